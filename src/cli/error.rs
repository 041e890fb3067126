// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all rtdata-related errors. This should be the *only* error
//! enum surfaced by the binary.

use thiserror::Error;

use crate::{
    cache::CacheError,
    compare::ComparisonError,
    constants::{API_KEY_ENV, API_KEY_FILE_ENV, BIGDATA_ROOT_ENV},
    fetch::FetchError,
    params::ParamsError,
    resolve::InvalidPathError,
};

/// The *only* publicly visible error from rtdata.
#[derive(Error, Debug)]
pub enum RtdataError {
    /// Configuration problems.
    #[error("{0}\n\nThe artifact store is configured with {BIGDATA_ROOT_ENV} (or --bigdata-root); see rtdata --help")]
    Params(String),

    /// A dataset reference that can't be resolved.
    #[error("{0}\n\nDataset paths are relative to the repository environment and use '/' separators")]
    InvalidPath(String),

    /// Anything that went wrong retrieving a dataset.
    #[error("{0}")]
    Fetch(String),

    /// The API key couldn't be used.
    #[error("{0}\n\nSet {API_KEY_ENV} or point {API_KEY_FILE_ENV} (or --api-key-file) at a file containing the key")]
    Credentials(String),

    /// An error touching the cache directory.
    #[error("{0}\n\nIf the cache is in a bad state, try 'rtdata cache-clear'")]
    Cache(String),

    /// Files couldn't be compared at all.
    #[error("{0}")]
    Comparison(String),

    /// Files were compared and differ.
    #[error("{0}")]
    Mismatch(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are toml or json with the same names as the long CLI flags")]
    ArgFile(String),

    /// A cfitsio error. Because these are usually quite spartan, some
    /// suggestions are provided here.
    #[error("cfitsio error: {0}\n\nIf you don't know what this means, try turning up verbosity (-v or -vv) and check that both files are valid FITS.")]
    Cfitsio(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<ParamsError> for RtdataError {
    fn from(e: ParamsError) -> Self {
        Self::Params(e.to_string())
    }
}

impl From<InvalidPathError> for RtdataError {
    fn from(e: InvalidPathError) -> Self {
        Self::InvalidPath(e.to_string())
    }
}

impl From<FetchError> for RtdataError {
    fn from(e: FetchError) -> Self {
        let s = e.to_string();
        match e {
            FetchError::Credentials { .. } => Self::Credentials(s),
            FetchError::Status {
                status: 401 | 403, ..
            } => Self::Credentials(s),
            FetchError::NotFound { .. }
            | FetchError::Status { .. }
            | FetchError::Request { .. }
            | FetchError::Client(_) => Self::Fetch(s),
            FetchError::Io { .. } => Self::Generic(s),
        }
    }
}

impl From<CacheError> for RtdataError {
    fn from(e: CacheError) -> Self {
        let s = e.to_string();
        match e {
            CacheError::InvalidPath(e) => Self::from(e),
            CacheError::Fetch(e) => Self::from(e),
            CacheError::Io { .. } => Self::Cache(s),
        }
    }
}

impl From<ComparisonError> for RtdataError {
    fn from(e: ComparisonError) -> Self {
        let s = e.to_string();
        match e {
            ComparisonError::Fits(_) => Self::Cfitsio(s),
            ComparisonError::Missing { .. } | ComparisonError::NotSet(_) => Self::Comparison(s),
            ComparisonError::Io { .. } => Self::Generic(s),
        }
    }
}

impl From<std::io::Error> for RtdataError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
