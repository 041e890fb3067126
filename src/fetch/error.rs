// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from fetching datasets.

use std::path::PathBuf;

use thiserror::Error;

/// A dataset couldn't be retrieved from the artifact store. These are never
/// retried; tests surface them as failures.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Dataset {location} doesn't exist in the artifact store")]
    NotFound { location: String },

    #[error("Artifact store responded with HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Artifact store credentials are unusable: {reason}")]
    Credentials { reason: String },

    #[error("Couldn't set up an HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Couldn't write {location} to {}: {source}", .dest.display())]
    Io {
        location: String,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// The HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Request { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
