// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Retrieving dataset bytes from the artifact store.
//!
//! Whether a fetch is a local copy or an HTTP GET depends only on the
//! [`RemoteLocation`] a dataset resolved to. Either way, bytes land in a
//! temporary file next to the destination which is then renamed into place,
//! so a partial download never appears at the destination.

mod error;
mod http;
mod local;

pub use error::FetchError;

use std::{fmt::Debug, path::Path, path::PathBuf, time::Duration};

use log::debug;

use crate::{
    constants::DEFAULT_TIMEOUT_SECS,
    resolve::{RemoteLocation, ResolvedLocation},
};

/// Something that can put a resolved dataset's bytes at a local path.
pub trait Fetch {
    /// Write the dataset behind `location` to `dest`, replacing anything
    /// already there. Returns the number of bytes written.
    fn fetch(&self, location: &ResolvedLocation, dest: &Path) -> Result<u64, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for Box<T> {
    fn fetch(&self, location: &ResolvedLocation, dest: &Path) -> Result<u64, FetchError> {
        (**self).fetch(location, dest)
    }
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, location: &ResolvedLocation, dest: &Path) -> Result<u64, FetchError> {
        (**self).fetch(location, dest)
    }
}

/// Where the artifact store API key comes from. Nothing is read until a fetch
/// actually needs it.
#[derive(Clone, Default)]
pub struct Credentials {
    /// A file whose (trimmed) contents are the API key.
    pub api_key_file: Option<PathBuf>,

    /// The API key itself. Takes precedence over `api_key_file`.
    pub api_key: Option<String>,

    /// If true, fetching from an HTTP store without a key is an error.
    pub required: bool,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key_file", &self.api_key_file)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("required", &self.required)
            .finish()
    }
}

impl Credentials {
    /// Get the API key, if one is configured.
    pub(crate) fn api_key(&self) -> Result<Option<String>, FetchError> {
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                return Ok(Some(key.to_string()));
            }
        }

        if let Some(file) = &self.api_key_file {
            debug!("Reading API key from {}", file.display());
            let contents =
                std::fs::read_to_string(file).map_err(|e| FetchError::Credentials {
                    reason: format!("couldn't read API key file {}: {e}", file.display()),
                })?;
            let key = contents.trim();
            if key.is_empty() {
                return Err(FetchError::Credentials {
                    reason: format!("API key file {} is empty", file.display()),
                });
            }
            return Ok(Some(key.to_string()));
        }

        if self.required {
            Err(FetchError::Credentials {
                reason: "an API key is required, but neither a key nor a key file was given"
                    .to_string(),
            })
        } else {
            Ok(None)
        }
    }
}

/// Fetches from a locally-mounted store by copying, and from an HTTP(S) store
/// with a blocking GET.
pub struct FetchClient {
    credentials: Credentials,
    http: reqwest::blocking::Client,
}

impl FetchClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<FetchClient, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(FetchError::Client)?;
        Ok(FetchClient { credentials, http })
    }

    /// A client without credentials and with the default timeout.
    pub fn anonymous() -> Result<FetchClient, FetchError> {
        FetchClient::new(
            Credentials::default(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }
}

impl Fetch for FetchClient {
    fn fetch(&self, location: &ResolvedLocation, dest: &Path) -> Result<u64, FetchError> {
        debug!("Fetching {} to {}", location.remote, dest.display());
        match &location.remote {
            RemoteLocation::Local(src) => local::copy(src, dest),
            RemoteLocation::Http(url) => {
                let api_key = self.credentials.api_key()?;
                http::download(&self.http, url, api_key.as_deref(), dest)
            }
        }
    }
}
