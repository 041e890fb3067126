// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters for accessing the artifact store, caching and comparing.
//!
//! Parameters come from environment variables first; the CLI layers an
//! arguments file and command-line flags on top of them. Everything is held
//! in a [`RegtestParams`] which is handed to each component explicitly.

mod error;

pub use error::ParamsError;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;
use reqwest::Url;

use crate::{compare::CompareOptions, constants::*, fetch::Credentials};

/// The root of the artifact store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BigdataRoot {
    /// A locally-mounted directory.
    Local(PathBuf),

    /// An HTTP(S) repository.
    Remote(Url),
}

impl BigdataRoot {
    /// Anything starting with `http://` or `https://` is a remote root;
    /// everything else is a local path.
    pub fn parse(root: &str) -> Result<BigdataRoot, ParamsError> {
        let trimmed = root.trim();
        if trimmed.is_empty() {
            return Err(ParamsError::NoBigdataRoot);
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|e| ParamsError::InvalidRoot {
                root: root.to_string(),
                reason: e.to_string(),
            })?;
            if url.cannot_be_a_base() || url.host().is_none() {
                return Err(ParamsError::InvalidRoot {
                    root: root.to_string(),
                    reason: "URL has no host".to_string(),
                });
            }
            Ok(BigdataRoot::Remote(url))
        } else {
            Ok(BigdataRoot::Local(PathBuf::from(trimmed)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, BigdataRoot::Remote(_))
    }
}

impl Display for BigdataRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BigdataRoot::Local(p) => write!(f, "{}", p.display()),
            BigdataRoot::Remote(u) => write!(f, "{u}"),
        }
    }
}

/// Everything needed to resolve, fetch, cache and compare regression-test
/// data.
#[derive(Debug, Clone)]
pub struct RegtestParams {
    pub bigdata_root: BigdataRoot,

    /// The artifact store folder (repository) holding inputs and truth files.
    pub inputs_root: String,

    /// The artifact store folder that results are uploaded to.
    pub results_root: String,

    /// The repository environment, e.g. "dev".
    pub env: String,

    pub cache_dir: PathBuf,

    /// If false, every fetch goes to the artifact store.
    pub use_cache: bool,

    /// Copy fetched files into the test's working directory, rather than
    /// handing out paths inside the cache.
    pub docopy: bool,

    pub credentials: Credentials,

    /// The HTTP request timeout.
    pub timeout: Duration,

    pub compare: CompareOptions,
}

impl RegtestParams {
    /// Parameters with every default filled in for the given store root.
    pub fn new(bigdata_root: BigdataRoot) -> RegtestParams {
        RegtestParams {
            bigdata_root,
            inputs_root: DEFAULT_INPUTS_ROOT.to_string(),
            results_root: DEFAULT_RESULTS_ROOT.to_string(),
            env: DEFAULT_ENV_NAME.to_string(),
            cache_dir: default_cache_dir(std::env::var("HOME").ok().as_deref()),
            use_cache: true,
            docopy: true,
            credentials: Credentials::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            compare: CompareOptions::default(),
        }
    }

    /// Read parameters from the process environment.
    pub fn from_env() -> Result<RegtestParams, ParamsError> {
        RegtestParams::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read parameters through `lookup`, which maps an environment variable
    /// name to its value (if set). Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<RegtestParams, ParamsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let root = get(BIGDATA_ROOT_ENV).ok_or(ParamsError::NoBigdataRoot)?;
        let mut params = RegtestParams::new(BigdataRoot::parse(&root)?);
        params.cache_dir = match get(CACHE_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => default_cache_dir(lookup("HOME").as_deref()),
        };
        if let Some(env) = get(ENV_NAME_ENV) {
            params.env = env;
        }
        if let Some(inputs_root) = get(INPUTS_ROOT_ENV) {
            params.inputs_root = inputs_root;
        }
        if let Some(results_root) = get(RESULTS_ROOT_ENV) {
            params.results_root = results_root;
        }

        params.credentials.api_key = get(API_KEY_ENV).map(|k| k.trim().to_string());
        params.credentials.api_key_file = match get(API_KEY_FILE_ENV) {
            Some(f) => Some(PathBuf::from(f)),
            None => {
                let default = Path::new(DEFAULT_API_KEY_FILE);
                default.exists().then(|| default.to_path_buf())
            }
        };

        debug!("Regression-test parameters from the environment: {params:#?}");
        Ok(params)
    }
}

/// `$HOME/.cache/roman_photoz/regtest`, or relative to the current directory
/// if there's no home directory.
pub(crate) fn default_cache_dir(home: Option<&str>) -> PathBuf {
    PathBuf::from(home.unwrap_or(".")).join(DEFAULT_CACHE_SUBDIR)
}
