// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mapping dataset references to artifact store locations and local cache
//! paths.
//!
//! A dataset reference is a relative path inside a repository environment,
//! e.g. `test_data/catalog.parquet`. Together with the configured store root,
//! repository, environment and subtree it maps to
//! `<root>/<repository>/<environment>/<subtree>/<reference>`.
//!
//! Nothing here touches the network or writes to disk.

mod error;

pub use error::InvalidPathError;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use reqwest::Url;
use strum_macros::{Display, EnumString};

use crate::{
    constants::{CACHE_HASH_LEN, UNCACHED_SUBDIR},
    io::sha256_str,
    params::{BigdataRoot, RegtestParams},
};

/// A validated, normalised relative path naming a file in a repository
/// environment. Never contains the store root or the environment name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetRef(String);

impl DatasetRef {
    /// Validate a relative dataset path. Empty (`""`) and current-directory
    /// (`"."`) segments are dropped; anything that could escape the
    /// repository environment is rejected.
    pub fn new<S: AsRef<str>>(path: S) -> Result<DatasetRef, InvalidPathError> {
        let path = path.as_ref();
        if path.is_empty() {
            return Err(InvalidPathError::Empty);
        }
        if path.contains('\0') {
            return Err(InvalidPathError::NulByte(path.to_string()));
        }
        if path.contains('\\') {
            return Err(InvalidPathError::Backslash(path.to_string()));
        }
        if path.starts_with('/') {
            return Err(InvalidPathError::Absolute(path.to_string()));
        }
        if path.ends_with('/') {
            return Err(InvalidPathError::NoFileName(path.to_string()));
        }

        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(InvalidPathError::ParentTraversal(path.to_string())),
                // URL parsers treat percent-encoded dots as dots.
                s if s.to_ascii_lowercase().replace("%2e", ".") == ".." => {
                    return Err(InvalidPathError::ParentTraversal(path.to_string()))
                }
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Err(InvalidPathError::NoFileName(path.to_string()));
        }

        Ok(DatasetRef(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path segments of this reference.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The final segment of the reference, i.e. the file's name.
    pub fn file_name(&self) -> &str {
        // Validation guarantees at least one non-empty segment.
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl Display for DatasetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetRef {
    type Err = InvalidPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetRef::new(s)
    }
}

/// Which part of a repository environment a dataset lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Subtree {
    /// Test inputs.
    #[strum(serialize = "test_data")]
    Input,

    /// Reference outputs to compare against.
    #[strum(serialize = "truth")]
    Truth,
}

/// Where a dataset's bytes can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLocation {
    /// A file on a locally-mounted artifact store.
    Local(PathBuf),

    /// A file on an HTTP(S) artifact store.
    Http(Url),
}

impl Display for RemoteLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteLocation::Local(p) => write!(f, "{}", p.display()),
            RemoteLocation::Http(u) => write!(f, "{u}"),
        }
    }
}

/// A fully-resolved dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub dataset: DatasetRef,

    pub subtree: Subtree,

    /// `<repository>/<environment>/<subtree>/<reference>`. This uniquely
    /// identifies the dataset within the store and keys the cache index.
    pub remote_key: String,

    pub remote: RemoteLocation,

    /// The deterministic local cache path for this dataset.
    pub cache_path: PathBuf,

    /// Did `cache_path` exist when this location was resolved?
    pub exists: bool,
}

/// Resolves dataset references for one (store root, repository, environment)
/// combination.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: BigdataRoot,
    repository: String,
    env: String,
    cache_dir: PathBuf,
}

impl Resolver {
    pub fn new<R, E, P>(root: BigdataRoot, repository: R, env: E, cache_dir: P) -> Resolver
    where
        R: Into<String>,
        E: Into<String>,
        P: Into<PathBuf>,
    {
        Resolver {
            root,
            repository: repository.into().trim_matches('/').to_string(),
            env: env.into().trim_matches('/').to_string(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn from_params(params: &RegtestParams) -> Resolver {
        Resolver::new(
            params.bigdata_root.clone(),
            params.inputs_root.as_str(),
            params.env.as_str(),
            params.cache_dir.as_path(),
        )
    }

    pub fn root(&self) -> &BigdataRoot {
        &self.root
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Validate `path` and resolve it.
    pub fn resolve(
        &self,
        path: &str,
        subtree: Subtree,
    ) -> Result<ResolvedLocation, InvalidPathError> {
        let dataset = DatasetRef::new(path)?;
        self.resolve_ref(&dataset, subtree)
    }

    /// Resolve an already-validated dataset reference.
    pub fn resolve_ref(
        &self,
        dataset: &DatasetRef,
        subtree: Subtree,
    ) -> Result<ResolvedLocation, InvalidPathError> {
        let remote_key = self.remote_key(dataset, subtree);
        let remote = match &self.root {
            BigdataRoot::Local(dir) => {
                let mut p = dir.join(&self.repository).join(&self.env);
                p.push(subtree.to_string());
                p.extend(dataset.segments());
                RemoteLocation::Local(p)
            }
            BigdataRoot::Remote(url) => {
                let mut url = url.clone();
                url.set_query(None);
                url.set_fragment(None);
                url.path_segments_mut()
                    .map_err(|()| InvalidPathError::Unrepresentable {
                        path: dataset.to_string(),
                        reason: format!("{} can't have a path", self.root),
                    })?
                    .pop_if_empty()
                    .extend(self.repository.split('/').filter(|s| !s.is_empty()))
                    .extend(self.env.split('/').filter(|s| !s.is_empty()))
                    .push(&subtree.to_string())
                    // Each segment is percent-encoded, so '?' and '#' stay
                    // part of the path.
                    .extend(dataset.segments());
                RemoteLocation::Http(url)
            }
        };
        let cache_path = self.cache_path_for_key(&remote_key, dataset);
        let exists = cache_path.is_file();

        Ok(ResolvedLocation {
            dataset: dataset.clone(),
            subtree,
            remote_key,
            remote,
            cache_path,
            exists,
        })
    }

    /// The key identifying a dataset within the store.
    pub fn remote_key(&self, dataset: &DatasetRef, subtree: Subtree) -> String {
        format!("{}/{}/{subtree}/{dataset}", self.repository, self.env)
    }

    /// `<cache_dir>/<hash prefix of the remote key>/<file name>`. The hash
    /// subdirectory keeps identically-named files from different locations
    /// apart while preserving the original file name.
    fn cache_path_for_key(&self, remote_key: &str, dataset: &DatasetRef) -> PathBuf {
        let hash = sha256_str(remote_key);
        self.cache_dir
            .join(&hash[..CACHE_HASH_LEN])
            .join(dataset.file_name())
    }

    /// Where a dataset is fetched to when caching is disabled. These files are
    /// scratch space and never recorded in the cache index.
    pub(crate) fn uncached_path(&self, location: &ResolvedLocation) -> PathBuf {
        let hash = sha256_str(&location.remote_key);
        self.cache_dir
            .join(UNCACHED_SUBDIR)
            .join(&hash[..CACHE_HASH_LEN])
            .join(location.dataset.file_name())
    }
}
