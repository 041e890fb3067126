// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A local cache of artifact store datasets.
//!
//! Cached files live at `<cache_dir>/<hash>/<file name>` (see
//! [`Resolver`](crate::resolve::Resolver)) and are recorded in
//! `<cache_dir>/cache_index.json`. The cache is unbounded; nothing is evicted
//! unless explicitly invalidated. Once cached, a file is never rewritten
//! unless it is invalidated, refreshed, or no longer matches its entry.

mod error;
mod index;

pub use error::CacheError;
pub use index::CacheEntry;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::{debug, info, warn};

use self::index::CacheIndex;
use crate::{
    constants::{CACHE_INDEX_FILENAME, UNCACHED_SUBDIR},
    fetch::Fetch,
    io::sha256_file,
    resolve::{DatasetRef, ResolvedLocation, Resolver, Subtree},
};

/// Introspection of the cache's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub enabled: bool,

    pub location: PathBuf,

    /// The number of indexed datasets present on disk.
    pub entries: usize,

    /// The total size of those datasets [bytes].
    pub total_bytes: u64,
}

impl CacheStats {
    pub fn size_mb(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

impl Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.enabled {
            return write!(f, "Cache disabled ({})", self.location.display());
        }
        write!(
            f,
            "Cache at {}: {} files, {} bytes ({:.2} MiB)",
            self.location.display(),
            self.entries,
            self.total_bytes,
            self.size_mb()
        )
    }
}

/// Fetches datasets through a local cache. The cache directory is shared
/// with any other processes using the same directory.
pub struct DataCache<F: Fetch> {
    resolver: Resolver,
    fetcher: F,
    enabled: bool,
    index: CacheIndex,
}

impl<F: Fetch> DataCache<F> {
    /// Set up a cache. If caching is enabled, the cache directory is created
    /// and any existing index is read.
    pub fn new(resolver: Resolver, fetcher: F, enabled: bool) -> Result<DataCache<F>, CacheError> {
        let mut cache = DataCache {
            resolver,
            fetcher,
            enabled: false,
            index: CacheIndex::default(),
        };
        cache.set_enabled(enabled)?;
        Ok(cache)
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn dir(&self) -> &Path {
        self.resolver.cache_dir()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn caching on or off. Turning it on (re)reads the index.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), CacheError> {
        if enabled && !self.enabled {
            std::fs::create_dir_all(self.dir()).map_err(|e| CacheError::Io {
                path: self.dir().to_path_buf(),
                source: e,
            })?;
            self.index = CacheIndex::load(&self.index_path());
            debug!(
                "Cache enabled at {} ({} indexed datasets)",
                self.dir().display(),
                self.index.len()
            );
        }
        self.enabled = enabled;
        Ok(())
    }

    fn index_path(&self) -> PathBuf {
        self.dir().join(CACHE_INDEX_FILENAME)
    }

    /// Get a local path to the dataset, fetching it if it isn't cached. With
    /// caching disabled, this always fetches.
    pub fn get(&mut self, dataset: &DatasetRef, subtree: Subtree) -> Result<PathBuf, CacheError> {
        let location = self.resolver.resolve_ref(dataset, subtree)?;
        if !self.enabled {
            let dest = self.resolver.uncached_path(&location);
            self.fetcher.fetch(&location, &dest)?;
            return Ok(dest);
        }

        if let Some(path) = self.cached_path(&location)? {
            debug!("Cache hit for {}", location.remote_key);
            return Ok(path);
        }
        self.fetch_and_record(&location)
    }

    /// Validate `path` as a dataset reference and [`get`](Self::get) it.
    pub fn get_path(&mut self, path: &str, subtree: Subtree) -> Result<PathBuf, CacheError> {
        let dataset = DatasetRef::new(path)?;
        self.get(&dataset, subtree)
    }

    /// Fetch the dataset again, even if it's cached.
    pub fn refresh(
        &mut self,
        dataset: &DatasetRef,
        subtree: Subtree,
    ) -> Result<PathBuf, CacheError> {
        if !self.enabled {
            return self.get(dataset, subtree);
        }
        let location = self.resolver.resolve_ref(dataset, subtree)?;
        info!("Refreshing {}", location.remote_key);
        self.fetch_and_record(&location)
    }

    /// The cache entry for a dataset, if there is one. Doesn't touch the
    /// artifact store.
    pub fn entry(&self, dataset: &DatasetRef, subtree: Subtree) -> Option<&CacheEntry> {
        self.index
            .get(&self.resolver.remote_key(dataset, subtree))
    }

    /// Remove a dataset from the cache, deleting its file. Returns true if
    /// there was anything to remove.
    pub fn invalidate(&mut self, dataset: &DatasetRef, subtree: Subtree) -> Result<bool, CacheError> {
        let location = self.resolver.resolve_ref(dataset, subtree)?;
        let mut removed = false;

        if self.enabled {
            // Merge with whatever other processes have recorded since we read
            // the index.
            let mut on_disk = CacheIndex::load(&self.index_path());
            let ours = self.index.remove(&location.remote_key).is_some();
            let theirs = on_disk.remove(&location.remote_key).is_some();
            if ours || theirs {
                on_disk.save(&self.index_path())?;
                removed = true;
            }
            self.index = on_disk;
        }

        if location.cache_path.exists() {
            remove_file(&location.cache_path)?;
            removed = true;
        }
        if let Some(parent) = location.cache_path.parent() {
            // Only succeeds if empty, which is all we want.
            let _ = std::fs::remove_dir(parent);
        }

        if removed {
            info!("Invalidated {}", location.remote_key);
        }
        Ok(removed)
    }

    /// Empty the cache directory entirely. Returns the number of indexed
    /// datasets that were removed.
    ///
    /// A disabled cache leaves the shared cache and its index alone; only its
    /// own scratch files are removed, and 0 is returned.
    pub fn invalidate_all(&mut self) -> Result<usize, CacheError> {
        let dir = self.dir().to_path_buf();
        if !self.enabled {
            let scratch = dir.join(UNCACHED_SUBDIR);
            if scratch.exists() {
                std::fs::remove_dir_all(&scratch).map_err(|e| CacheError::Io {
                    path: scratch.clone(),
                    source: e,
                })?;
            }
            info!("Caching is disabled; left {} untouched", dir.display());
            return Ok(0);
        }

        let num_entries = self.index.len().max(CacheIndex::load(&self.index_path()).len());

        if dir.exists() {
            let read_dir = std::fs::read_dir(&dir).map_err(|e| CacheError::Io {
                path: dir.clone(),
                source: e,
            })?;
            for entry in read_dir {
                let entry = entry.map_err(|e| CacheError::Io {
                    path: dir.clone(),
                    source: e,
                })?;
                let path = entry.path();
                let result = if path.is_dir() {
                    std::fs::remove_dir_all(&path)
                } else {
                    std::fs::remove_file(&path)
                };
                result.map_err(|e| CacheError::Io { path, source: e })?;
            }
        }

        self.index.clear();
        self.index.save(&self.index_path())?;
        info!("Cleared the cache at {}", dir.display());
        Ok(num_entries)
    }

    /// Count the indexed datasets that are present on disk. No side effects.
    pub fn stats(&self) -> CacheStats {
        let mut entries = 0;
        let mut total_bytes = 0;
        if self.enabled {
            for (_, entry) in self.index.iter() {
                if let Ok(m) = std::fs::metadata(self.dir().join(&entry.cache_path)) {
                    if m.is_file() {
                        entries += 1;
                        total_bytes += m.len();
                    }
                }
            }
        }

        CacheStats {
            enabled: self.enabled,
            location: self.dir().to_path_buf(),
            entries,
            total_bytes,
        }
    }

    /// Get the path of a valid cached copy of a dataset, if there is one.
    ///
    /// A file that no longer matches its entry's size is treated as absent. A
    /// file at the deterministic cache path without an entry (e.g. another
    /// process's index write won the race) is adopted; atomic renames mean it
    /// is complete.
    fn cached_path(&mut self, location: &ResolvedLocation) -> Result<Option<PathBuf>, CacheError> {
        if let Some(entry) = self.index.get(&location.remote_key) {
            let path = self.dir().join(&entry.cache_path);
            match std::fs::metadata(&path) {
                Ok(m) if m.is_file() && m.len() == entry.size => return Ok(Some(path)),
                Ok(m) => {
                    warn!(
                        "Cached {} has {} bytes, but {} were fetched; fetching again",
                        path.display(),
                        m.len(),
                        entry.size
                    );
                    return Ok(None);
                }
                Err(_) => {
                    debug!(
                        "Cached file for {} has gone missing",
                        location.remote_key
                    );
                    return Ok(None);
                }
            }
        }

        if location.cache_path.is_file() {
            debug!(
                "Adopting unindexed cache file {}",
                location.cache_path.display()
            );
            self.record(location)?;
            return Ok(Some(location.cache_path.clone()));
        }

        Ok(None)
    }

    fn fetch_and_record(&mut self, location: &ResolvedLocation) -> Result<PathBuf, CacheError> {
        let num_bytes = self.fetcher.fetch(location, &location.cache_path)?;
        debug!(
            "Fetched {} ({num_bytes} bytes) into {}",
            location.remote,
            location.cache_path.display()
        );
        self.record(location)?;
        Ok(location.cache_path.clone())
    }

    /// Record the file at the location's cache path in the index.
    fn record(&mut self, location: &ResolvedLocation) -> Result<(), CacheError> {
        let path = &location.cache_path;
        let io_err = |e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        let size = std::fs::metadata(path).map_err(io_err)?.len();
        let sha256 = sha256_file(path).map_err(io_err)?;
        let cache_path = path
            .strip_prefix(self.dir())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf());
        let entry = CacheEntry {
            cache_path,
            size,
            sha256,
            timestamp: Utc::now(),
        };

        let mut on_disk = CacheIndex::load(&self.index_path());
        on_disk.insert(location.remote_key.clone(), entry);
        on_disk.save(&self.index_path())?;
        self.index = on_disk;
        Ok(())
    }
}

fn remove_file(path: &Path) -> Result<(), CacheError> {
    std::fs::remove_file(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
