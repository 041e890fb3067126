// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The on-disk index of cached datasets.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use log::{trace, warn};
use serde::{Deserialize, Serialize};

use super::CacheError;
use crate::io::write_atomically;

/// Metadata about one cached dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Path of the cached file, relative to the cache directory.
    pub cache_path: PathBuf,

    /// Size of the file when it was fetched [bytes].
    pub size: u64,

    /// SHA-256 of the file when it was fetched.
    pub sha256: String,

    /// When the file was fetched.
    pub timestamp: DateTime<Utc>,
}

/// Cache entries keyed by remote key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(super) struct CacheIndex {
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheIndex {
    /// Read the index at `path`. A missing index is empty; an unreadable or
    /// corrupt one is discarded.
    pub(super) fn load(path: &Path) -> CacheIndex {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheIndex::default(),
            Err(e) => {
                warn!(
                    "Couldn't open cache index {}: {e}; starting a new one",
                    path.display()
                );
                return CacheIndex::default();
            }
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(index) => index,
            Err(e) => {
                warn!(
                    "Cache index {} is corrupt ({e}); starting a new one",
                    path.display()
                );
                CacheIndex::default()
            }
        }
    }

    /// Atomically replace the index at `path`.
    pub(super) fn save(&self, path: &Path) -> Result<(), CacheError> {
        trace!("Writing cache index {} ({} entries)", path.display(), self.len());
        write_atomically(path, |f| -> Result<u64, std::io::Error> {
            let mut writer = BufWriter::new(f);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
            Ok(0)
        })
        .map(|_| ())
        .map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub(super) fn get(&self, remote_key: &str) -> Option<&CacheEntry> {
        self.entries.get(remote_key)
    }

    pub(super) fn insert(&mut self, remote_key: String, entry: CacheEntry) {
        self.entries.insert(remote_key, entry);
    }

    pub(super) fn remove(&mut self, remote_key: &str) -> Option<CacheEntry> {
        self.entries.remove(remote_key)
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }
}
