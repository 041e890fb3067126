// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File stuff (atomic writes, digests, FITS helpers).

pub(crate) mod fits;

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

/// Write everything produced by `fill` into a uniquely-named temporary file
/// next to `dest`, then rename it over `dest`. Readers of `dest` therefore
/// only ever see a complete file; concurrent writers are last-rename-wins.
///
/// The parent directory of `dest` is created if it doesn't exist. The number
/// of bytes reported by `fill` is returned.
pub(crate) fn write_atomically<F, E>(dest: &Path, fill: F) -> Result<u64, E>
where
    F: FnOnce(&mut File) -> Result<u64, E>,
    E: From<std::io::Error>,
{
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    let num_bytes = fill(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(num_bytes)
}

/// Copy `src` to `dest` atomically (see [`write_atomically`]).
pub(crate) fn copy_atomically(src: &Path, dest: &Path) -> Result<u64, std::io::Error> {
    let mut reader = BufReader::new(File::open(src)?);
    write_atomically(dest, |f| std::io::copy(&mut reader, f))
}

/// Get the SHA-256 digest of a file's contents as lowercase hex.
pub(crate) fn sha256_file(path: &Path) -> Result<String, std::io::Error> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Get the SHA-256 digest of some bytes as lowercase hex.
pub(crate) fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub(crate) fn sha256_str(s: &str) -> String {
    sha256_bytes(s.as_bytes())
}
