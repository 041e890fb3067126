// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fetching from a locally-mounted artifact store.

use std::path::Path;

use super::FetchError;
use crate::io::copy_atomically;

pub(super) fn copy(src: &Path, dest: &Path) -> Result<u64, FetchError> {
    if !src.is_file() {
        return Err(FetchError::NotFound {
            location: src.display().to_string(),
        });
    }

    copy_atomically(src, dest).map_err(|e| FetchError::Io {
        location: src.display().to_string(),
        dest: dest.to_path_buf(),
        source: e,
    })
}
