// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

use crate::io::fits::FitsError;

/// A file couldn't be compared at all. This is distinct from a comparison
/// that found differences.
#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("Can't compare {}: file doesn't exist", .path.display())]
    Missing { path: PathBuf },

    #[error("Couldn't read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error("No {0} file has been set")]
    NotSet(&'static str),
}
