// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Regression-test data management for roman_photoz.

Datasets live in a versioned artifact store (a local directory or an HTTP(S)
repository). This crate resolves relative dataset paths against that store,
fetches and caches the files locally, and compares pipeline outputs against
truth files.
 */

pub mod bigdata;
pub mod cache;
mod cli;
pub mod compare;
pub mod constants;
pub mod fetch;
mod io;
pub mod params;
pub mod resolve;
pub mod rtdata;

// Re-exports.
pub use cache::{CacheError, CacheStats, DataCache};
pub use cli::{Rtdata, RtdataError};
pub use compare::{
    compare_files, CompareOptions, ComparisonError, ComparisonResult, Difference, FileFormat,
    LineChange, Tolerance,
};
pub use fetch::{Credentials, Fetch, FetchClient, FetchError};
pub use params::{BigdataRoot, ParamsError, RegtestParams};
pub use resolve::{
    DatasetRef, InvalidPathError, RemoteLocation, ResolvedLocation, Resolver, Subtree,
};
pub use rtdata::RegtestData;

use crossbeam_utils::atomic::AtomicCell;

lazy_static::lazy_static! {
    /// Are progress bars being drawn? This should only ever be enabled by CLI
    /// code.
    pub(crate) static ref PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
}
