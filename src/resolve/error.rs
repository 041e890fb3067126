// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors for malformed dataset references.

use thiserror::Error;

/// A dataset reference that can't safely be resolved. These are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPathError {
    #[error("Dataset path is empty")]
    Empty,

    #[error("Dataset path '{0}' is absolute; it must be relative to the repository environment")]
    Absolute(String),

    #[error("Dataset path '{0}' contains a parent-directory ('..') segment")]
    ParentTraversal(String),

    #[error("Dataset path '{0}' contains a backslash; use '/' as the separator")]
    Backslash(String),

    #[error("Dataset path '{0}' contains a NUL byte")]
    NulByte(String),

    #[error("Dataset path '{0}' doesn't name a file")]
    NoFileName(String),

    #[error("Dataset path '{path}' can't be made into a URL: {reason}")]
    Unrepresentable { path: String, reason: String },
}
