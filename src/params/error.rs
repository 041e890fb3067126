// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::constants::BIGDATA_ROOT_ENV;

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error("No artifact store root was given; set {BIGDATA_ROOT_ENV} to a local directory or an http(s) URL")]
    NoBigdataRoot,

    #[error("Artifact store root '{root}' is invalid: {reason}")]
    InvalidRoot { root: String, reason: String },

    #[error("Tolerances must be finite and non-negative; got atol = {atol}, rtol = {rtol}")]
    InvalidTolerance { atol: f64, rtol: f64 },

    #[error("The request timeout must be greater than zero seconds")]
    ZeroTimeout,

    #[error("Unrecognised comparison format '{0}'; expected one of: fits, text, binary")]
    UnknownFormat(String),
}
