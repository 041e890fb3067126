// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::common::ARG_FILE_HELP;
use crate::{
    compare::{compare_files, CompareOptions, FileFormat, Tolerance},
    constants::{DEFAULT_ATOL, DEFAULT_IGNORE_KEYWORDS, DEFAULT_MAX_REPORTED_DIFFS, DEFAULT_RTOL},
    params::ParamsError,
    RtdataError,
};

lazy_static::lazy_static! {
    static ref ATOL_HELP: String =
        format!("The absolute tolerance used when comparing floats. Default: {DEFAULT_ATOL:e}");

    static ref RTOL_HELP: String =
        format!("The relative tolerance used when comparing floats. Default: {DEFAULT_RTOL:e}");

    static ref IGNORE_KEYWORD_HELP: String =
        format!("A FITS header keyword not to compare; may be given multiple times. A trailing '*' matches any suffix. Always ignored unless --no-default-ignores is given: {}", DEFAULT_IGNORE_KEYWORDS.join(", "));

    static ref MAX_DIFFS_HELP: String =
        format!("The maximum number of differences to report. Default: {DEFAULT_MAX_REPORTED_DIFFS}");

    static ref FORMAT_HELP: String =
        format!("Compare the files as this format rather than detecting it. Supported formats: {}", FileFormat::iter().join(", "));
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CompareArgs {
    /// The file produced by the test.
    #[clap(name = "OUTPUT", parse(from_os_str))]
    #[serde(skip)]
    pub(super) output: PathBuf,

    /// The truth file to compare against.
    #[clap(name = "TRUTH", parse(from_os_str))]
    #[serde(skip)]
    pub(super) truth: PathBuf,

    #[clap(long, help = ATOL_HELP.as_str())]
    pub(super) atol: Option<f64>,

    #[clap(long, help = RTOL_HELP.as_str())]
    pub(super) rtol: Option<f64>,

    #[clap(
        long = "ignore-keyword",
        multiple_occurrences(true),
        number_of_values(1),
        help = IGNORE_KEYWORD_HELP.as_str()
    )]
    pub(super) ignore_keywords: Option<Vec<String>>,

    /// Compare every FITS header keyword except those given with
    /// --ignore-keyword.
    #[clap(long)]
    #[serde(default)]
    pub(super) no_default_ignores: bool,

    #[clap(long, help = MAX_DIFFS_HELP.as_str())]
    pub(super) max_diffs: Option<usize>,

    #[clap(long, help = FORMAT_HELP.as_str())]
    pub(super) format: Option<String>,

    #[clap(long, help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    #[serde(skip)]
    pub(super) args_file: Option<PathBuf>,
}

impl CompareArgs {
    pub(super) fn merge(self) -> Result<CompareArgs, RtdataError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let CompareArgs {
                output: _,
                truth: _,
                atol,
                rtol,
                ignore_keywords,
                no_default_ignores,
                max_diffs,
                format,
                args_file: _,
            } = unpack_arg_file!(arg_file);

            Ok(CompareArgs {
                output: cli_args.output,
                truth: cli_args.truth,
                atol: cli_args.atol.or(atol),
                rtol: cli_args.rtol.or(rtol),
                ignore_keywords: cli_args.ignore_keywords.or(ignore_keywords),
                no_default_ignores: cli_args.no_default_ignores || no_default_ignores,
                max_diffs: cli_args.max_diffs.or(max_diffs),
                format: cli_args.format.or(format),
                args_file: None,
            })
        } else {
            Ok(cli_args)
        }
    }

    /// Turn the arguments into comparison options.
    pub(super) fn options(&self) -> Result<CompareOptions, ParamsError> {
        let mut options = CompareOptions {
            tolerance: Tolerance::new(
                self.atol.unwrap_or(DEFAULT_ATOL),
                self.rtol.unwrap_or(DEFAULT_RTOL),
            )?,
            ..Default::default()
        };
        if self.no_default_ignores {
            options.ignore_keywords.clear();
        }
        if let Some(keywords) = &self.ignore_keywords {
            options.ignore_keywords.extend(keywords.iter().cloned());
        }
        if let Some(max_diffs) = self.max_diffs {
            options.max_reported = max_diffs;
        }
        if let Some(format) = &self.format {
            let parsed = FileFormat::from_str(format.trim())
                .map_err(|_| ParamsError::UnknownFormat(format.clone()))?;
            options.format = Some(parsed);
        }
        Ok(options)
    }

    /// Compare the files and print the report. Differences are an error, so
    /// the process exits non-zero.
    pub(super) fn run(self) -> Result<(), RtdataError> {
        debug!("{:#?}", self);

        let options = self.options()?;
        info!("Comparing with {}", options.tolerance);
        let result = compare_files(&self.output, &self.truth, &options)?;
        println!("{result}");

        if result.is_match() {
            Ok(())
        } else {
            Err(RtdataError::Mismatch(format!(
                "{} doesn't match {}: {} difference(s)",
                result.output.display(),
                result.truth.display(),
                result.total_differences
            )))
        }
    }
}
