// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `get-data` and `get-truth`.

use std::path::PathBuf;

use clap::Parser;
use log::debug;
use serde::{Deserialize, Serialize};

use super::common::{StoreArgs, ARG_FILE_HELP};
use crate::{resolve::Subtree, rtdata::RegtestData, RtdataError};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct GetArgs {
    /// The dataset, relative to the repository environment's test_data (or
    /// truth) folder, e.g. "photoz/catalog.parquet".
    #[clap(name = "DATASET")]
    #[serde(skip)]
    pub(super) dataset: String,

    /// The directory fetched datasets are copied into. Truth files go into a
    /// "truth" subdirectory. Default: the current directory
    #[clap(short, long, parse(from_os_str))]
    pub(super) work_dir: Option<PathBuf>,

    #[clap(long, help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    #[serde(skip)]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "store")]
    #[serde(default)]
    pub(super) store_args: StoreArgs,
}

impl GetArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified
    /// into a single struct. Where applicable, it will prefer CLI parameters
    /// over those in the file.
    pub(super) fn merge(self) -> Result<GetArgs, RtdataError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let GetArgs {
                dataset: _,
                work_dir,
                args_file: _,
                store_args,
            } = unpack_arg_file!(arg_file);

            Ok(GetArgs {
                dataset: cli_args.dataset,
                work_dir: cli_args.work_dir.or(work_dir),
                args_file: None,
                store_args: cli_args.store_args.merge(store_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    /// Fetch the dataset and print where it landed.
    pub(super) fn run(self, subtree: Subtree) -> Result<(), RtdataError> {
        debug!("{:#?}", self);

        let GetArgs {
            dataset,
            work_dir,
            args_file: _,
            store_args,
        } = self;
        let params = store_args.parse()?;
        let work_dir = work_dir.unwrap_or_else(|| PathBuf::from("."));
        let mut rtdata = RegtestData::from_params(&params, work_dir)?;

        let path = match subtree {
            Subtree::Input => rtdata.get_data(&dataset)?,
            Subtree::Truth => rtdata.get_truth(&dataset)?,
        };
        println!("{}", path.display());
        Ok(())
    }
}
