// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cache maintenance subcommands.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::common::{StoreArgs, ARG_FILE_HELP};
use crate::{
    cache::DataCache,
    fetch::FetchClient,
    params::RegtestParams,
    resolve::{DatasetRef, Resolver, Subtree},
    RtdataError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CacheArgs {
    #[clap(long, help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    #[serde(skip)]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "store")]
    #[serde(default)]
    pub(super) store_args: StoreArgs,
}

impl CacheArgs {
    pub(super) fn merge(self) -> Result<CacheArgs, RtdataError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let CacheArgs {
                args_file: _,
                store_args,
            } = unpack_arg_file!(arg_file);

            Ok(CacheArgs {
                args_file: None,
                store_args: cli_args.store_args.merge(store_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    /// Print what's in the cache.
    pub(super) fn info(self) -> Result<(), RtdataError> {
        let cache = open_cache(&self.store_args.parse()?)?;
        println!("{}", cache.stats());
        Ok(())
    }

    /// Delete everything in the cache.
    pub(super) fn clear(self) -> Result<(), RtdataError> {
        let mut cache = open_cache(&self.store_args.parse()?)?;
        let num_removed = cache.invalidate_all()?;
        println!("Removed {num_removed} cached dataset(s) from {}", cache.dir().display());
        Ok(())
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CacheInvalidateArgs {
    /// The dataset to remove from the cache.
    #[clap(name = "DATASET")]
    #[serde(skip)]
    pub(super) dataset: String,

    /// The dataset is a truth file rather than an input.
    #[clap(long)]
    #[serde(skip)]
    pub(super) truth: bool,

    #[clap(flatten)]
    pub(super) cache_args: CacheArgs,
}

impl CacheInvalidateArgs {
    pub(super) fn merge(self) -> Result<CacheInvalidateArgs, RtdataError> {
        Ok(CacheInvalidateArgs {
            cache_args: self.cache_args.merge()?,
            ..self
        })
    }

    pub(super) fn run(self) -> Result<(), RtdataError> {
        let dataset = DatasetRef::new(&self.dataset)?;
        let subtree = if self.truth {
            Subtree::Truth
        } else {
            Subtree::Input
        };
        let mut cache = open_cache(&self.cache_args.store_args.parse()?)?;
        if cache.invalidate(&dataset, subtree)? {
            println!("Invalidated {}", cache.resolver().remote_key(&dataset, subtree));
        } else {
            info!("{dataset} wasn't cached");
        }
        Ok(())
    }
}

fn open_cache(params: &RegtestParams) -> Result<DataCache<FetchClient>, RtdataError> {
    let client = FetchClient::new(params.credentials.clone(), params.timeout)?;
    let cache = DataCache::new(Resolver::from_params(params), client, params.use_cache)?;
    Ok(cache)
}
