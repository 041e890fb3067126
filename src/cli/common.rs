// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Arguments shared by rtdata subcommands.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::RtdataError;
use crate::{
    constants::{
        BIGDATA_ROOT_ENV, CACHE_DIR_ENV, DEFAULT_ENV_NAME, DEFAULT_INPUTS_ROOT,
        DEFAULT_RESULTS_ROOT, DEFAULT_TIMEOUT_SECS,
    },
    params::{ParamsError, RegtestParams},
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref BIGDATA_ROOT_HELP: String =
        format!("The root of the artifact store; a local directory or an http(s) URL. Default: the value of {BIGDATA_ROOT_ENV}");

    static ref ENV_HELP: String =
        format!("The artifact store environment. Default: {DEFAULT_ENV_NAME}");

    static ref INPUTS_ROOT_HELP: String =
        format!("The artifact store repository holding inputs and truth files. Default: {DEFAULT_INPUTS_ROOT}");

    static ref RESULTS_ROOT_HELP: String =
        format!("The artifact store repository that results are uploaded to. Default: {DEFAULT_RESULTS_ROOT}");

    static ref CACHE_DIR_HELP: String =
        format!("The local cache directory. Default: the value of {CACHE_DIR_ENV}, or ~/.cache/roman_photoz/regtest");

    static ref TIMEOUT_HELP: String =
        format!("The HTTP request timeout [seconds]. Default: {DEFAULT_TIMEOUT_SECS}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::{common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED}, RtdataError};

        log::debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                log::debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(RtdataError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                log::debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(RtdataError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(RtdataError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Where the artifact store is and how to talk to it. Anything not given here
/// falls back to environment variables, then to defaults.
#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct StoreArgs {
    #[clap(long, help = BIGDATA_ROOT_HELP.as_str(), help_heading = "ARTIFACT STORE")]
    pub(super) bigdata_root: Option<String>,

    #[clap(long, help = ENV_HELP.as_str(), help_heading = "ARTIFACT STORE")]
    pub(super) env: Option<String>,

    #[clap(long, help = INPUTS_ROOT_HELP.as_str(), help_heading = "ARTIFACT STORE")]
    pub(super) inputs_root: Option<String>,

    #[clap(long, help = RESULTS_ROOT_HELP.as_str(), help_heading = "ARTIFACT STORE")]
    pub(super) results_root: Option<String>,

    /// A file containing the artifact store API key.
    #[clap(long, parse(from_os_str), help_heading = "ARTIFACT STORE")]
    pub(super) api_key_file: Option<PathBuf>,

    /// Fail any HTTP fetch that has no API key to send.
    #[clap(long, help_heading = "ARTIFACT STORE")]
    #[serde(default)]
    pub(super) require_api_key: bool,

    #[clap(long, help = TIMEOUT_HELP.as_str(), help_heading = "ARTIFACT STORE")]
    pub(super) timeout: Option<u64>,

    #[clap(long, parse(from_os_str), help = CACHE_DIR_HELP.as_str(), help_heading = "CACHING")]
    pub(super) cache_dir: Option<PathBuf>,

    /// Don't use the cache; every dataset is fetched from the artifact store.
    #[clap(long, help_heading = "CACHING")]
    #[serde(default)]
    pub(super) no_cache: bool,

    /// Don't copy fetched datasets into the working directory; use them
    /// directly from the cache. Files in the cache must not be modified.
    #[clap(long, help_heading = "CACHING")]
    #[serde(default)]
    pub(super) no_copy: bool,
}

impl StoreArgs {
    /// Merge these arguments with those from an arguments file, preferring
    /// `self`.
    pub(super) fn merge(self, file_args: StoreArgs) -> StoreArgs {
        StoreArgs {
            bigdata_root: self.bigdata_root.or(file_args.bigdata_root),
            env: self.env.or(file_args.env),
            inputs_root: self.inputs_root.or(file_args.inputs_root),
            results_root: self.results_root.or(file_args.results_root),
            api_key_file: self.api_key_file.or(file_args.api_key_file),
            require_api_key: self.require_api_key || file_args.require_api_key,
            timeout: self.timeout.or(file_args.timeout),
            cache_dir: self.cache_dir.or(file_args.cache_dir),
            no_cache: self.no_cache || file_args.no_cache,
            no_copy: self.no_copy || file_args.no_copy,
        }
    }

    pub(super) fn parse(self) -> Result<RegtestParams, RtdataError> {
        self.parse_with(|key| std::env::var(key).ok())
    }

    /// Turn these arguments into [`RegtestParams`], using `lookup` for
    /// environment variables. Arguments take precedence over the environment.
    pub(super) fn parse_with<F>(self, lookup: F) -> Result<RegtestParams, RtdataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let StoreArgs {
            bigdata_root,
            env,
            inputs_root,
            results_root,
            api_key_file,
            require_api_key,
            timeout,
            cache_dir,
            no_cache,
            no_copy,
        } = self;

        let mut params = RegtestParams::from_lookup(|key| match key {
            BIGDATA_ROOT_ENV => bigdata_root.clone().or_else(|| lookup(key)),
            _ => lookup(key),
        })?;
        if let Some(env) = env {
            params.env = env;
        }
        if let Some(inputs_root) = inputs_root {
            params.inputs_root = inputs_root;
        }
        if let Some(results_root) = results_root {
            params.results_root = results_root;
        }
        if let Some(api_key_file) = api_key_file {
            params.credentials.api_key_file = Some(api_key_file);
        }
        params.credentials.required = require_api_key;
        if let Some(timeout) = timeout {
            if timeout == 0 {
                return Err(ParamsError::ZeroTimeout.into());
            }
            params.timeout = Duration::from_secs(timeout);
        }
        if let Some(cache_dir) = cache_dir {
            params.cache_dir = cache_dir;
        }
        params.use_cache = !no_cache;
        params.docopy = !no_copy;

        debug!("Regression-test parameters: {params:#?}");
        Ok(params)
    }
}
