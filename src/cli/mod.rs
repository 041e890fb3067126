// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `rtdata`
//! subcommands are contained in modules.
//!
//! All booleans must have `#[serde(default)]` annotated, and anything that
//! isn't a boolean must be optional. This allows all arguments to be optional
//! *and* usable in an arguments file.
//!
//! Only 3 things should be public in this module: `Rtdata`, `Rtdata::run`,
//! and `RtdataError`.

#[macro_use]
mod common;
mod cache;
mod compare;
mod data;
mod error;

pub use error::RtdataError;

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

use crate::{resolve::Subtree, PROGRESS_BARS};

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = r#"Fetch, cache and compare regression-test data for roman_photoz.
Datasets are read from the artifact store named by TEST_BIGDATA (or --bigdata-root)."#
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Rtdata {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Don't draw progress bars.
    #[clap(long)]
    #[clap(global = true)]
    no_progress_bars: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(alias = "data")]
    #[clap(about = "Fetch an input dataset into the working directory and print its path.")]
    GetData(data::GetArgs),

    #[clap(alias = "truth")]
    #[clap(about = "Fetch a truth file into <working directory>/truth and print its path.")]
    GetTruth(data::GetArgs),

    #[clap(
        about = r#"Compare an output file against a truth file. FITS files are compared HDU by HDU
with float tolerances; text files line by line; anything else byte by byte.
Exits non-zero if the files differ."#
    )]
    Compare(compare::CompareArgs),

    #[clap(about = "Print the location, number of files and size of the cache.")]
    CacheInfo(cache::CacheArgs),

    #[clap(about = "Delete everything in the cache.")]
    CacheClear(cache::CacheArgs),

    #[clap(about = "Remove a single dataset from the cache.")]
    CacheInvalidate(cache::CacheInvalidateArgs),
}

impl Rtdata {
    pub fn run(self) -> Result<(), RtdataError> {
        // Set up logging.
        let GlobalArgs {
            no_progress_bars,
            verbosity,
        } = self.global_opts;
        setup_logging(verbosity)
            .map_err(|e| RtdataError::Generic(format!("Failed to initialise logging: {e}")))?;
        // Enable progress bars if the user didn't say "no progress bars".
        if !no_progress_bars {
            PROGRESS_BARS.store(true);
        }

        // Print the version of rtdata and its build-time information.
        let sub_command = match &self.command {
            Command::GetData(_) => "get-data",
            Command::GetTruth(_) => "get-truth",
            Command::Compare(_) => "compare",
            Command::CacheInfo(_) => "cache-info",
            Command::CacheClear(_) => "cache-clear",
            Command::CacheInvalidate(_) => "cache-invalidate",
        };
        info!("rtdata {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        match self.command {
            Command::GetData(args) => args.merge()?.run(Subtree::Input)?,
            Command::GetTruth(args) => args.merge()?.run(Subtree::Truth)?,
            Command::Compare(args) => args.merge()?.run()?,
            Command::CacheInfo(args) => args.merge()?.info()?,
            Command::CacheClear(args) => args.merge()?.clear()?,
            Command::CacheInvalidate(args) => args.merge()?.run()?,
        }

        info!("rtdata {} complete.", sub_command);
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

/// Write many info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => {
            info!("Compiled on git commit hash: {hash}{dirty}");
        }
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {}", hr);
    }
    info!("            {}", BUILT_TIME_UTC);
    info!("         with compiler {}", RUSTC_VERSION);
    info!("");
}
