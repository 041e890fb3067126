// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod cache;
mod compare;
mod data;

use std::{
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use tempfile::TempDir;

use roman_photoz_regtest::constants::*;

fn rtdata() -> Command {
    Command::cargo_bin("rtdata").unwrap()
}

/// `rtdata` with an environment that only knows about the given store and
/// cache. Nothing from the caller's environment leaks in.
fn rtdata_with_store(store: Option<&Path>, cache_dir: &Path) -> Command {
    let mut cmd = rtdata();
    for var in [
        BIGDATA_ROOT_ENV,
        API_KEY_ENV,
        API_KEY_FILE_ENV,
        ENV_NAME_ENV,
        INPUTS_ROOT_ENV,
        RESULTS_ROOT_ENV,
        BUILD_TAG_ENV,
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    if let Some(store) = store {
        cmd.env(BIGDATA_ROOT_ENV, store);
    }
    cmd.env(CACHE_DIR_ENV, cache_dir);
    cmd.arg("--no-progress-bars");
    cmd
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// A local artifact store laid out like the real one, with files in both the
/// "dev" inputs and truth trees.
struct Store {
    dir: TempDir,
}

impl Store {
    fn new() -> Store {
        let store = Store {
            dir: TempDir::new().expect("couldn't make tmp dir"),
        };
        store.add_input("photoz/catalog.txt", b"id redshift\ngal1 0.5\ngal2 1.25\n");
        store.add_truth("photoz/catalog.txt", b"id redshift\ngal1 0.5\ngal2 1.25\n");
        store
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn env_dir(&self) -> PathBuf {
        self.path()
            .join(DEFAULT_INPUTS_ROOT)
            .join(DEFAULT_ENV_NAME)
    }

    fn add_input(&self, rel: &str, contents: &[u8]) {
        self.add(&self.env_dir().join(INPUT_SUBTREE).join(rel), contents);
    }

    fn add_truth(&self, rel: &str, contents: &[u8]) {
        self.add(&self.env_dir().join(TRUTH_SUBTREE).join(rel), contents);
    }

    fn add(&self, path: &Path, contents: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

#[test]
fn test_help() {
    let cmd = rtdata().arg("--help").ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    for sub_command in [
        "get-data",
        "get-truth",
        "compare",
        "cache-info",
        "cache-clear",
        "cache-invalidate",
    ] {
        assert!(stdout.contains(sub_command), "{stdout}");
    }
}

#[test]
fn test_no_subcommand_is_an_error() {
    let cmd = rtdata().ok();
    assert!(cmd.is_err());
}
