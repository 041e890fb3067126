// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests for the cache maintenance subcommands.

use std::path::Path;

use tempfile::TempDir;

use crate::{get_cmd_output, rtdata_with_store, Store};

fn fetch(store: &Store, cache_dir: &Path, sub_command: &str, dataset: &str) {
    #[rustfmt::skip]
    let cmd = rtdata_with_store(Some(store.path()), cache_dir)
        .args([sub_command, dataset, "--no-copy"])
        .ok();
    assert!(cmd.is_ok(), "{sub_command} failed: {:?}", get_cmd_output(cmd));
}

fn cache_info(store: &Store, cache_dir: &Path) -> String {
    let cmd = rtdata_with_store(Some(store.path()), cache_dir)
        .arg("cache-info")
        .ok();
    assert!(cmd.is_ok(), "cache-info failed: {:?}", get_cmd_output(cmd));
    get_cmd_output(cmd).0
}

#[test]
fn test_cache_info_and_clear() {
    let store = Store::new();
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cache_dir = tmp_dir.path().join("cache");

    let stdout = cache_info(&store, &cache_dir);
    assert!(stdout.contains(": 0 files, 0 bytes"), "{stdout}");

    fetch(&store, &cache_dir, "get-data", "photoz/catalog.txt");
    fetch(&store, &cache_dir, "get-truth", "photoz/catalog.txt");
    let stdout = cache_info(&store, &cache_dir);
    assert!(stdout.contains(": 2 files, 62 bytes"), "{stdout}");

    let cmd = rtdata_with_store(Some(store.path()), &cache_dir)
        .arg("cache-clear")
        .ok();
    assert!(cmd.is_ok(), "cache-clear failed: {:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Removed 2 cached dataset(s)"), "{stdout}");

    let stdout = cache_info(&store, &cache_dir);
    assert!(stdout.contains(": 0 files, 0 bytes"), "{stdout}");
}

#[test]
fn test_cache_invalidate() {
    let store = Store::new();
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cache_dir = tmp_dir.path().join("cache");

    fetch(&store, &cache_dir, "get-data", "photoz/catalog.txt");
    fetch(&store, &cache_dir, "get-truth", "photoz/catalog.txt");

    #[rustfmt::skip]
    let cmd = rtdata_with_store(Some(store.path()), &cache_dir)
        .args(["cache-invalidate", "photoz/catalog.txt", "--truth"])
        .ok();
    assert!(cmd.is_ok(), "cache-invalidate failed: {:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(
        stdout.contains("Invalidated roman-pipeline/dev/truth/photoz/catalog.txt"),
        "{stdout}"
    );

    // Only the input is left.
    let stdout = cache_info(&store, &cache_dir);
    assert!(stdout.contains(": 1 files, 31 bytes"), "{stdout}");
}

#[test]
fn test_cache_with_real_store() {
    roman_photoz_regtest::skip_unless_bigdata!();

    // Uses whatever TEST_BIGDATA points at, but a scratch cache.
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = crate::rtdata()
        .env(roman_photoz_regtest::constants::CACHE_DIR_ENV, tmp_dir.path())
        .args(["--no-progress-bars", "cache-info"])
        .ok();
    assert!(cmd.is_ok(), "cache-info failed: {:?}", get_cmd_output(cmd));
}
