// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests for get-data and get-truth.

use tempfile::TempDir;

use crate::{get_cmd_output, rtdata_with_store, Store};

#[test]
fn test_get_data_copies_into_work_dir() {
    let store = Store::new();
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cache_dir = tmp_dir.path().join("cache");
    let work_dir = tmp_dir.path().join("work");

    #[rustfmt::skip]
    let cmd = rtdata_with_store(Some(store.path()), &cache_dir)
        .args([
            "get-data", "photoz/catalog.txt",
            "--work-dir", &work_dir.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "get-data failed: {:?}", get_cmd_output(cmd));
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");

    let fetched = work_dir.join("catalog.txt");
    assert!(
        stdout.lines().any(|l| l == fetched.display().to_string()),
        "{stdout}"
    );
    assert_eq!(
        std::fs::read(&fetched).unwrap(),
        b"id redshift\ngal1 0.5\ngal2 1.25\n"
    );
    // The cache has it too.
    assert!(cache_dir.join("cache_index.json").exists());
}

#[test]
fn test_get_truth_with_cli_root() {
    let store = Store::new();
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let work_dir = tmp_dir.path().join("work");

    #[rustfmt::skip]
    let cmd = rtdata_with_store(None, &tmp_dir.path().join("cache"))
        .args([
            "get-truth", "photoz/catalog.txt",
            "--bigdata-root", &store.path().display().to_string(),
            "--work-dir", &work_dir.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "get-truth failed: {:?}", get_cmd_output(cmd));
    assert!(work_dir.join("truth/catalog.txt").exists());
}

#[test]
fn test_get_data_from_args_file() {
    let store = Store::new();
    store.add(
        &store
            .path()
            .join("roman-pipeline/stable/test_data/photoz/stable_only.txt"),
        b"stable\n",
    );

    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let work_dir = tmp_dir.path().join("work");
    let args_file = tmp_dir.path().join("args.toml");
    std::fs::write(
        &args_file,
        format!(
            "work_dir = {:?}\n\n[store]\nenv = \"stable\"\nno_cache = true\n",
            work_dir.display().to_string()
        ),
    )
    .unwrap();

    #[rustfmt::skip]
    let cmd = rtdata_with_store(Some(store.path()), &tmp_dir.path().join("cache"))
        .args([
            "get-data", "photoz/stable_only.txt",
            "--args-file", &args_file.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "get-data failed: {:?}", get_cmd_output(cmd));
    assert_eq!(
        std::fs::read(work_dir.join("stable_only.txt")).unwrap(),
        b"stable\n"
    );
    // Caching was disabled, so nothing was indexed.
    assert!(!tmp_dir.path().join("cache/cache_index.json").exists());
}

#[test]
fn test_missing_dataset_fails() {
    let store = Store::new();
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");

    #[rustfmt::skip]
    let cmd = rtdata_with_store(Some(store.path()), &tmp_dir.path().join("cache"))
        .args([
            "get-data", "photoz/nope.txt",
            "--work-dir", &tmp_dir.path().display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("photoz/nope.txt"), "{stderr}");
}

#[test]
fn test_unsafe_path_fails() {
    let store = Store::new();
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");

    #[rustfmt::skip]
    let cmd = rtdata_with_store(Some(store.path()), &tmp_dir.path().join("cache"))
        .args([
            "get-truth", "../test_data/photoz/catalog.txt",
            "--work-dir", &tmp_dir.path().display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains(".."), "{stderr}");
}

#[test]
fn test_no_store_fails() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let cmd = rtdata_with_store(None, &tmp_dir.path().join("cache"))
        .args(["get-data", "photoz/catalog.txt"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("TEST_BIGDATA"), "{stderr}");
}
