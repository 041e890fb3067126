// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use indoc::indoc;
use tempfile::TempDir;

use crate::{get_cmd_output, rtdata};

#[test]
fn test_compare_identical_files() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.txt");
    let truth = tmp_dir.path().join("truth.txt");
    std::fs::write(&output, "id redshift\ngal1 0.5\n").unwrap();
    std::fs::write(&truth, "id redshift\ngal1 0.5\n").unwrap();

    let cmd = rtdata()
        .args([
            "compare",
            &output.display().to_string(),
            &truth.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "compare failed: {:?}", get_cmd_output(cmd));
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stdout.contains("matches"), "{stdout}");
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_compare_mismatch_exits_non_zero() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.txt");
    let truth = tmp_dir.path().join("truth.txt");
    std::fs::write(
        &output,
        indoc! {"
            id redshift
            gal1 0.5
            gal2 1.3
        "},
    )
    .unwrap();
    std::fs::write(
        &truth,
        indoc! {"
            id redshift
            gal1 0.5
            gal2 1.25
        "},
    )
    .unwrap();

    let cmd = rtdata()
        .args([
            "compare",
            &output.display().to_string(),
            &truth.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let output = match &cmd {
        Err(e) => e.as_output().unwrap().clone(),
        Ok(_) => unreachable!(),
    };
    assert_eq!(output.status.code(), Some(1));

    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stdout.contains("gal2 1.3"), "{stdout}");
    assert!(stdout.contains("gal2 1.25"), "{stdout}");
    assert!(stderr.contains("2 difference(s)"), "{stderr}");
}

#[test]
fn test_compare_format_from_args_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("out.txt");
    let truth = tmp_dir.path().join("truth.txt");
    // Only line endings differ.
    std::fs::write(&output, "a\r\nb\r\n").unwrap();
    std::fs::write(&truth, "a\nb\n").unwrap();

    let cmd = rtdata()
        .args([
            "compare",
            &output.display().to_string(),
            &truth.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("(text, 1 difference)"), "{stdout}");
    assert!(stdout.contains("byte offset 1"), "{stdout}");

    let args_file = tmp_dir.path().join("compare.json");
    std::fs::write(&args_file, r#"{"format": "binary"}"#).unwrap();
    let cmd = rtdata()
        .args([
            "compare",
            &output.display().to_string(),
            &truth.display().to_string(),
            "--args-file",
            &args_file.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("SHA-256"), "{stdout}");
}

#[test]
fn test_compare_missing_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let truth = tmp_dir.path().join("truth.txt");
    std::fs::write(&truth, "a\n").unwrap();

    let cmd = rtdata()
        .args([
            "compare",
            &tmp_dir.path().join("nope.txt").display().to_string(),
            &truth.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("doesn't exist"), "{stderr}");
}

#[test]
fn test_compare_bad_tolerance() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let file = tmp_dir.path().join("a.txt");
    std::fs::write(&file, "a\n").unwrap();
    let file = file.display().to_string();

    let cmd = rtdata()
        .args(["compare", &file, &file, "--rtol=-1"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("non-negative"), "{stderr}");
}
