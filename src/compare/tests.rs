// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use fitsio::{
    images::{ImageDescription, ImageType},
    tables::{ColumnDataType, ColumnDescription},
    FitsFile,
};
use indoc::indoc;
use tempfile::TempDir;

use super::*;

fn write(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A small catalogue-like FITS file: a primary HDU with a few keywords, a 2x3
/// image and a two-column table.
struct FitsContents {
    exptime: f64,
    date: &'static str,
    pixels: Vec<f64>,
    ids: Vec<String>,
    redshifts: Vec<f64>,
}

impl Default for FitsContents {
    fn default() -> Self {
        FitsContents {
            exptime: 100.5,
            date: "2024-01-01T00:00:00",
            pixels: vec![1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0],
            ids: vec!["gal1".to_string(), "gal2".to_string(), "gal3".to_string()],
            redshifts: vec![0.5, 1.25, 2.0],
        }
    }
}

fn write_fits(dir: &TempDir, name: &str, contents: &FitsContents) -> PathBuf {
    let path = dir.path().join(name);
    let mut fptr = FitsFile::create(&path).open().unwrap();
    let hdu = fptr.hdu(0).unwrap();
    hdu.write_key(&mut fptr, "EXPTIME", contents.exptime)
        .unwrap();
    hdu.write_key(&mut fptr, "DATE", contents.date).unwrap();
    hdu.write_key(&mut fptr, "TELESCOP", "ROMAN").unwrap();

    let image_description = ImageDescription {
        data_type: ImageType::Double,
        dimensions: &[2, 3],
    };
    let hdu = fptr.create_image("SCI", &image_description).unwrap();
    hdu.write_image(&mut fptr, &contents.pixels).unwrap();

    let columns = [
        ColumnDescription::new("ID")
            .with_type(ColumnDataType::String)
            .that_repeats(8)
            .create()
            .unwrap(),
        ColumnDescription::new("REDSHIFT")
            .with_type(ColumnDataType::Double)
            .create()
            .unwrap(),
    ];
    let hdu = fptr.create_table("CATALOG", &columns).unwrap();
    hdu.write_col(&mut fptr, "ID", &contents.ids).unwrap();
    hdu.write_col(&mut fptr, "REDSHIFT", &contents.redshifts)
        .unwrap();
    path
}

#[test]
fn test_tolerance_is_inclusive() {
    let tol = Tolerance::new(0.25, 0.0).unwrap();
    let eps = 2.0_f64.powi(-20);
    assert!(tol.is_close(1.25, 1.0));
    assert!(tol.is_close(1.25 - eps, 1.0));
    assert!(!tol.is_close(1.25 + eps, 1.0));
    assert!(tol.is_close(0.75, 1.0));
    assert!(!tol.is_close(0.75 - eps, 1.0));

    let tol = Tolerance::new(0.0, 0.5).unwrap();
    assert!(tol.is_close(3.0, 2.0));
    assert!(tol.is_close(3.0 - 1e-9, 2.0));
    assert!(!tol.is_close(3.0 + 1e-9, 2.0));
}

#[test]
fn test_tolerance_special_values() {
    let tol = Tolerance::default();
    assert!(tol.is_close(f64::NAN, f64::NAN));
    assert!(!tol.is_close(f64::NAN, 1.0));
    assert!(!tol.is_close(1.0, f64::NAN));
    assert!(tol.is_close(f64::INFINITY, f64::INFINITY));
    assert!(!tol.is_close(f64::INFINITY, f64::NEG_INFINITY));
    assert!(!tol.is_close(f64::MAX, f64::INFINITY));

    assert!(!Tolerance::exact().is_close(1.0 + f64::EPSILON, 1.0));
    assert!(Tolerance::exact().is_close(1.0, 1.0));
}

#[test]
fn test_invalid_tolerances() {
    assert!(matches!(
        Tolerance::new(-1.0, 0.0),
        Err(ParamsError::InvalidTolerance { .. })
    ));
    assert!(matches!(
        Tolerance::new(0.0, f64::NAN),
        Err(ParamsError::InvalidTolerance { .. })
    ));
    assert!(matches!(
        Tolerance::new(f64::INFINITY, 0.0),
        Err(ParamsError::InvalidTolerance { .. })
    ));
    let tol = Tolerance::new(1e-3, 1e-6).unwrap();
    assert_abs_diff_eq!(tol.atol(), 1e-3);
    assert_abs_diff_eq!(tol.rtol(), 1e-6);
}

#[test]
fn test_ignored_keywords() {
    let options = CompareOptions::default();
    assert!(options.is_ignored("DATE"));
    assert!(options.is_ignored("DATE-OBS"));
    assert!(options.is_ignored("date-end"));
    assert!(options.is_ignored("CHECKSUM"));
    assert!(!options.is_ignored("DATEOBS"));
    assert!(!options.is_ignored("EXPTIME"));

    let options = CompareOptions {
        ignore_keywords: vec!["*".to_string()],
        ..Default::default()
    };
    assert!(options.is_ignored("ANYTHING"));
}

#[test]
fn test_file_format_strings() {
    assert_eq!("FITS".parse::<FileFormat>().unwrap(), FileFormat::Fits);
    assert_eq!("text".parse::<FileFormat>().unwrap(), FileFormat::Text);
    assert_eq!(FileFormat::Binary.to_string(), "binary");
    assert!("parquet".parse::<FileFormat>().is_err());
}

#[test]
fn test_identical_binary_files_match() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write(&tmp_dir, "a.bin", &[1, 2, 3, 0]);
    let truth = write(&tmp_dir, "b.bin", &[1, 2, 3, 0]);
    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert!(result.is_match(), "{result}");
    assert_eq!(result.format, FileFormat::Binary);
    assert!(result.to_string().contains("matches"));
}

#[test]
fn test_binary_mismatch_reports_offset() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write(&tmp_dir, "a.bin", &[1, 2, 3]);
    let truth = write(&tmp_dir, "b.bin", &[1, 2, 4]);
    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert!(!result.is_match());
    assert_eq!(result.format, FileFormat::Binary);
    assert_eq!(result.total_differences, 1);
    assert_eq!(
        result.differences,
        [Difference::Byte {
            offset: 2,
            actual: 3,
            expected: 4
        }]
    );
    let report = result.to_string();
    assert!(report.contains("byte offset 2"), "{report}");
    assert!(report.contains(&crate::io::sha256_bytes(&[1, 2, 4])), "{report}");
}

#[test]
fn test_binary_size_mismatch() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write(&tmp_dir, "a.bin", &[0xff, 2, 3, 4]);
    let truth = write(&tmp_dir, "b.bin", &[0xff, 2]);
    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert_eq!(
        result.differences,
        [Difference::Size {
            actual: 4,
            expected: 2
        }]
    );
}

#[test]
fn test_reported_differences_are_capped() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write(&tmp_dir, "a.bin", &[0xff; 100]);
    let truth = write(&tmp_dir, "b.bin", &[0xfe; 100]);
    let options = CompareOptions {
        max_reported: 10,
        ..Default::default()
    };
    let result = compare_files(&output, &truth, &options).unwrap();
    assert_eq!(result.total_differences, 100);
    assert_eq!(result.differences.len(), 10);
    assert!(result.to_string().contains("... and 90 more differences"));
}

#[test]
fn test_text_diff() {
    let tmp_dir = TempDir::new().unwrap();
    let truth = write(
        &tmp_dir,
        "truth.txt",
        indoc! {"
            id z_phot
            gal1 0.50
            gal2 1.25
            gal3 2.00
        "}
        .as_bytes(),
    );
    let output = write(
        &tmp_dir,
        "output.txt",
        indoc! {"
            id z_phot
            gal1 0.50
            gal2 1.30
            gal3 2.00
        "}
        .as_bytes(),
    );

    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert_eq!(result.format, FileFormat::Text);
    assert_eq!(
        result.differences,
        [
            Difference::Line {
                change: LineChange::Removed,
                line: 3,
                text: "gal2 1.25".to_string()
            },
            Difference::Line {
                change: LineChange::Added,
                line: 3,
                text: "gal2 1.30".to_string()
            },
        ]
    );
    let report = result.to_string();
    assert!(report.contains("gal2 1.30"), "{report}");

    let result = compare_files(&truth, &truth, &CompareOptions::default()).unwrap();
    assert!(result.is_match());
}

#[test]
fn test_forced_format() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write(&tmp_dir, "a.txt", b"same\n");
    let truth = write(&tmp_dir, "b.txt", b"same\r\n");
    let options = CompareOptions {
        format: Some(FileFormat::Binary),
        ..Default::default()
    };
    let result = compare_files(&output, &truth, &options).unwrap();
    assert_eq!(result.format, FileFormat::Binary);
    assert!(!result.is_match());

    // The line diff can't see line endings, but the files still differ.
    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert_eq!(result.format, FileFormat::Text);
    assert_eq!(
        result.differences,
        [Difference::Byte {
            offset: 4,
            actual: b'\n',
            expected: b'\r'
        }]
    );
}

#[test]
fn test_text_missing_final_newline() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write(&tmp_dir, "a.txt", b"a\nb");
    let truth = write(&tmp_dir, "b.txt", b"a\nb\n");
    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert_eq!(result.format, FileFormat::Text);
    assert!(!result.is_match());
    assert_eq!(
        result.differences,
        [Difference::Size {
            actual: 3,
            expected: 4
        }]
    );
}

#[test]
fn test_control_bytes_are_not_text() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write(&tmp_dir, "a.dat", b"\x01\x02\x1b");
    let truth = write(&tmp_dir, "b.dat", b"\x01\x02\x1b");
    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert_eq!(result.format, FileFormat::Binary);

    // Tabs and form feeds are fine.
    let output = write(&tmp_dir, "a.txt", b"id\tz\n\x0cgal1\t0.5\r\n");
    let result = compare_files(&output, &output, &CompareOptions::default()).unwrap();
    assert_eq!(result.format, FileFormat::Text);
    assert!(result.is_match(), "{result}");
}

#[test]
fn test_invalid_utf8_after_detection_prefix_is_compared_as_bytes() {
    let tmp_dir = TempDir::new().unwrap();
    let mut actual = vec![b'x'; 9000];
    let mut expected = actual.clone();
    actual.push(0xff);
    expected.push(0xfe);
    let output = write(&tmp_dir, "a.txt", &actual);
    let truth = write(&tmp_dir, "b.txt", &expected);

    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert!(!result.is_match());
    assert_eq!(result.format, FileFormat::Binary);
    assert_eq!(
        result.differences,
        [Difference::Byte {
            offset: 9000,
            actual: 0xff,
            expected: 0xfe
        }]
    );
}

#[test]
fn test_missing_file_is_an_error() {
    let tmp_dir = TempDir::new().unwrap();
    let truth = write(&tmp_dir, "b.bin", &[1]);
    let result = compare_files(tmp_dir.path().join("nope.bin"), &truth, &CompareOptions::default());
    assert!(matches!(result, Err(ComparisonError::Missing { .. })));
}

#[test]
fn test_unparseable_fits_is_an_error() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write(&tmp_dir, "a.fits", b"not a fits file");
    let truth = write(&tmp_dir, "b.fits", b"not a fits file");
    let result = compare_files(&output, &truth, &CompareOptions::default());
    assert!(matches!(result, Err(ComparisonError::Fits(_))));
}

#[test]
fn test_identical_fits_files_match() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write_fits(&tmp_dir, "output.fits", &FitsContents::default());
    let truth = write_fits(&tmp_dir, "truth.fits", &FitsContents::default());
    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert_eq!(result.format, FileFormat::Fits);
    assert!(result.is_match(), "{result}");
}

#[test]
fn test_fits_detected_by_content() {
    let tmp_dir = TempDir::new().unwrap();
    let output = write_fits(&tmp_dir, "output.dat", &FitsContents::default());
    let truth = write_fits(&tmp_dir, "truth.dat", &FitsContents::default());
    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert_eq!(result.format, FileFormat::Fits);
    assert!(result.is_match(), "{result}");
}

#[test]
fn test_fits_ignored_keywords_and_small_perturbations() {
    let tmp_dir = TempDir::new().unwrap();
    let truth = write_fits(&tmp_dir, "truth.fits", &FitsContents::default());
    let mut contents = FitsContents {
        date: "2025-06-30T12:00:00",
        ..Default::default()
    };
    contents.redshifts[1] += 1e-9;
    contents.pixels[0] += 1e-9;
    let output = write_fits(&tmp_dir, "output.fits", &contents);

    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert!(result.is_match(), "{result}");

    // Without ignoring DATE and with exact comparison, everything shows up.
    let options = CompareOptions {
        tolerance: Tolerance::exact(),
        ignore_keywords: vec![],
        ..Default::default()
    };
    let result = compare_files(&output, &truth, &options).unwrap();
    assert_eq!(result.total_differences, 3, "{result}");
}

#[test]
fn test_fits_perturbed_column_is_named() {
    let tmp_dir = TempDir::new().unwrap();
    let truth = write_fits(&tmp_dir, "truth.fits", &FitsContents::default());
    let mut contents = FitsContents::default();
    contents.redshifts[2] = 2.1;
    let output = write_fits(&tmp_dir, "output.fits", &contents);

    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert!(!result.is_match());
    assert_eq!(result.total_differences, 1, "{result}");
    match &result.differences[0] {
        Difference::NumericCell {
            hdu,
            column,
            row,
            actual,
            expected,
        } => {
            assert_eq!(*hdu, 2);
            assert_eq!(column, "REDSHIFT");
            assert_eq!(*row, 2);
            assert_abs_diff_eq!(*actual, 2.1);
            assert_abs_diff_eq!(*expected, 2.0);
        }
        d => panic!("unexpected difference: {d}"),
    }
    assert!(result.to_string().contains("REDSHIFT"));
}

#[test]
fn test_fits_header_pixel_and_string_differences() {
    let tmp_dir = TempDir::new().unwrap();
    let truth = write_fits(&tmp_dir, "truth.fits", &FitsContents::default());
    let mut contents = FitsContents {
        exptime: 200.0,
        ..Default::default()
    };
    contents.pixels[2] = 3.0;
    contents.ids[0] = "gal9".to_string();
    let output = write_fits(&tmp_dir, "output.fits", &contents);

    let result = compare_files(&output, &truth, &CompareOptions::default()).unwrap();
    assert_eq!(result.total_differences, 3, "{result}");
    assert!(matches!(
        &result.differences[0],
        Difference::Keyword { hdu: 0, keyword, .. } if keyword == "EXPTIME"
    ));
    assert!(matches!(
        &result.differences[1],
        Difference::Pixel { hdu: 1, index: 2, .. }
    ));
    assert!(matches!(
        &result.differences[2],
        Difference::StringCell { hdu: 2, row: 0, column, .. } if column == "ID"
    ));
}
