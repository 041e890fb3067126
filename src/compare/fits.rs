// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structural comparison of FITS files.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use fitsio::{
    hdu::{FitsHdu, HduInfo},
    tables::{ColumnDataType, ConcreteColumnDescription},
    FitsFile,
};
use log::trace;

use super::{CompareOptions, ComparisonError, Difference, Differences, Tolerance};
use crate::io::fits::*;

pub(super) fn compare(
    output: &Path,
    truth: &Path,
    options: &CompareOptions,
    differences: &mut Differences,
) -> Result<(), ComparisonError> {
    let mut out_fptr = fits_open(output)?;
    let mut truth_fptr = fits_open(truth)?;

    let num_out_hdus = fits_num_hdus(&mut out_fptr)?;
    let num_truth_hdus = fits_num_hdus(&mut truth_fptr)?;
    if num_out_hdus != num_truth_hdus {
        differences.push(Difference::HduCount {
            actual: num_out_hdus,
            expected: num_truth_hdus,
        });
    }

    for hdu_num in 0..num_out_hdus.min(num_truth_hdus) {
        trace!("Comparing HDU {hdu_num}");
        let out_hdu = fits_open_hdu(&mut out_fptr, hdu_num)?;
        let truth_hdu = fits_open_hdu(&mut truth_fptr, hdu_num)?;

        let out_header = fits_get_header(&mut out_fptr, &out_hdu)?;
        let truth_header = fits_get_header(&mut truth_fptr, &truth_hdu)?;
        compare_headers(hdu_num, &out_header, &truth_header, options, differences);

        match (&out_hdu.info, &truth_hdu.info) {
            (
                HduInfo::ImageInfo { shape: out_shape, .. },
                HduInfo::ImageInfo {
                    shape: truth_shape,
                    ..
                },
            ) => {
                if out_shape != truth_shape {
                    differences.push(Difference::ImageShape {
                        hdu: hdu_num,
                        actual: out_shape.clone(),
                        expected: truth_shape.clone(),
                    });
                    continue;
                }
                let out_pixels = fits_get_image_f64(&mut out_fptr, &out_hdu)?;
                let truth_pixels = fits_get_image_f64(&mut truth_fptr, &truth_hdu)?;
                for (index, (&a, &e)) in out_pixels.iter().zip(&truth_pixels).enumerate() {
                    if !options.tolerance.is_close(a, e) {
                        differences.push(Difference::Pixel {
                            hdu: hdu_num,
                            index,
                            actual: a,
                            expected: e,
                        });
                    }
                }
            }

            (
                HduInfo::TableInfo {
                    column_descriptions: out_cols,
                    num_rows: out_rows,
                },
                HduInfo::TableInfo {
                    column_descriptions: truth_cols,
                    num_rows: truth_rows,
                },
            ) => {
                let out_table = Table {
                    fptr: &mut out_fptr,
                    hdu: &out_hdu,
                    columns: out_cols,
                    num_rows: *out_rows,
                };
                let truth_table = Table {
                    fptr: &mut truth_fptr,
                    hdu: &truth_hdu,
                    columns: truth_cols,
                    num_rows: *truth_rows,
                };
                compare_tables(hdu_num, out_table, truth_table, options.tolerance, differences)?;
            }

            (out_info, truth_info) => {
                let (actual, expected) = (hdu_kind(out_info), hdu_kind(truth_info));
                if actual != expected {
                    differences.push(Difference::HduKind {
                        hdu: hdu_num,
                        actual,
                        expected,
                    });
                }
            }
        }
    }

    Ok(())
}

fn hdu_kind(info: &HduInfo) -> &'static str {
    match info {
        HduInfo::ImageInfo { .. } => "image",
        HduInfo::TableInfo { .. } => "table",
        HduInfo::AnyInfo => "unknown",
    }
}

/// Compare every non-ignored keyword. Values that parse as numbers on both
/// sides are compared within tolerance; everything else must match exactly.
/// A keyword appearing more than once is compared occurrence by occurrence.
fn compare_headers(
    hdu_num: usize,
    out_header: &[HeaderCard],
    truth_header: &[HeaderCard],
    options: &CompareOptions,
    differences: &mut Differences,
) {
    let out_values = values_by_keyword(out_header);
    let truth_values = values_by_keyword(truth_header);
    let occurrences = |values: &HashMap<&str, Vec<&str>>, keyword: &str| -> usize {
        values.get(keyword).map(Vec::len).unwrap_or(0)
    };

    let mut seen = HashSet::new();
    for card in truth_header {
        let keyword = card.keyword.as_str();
        if options.is_ignored(keyword) || !seen.insert(keyword) {
            continue;
        }
        let expected = truth_values.get(keyword).map(Vec::as_slice).unwrap_or(&[]);
        let actual = out_values.get(keyword).map(Vec::as_slice).unwrap_or(&[]);
        for (actual, expected) in actual.iter().zip(expected) {
            if !header_values_match(actual, expected, options.tolerance) {
                differences.push(Difference::Keyword {
                    hdu: hdu_num,
                    keyword: keyword.to_string(),
                    actual: actual.to_string(),
                    expected: expected.to_string(),
                });
            }
        }
        for _ in actual.len()..expected.len() {
            differences.push(Difference::MissingKeyword {
                hdu: hdu_num,
                keyword: keyword.to_string(),
            });
        }
    }

    let mut seen = HashSet::new();
    for card in out_header {
        let keyword = card.keyword.as_str();
        if options.is_ignored(keyword) || !seen.insert(keyword) {
            continue;
        }
        let expected = occurrences(&truth_values, keyword);
        for _ in expected..occurrences(&out_values, keyword) {
            differences.push(Difference::ExtraKeyword {
                hdu: hdu_num,
                keyword: keyword.to_string(),
            });
        }
    }
}

/// Each keyword's values, in header order.
fn values_by_keyword(header: &[HeaderCard]) -> HashMap<&str, Vec<&str>> {
    let mut values: HashMap<&str, Vec<&str>> = HashMap::new();
    for card in header {
        values
            .entry(card.keyword.as_str())
            .or_default()
            .push(card.value.as_str());
    }
    values
}

fn header_values_match(actual: &str, expected: &str, tolerance: Tolerance) -> bool {
    if actual == expected {
        return true;
    }
    match (parse_header_float(actual), parse_header_float(expected)) {
        (Some(a), Some(e)) => tolerance.is_close(a, e),
        _ => false,
    }
}

/// FITS allows a 'D' exponent for double precision values.
fn parse_header_float(value: &str) -> Option<f64> {
    value.trim().replace(['D', 'd'], "E").parse().ok()
}

struct Table<'a> {
    fptr: &'a mut FitsFile,
    hdu: &'a FitsHdu,
    columns: &'a [ConcreteColumnDescription],
    num_rows: usize,
}

impl<'a> Table<'a> {
    fn column(&self, name: &str) -> Option<(usize, &'a ConcreteColumnDescription)> {
        let columns: &'a [ConcreteColumnDescription] = self.columns;
        columns.iter().enumerate().find(|(_, c)| c.name == name)
    }
}

fn is_string_column(column: &ConcreteColumnDescription) -> bool {
    matches!(column.data_type.typ, ColumnDataType::String)
}

fn compare_tables(
    hdu_num: usize,
    mut out: Table,
    mut truth: Table,
    tolerance: Tolerance,
    differences: &mut Differences,
) -> Result<(), ComparisonError> {
    if out.num_rows != truth.num_rows {
        differences.push(Difference::RowCount {
            hdu: hdu_num,
            actual: out.num_rows,
            expected: truth.num_rows,
        });
    }
    for column in out.columns {
        if truth.column(&column.name).is_none() {
            differences.push(Difference::ExtraColumn {
                hdu: hdu_num,
                column: column.name.clone(),
            });
        }
    }

    for (truth_index, truth_col) in truth.columns.iter().enumerate() {
        let name = &truth_col.name;
        let (out_index, out_col) = match out.column(name) {
            Some(c) => c,
            None => {
                differences.push(Difference::MissingColumn {
                    hdu: hdu_num,
                    column: name.clone(),
                });
                continue;
            }
        };
        let string_col = is_string_column(truth_col);
        if string_col != is_string_column(out_col)
            || (!string_col && out_col.data_type.repeat != truth_col.data_type.repeat)
        {
            differences.push(Difference::ColumnLayout {
                hdu: hdu_num,
                column: name.clone(),
            });
            continue;
        }

        if string_col {
            let actual = fits_get_string_col(out.fptr, out.hdu, name)?;
            let expected = fits_get_string_col(truth.fptr, truth.hdu, name)?;
            for (row, (a, e)) in actual.iter().zip(&expected).enumerate() {
                if a.trim_end() != e.trim_end() {
                    differences.push(Difference::StringCell {
                        hdu: hdu_num,
                        column: name.clone(),
                        row,
                        actual: a.clone(),
                        expected: e.clone(),
                    });
                }
            }
        } else {
            let repeat = truth_col.data_type.repeat.max(1);
            let actual =
                fits_get_numeric_col(out.fptr, out.hdu, out_index, out.num_rows * repeat)?;
            let expected = fits_get_numeric_col(
                truth.fptr,
                truth.hdu,
                truth_index,
                truth.num_rows * repeat,
            )?;
            for (i, (&a, &e)) in actual.iter().zip(&expected).enumerate() {
                if !tolerance.is_close(a, e) {
                    differences.push(Difference::NumericCell {
                        hdu: hdu_num,
                        column: name.clone(),
                        row: i / repeat,
                        actual: a,
                        expected: e,
                    });
                }
            }
        }
    }

    Ok(())
}
