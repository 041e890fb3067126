// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Comparing produced files against truth files.
//!
//! FITS files are compared structurally (HDUs, headers, images and tables)
//! with floating-point values compared within a [`Tolerance`]. Text files get
//! a line diff, and anything else must match byte for byte.

mod binary;
mod error;
mod fits;
mod text;
#[cfg(test)]
mod tests;

pub use crate::io::fits::FitsError;
pub use error::ComparisonError;

use std::{
    fmt::Display,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::{
        DEFAULT_ATOL, DEFAULT_IGNORE_KEYWORDS, DEFAULT_MAX_REPORTED_DIFFS, DEFAULT_RTOL,
    },
    params::ParamsError,
};

/// Absolute and relative tolerances for floating-point comparisons. Values
/// `actual` and `expected` are close if
/// `|actual - expected| <= atol + rtol * |expected|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    atol: f64,
    rtol: f64,
}

impl Tolerance {
    pub fn new(atol: f64, rtol: f64) -> Result<Tolerance, ParamsError> {
        if !atol.is_finite() || !rtol.is_finite() || atol < 0.0 || rtol < 0.0 {
            return Err(ParamsError::InvalidTolerance { atol, rtol });
        }
        Ok(Tolerance { atol, rtol })
    }

    /// Exact comparisons only.
    pub fn exact() -> Tolerance {
        Tolerance {
            atol: 0.0,
            rtol: 0.0,
        }
    }

    pub fn atol(&self) -> f64 {
        self.atol
    }

    pub fn rtol(&self) -> f64 {
        self.rtol
    }

    /// Is `actual` close enough to `expected`? The boundary is inclusive. NaN
    /// is considered equal to NaN, and infinities must match exactly.
    pub fn is_close(&self, actual: f64, expected: f64) -> bool {
        if actual.is_nan() || expected.is_nan() {
            return actual.is_nan() && expected.is_nan();
        }
        if actual.is_infinite() || expected.is_infinite() {
            return actual == expected;
        }
        (actual - expected).abs() <= self.atol + self.rtol * expected.abs()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            atol: DEFAULT_ATOL,
            rtol: DEFAULT_RTOL,
        }
    }
}

impl Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "atol = {:e}, rtol = {:e}", self.atol, self.rtol)
    }
}

/// How a pair of files is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FileFormat {
    Fits,
    Text,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompareOptions {
    pub tolerance: Tolerance,

    /// FITS header keywords that are not compared. A trailing `*` matches any
    /// suffix, e.g. `DATE-*`.
    pub ignore_keywords: Vec<String>,

    /// At most this many differences are kept in a [`ComparisonResult`]; all
    /// differences are still counted.
    pub max_reported: usize,

    /// Compare as this format rather than detecting it.
    pub format: Option<FileFormat>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            tolerance: Tolerance::default(),
            ignore_keywords: DEFAULT_IGNORE_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_reported: DEFAULT_MAX_REPORTED_DIFFS,
            format: None,
        }
    }
}

impl CompareOptions {
    /// Is this FITS header keyword excluded from comparison?
    pub fn is_ignored(&self, keyword: &str) -> bool {
        self.ignore_keywords.iter().any(|pattern| {
            match pattern.strip_suffix('*') {
                Some(prefix) => keyword
                    .get(..prefix.len())
                    .map(|s| s.eq_ignore_ascii_case(prefix))
                    .unwrap_or(false),
                None => keyword.eq_ignore_ascii_case(pattern),
            }
        })
    }
}

/// Whether a line is only in the truth file or only in the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Removed,
    Added,
}

/// A single difference between an output file and its truth file. "actual"
/// values come from the output file, "expected" from the truth file.
#[derive(Debug, Clone, PartialEq)]
pub enum Difference {
    HduCount {
        actual: usize,
        expected: usize,
    },

    HduKind {
        hdu: usize,
        actual: &'static str,
        expected: &'static str,
    },

    MissingKeyword {
        hdu: usize,
        keyword: String,
    },

    ExtraKeyword {
        hdu: usize,
        keyword: String,
    },

    Keyword {
        hdu: usize,
        keyword: String,
        actual: String,
        expected: String,
    },

    ImageShape {
        hdu: usize,
        actual: Vec<usize>,
        expected: Vec<usize>,
    },

    /// `index` is the flattened pixel index.
    Pixel {
        hdu: usize,
        index: usize,
        actual: f64,
        expected: f64,
    },

    RowCount {
        hdu: usize,
        actual: usize,
        expected: usize,
    },

    MissingColumn {
        hdu: usize,
        column: String,
    },

    ExtraColumn {
        hdu: usize,
        column: String,
    },

    /// The column exists in both files, but holds a different kind or number
    /// of values per row.
    ColumnLayout {
        hdu: usize,
        column: String,
    },

    NumericCell {
        hdu: usize,
        column: String,
        row: usize,
        actual: f64,
        expected: f64,
    },

    StringCell {
        hdu: usize,
        column: String,
        row: usize,
        actual: String,
        expected: String,
    },

    /// `line` is 1-indexed, in the truth file for removals and in the output
    /// file for additions.
    Line {
        change: LineChange,
        line: usize,
        text: String,
    },

    Size {
        actual: u64,
        expected: u64,
    },

    Byte {
        offset: u64,
        actual: u8,
        expected: u8,
    },
}

impl Display for Difference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difference::HduCount { actual, expected } => {
                write!(f, "{actual} HDUs, expected {expected}")
            }
            Difference::HduKind {
                hdu,
                actual,
                expected,
            } => write!(f, "HDU {hdu}: {actual} HDU, expected {expected}"),
            Difference::MissingKeyword { hdu, keyword } => {
                write!(f, "HDU {hdu}: keyword {keyword} is missing")
            }
            Difference::ExtraKeyword { hdu, keyword } => {
                write!(f, "HDU {hdu}: unexpected keyword {keyword}")
            }
            Difference::Keyword {
                hdu,
                keyword,
                actual,
                expected,
            } => write!(f, "HDU {hdu}: keyword {keyword} = {actual}, expected {expected}"),
            Difference::ImageShape {
                hdu,
                actual,
                expected,
            } => write!(f, "HDU {hdu}: image shape {actual:?}, expected {expected:?}"),
            Difference::Pixel {
                hdu,
                index,
                actual,
                expected,
            } => write!(f, "HDU {hdu}: pixel {index} = {actual}, expected {expected}"),
            Difference::RowCount {
                hdu,
                actual,
                expected,
            } => write!(f, "HDU {hdu}: {actual} rows, expected {expected}"),
            Difference::MissingColumn { hdu, column } => {
                write!(f, "HDU {hdu}: column {column} is missing")
            }
            Difference::ExtraColumn { hdu, column } => {
                write!(f, "HDU {hdu}: unexpected column {column}")
            }
            Difference::ColumnLayout { hdu, column } => {
                write!(f, "HDU {hdu}: column {column} has a different type or repeat count")
            }
            Difference::NumericCell {
                hdu,
                column,
                row,
                actual,
                expected,
            } => write!(
                f,
                "HDU {hdu}: column {column} row {row} = {actual}, expected {expected}"
            ),
            Difference::StringCell {
                hdu,
                column,
                row,
                actual,
                expected,
            } => write!(
                f,
                "HDU {hdu}: column {column} row {row} = '{actual}', expected '{expected}'"
            ),
            Difference::Line { change, line, text } => match change {
                LineChange::Removed => write!(f, "-{line:>6}: {text}"),
                LineChange::Added => write!(f, "+{line:>6}: {text}"),
            },
            Difference::Size { actual, expected } => {
                write!(f, "size is {actual} bytes, expected {expected} bytes")
            }
            Difference::Byte {
                offset,
                actual,
                expected,
            } => write!(
                f,
                "byte offset {offset}: 0x{actual:02x}, expected 0x{expected:02x}"
            ),
        }
    }
}

/// Collects differences, keeping only the first few.
#[derive(Debug)]
pub(crate) struct Differences {
    kept: Vec<Difference>,
    total: usize,
    max: usize,
}

impl Differences {
    pub(crate) fn new(max: usize) -> Differences {
        Differences {
            kept: vec![],
            total: 0,
            max,
        }
    }

    pub(crate) fn push(&mut self, difference: Difference) {
        trace!("{difference}");
        self.total += 1;
        if self.kept.len() < self.max {
            self.kept.push(difference);
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }
}

/// The outcome of comparing an output file against a truth file.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub output: PathBuf,

    pub truth: PathBuf,

    pub format: FileFormat,

    /// The first differences found.
    pub differences: Vec<Difference>,

    /// The total number of differences found, including any not kept in
    /// `differences`.
    pub total_differences: usize,

    /// Extra information about a mismatch, e.g. file digests.
    pub notes: Vec<String>,
}

impl ComparisonResult {
    pub fn is_match(&self) -> bool {
        self.total_differences == 0
    }
}

impl Display for ComparisonResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_match() {
            return write!(
                f,
                "{} matches {} ({})",
                self.output.display(),
                self.truth.display(),
                self.format
            );
        }

        writeln!(
            f,
            "{} differs from {} ({}, {} difference{}):",
            self.output.display(),
            self.truth.display(),
            self.format,
            self.total_differences,
            if self.total_differences == 1 { "" } else { "s" }
        )?;
        for d in &self.differences {
            writeln!(f, "  {d}")?;
        }
        let hidden = self.total_differences - self.differences.len();
        if hidden > 0 {
            writeln!(f, "  ... and {hidden} more differences")?;
        }
        for note in &self.notes {
            writeln!(f, "  {note}")?;
        }
        Ok(())
    }
}

/// Compare an output file against a truth file.
///
/// Failing to read or parse either file is an error; finding differences is
/// not.
pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(
    output: P,
    truth: Q,
    options: &CompareOptions,
) -> Result<ComparisonResult, ComparisonError> {
    let output = output.as_ref();
    let truth = truth.as_ref();
    for path in [output, truth] {
        if !path.is_file() {
            return Err(ComparisonError::Missing {
                path: path.to_path_buf(),
            });
        }
    }

    let mut format = match options.format {
        Some(format) => format,
        None => detect(output, truth)?,
    };
    debug!(
        "Comparing {} against {} as {format}",
        output.display(),
        truth.display()
    );

    let mut differences = Differences::new(options.max_reported);
    let mut notes = vec![];
    match format {
        FileFormat::Fits => fits::compare(output, truth, options, &mut differences)?,
        FileFormat::Text => {
            let actual = read(output)?;
            let expected = read(truth)?;
            match (std::str::from_utf8(&actual), std::str::from_utf8(&expected)) {
                (Ok(actual_text), Ok(expected_text)) => {
                    text::compare(actual_text, expected_text, &mut differences);
                    // Line endings and a missing final newline are invisible
                    // to the line diff.
                    if differences.total() == 0 && actual != expected {
                        differences.push(binary::first_difference(&actual, &expected));
                    }
                }
                _ => {
                    debug!("Not valid UTF-8 throughout; comparing bytes instead");
                    format = FileFormat::Binary;
                    binary::compare(&actual, &expected, &mut differences, &mut notes);
                }
            }
        }
        FileFormat::Binary => {
            let actual = read(output)?;
            let expected = read(truth)?;
            binary::compare(&actual, &expected, &mut differences, &mut notes);
        }
    }

    Ok(ComparisonResult {
        output: output.to_path_buf(),
        truth: truth.to_path_buf(),
        format,
        total_differences: differences.total(),
        differences: differences.kept,
        notes,
    })
}

const FITS_MAGIC: &[u8] = b"SIMPLE  =";

/// How much of each file is inspected when detecting its format [bytes].
const DETECT_PREFIX_LEN: u64 = 8192;

/// FITS if either file has a FITS extension or starts like a FITS file, text
/// if both look like UTF-8 without control bytes, otherwise binary.
fn detect(output: &Path, truth: &Path) -> Result<FileFormat, ComparisonError> {
    let has_fits_extension = [output, truth].iter().any(|p| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "fits" | "fit" | "fts"))
            .unwrap_or(false)
    });
    if has_fits_extension {
        return Ok(FileFormat::Fits);
    }

    let actual = read_prefix(output)?;
    let expected = read_prefix(truth)?;
    let format = if actual.starts_with(FITS_MAGIC) || expected.starts_with(FITS_MAGIC) {
        FileFormat::Fits
    } else if looks_like_text(&actual) && looks_like_text(&expected) {
        FileFormat::Text
    } else {
        FileFormat::Binary
    };
    Ok(format)
}

fn looks_like_text(prefix: &[u8]) -> bool {
    let is_control = |b: &u8| *b < 0x20 && !matches!(*b, b'\t' | b'\n' | b'\r' | 0x0c);
    if prefix.iter().any(is_control) {
        return false;
    }
    match std::str::from_utf8(prefix) {
        Ok(_) => true,
        // A multi-byte character cut off by the end of the prefix is fine.
        Err(e) => e.error_len().is_none(),
    }
}

fn read_prefix(path: &Path) -> Result<Vec<u8>, ComparisonError> {
    let io_err = |e| ComparisonError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let file = File::open(path).map_err(io_err)?;
    let mut prefix = vec![];
    file.take(DETECT_PREFIX_LEN)
        .read_to_end(&mut prefix)
        .map_err(io_err)?;
    Ok(prefix)
}

fn read(path: &Path) -> Result<Vec<u8>, ComparisonError> {
    std::fs::read(path).map_err(|e| ComparisonError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
