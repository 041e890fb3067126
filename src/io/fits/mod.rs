// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions for reading FITS files.
//!
//! fitsio doesn't expose every cfitsio routine we need for generic reading
//! (e.g. iterating over every header card), so some functions here call
//! cfitsio directly.

mod error;

pub use error::FitsError;

use std::{
    ffi::CStr,
    fmt::Display,
    os::raw::{c_char, c_int},
    path::Path,
    ptr,
};

use fitsio::{hdu::*, FitsFile};

// Buffer sizes from fitsio.h.
const FLEN_KEYWORD: usize = 75;
const FLEN_VALUE: usize = 71;
const FLEN_COMMENT: usize = 73;

// TDOUBLE (fitsio.h)
const TDOUBLE: c_int = 82;

/// A single keyword = value card from a FITS header.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HeaderCard {
    pub(crate) keyword: String,
    /// The value, with any string quoting removed.
    pub(crate) value: String,
}

/// Open a fits file.
#[track_caller]
pub(crate) fn fits_open<P: AsRef<Path>>(file: P) -> Result<FitsFile, FitsError> {
    FitsFile::open(file.as_ref()).map_err(|e| {
        let caller = std::panic::Location::caller();
        FitsError::Open {
            fits_error: Box::new(e),
            fits_filename: file.as_ref().to_path_buf().into_boxed_path(),
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    })
}

/// Open a fits file's HDU. This also makes it the "current" HDU for any raw
/// cfitsio calls.
#[track_caller]
pub(crate) fn fits_open_hdu<T: DescribesHdu + Display + Copy>(
    fits_fptr: &mut FitsFile,
    hdu_description: T,
) -> Result<FitsHdu, FitsError> {
    fits_fptr.hdu(hdu_description).map_err(|e| {
        let caller = std::panic::Location::caller();
        FitsError::Fitsio {
            fits_error: Box::new(e),
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_description: format!("{hdu_description}").into_boxed_str(),
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    })
}

/// Get the number of HDUs in a fits file.
#[track_caller]
pub(crate) fn fits_num_hdus(fits_fptr: &mut FitsFile) -> Result<usize, FitsError> {
    let mut num_hdus = 0;
    let mut status = 0;
    unsafe {
        // ffthdu = fits_get_num_hdus
        fitsio_sys::ffthdu(fits_fptr.as_raw(), &mut num_hdus, &mut status);
    }
    fitsio::errors::check_status(status).map_err(|e| {
        let caller = std::panic::Location::caller();
        FitsError::Fitsio {
            fits_error: Box::new(e),
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_description: "<all>".into(),
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    })?;
    Ok(num_hdus as usize)
}

/// Read every keyword = value card in the header of the given HDU, in order.
/// COMMENT, HISTORY and blank cards are skipped.
#[track_caller]
pub(crate) fn fits_get_header(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
) -> Result<Vec<HeaderCard>, FitsError> {
    // Ensure the raw calls below act on this HDU.
    let hdu = fits_open_hdu(fits_fptr, hdu.number)?;
    let caller = std::panic::Location::caller();

    let mut num_keys = 0;
    let mut status = 0;
    unsafe {
        // ffghsp = fits_get_hdrspace
        fitsio_sys::ffghsp(
            fits_fptr.as_raw(),
            &mut num_keys,
            &mut 0,
            &mut status,
        );
    }
    if status != 0 {
        return Err(FitsError::HeaderCard {
            card_num: 0,
            status,
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_num: hdu.number + 1,
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        });
    }

    let mut cards = Vec::with_capacity(num_keys as usize);
    for card_num in 1..=num_keys {
        let mut keyword = [0 as c_char; FLEN_KEYWORD];
        let mut value = [0 as c_char; FLEN_VALUE];
        let mut comment = [0 as c_char; FLEN_COMMENT];
        let (keyword, value) = unsafe {
            // ffgkyn = fits_read_keyn
            fitsio_sys::ffgkyn(
                fits_fptr.as_raw(),
                card_num,
                keyword.as_mut_ptr(),
                value.as_mut_ptr(),
                comment.as_mut_ptr(),
                &mut status,
            );
            if status != 0 {
                return Err(FitsError::HeaderCard {
                    card_num,
                    status,
                    fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
                    hdu_num: hdu.number + 1,
                    source_file: caller.file(),
                    source_line: caller.line(),
                    source_column: caller.column(),
                });
            }
            (
                CStr::from_ptr(keyword.as_ptr())
                    .to_string_lossy()
                    .into_owned(),
                CStr::from_ptr(value.as_ptr()).to_string_lossy().into_owned(),
            )
        };

        match keyword.as_str() {
            "" | "COMMENT" | "HISTORY" => continue,
            _ => cards.push(HeaderCard {
                keyword,
                value: unquote_value(&value),
            }),
        }
    }

    Ok(cards)
}

/// FITS string values are wrapped in single quotes, padded with trailing
/// spaces, and have embedded quotes doubled.
fn unquote_value(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        Some(inner) => inner.trim_end().replace("''", "'"),
        None => trimmed.to_string(),
    }
}

/// Given a FITS file pointer and an image HDU, read the image as doubles.
/// Empty images (NAXIS = 0) yield an empty vector.
#[track_caller]
pub(crate) fn fits_get_image_f64(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
) -> Result<Vec<f64>, FitsError> {
    match &hdu.info {
        HduInfo::ImageInfo { shape, .. } if shape.is_empty() || shape.contains(&0) => Ok(vec![]),
        HduInfo::ImageInfo { .. } => hdu.read_image(fits_fptr).map_err(|e| {
            let caller = std::panic::Location::caller();
            FitsError::Fitsio {
                fits_error: Box::new(e),
                fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
                hdu_description: format!("{}", hdu.number + 1).into_boxed_str(),
                source_file: caller.file(),
                source_line: caller.line(),
                source_column: caller.column(),
            }
        }),
        _ => {
            let caller = std::panic::Location::caller();
            Err(FitsError::NotImage {
                fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
                hdu_num: hdu.number + 1,
                source_file: caller.file(),
                source_line: caller.line(),
                source_column: caller.column(),
            })
        }
    }
}

/// Get a string column from a fits file's table HDU.
#[track_caller]
pub(crate) fn fits_get_string_col(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    col_name: &str,
) -> Result<Vec<String>, FitsError> {
    hdu.read_col(fits_fptr, col_name).map_err(|e| {
        let caller = std::panic::Location::caller();
        FitsError::Fitsio {
            fits_error: Box::new(e),
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_description: format!("{}", hdu.number + 1).into_boxed_str(),
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    })
}

/// Get every element of a numeric column from a fits file's table HDU as
/// doubles. `col_index` is zero-indexed; `num_elements` is the number of rows
/// multiplied by the column's repeat count. cfitsio does the type conversion.
#[track_caller]
pub(crate) fn fits_get_numeric_col(
    fits_fptr: &mut FitsFile,
    hdu: &FitsHdu,
    col_index: usize,
    num_elements: usize,
) -> Result<Vec<f64>, FitsError> {
    let mut values = vec![0.0; num_elements];
    if num_elements == 0 {
        return Ok(values);
    }
    // Ensure the raw call below acts on this HDU.
    let hdu = fits_open_hdu(fits_fptr, hdu.number)?;

    let mut status = 0;
    unsafe {
        // ffgcv = fits_read_col
        fitsio_sys::ffgcv(
            fits_fptr.as_raw(),
            TDOUBLE,
            col_index as c_int + 1,
            1,
            1,
            num_elements as i64,
            ptr::null_mut(),
            values.as_mut_ptr().cast(),
            &mut 0,
            &mut status,
        );
    }
    fitsio::errors::check_status(status).map_err(|e| {
        let caller = std::panic::Location::caller();
        FitsError::Fitsio {
            fits_error: Box::new(e),
            fits_filename: fits_fptr.file_path().to_path_buf().into_boxed_path(),
            hdu_description: format!("{}", hdu.number + 1).into_boxed_str(),
            source_file: caller.file(),
            source_line: caller.line(),
            source_column: caller.column(),
        }
    })?;
    Ok(values)
}
