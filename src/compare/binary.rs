// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Byte-exact comparison.

use super::{Difference, Differences};
use crate::io::sha256_bytes;

pub(super) fn compare(
    actual: &[u8],
    expected: &[u8],
    differences: &mut Differences,
    notes: &mut Vec<String>,
) {
    if actual == expected {
        return;
    }

    if actual.len() != expected.len() {
        differences.push(Difference::Size {
            actual: actual.len() as u64,
            expected: expected.len() as u64,
        });
    }
    for (offset, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        if a != e {
            differences.push(Difference::Byte {
                offset: offset as u64,
                actual: a,
                expected: e,
            });
        }
    }

    notes.push(format!("output SHA-256: {}", sha256_bytes(actual)));
    notes.push(format!("truth SHA-256:  {}", sha256_bytes(expected)));
}

/// The first byte that differs between two files known to differ, or their
/// sizes if one is a prefix of the other.
pub(super) fn first_difference(actual: &[u8], expected: &[u8]) -> Difference {
    match actual.iter().zip(expected).position(|(a, e)| a != e) {
        Some(offset) => Difference::Byte {
            offset: offset as u64,
            actual: actual[offset],
            expected: expected[offset],
        },
        None => Difference::Size {
            actual: actual.len() as u64,
            expected: expected.len() as u64,
        },
    }
}
