// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Line-based comparison of text files.

use super::{Difference, Differences, LineChange};

/// Beyond this many cells, the LCS table is too big and lines are compared
/// positionally instead.
const MAX_LCS_CELLS: usize = 16_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    /// Index into the old (truth) lines.
    Remove(usize),
    /// Index into the new (output) lines.
    Insert(usize),
}

pub(super) fn compare(actual: &str, expected: &str, differences: &mut Differences) {
    let actual: Vec<&str> = actual.lines().collect();
    let expected: Vec<&str> = expected.lines().collect();

    let prefix = actual
        .iter()
        .zip(&expected)
        .take_while(|(a, e)| a == e)
        .count();
    let suffix = actual[prefix..]
        .iter()
        .rev()
        .zip(expected[prefix..].iter().rev())
        .take_while(|(a, e)| a == e)
        .count();
    let old = &expected[prefix..expected.len() - suffix];
    let new = &actual[prefix..actual.len() - suffix];

    for edit in diff(old, new) {
        let difference = match edit {
            Edit::Remove(i) => Difference::Line {
                change: LineChange::Removed,
                line: prefix + i + 1,
                text: old[i].to_string(),
            },
            Edit::Insert(j) => Difference::Line {
                change: LineChange::Added,
                line: prefix + j + 1,
                text: new[j].to_string(),
            },
        };
        differences.push(difference);
    }
}

/// The edits turning `old` into `new`, in order, with removals before
/// insertions at each position.
fn diff(old: &[&str], new: &[&str]) -> Vec<Edit> {
    let n = old.len();
    let m = new.len();
    let mut edits = vec![];

    if n.saturating_mul(m) > MAX_LCS_CELLS {
        for i in 0..n.max(m) {
            match (old.get(i), new.get(i)) {
                (Some(a), Some(b)) if a == b => (),
                (a, b) => {
                    if a.is_some() {
                        edits.push(Edit::Remove(i));
                    }
                    if b.is_some() {
                        edits.push(Edit::Insert(i));
                    }
                }
            }
        }
        return edits;
    }

    // lcs[i * (m + 1) + j] is the LCS length of old[i..] and new[j..].
    let width = m + 1;
    let mut lcs = vec![0_u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if old[i] == new[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            edits.push(Edit::Remove(i));
            i += 1;
        } else {
            edits.push(Edit::Insert(j));
            j += 1;
        }
    }
    edits.extend((i..n).map(Edit::Remove));
    edits.extend((j..m).map(Edit::Insert));
    edits
}
