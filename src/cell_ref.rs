//! Utilities for Excel-style column letters, cell references and ranges.
//!
//! Everything here is 1-based: column `A` is 1 and the first row is 1.

use crate::types::MergeRange;

/// Convert column letters (`"A"`, `"Z"`, `"AA"`) into a 1-based column number.
///
/// Letters are read as a bijective base-26 numeral ('A' = 1 .. 'Z' = 26, no
/// zero digit). Lowercase is accepted. Returns `None` for empty input, any
/// non-letter character, or overflow.
pub fn column_letter_to_number(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    Some(col)
}

/// Convert a 1-based column number into column letters.
///
/// Returns an empty string for 0, which has no column name.
pub fn column_number_to_letter(number: u32) -> String {
    let mut letters = Vec::new();
    let mut n = number;
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, so the narrowing is lossless
        #[allow(clippy::cast_possible_truncation)]
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Format a 1-based (row, col) pair as an `A1`-style reference.
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_number_to_letter(col), row)
}

/// Parse a cell reference like `"B12"` or `"$B$12"` into 1-based `(row, col)`.
///
/// The reference must be letters followed by digits; anything else is
/// rejected rather than guessed at.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Bytes variant of [`parse_cell_ref`] for raw XML attribute values.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
            col = col.checked_mul(26)?.checked_add(digit)?;
            saw_col = true;
        } else if b.is_ascii_digit() {
            if !saw_col {
                return None;
            }
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((row, col))
}

/// Parse a range like `"A1:C3"` into a [`MergeRange`].
///
/// Only the two-corner `LETTERS+DIGITS:LETTERS+DIGITS` form is accepted.
/// Corners are normalized so that start <= end on both axes.
pub fn parse_range_ref(range: &str) -> Option<MergeRange> {
    let (start, end) = range.trim().split_once(':')?;
    let (r1, c1) = parse_cell_ref(start)?;
    let (r2, c2) = parse_cell_ref(end)?;

    Some(MergeRange {
        start_row: r1.min(r2),
        start_col: c1.min(c2),
        end_row: r1.max(r2),
        end_col: c1.max(c2),
    })
}

/// Format a range back into `A1:C3` form.
pub fn format_range_ref(range: &MergeRange) -> String {
    format!(
        "{}:{}",
        cell_ref(range.start_row, range.start_col),
        cell_ref(range.end_row, range.end_col)
    )
}
