//! Row, column-width and merge-range copying between sheets.
//!
//! Values pass through [`extract_value`], so the target never receives a
//! formula or a run list. Styles are cloned, and since `CellStyle` owns all
//! of its parts the target shares nothing with the source workbook.

use crate::config::ColumnWindow;
use crate::value::extract_value;
use crate::cell_ref::format_range_ref;
use crate::types::Sheet;

/// Copy one row's window cells into `target_row`, keeping column positions.
///
/// Values are written only when the source cell has one; the style is cloned
/// whenever the source cell exists. Returns `false` when the source row does
/// not exist at all.
pub fn copy_row(
    source: &Sheet,
    source_row: u32,
    target: &mut Sheet,
    target_row: u32,
    window: ColumnWindow,
) -> bool {
    let Some(row) = source.row(source_row) else {
        return false;
    };

    for (&col, cell) in row.cells.range(window.start..=window.end) {
        let value = extract_value(cell.value.as_ref());
        if value.is_none() && cell.style.is_none() {
            continue;
        }
        let out = target.cell_mut(target_row, col);
        if let Some(value) = value {
            out.value = Some(value.into());
        }
        if let Some(style) = &cell.style {
            out.style = Some(style.clone());
        }
    }

    if row.height.is_some() || row.hidden {
        let out = target.row_mut(target_row);
        out.height = row.height.or(out.height);
        out.hidden |= row.hidden;
    }
    true
}

/// Copy explicit column widths inside the window; other columns keep the
/// target's default width.
pub fn copy_column_widths(source: &Sheet, target: &mut Sheet, window: ColumnWindow) {
    for (&col, width) in source.col_widths.range(window.start..=window.end) {
        target.col_widths.insert(col, *width);
    }
}

/// Recreate the source merges lying fully inside
/// `[source_row_start, source_row_end] x window`, shifted so that
/// `source_row_start` lands on `target_row_offset`.
///
/// Ranges that would collide with an existing target merge are skipped.
/// Returns how many ranges were recreated.
pub fn copy_merged_ranges(
    source: &Sheet,
    target: &mut Sheet,
    source_row_start: u32,
    source_row_end: u32,
    target_row_offset: u32,
    window: ColumnWindow,
) -> usize {
    let delta = i64::from(target_row_offset) - i64::from(source_row_start);
    let mut created = 0;

    for range in &source.merges {
        if !range.is_within(source_row_start, source_row_end, window.start, window.end) {
            continue;
        }
        let Some(shifted) = range.shifted_rows(delta) else {
            continue;
        };
        if target.try_add_merge(shifted) {
            created += 1;
        } else {
            log::debug!(
                "skipping merge {} from '{}': collides with an existing range on '{}'",
                format_range_ref(range),
                source.name,
                target.name
            );
        }
    }

    created
}
