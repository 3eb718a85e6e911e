use std::collections::BTreeMap;

use super::Cell;

/// A complete workbook: ordered sheets plus the date system flag.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// Whether the workbook uses the 1904 date system (Mac default)
    pub date1904: bool,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Remove every sheet with the given name, returning how many were removed.
    pub fn remove_sheet(&mut self, name: &str) -> usize {
        let before = self.sheets.len();
        self.sheets.retain(|s| s.name != name);
        before - self.sheets.len()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Sheet visibility state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

/// A rectangular block of cells displayed as one, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeRange {
    pub fn overlaps(&self, other: &MergeRange) -> bool {
        self.start_row <= other.end_row
            && other.start_row <= self.end_row
            && self.start_col <= other.end_col
            && other.start_col <= self.end_col
    }

    /// True when the range lies entirely inside the given rows and columns.
    pub fn is_within(&self, first_row: u32, last_row: u32, first_col: u32, last_col: u32) -> bool {
        self.start_row >= first_row
            && self.end_row <= last_row
            && self.start_col >= first_col
            && self.end_col <= last_col
    }

    /// Shift the range vertically; `None` if it would leave the sheet.
    pub fn shifted_rows(&self, delta: i64) -> Option<MergeRange> {
        let start = i64::from(self.start_row) + delta;
        let end = i64::from(self.end_row) + delta;
        Some(MergeRange {
            start_row: u32::try_from(start).ok().filter(|r| *r >= 1)?,
            start_col: self.start_col,
            end_row: u32::try_from(end).ok()?,
            end_col: self.end_col,
        })
    }
}

/// Explicit column width in Excel character units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnWidth {
    pub width: f64,
    pub hidden: bool,
}

/// One worksheet row: sparse cells keyed by 1-based column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: BTreeMap<u32, Cell>,
    /// Custom height in points.
    pub height: Option<f64>,
    pub hidden: bool,
}

/// A single worksheet
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub state: SheetState,
    /// Sparse rows keyed by 1-based row number.
    pub rows: BTreeMap<u32, Row>,
    /// Explicit widths keyed by 1-based column number.
    pub col_widths: BTreeMap<u32, ColumnWidth>,
    pub merges: Vec<MergeRange>,
    /// Default row height in points from `<sheetFormatPr>`.
    pub default_row_height: Option<f64>,
    /// Default column width in characters from `<sheetFormatPr>`.
    pub default_col_width: Option<f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    pub fn row_mut(&mut self, row: u32) -> &mut Row {
        self.rows.entry(row).or_default()
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cells.get(&col))
    }

    pub fn cell_mut(&mut self, row: u32, col: u32) -> &mut Cell {
        self.row_mut(row).cells.entry(col).or_default()
    }

    /// Highest row number present in the sheet, 0 for an empty sheet.
    pub fn last_row(&self) -> u32 {
        self.rows.keys().next_back().copied().unwrap_or(0)
    }

    /// Highest column number holding a cell, 0 for an empty sheet.
    pub fn last_col(&self) -> u32 {
        self.rows
            .values()
            .filter_map(|r| r.cells.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }

    /// Register a merge range unless it collides with an existing one.
    ///
    /// Returns `false` (and leaves the sheet untouched) on collision.
    pub fn try_add_merge(&mut self, range: MergeRange) -> bool {
        if self.merges.iter().any(|m| m.overlaps(&range)) {
            return false;
        }
        self.merges.push(range);
        true
    }
}
