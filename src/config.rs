//! Merge configuration.
//!
//! The JSON form is camelCase and every field is optional:
//!
//! ```json
//! {"includeTotal": true, "startRow": 2, "startColumn": "A", "endColumn": "Z",
//!  "includeSignature": true, "outputBase": "fresh"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cell_ref::column_letter_to_number;
use crate::error::{Result, XlmergeError};

/// Longest column label accepted from users (`ZZ` = 702).
pub const MAX_COLUMN_LETTERS: usize = 2;

/// Which workbook carries the "Consolidated" sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputBase {
    /// A new workbook holding only the consolidated sheet.
    #[default]
    Fresh,
    /// The first input workbook, keeping its other sheets.
    FirstInput,
}

impl FromStr for OutputBase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fresh" => Ok(Self::Fresh),
            "first-input" | "firstinput" | "first_input" => Ok(Self::FirstInput),
            other => Err(format!(
                "unknown output base '{other}' (expected 'fresh' or 'first-input')"
            )),
        }
    }
}

impl fmt::Display for OutputBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => f.write_str("fresh"),
            Self::FirstInput => f.write_str("first-input"),
        }
    }
}

/// Inclusive 1-based column range every predicate and copy is limited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWindow {
    pub start: u32,
    pub end: u32,
}

impl ColumnWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, col: u32) -> bool {
        (self.start..=self.end).contains(&col)
    }

    pub fn columns(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }

    /// Number of columns in the window.
    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeConfig {
    /// Keep rows labelled "TOTAL"; when false, subtotal-shaped rows are dropped too.
    pub include_total: bool,
    /// First data row of each sheet; rows above it are header material.
    pub start_row: u32,
    pub start_column: String,
    pub end_column: String,
    /// Append the first signature section found, once, after all data.
    pub include_signature: bool,
    pub output_base: OutputBase,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            include_total: true,
            start_row: 2,
            start_column: "A".to_string(),
            end_column: "Z".to_string(),
            include_signature: true,
            output_base: OutputBase::Fresh,
        }
    }
}

impl MergeConfig {
    /// Decode, normalize and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Trim and uppercase the column letters.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.start_column = self.start_column.trim().to_ascii_uppercase();
        self.end_column = self.end_column.trim().to_ascii_uppercase();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_row == 0 {
            return Err(XlmergeError::Config("startRow must be at least 1".into()));
        }
        let window = self.column_window()?;
        if window.start > window.end {
            return Err(XlmergeError::Config(format!(
                "startColumn {} is after endColumn {}",
                self.start_column, self.end_column
            )));
        }
        Ok(())
    }

    /// Resolve the column letters to a window.
    pub fn column_window(&self) -> Result<ColumnWindow> {
        Ok(ColumnWindow::new(
            parse_column(&self.start_column, "startColumn")?,
            parse_column(&self.end_column, "endColumn")?,
        ))
    }
}

fn parse_column(letters: &str, field: &str) -> Result<u32> {
    if letters.len() > MAX_COLUMN_LETTERS {
        return Err(XlmergeError::Config(format!(
            "{field} '{letters}' has more than {MAX_COLUMN_LETTERS} letters"
        )));
    }
    column_letter_to_number(letters)
        .ok_or_else(|| XlmergeError::Config(format!("{field} '{letters}' is not a column")))
}
