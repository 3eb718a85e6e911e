use super::{CellStyle, RichTextRun};

/// A portable, display-independent cell value.
///
/// This is what the row copier writes into the output sheet: never a
/// formula, never a run list.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    /// Numbers, including date serials (the display format lives in the style).
    Number(f64),
    Bool(bool),
    /// Error literal such as `#DIV/0!`.
    Error(String),
    /// ISO 8601 date stored with `t="d"`.
    IsoDate(String),
}

impl Scalar {
    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// How a formula participates in a shared/array group.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaKind {
    Normal,
    /// Shared formula. The master carries the expression and the `ref` range;
    /// followers carry only the group index.
    Shared { index: u32, range: Option<String> },
    Array { range: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    /// Expression text without the leading `=`; empty for shared followers.
    pub expr: String,
    pub kind: FormulaKind,
    /// Last computed result stored in the file.
    pub cached: Option<Scalar>,
}

/// Raw cell value as stored in the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Error(String),
    IsoDate(String),
    RichText(Vec<RichTextRun>),
    Formula(Formula),
}

impl From<Scalar> for CellValue {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => CellValue::Text(s),
            Scalar::Number(n) => CellValue::Number(n),
            Scalar::Bool(b) => CellValue::Bool(b),
            Scalar::Error(e) => CellValue::Error(e),
            Scalar::IsoDate(d) => CellValue::IsoDate(d),
        }
    }
}

/// A single cell's value and style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: Option<CellValue>,
    pub style: Option<CellStyle>,
}

impl Cell {
    pub fn with_value(value: CellValue) -> Self {
        Self {
            value: Some(value),
            style: None,
        }
    }
}
