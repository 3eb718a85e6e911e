//! Row classification: total rows, subtotal rows and signature rows.
//!
//! Every predicate looks only at the cells inside the column window.

use crate::config::ColumnWindow;
use crate::types::{Row, Scalar, Sheet};
use crate::value::extract_value;

/// Label that marks a total row, compared case-insensitively after trimming.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Labels that open a signature section, matched against lowercased cell text.
///
/// Vietnamese creator / receiver / deliverer / signature labels, and the
/// English sign-off phrases. Bare English nouns such as `receiver` are left
/// out because they are ordinary column headers.
pub const SIGNATURE_KEYWORDS: &[&str] = &[
    "người lập",
    "người nhận",
    "người giao",
    "ký tên",
    "chữ ký",
    "prepared by",
    "received by",
    "delivered by",
    "signed by",
    "signature:",
];

/// Fraction of empty window cells a subtotal row needs, as `num / den`.
const SUBTOTAL_EMPTY_RATIO: (u32, u32) = (7, 10);
const SUBTOTAL_MAX_NUMERIC: u32 = 3;

/// How a single cell counts towards the subtotal heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Empty,
    Numeric,
    Textual,
}

/// Per-sheet markers, computed once before the sheet's rows are walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetMarkers {
    pub total_row: Option<u32>,
    pub signature_row: Option<u32>,
}

impl SheetMarkers {
    pub fn scan(sheet: &Sheet, window: ColumnWindow) -> Self {
        Self {
            total_row: find_total_row(sheet, window),
            signature_row: find_signature_row(sheet, window),
        }
    }
}

fn window_values<'a>(row: &'a Row, window: ColumnWindow) -> impl Iterator<Item = Scalar> + 'a {
    row.cells
        .range(window.start..=window.end)
        .filter_map(|(_, cell)| extract_value(cell.value.as_ref()))
}

fn first_row_matching(
    sheet: &Sheet,
    window: ColumnWindow,
    matches: impl Fn(&str) -> bool,
) -> Option<u32> {
    sheet
        .rows
        .iter()
        .find(|(_, row)| {
            window_values(row, window).any(|v| v.as_text().is_some_and(|t| matches(t)))
        })
        .map(|(&n, _)| n)
}

/// First row (scanning the whole sheet from row 1) holding a cell whose
/// trimmed text is exactly `TOTAL`, ignoring case.
pub fn find_total_row(sheet: &Sheet, window: ColumnWindow) -> Option<u32> {
    first_row_matching(sheet, window, |text| {
        text.trim().eq_ignore_ascii_case(TOTAL_LABEL)
    })
}

/// Normalize cell text for keyword search: lowercase with whitespace runs
/// collapsed to single spaces.
fn normalize_label(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether a cell text contains any signature keyword.
pub fn is_signature_text(text: &str) -> bool {
    let normalized = normalize_label(text);
    SIGNATURE_KEYWORDS.iter().any(|k| normalized.contains(k))
}

/// First row (scanning the whole sheet from row 1) with a cell containing
/// any signature keyword.
pub fn find_signature_row(sheet: &Sheet, window: ColumnWindow) -> Option<u32> {
    first_row_matching(sheet, window, is_signature_text)
}

/// Parse text as a number, allowing thousands groups.
///
/// Both `1,250,000.5` and `1.250.000,5` are read. A lone `1.250` keeps the
/// dot as the decimal point.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| parse_grouped(trimmed, ',', '.'))
        .or_else(|| parse_grouped(trimmed, '.', ','))
        .filter(|n| n.is_finite())
}

/// Parse digits split into groups of three by `group`, with an optional
/// fraction after `decimal`.
fn parse_grouped(text: &str, group: char, decimal: char) -> Option<f64> {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac) = unsigned.split_once(decimal).unwrap_or((unsigned, ""));
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let mut groups = int_part.split(group);
    let head = groups.next()?;
    if !all_digits(head) || head.len() > 3 {
        return None;
    }
    let mut digits = head.to_string();
    for g in groups {
        if !all_digits(g) || g.len() != 3 {
            return None;
        }
        digits.push_str(g);
    }

    if frac.is_empty() {
        format!("{sign}{digits}").parse().ok()
    } else if all_digits(frac) {
        format!("{sign}{digits}.{frac}").parse().ok()
    } else {
        None
    }
}

pub fn classify_cell(value: Option<&Scalar>) -> CellKind {
    match value {
        None => CellKind::Empty,
        Some(Scalar::Number(_)) => CellKind::Numeric,
        Some(Scalar::Text(s)) if s.trim().is_empty() => CellKind::Empty,
        Some(Scalar::Text(s)) if parse_numeric_text(s).is_some() => CellKind::Numeric,
        Some(_) => CellKind::Textual,
    }
}

/// Whether a row looks like an unlabeled subtotal: mostly empty, one to
/// three figures and no text inside the window.
pub fn is_subtotal_row(sheet: &Sheet, row: u32, window: ColumnWindow) -> bool {
    let total = window.width();
    let (mut empty, mut numeric, mut text) = (0u32, 0u32, 0u32);

    for col in window.columns() {
        let value = sheet
            .cell(row, col)
            .and_then(|c| extract_value(c.value.as_ref()));
        match classify_cell(value.as_ref()) {
            CellKind::Empty => empty += 1,
            CellKind::Numeric => numeric += 1,
            CellKind::Textual => text += 1,
        }
    }

    let (num, den) = SUBTOTAL_EMPTY_RATIO;
    empty * den >= total * num && (1..=SUBTOTAL_MAX_NUMERIC).contains(&numeric) && text == 0
}
