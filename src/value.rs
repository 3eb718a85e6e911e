//! Cell value extraction.
//!
//! Turns whatever a source cell stores into the scalar that lands in the
//! output: formulas collapse to their cached result and rich text collapses
//! to its concatenated runs. Strings are never reinterpreted, so text that
//! merely looks like a date survives byte for byte.

use crate::types::{concat_runs, CellValue, Scalar};

/// Display-independent value of a cell, `None` when there is nothing to copy.
///
/// A formula without a cached result yields `None`; the expression text is
/// never returned.
pub fn extract_value(value: Option<&CellValue>) -> Option<Scalar> {
    match value? {
        CellValue::Formula(f) => f.cached.clone(),
        CellValue::RichText(runs) => Some(Scalar::Text(concat_runs(runs))),
        CellValue::Text(s) => Some(Scalar::Text(s.clone())),
        CellValue::Number(n) => Some(Scalar::Number(*n)),
        CellValue::Bool(b) => Some(Scalar::Bool(*b)),
        CellValue::Error(e) => Some(Scalar::Error(e.clone())),
        CellValue::IsoDate(d) => Some(Scalar::IsoDate(d.clone())),
    }
}
