//! Generates worksheet XML from a `Sheet` struct.
//!
//! Strings are written inline (`t="inlineStr"`), so the package needs no
//! shared string table. Styles go through the workbook-wide
//! [`StyleRegistry`].

use std::collections::HashSet;
use std::fmt::Write as _;

use super::styles_writer::{write_font_props, StyleRegistry};
use crate::cell_ref::{cell_ref, format_range_ref};
use crate::error::{Result, XlmergeError};
use crate::types::{Cell, CellValue, Formula, FormulaKind, RichTextRun, Row, Scalar, Sheet};
use crate::xml_helpers::xml_escape;

/// Write a complete worksheet XML string from a `Sheet`.
///
/// Fails with [`XlmergeError::Formula`] when a shared-formula follower has
/// no master on the same sheet.
pub(crate) fn write_sheet_xml(
    sheet: &Sheet,
    styles: &mut StyleRegistry,
    selected: bool,
) -> Result<String> {
    check_shared_formulas(sheet)?;

    let mut out = String::with_capacity(4096);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push('\n');

    // <dimension>
    let (last_row, last_col) = (sheet.last_row(), sheet.last_col());
    if last_row > 0 && last_col > 0 {
        let _ = writeln!(
            out,
            r#"<dimension ref="A1:{}"/>"#,
            cell_ref(last_row, last_col)
        );
    }

    // <sheetViews>
    let _ = writeln!(
        out,
        r#"<sheetViews><sheetView{} workbookViewId="0"/></sheetViews>"#,
        if selected { r#" tabSelected="1""# } else { "" }
    );

    // <sheetFormatPr>
    out.push_str("<sheetFormatPr");
    if let Some(width) = sheet.default_col_width {
        let _ = write!(out, r#" defaultColWidth="{width}""#);
    }
    let _ = writeln!(
        out,
        r#" defaultRowHeight="{}"/>"#,
        sheet.default_row_height.unwrap_or(15.0)
    );

    // <cols>
    if !sheet.col_widths.is_empty() {
        out.push_str("<cols>\n");
        for (col, cw) in &sheet.col_widths {
            let _ = write!(
                out,
                r#"<col min="{col}" max="{col}" width="{}" customWidth="1""#,
                cw.width
            );
            if cw.hidden {
                out.push_str(r#" hidden="1""#);
            }
            out.push_str("/>\n");
        }
        out.push_str("</cols>\n");
    }

    // <sheetData>
    out.push_str("<sheetData>\n");
    for (&row_num, row) in &sheet.rows {
        write_row(&mut out, row_num, row, styles);
    }
    out.push_str("</sheetData>\n");

    // <mergeCells>
    if !sheet.merges.is_empty() {
        let _ = writeln!(out, r#"<mergeCells count="{}">"#, sheet.merges.len());
        for merge in &sheet.merges {
            let _ = writeln!(out, r#"<mergeCell ref="{}"/>"#, format_range_ref(merge));
        }
        out.push_str("</mergeCells>\n");
    }

    out.push_str("</worksheet>");
    Ok(out)
}

/// Every shared follower needs a master carrying the expression.
fn check_shared_formulas(sheet: &Sheet) -> Result<()> {
    let formulas = || {
        sheet.rows.iter().flat_map(|(&r, row)| {
            row.cells.iter().filter_map(move |(&c, cell)| match &cell.value {
                Some(CellValue::Formula(f)) => Some((r, c, f)),
                _ => None,
            })
        })
    };

    let masters: HashSet<u32> = formulas()
        .filter_map(|(_, _, f)| match &f.kind {
            FormulaKind::Shared {
                index,
                range: Some(_),
            } if !f.expr.is_empty() => Some(*index),
            _ => None,
        })
        .collect();

    for (r, c, f) in formulas() {
        if let FormulaKind::Shared { index, range: None } = f.kind {
            if !masters.contains(&index) {
                return Err(XlmergeError::Formula(format!(
                    "shared formula {index} at {}!{} has no master cell",
                    sheet.name,
                    cell_ref(r, c)
                )));
            }
        }
    }
    Ok(())
}

fn write_row(out: &mut String, row_num: u32, row: &Row, styles: &mut StyleRegistry) {
    let _ = write!(out, r#"<row r="{row_num}""#);
    if let Some(height) = row.height {
        let _ = write!(out, r#" ht="{height}" customHeight="1""#);
    }
    if row.hidden {
        out.push_str(r#" hidden="1""#);
    }
    if row.cells.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push('>');
    for (&col, cell) in &row.cells {
        write_cell(out, row_num, col, cell, styles);
    }
    out.push_str("</row>\n");
}

/// Type attribute and `<v>` text for a scalar.
fn scalar_parts(value: &Scalar, in_formula: bool) -> (Option<&'static str>, String) {
    match value {
        Scalar::Text(s) => (Some("str"), xml_escape(s)),
        Scalar::Number(n) if n.is_finite() => (None, n.to_string()),
        Scalar::Number(_) => (Some("e"), "#NUM!".to_string()),
        Scalar::Bool(b) => (Some("b"), if *b { "1" } else { "0" }.to_string()),
        Scalar::Error(e) => (Some("e"), xml_escape(e)),
        Scalar::IsoDate(d) if in_formula => (Some("str"), xml_escape(d)),
        Scalar::IsoDate(d) => (Some("d"), xml_escape(d)),
    }
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, row: u32, col: u32, cell: &Cell, styles: &mut StyleRegistry) {
    let _ = write!(out, r#"<c r="{}""#, cell_ref(row, col));

    if let Some(style) = &cell.style {
        let idx = styles.style_index(style);
        if idx > 0 {
            let _ = write!(out, r#" s="{idx}""#);
        }
    }

    match &cell.value {
        None => out.push_str("/>"),
        Some(CellValue::Text(s)) => {
            out.push_str(r#" t="inlineStr"><is>"#);
            write_text_element(out, s);
            out.push_str("</is></c>");
        }
        Some(CellValue::RichText(runs)) => {
            out.push_str(r#" t="inlineStr"><is>"#);
            write_runs(out, runs);
            out.push_str("</is></c>");
        }
        Some(CellValue::Formula(formula)) => write_formula_cell(out, formula),
        Some(CellValue::Number(n)) => write_scalar_cell(out, &Scalar::Number(*n)),
        Some(CellValue::Bool(b)) => write_scalar_cell(out, &Scalar::Bool(*b)),
        Some(CellValue::Error(e)) => write_scalar_cell(out, &Scalar::Error(e.clone())),
        Some(CellValue::IsoDate(d)) => write_scalar_cell(out, &Scalar::IsoDate(d.clone())),
    }
}

fn write_scalar_cell(out: &mut String, value: &Scalar) {
    let (t, v) = scalar_parts(value, false);
    if let Some(t) = t {
        let _ = write!(out, r#" t="{t}""#);
    }
    let _ = write!(out, "><v>{v}</v></c>");
}

fn write_formula_cell(out: &mut String, formula: &Formula) {
    let cached = formula.cached.as_ref().map(|v| scalar_parts(v, true));
    if let Some((Some(t), _)) = &cached {
        let _ = write!(out, r#" t="{t}""#);
    }
    out.push('>');

    let expr = xml_escape(&formula.expr);
    match &formula.kind {
        FormulaKind::Normal => {
            let _ = write!(out, "<f>{expr}</f>");
        }
        FormulaKind::Shared {
            index,
            range: Some(range),
        } => {
            let _ = write!(
                out,
                r#"<f t="shared" ref="{}" si="{index}">{expr}</f>"#,
                xml_escape(range)
            );
        }
        FormulaKind::Shared { index, range: None } => {
            let _ = write!(out, r#"<f t="shared" si="{index}"/>"#);
        }
        FormulaKind::Array { range } => {
            let _ = write!(
                out,
                r#"<f t="array" ref="{}">{expr}</f>"#,
                xml_escape(range)
            );
        }
    }

    if let Some((_, v)) = cached {
        let _ = write!(out, "<v>{v}</v>");
    }
    out.push_str("</c>");
}

fn write_text_element(out: &mut String, text: &str) {
    let preserve = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
    if preserve {
        let _ = write!(out, r#"<t xml:space="preserve">{}</t>"#, xml_escape(text));
    } else {
        let _ = write!(out, "<t>{}</t>", xml_escape(text));
    }
}

fn write_runs(out: &mut String, runs: &[RichTextRun]) {
    for run in runs {
        out.push_str("<r>");
        if let Some(font) = &run.font {
            out.push_str("<rPr>");
            write_font_props(out, font, "rFont");
            out.push_str("</rPr>");
        }
        write_text_element(out, &run.text);
        out.push_str("</r>");
    }
}
