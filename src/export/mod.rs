//! XLSX export pipeline.
//!
//! Serializes an owned [`Workbook`] into a fresh package. Every sheet is
//! re-generated from the model; nothing is copied from the input archives.

mod package;
pub(crate) mod sheet_writer;
pub(crate) mod styles_writer;

use crate::error::Result;
use crate::types::{CellValue, SheetState, Workbook};
use crate::value::extract_value;

use sheet_writer::write_sheet_xml;
use styles_writer::StyleRegistry;

/// Serialize a workbook to XLSX bytes.
///
/// The last visible sheet becomes the active tab.
pub fn write_workbook(workbook: &Workbook) -> Result<Vec<u8>> {
    let active = workbook
        .sheets
        .iter()
        .rposition(|s| s.state == SheetState::Visible)
        .unwrap_or(0);

    let mut styles = StyleRegistry::new();
    let mut sheet_parts = Vec::with_capacity(workbook.sheets.len());
    for (i, sheet) in workbook.sheets.iter().enumerate() {
        let xml = write_sheet_xml(sheet, &mut styles, i == active)?;
        sheet_parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), xml));
    }

    let count = workbook.sheets.len();
    let mut parts = vec![
        (
            "[Content_Types].xml".to_string(),
            package::content_types_xml(count),
        ),
        ("_rels/.rels".to_string(), package::root_rels_xml()),
        ("xl/workbook.xml".to_string(), package::workbook_xml(workbook, active)),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            package::workbook_rels_xml(count),
        ),
        ("xl/styles.xml".to_string(), styles.to_xml()),
    ];
    parts.extend(sheet_parts);

    log::debug!(
        "writing {count} sheet(s) with {} cell format(s)",
        styles.xf_count()
    );
    package::zip_parts(&parts)
}

/// Copy of `workbook` with every formula replaced by its cached value.
///
/// Formulas without a cached value leave an empty (possibly styled) cell.
pub fn values_only(workbook: &Workbook) -> Workbook {
    let mut flat = workbook.clone();
    for sheet in &mut flat.sheets {
        for row in sheet.rows.values_mut() {
            for cell in row.cells.values_mut() {
                if matches!(cell.value, Some(CellValue::Formula(_))) {
                    cell.value = extract_value(cell.value.as_ref()).map(CellValue::from);
                }
            }
        }
    }
    flat
}
