//! Main XLSX parser
//!
//! Orchestrates the parsing of all components from the ZIP archive into an
//! owned [`Workbook`]. Styles are resolved while parsing, so the returned
//! model holds no references into the archive.

mod relationships;
pub(crate) mod styles;
mod worksheet;

use std::io::Cursor;
use zip::ZipArchive;

use crate::error::{Result, XlmergeError};
use crate::types::Workbook;

use relationships::{
    get_sheet_info, parse_shared_strings, parse_stylesheet, parse_theme_colors,
    parse_workbook_relationships,
};
use styles::StyleResolver;
use worksheet::{parse_sheet, SheetContext};

/// Parse an XLSX file from bytes.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let rels = parse_workbook_relationships(&mut archive)?;
    let theme_colors = parse_theme_colors(&mut archive, rels.theme.as_deref());
    let stylesheet = parse_stylesheet(&mut archive, rels.styles.as_deref())?;
    let resolver = StyleResolver::new(&stylesheet, &theme_colors);
    let shared_strings =
        parse_shared_strings(&mut archive, rels.shared_strings.as_deref(), &resolver)?;

    let (sheet_infos, date1904) = get_sheet_info(&mut archive, &rels.worksheets)?;
    if sheet_infos.is_empty() {
        return Err(XlmergeError::Parse("workbook contains no worksheets".into()));
    }

    let ctx = SheetContext {
        shared_strings: &shared_strings,
        styles: &resolver,
    };

    let mut workbook = Workbook {
        sheets: Vec::with_capacity(sheet_infos.len()),
        date1904,
    };
    for info in &sheet_infos {
        workbook.sheets.push(parse_sheet(&mut archive, info, &ctx)?);
    }

    log::debug!(
        "parsed workbook: {} sheet(s), {} shared string(s), {} cell format(s)",
        workbook.sheets.len(),
        shared_strings.len(),
        stylesheet.cell_xfs.len()
    );

    Ok(workbook)
}
