//! Assemble the OPC package: content types, relationships, workbook part,
//! styles and one worksheet part per sheet, deflated into a ZIP archive.

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::Result;
use crate::types::{SheetState, Workbook};
use crate::xml_helpers::xml_escape;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub(crate) fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

pub(crate) fn root_rels_xml() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    let _ = write!(
        xml,
        r#"<Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/>"#
    );
    xml.push_str("</Relationships>");
    xml
}

/// `xl/_rels/workbook.xml.rels`: sheets take rId1..rIdN, styles follows.
pub(crate) fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{i}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        );
    }
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{REL_NS}/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    );
    xml.push_str("</Relationships>");
    xml
}

pub(crate) fn workbook_xml(workbook: &Workbook, active_tab: usize) -> String {
    let mut xml = String::from(XML_DECL);
    let _ = write!(
        xml,
        r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{REL_NS}">"#
    );
    if workbook.date1904 {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    let _ = write!(
        xml,
        r#"<bookViews><workbookView activeTab="{active_tab}"/></bookViews>"#
    );
    xml.push_str("<sheets>");
    for (i, sheet) in workbook.sheets.iter().enumerate() {
        let state = match sheet.state {
            SheetState::Visible => "",
            SheetState::Hidden => r#" state="hidden""#,
            SheetState::VeryHidden => r#" state="veryHidden""#,
        };
        let _ = write!(
            xml,
            r#"<sheet name="{}" sheetId="{}"{state} r:id="rId{}"/>"#,
            xml_escape(&sheet.name),
            i + 1,
            i + 1
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

/// Deflate the named parts into a ZIP archive, in order.
pub(crate) fn zip_parts(parts: &[(String, String)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, body) in parts {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(body.as_bytes())?;
    }
    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
