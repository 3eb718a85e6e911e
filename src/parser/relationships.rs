//! Package-level parts: workbook relationships, sheet list, theme palette,
//! shared strings and the stylesheet.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::color::DEFAULT_THEME_COLORS;
use crate::error::Result;
use crate::rich_text::parse_string_item;
use crate::styles::parse_styles;
use crate::types::{SharedString, SheetState, StyleSheet};
use crate::xml_helpers::{attr_string, attr_string_local};

use super::styles::StyleResolver;
use super::worksheet::SheetInfo;

/// Workbook relationships parsed from xl/_rels/workbook.xml.rels
///
/// Paths are resolved relative to the xl/ directory and stored as full paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// rId -> full path, e.g. "rId1" -> "xl/worksheets/sheet1.xml"
    pub worksheets: HashMap<String, String>,
    pub shared_strings: Option<String>,
    pub styles: Option<String>,
    pub theme: Option<String>,
}

fn resolve_target(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else {
        format!("xl/{}", target.trim_start_matches("./"))
    }
}

/// Parse workbook relationships from xl/_rels/workbook.xml.rels
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<WorkbookRelationships> {
    let mut rels = WorkbookRelationships::default();

    let Ok(file) = archive.by_name("xl/_rels/workbook.xml.rels") else {
        return Ok(rels);
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_string(e, b"Id").unwrap_or_default();
                let target = attr_string(e, b"Target").unwrap_or_default();
                let rel_type = attr_string(e, b"Type").unwrap_or_default();
                let full_path = resolve_target(&target);

                if target.is_empty() {
                    // nothing to point at
                } else if rel_type.ends_with("/worksheet") && !id.is_empty() {
                    rels.worksheets.insert(id, full_path);
                } else if rel_type.ends_with("/sharedStrings") {
                    rels.shared_strings = Some(full_path);
                } else if rel_type.ends_with("/styles") {
                    rels.styles = Some(full_path);
                } else if rel_type.ends_with("/theme") {
                    rels.theme = Some(full_path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Sheet names, paths and states from xl/workbook.xml, plus the date1904 flag.
///
/// Chart sheets and dialog sheets have no worksheet relationship and are left out.
pub(super) fn get_sheet_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<(Vec<SheetInfo>, bool)> {
    let file = archive.by_name("xl/workbook.xml")?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);

    let mut sheets = Vec::new();
    let mut date1904 = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    date1904 = attr_string(e, b"date1904")
                        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
                }
                b"sheet" => {
                    let name = attr_string(e, b"name").unwrap_or_default();
                    let state = match attr_string(e, b"state").as_deref() {
                        Some("hidden") => SheetState::Hidden,
                        Some("veryHidden") => SheetState::VeryHidden,
                        _ => SheetState::Visible,
                    };
                    // r:id is namespace prefixed
                    let r_id = attr_string_local(e, b"id").unwrap_or_default();

                    let path = if relationships.is_empty() {
                        Some(format!("xl/worksheets/sheet{}.xml", sheets.len() + 1))
                    } else {
                        relationships.get(&r_id).cloned()
                    };
                    if let (false, Some(path)) = (name.is_empty(), path) {
                        sheets.push(SheetInfo { name, path, state });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok((sheets, date1904))
}

/// Theme palette in slot order (lt1, dk1, lt2, dk2, accent1..6, hlink, folHlink).
///
/// Colors are keyed by element name since the part itself lists dk1 first.
/// An unreadable theme falls back to the default Office palette.
pub(super) fn parse_theme_colors<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    const SLOTS: [&[u8]; 12] = [
        b"lt1", b"dk1", b"lt2", b"dk2", b"accent1", b"accent2", b"accent3", b"accent4",
        b"accent5", b"accent6", b"hlink", b"folHlink",
    ];

    let mut colors: Vec<String> = DEFAULT_THEME_COLORS
        .iter()
        .map(ToString::to_string)
        .collect();

    let Ok(file) = archive.by_name(path.unwrap_or("xl/theme/theme1.xml")) else {
        return colors;
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);
    let mut buf = Vec::new();
    let mut in_clr_scheme = false;
    let mut slot: Option<usize> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if name == b"clrScheme" {
                    in_clr_scheme = true;
                } else if in_clr_scheme {
                    if let Some(idx) = SLOTS.iter().position(|s| *s == name) {
                        slot = Some(idx);
                    } else if name == b"srgbClr" || name == b"sysClr" {
                        let value = attr_string(e, b"lastClr").or_else(|| attr_string(e, b"val"));
                        if let (Some(idx), Some(value)) = (slot, value) {
                            if value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit()) {
                                if let Some(c) = colors.get_mut(idx) {
                                    *c = value.to_ascii_uppercase();
                                }
                            }
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"clrScheme" {
                    break;
                }
                if SLOTS.contains(&e.local_name().as_ref()) {
                    slot = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("theme part is malformed, using the default palette: {e}");
                return DEFAULT_THEME_COLORS.iter().map(ToString::to_string).collect();
            }
            _ => {}
        }
        buf.clear();
    }

    colors
}

/// Parse the shared string table; run fonts are resolved through `styles`.
///
/// A malformed table is an error: dropping one item would shift every later index.
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
    styles: &StyleResolver<'_>,
) -> Result<Vec<SharedString>> {
    let Ok(file) = archive.by_name(path.unwrap_or("xl/sharedStrings.xml")) else {
        return Ok(Vec::new());
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(parse_string_item(&mut xml, b"si", styles)?);
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(SharedString::Plain(String::new()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Parse stylesheet from styles file
pub(super) fn parse_stylesheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<StyleSheet> {
    let Ok(file) = archive.by_name(path.unwrap_or("xl/styles.xml")) else {
        return Ok(StyleSheet::default());
    };
    parse_styles(BufReader::new(file))
}
