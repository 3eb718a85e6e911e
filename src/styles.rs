//! Parsing of xl/styles.xml
//!
//! Collects number formats, fonts, fills, borders and cell formats (xf) as
//! raw records. Colors stay unresolved here; see `parser::styles` for the
//! conversion into owned `CellStyle` values.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

use crate::color::normalize_argb;
use crate::error::Result;
use crate::types::{
    Alignment, CellXf, Protection, RawBorder, RawBorderSide, RawFill, RawFont, StyleSheet,
};
use crate::xml_helpers::{
    attr_bool_default, attr_i32, attr_string, attr_u32, attr_val, attr_val_f64, attr_val_u32,
    parse_color_attrs, toggle_val,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    IndexedColors,
    /// Sections whose children must not be mistaken for the ones above
    /// (`cellStyleXfs`, `dxfs`, `extLst`).
    Ignored,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
    Diagonal,
}

fn side_of(name: &[u8]) -> Option<Side> {
    match name {
        b"left" | b"start" => Some(Side::Left),
        b"right" | b"end" => Some(Side::Right),
        b"top" => Some(Side::Top),
        b"bottom" => Some(Side::Bottom),
        b"diagonal" => Some(Side::Diagonal),
        _ => None,
    }
}

fn side_slot(border: &mut RawBorder, side: Side) -> &mut Option<RawBorderSide> {
    match side {
        Side::Left => &mut border.left,
        Side::Right => &mut border.right,
        Side::Top => &mut border.top,
        Side::Bottom => &mut border.bottom,
        Side::Diagonal => &mut border.diagonal,
    }
}

/// Apply a font child element (`<b/>`, `<sz val="11"/>`, ...) to a raw font.
///
/// Shared with the rich-text run parser, whose `<rPr>` uses the same
/// vocabulary (with `rFont` in place of `name`).
pub fn apply_font_child(font: &mut RawFont, e: &BytesStart) {
    match e.local_name().as_ref() {
        b"b" => font.bold = toggle_val(e),
        b"i" => font.italic = toggle_val(e),
        b"strike" => font.strikethrough = toggle_val(e),
        b"u" => {
            let val = attr_val(e).unwrap_or_else(|| "single".to_string());
            font.underline = (val != "none").then_some(val);
        }
        b"sz" => font.size = attr_val_f64(e),
        b"name" | b"rFont" => font.name = attr_val(e),
        b"family" => font.family = attr_val_u32(e),
        b"charset" => font.charset = attr_val_u32(e),
        b"vertAlign" => font.vert_align = attr_val(e),
        b"color" => font.color = Some(parse_color_attrs(e)),
        _ => {}
    }
}

fn parse_alignment(e: &BytesStart) -> Alignment {
    Alignment {
        horizontal: attr_string(e, b"horizontal"),
        vertical: attr_string(e, b"vertical"),
        wrap_text: attr_bool_default(e, b"wrapText", false),
        shrink_to_fit: attr_bool_default(e, b"shrinkToFit", false),
        indent: attr_u32(e, b"indent").filter(|i| *i > 0),
        text_rotation: attr_i32(e, b"textRotation").filter(|r| *r != 0),
        reading_order: attr_u32(e, b"readingOrder")
            .and_then(|r| u8::try_from(r).ok())
            .filter(|r| *r != 0),
    }
}

fn parse_protection(e: &BytesStart) -> Protection {
    Protection {
        locked: attr_bool_default(e, b"locked", true),
        hidden: attr_bool_default(e, b"hidden", false),
    }
}

fn parse_xf(e: &BytesStart) -> CellXf {
    CellXf {
        font_id: attr_u32(e, b"fontId"),
        fill_id: attr_u32(e, b"fillId"),
        border_id: attr_u32(e, b"borderId"),
        num_fmt_id: attr_u32(e, b"numFmtId"),
        alignment: None,
        protection: None,
    }
}

/// Parse styles.xml content
#[allow(clippy::too_many_lines)]
pub fn parse_styles<R: BufRead>(reader: R) -> Result<StyleSheet> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut stylesheet = StyleSheet::default();
    let mut buf = Vec::new();

    let mut section = Section::None;
    let mut current_font: Option<RawFont> = None;
    let mut current_fill: Option<RawFill> = None;
    let mut current_border: Option<RawBorder> = None;
    let mut current_side: Option<Side> = None;
    let mut current_xf: Option<CellXf> = None;
    let mut indexed_colors: Vec<String> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();

                match (section, name.as_ref()) {
                    (Section::None, b"numFmts") => section = Section::NumFmts,
                    (Section::None, b"fonts") => section = Section::Fonts,
                    (Section::None, b"fills") => section = Section::Fills,
                    (Section::None, b"borders") => section = Section::Borders,
                    (Section::None, b"cellXfs") => section = Section::CellXfs,
                    (Section::None, b"indexedColors") => section = Section::IndexedColors,
                    (Section::None, b"cellStyleXfs" | b"dxfs" | b"extLst") if !is_empty => {
                        section = Section::Ignored;
                    }

                    (Section::NumFmts, b"numFmt") => {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            stylesheet.num_fmts.push((id, code));
                        }
                    }

                    (Section::IndexedColors, b"rgbColor") => {
                        if let Some(rgb) = attr_string(e, b"rgb").and_then(|s| normalize_argb(&s))
                        {
                            indexed_colors.push(rgb);
                        }
                    }

                    (Section::Fonts, b"font") => {
                        if is_empty {
                            stylesheet.fonts.push(RawFont::default());
                        } else {
                            current_font = Some(RawFont::default());
                        }
                    }
                    (Section::Fonts, _) => {
                        if let Some(ref mut font) = current_font {
                            apply_font_child(font, e);
                        }
                    }

                    (Section::Fills, b"fill") => {
                        if is_empty {
                            stylesheet.fills.push(RawFill::default());
                        } else {
                            current_fill = Some(RawFill::default());
                        }
                    }
                    (Section::Fills, b"patternFill") => {
                        if let Some(ref mut fill) = current_fill {
                            fill.pattern_type = attr_string(e, b"patternType");
                        }
                    }
                    (Section::Fills, b"fgColor") => {
                        if let Some(ref mut fill) = current_fill {
                            fill.fg_color = Some(parse_color_attrs(e));
                        }
                    }
                    (Section::Fills, b"bgColor") => {
                        if let Some(ref mut fill) = current_fill {
                            fill.bg_color = Some(parse_color_attrs(e));
                        }
                    }

                    (Section::Borders, b"border") => {
                        let border = RawBorder {
                            diagonal_up: attr_bool_default(e, b"diagonalUp", false),
                            diagonal_down: attr_bool_default(e, b"diagonalDown", false),
                            ..Default::default()
                        };
                        if is_empty {
                            stylesheet.borders.push(border);
                        } else {
                            current_border = Some(border);
                        }
                    }
                    (Section::Borders, b"color") => {
                        if let (Some(border), Some(side)) = (current_border.as_mut(), current_side)
                        {
                            if let Some(s) = side_slot(border, side) {
                                s.color = Some(parse_color_attrs(e));
                            }
                        }
                    }
                    (Section::Borders, other) => {
                        if let (Some(border), Some(side)) = (current_border.as_mut(), side_of(other))
                        {
                            // A side without a style attribute draws nothing
                            if let Some(style) = attr_string(e, b"style").filter(|s| s != "none") {
                                *side_slot(border, side) = Some(RawBorderSide { style, color: None });
                            }
                            if !is_empty {
                                current_side = Some(side);
                            }
                        }
                    }

                    (Section::CellXfs, b"xf") => {
                        let xf = parse_xf(e);
                        if is_empty {
                            stylesheet.cell_xfs.push(xf);
                        } else {
                            current_xf = Some(xf);
                        }
                    }
                    (Section::CellXfs, b"alignment") => {
                        if let Some(ref mut xf) = current_xf {
                            xf.alignment = Some(parse_alignment(e));
                        }
                    }
                    (Section::CellXfs, b"protection") => {
                        if let Some(ref mut xf) = current_xf {
                            xf.protection = Some(parse_protection(e));
                        }
                    }

                    _ => {}
                }
            }

            Ok(Event::End(ref e)) => match (section, e.local_name().as_ref()) {
                (Section::Fonts, b"font") => {
                    if let Some(font) = current_font.take() {
                        stylesheet.fonts.push(font);
                    }
                }
                (Section::Fills, b"fill") => {
                    if let Some(fill) = current_fill.take() {
                        stylesheet.fills.push(fill);
                    }
                }
                (Section::Borders, b"border") => {
                    current_side = None;
                    if let Some(border) = current_border.take() {
                        stylesheet.borders.push(border);
                    }
                }
                (Section::Borders, other) if side_of(other).is_some() => current_side = None,
                (Section::CellXfs, b"xf") => {
                    if let Some(xf) = current_xf.take() {
                        stylesheet.cell_xfs.push(xf);
                    }
                }
                (
                    _,
                    b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" | b"indexedColors"
                    | b"cellStyleXfs" | b"dxfs" | b"extLst",
                ) => section = Section::None,
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }

        buf.clear();
    }

    if !indexed_colors.is_empty() {
        stylesheet.indexed_colors = Some(indexed_colors);
    }

    Ok(stylesheet)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="dd/mm/yyyy"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><u/><sz val="14"/><color theme="1"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border diagonalUp="1"><left style="thin"><color rgb="FF000000"/></left><right/><top style="double"/><bottom/><diagonal/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyAlignment="1">
      <alignment horizontal="center" vertical="top" wrapText="1"/>
      <protection locked="0"/>
    </xf>
    <xf numFmtId="3" fontId="0" fillId="0" borderId="0" xfId="0"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font><fill><patternFill><bgColor rgb="FFFF0000"/></patternFill></fill></dxf></dxfs>
</styleSheet>"#;

    fn parse() -> StyleSheet {
        parse_styles(STYLES.as_bytes()).unwrap()
    }

    #[test]
    fn collects_sections() {
        let sheet = parse();
        assert_eq!(sheet.num_fmts, vec![(164, "dd/mm/yyyy".to_string())]);
        assert_eq!(sheet.fonts.len(), 2);
        assert_eq!(sheet.fills.len(), 3);
        assert_eq!(sheet.borders.len(), 2);
        // cellStyleXfs must not leak into cellXfs
        assert_eq!(sheet.cell_xfs.len(), 3);
    }

    #[test]
    fn font_toggles() {
        let font = &parse().fonts[1];
        assert!(font.bold);
        assert!(!font.italic);
        assert_eq!(font.underline.as_deref(), Some("single"));
        assert_eq!(font.size, Some(14.0));
        assert_eq!(font.name.as_deref(), Some("Arial"));
        assert_eq!(font.color.as_ref().unwrap().theme, Some(1));
    }

    #[test]
    fn fill_colors() {
        let fill = &parse().fills[2];
        assert_eq!(fill.pattern_type.as_deref(), Some("solid"));
        assert_eq!(
            fill.fg_color.as_ref().unwrap().rgb.as_deref(),
            Some("FFFFFF00")
        );
        assert_eq!(fill.bg_color.as_ref().unwrap().indexed, Some(64));
    }

    #[test]
    fn border_sides_and_colors() {
        let border = &parse().borders[1];
        assert!(border.diagonal_up);
        let left = border.left.as_ref().unwrap();
        assert_eq!(left.style, "thin");
        assert_eq!(left.color.as_ref().unwrap().rgb.as_deref(), Some("FF000000"));
        assert_eq!(border.top.as_ref().unwrap().style, "double");
        assert!(border.top.as_ref().unwrap().color.is_none());
        assert!(border.right.is_none());
    }

    #[test]
    fn xf_children() {
        let xf = &parse().cell_xfs[1];
        assert_eq!(xf.num_fmt_id, Some(164));
        let align = xf.alignment.as_ref().unwrap();
        assert_eq!(align.horizontal.as_deref(), Some("center"));
        assert!(align.wrap_text);
        assert!(!xf.protection.unwrap().locked);
    }
}
