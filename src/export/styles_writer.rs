//! Style registry and `xl/styles.xml` generation.
//!
//! Cells carry owned [`CellStyle`] values; the registry interns them into the
//! indexed font / fill / border / numFmt / cellXfs tables the package needs.
//! Index 0 of every table is the workbook default, so an unstyled cell simply
//! omits its `s` attribute.

use std::fmt::Write as _;

use crate::types::{
    Alignment, Border, BorderSide, CellStyle, Color, Fill, Font, NumFmt, Protection,
};
use crate::xml_helpers::xml_escape;

/// First id available for workbook-defined number formats.
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

fn table_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Position of `item` in `table`, appending it first when missing.
fn intern<T: PartialEq + Clone>(table: &mut Vec<T>, item: &T) -> u32 {
    match table.iter().position(|existing| existing == item) {
        Some(idx) => table_index(idx),
        None => {
            table.push(item.clone());
            table_index(table.len() - 1)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct XfEntry {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    num_fmt_id: u32,
    alignment: Option<Alignment>,
    protection: Option<Protection>,
}

impl XfEntry {
    fn default_entry() -> Self {
        Self {
            font_id: 0,
            fill_id: 0,
            border_id: 0,
            num_fmt_id: 0,
            alignment: None,
            protection: None,
        }
    }
}

/// Interning table of every style used by the sheets being written.
#[derive(Debug)]
pub(crate) struct StyleRegistry {
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    num_fmts: Vec<(u32, String)>,
    xfs: Vec<XfEntry>,
    /// Source style of each xf, same indices as `xfs`.
    styles: Vec<CellStyle>,
}

impl StyleRegistry {
    pub(crate) fn new() -> Self {
        let default_font = Font {
            name: Some("Calibri".to_string()),
            size: Some(11.0),
            family: Some(2),
            ..Default::default()
        };
        let fill = |pattern: &str| Fill {
            pattern_type: pattern.to_string(),
            fg_color: None,
            bg_color: None,
        };
        Self {
            fonts: vec![default_font],
            // Both placeholder fills are required at positions 0 and 1
            fills: vec![fill("none"), fill("gray125")],
            borders: vec![Border::default()],
            num_fmts: Vec::new(),
            xfs: vec![XfEntry::default_entry()],
            styles: vec![CellStyle::default()],
        }
    }

    /// cellXfs index for `style`; 0 for an empty style.
    pub(crate) fn style_index(&mut self, style: &CellStyle) -> u32 {
        if style.is_empty() {
            return 0;
        }
        if let Some(idx) = self.styles.iter().position(|s| s == style) {
            return table_index(idx);
        }

        let entry = XfEntry {
            font_id: style.font.as_ref().map_or(0, |f| intern(&mut self.fonts, f)),
            fill_id: style.fill.as_ref().map_or(0, |f| intern(&mut self.fills, f)),
            border_id: style
                .border
                .as_ref()
                .map_or(0, |b| intern(&mut self.borders, b)),
            num_fmt_id: style.num_fmt.as_ref().map_or(0, |n| self.num_fmt_id(n)),
            alignment: style.alignment.clone(),
            protection: style.protection,
        };

        self.xfs.push(entry);
        self.styles.push(style.clone());
        table_index(self.xfs.len() - 1)
    }

    fn num_fmt_id(&mut self, fmt: &NumFmt) -> u32 {
        match fmt {
            NumFmt::Builtin(id) => *id,
            NumFmt::Custom(code) => {
                if let Some((id, _)) = self.num_fmts.iter().find(|(_, c)| c == code) {
                    return *id;
                }
                let id = FIRST_CUSTOM_NUM_FMT + table_index(self.num_fmts.len());
                self.num_fmts.push((id, code.clone()));
                id
            }
        }
    }

    pub(crate) fn xf_count(&self) -> usize {
        self.xfs.len()
    }

    /// Serialize the registry as `xl/styles.xml`.
    pub(crate) fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(2048);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.num_fmts.is_empty() {
            let _ = write!(xml, r#"<numFmts count="{}">"#, self.num_fmts.len());
            for (id, code) in &self.num_fmts {
                let _ = write!(
                    xml,
                    r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#,
                    xml_escape(code)
                );
            }
            xml.push_str("</numFmts>");
        }

        let _ = write!(xml, r#"<fonts count="{}">"#, self.fonts.len());
        for font in &self.fonts {
            xml.push_str("<font>");
            write_font_props(&mut xml, font, "name");
            xml.push_str("</font>");
        }
        xml.push_str("</fonts>");

        let _ = write!(xml, r#"<fills count="{}">"#, self.fills.len());
        for fill in &self.fills {
            write_fill(&mut xml, fill);
        }
        xml.push_str("</fills>");

        let _ = write!(xml, r#"<borders count="{}">"#, self.borders.len());
        for border in &self.borders {
            write_border(&mut xml, border);
        }
        xml.push_str("</borders>");

        xml.push_str(
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        );

        let _ = write!(xml, r#"<cellXfs count="{}">"#, self.xfs.len());
        for xf in &self.xfs {
            write_xf(&mut xml, xf);
        }
        xml.push_str("</cellXfs>");

        xml.push_str(
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
        );
        xml.push_str("</styleSheet>");
        xml
    }
}

fn color_attrs(color: &Color) -> String {
    match color {
        Color::Argb(argb) => format!(r#"rgb="{}""#, xml_escape(argb)),
        Color::Auto => r#"auto="1""#.to_string(),
    }
}

/// Font properties shared by `<font>` and rich-text `<rPr>`; the two differ
/// only in the element used for the face name.
pub(crate) fn write_font_props(xml: &mut String, font: &Font, name_tag: &str) {
    if font.bold {
        xml.push_str("<b/>");
    }
    if font.italic {
        xml.push_str("<i/>");
    }
    if font.strikethrough {
        xml.push_str("<strike/>");
    }
    match font.underline.as_deref() {
        Some("single") => xml.push_str("<u/>"),
        Some(kind) => {
            let _ = write!(xml, r#"<u val="{}"/>"#, xml_escape(kind));
        }
        None => {}
    }
    if let Some(va) = &font.vert_align {
        let _ = write!(xml, r#"<vertAlign val="{}"/>"#, xml_escape(va));
    }
    if let Some(size) = font.size {
        let _ = write!(xml, r#"<sz val="{size}"/>"#);
    }
    if let Some(color) = &font.color {
        let _ = write!(xml, "<color {}/>", color_attrs(color));
    }
    if let Some(name) = &font.name {
        let _ = write!(xml, r#"<{name_tag} val="{}"/>"#, xml_escape(name));
    }
    if let Some(family) = font.family {
        let _ = write!(xml, r#"<family val="{family}"/>"#);
    }
    if let Some(charset) = font.charset {
        let _ = write!(xml, r#"<charset val="{charset}"/>"#);
    }
}

fn write_fill(xml: &mut String, fill: &Fill) {
    xml.push_str("<fill>");
    if fill.fg_color.is_none() && fill.bg_color.is_none() {
        let _ = write!(
            xml,
            r#"<patternFill patternType="{}"/>"#,
            xml_escape(&fill.pattern_type)
        );
    } else {
        let _ = write!(
            xml,
            r#"<patternFill patternType="{}">"#,
            xml_escape(&fill.pattern_type)
        );
        if let Some(fg) = &fill.fg_color {
            let _ = write!(xml, "<fgColor {}/>", color_attrs(fg));
        }
        if let Some(bg) = &fill.bg_color {
            let _ = write!(xml, "<bgColor {}/>", color_attrs(bg));
        }
        xml.push_str("</patternFill>");
    }
    xml.push_str("</fill>");
}

fn write_border_side(xml: &mut String, tag: &str, side: Option<&BorderSide>) {
    match side {
        Some(side) => {
            let _ = write!(xml, r#"<{tag} style="{}">"#, xml_escape(&side.style));
            if let Some(color) = &side.color {
                let _ = write!(xml, "<color {}/>", color_attrs(color));
            }
            let _ = write!(xml, "</{tag}>");
        }
        None => {
            let _ = write!(xml, "<{tag}/>");
        }
    }
}

fn write_border(xml: &mut String, border: &Border) {
    xml.push_str("<border");
    if border.diagonal_up {
        xml.push_str(r#" diagonalUp="1""#);
    }
    if border.diagonal_down {
        xml.push_str(r#" diagonalDown="1""#);
    }
    xml.push('>');
    write_border_side(xml, "left", border.left.as_ref());
    write_border_side(xml, "right", border.right.as_ref());
    write_border_side(xml, "top", border.top.as_ref());
    write_border_side(xml, "bottom", border.bottom.as_ref());
    write_border_side(xml, "diagonal", border.diagonal.as_ref());
    xml.push_str("</border>");
}

fn write_alignment(xml: &mut String, align: &Alignment) {
    xml.push_str("<alignment");
    if let Some(h) = &align.horizontal {
        let _ = write!(xml, r#" horizontal="{}""#, xml_escape(h));
    }
    if let Some(v) = &align.vertical {
        let _ = write!(xml, r#" vertical="{}""#, xml_escape(v));
    }
    if let Some(rotation) = align.text_rotation {
        let _ = write!(xml, r#" textRotation="{rotation}""#);
    }
    if align.wrap_text {
        xml.push_str(r#" wrapText="1""#);
    }
    if let Some(indent) = align.indent {
        let _ = write!(xml, r#" indent="{indent}""#);
    }
    if align.shrink_to_fit {
        xml.push_str(r#" shrinkToFit="1""#);
    }
    if let Some(order) = align.reading_order {
        let _ = write!(xml, r#" readingOrder="{order}""#);
    }
    xml.push_str("/>");
}

fn write_xf(xml: &mut String, xf: &XfEntry) {
    let _ = write!(
        xml,
        r#"<xf numFmtId="{}" fontId="{}" fillId="{}" borderId="{}" xfId="0""#,
        xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id
    );
    if xf.num_fmt_id > 0 {
        xml.push_str(r#" applyNumberFormat="1""#);
    }
    if xf.font_id > 0 {
        xml.push_str(r#" applyFont="1""#);
    }
    if xf.fill_id > 0 {
        xml.push_str(r#" applyFill="1""#);
    }
    if xf.border_id > 0 {
        xml.push_str(r#" applyBorder="1""#);
    }
    if xf.alignment.is_some() {
        xml.push_str(r#" applyAlignment="1""#);
    }
    if xf.protection.is_some() {
        xml.push_str(r#" applyProtection="1""#);
    }

    if xf.alignment.is_none() && xf.protection.is_none() {
        xml.push_str("/>");
        return;
    }
    xml.push('>');
    if let Some(align) = &xf.alignment {
        write_alignment(xml, align);
    }
    if let Some(protection) = &xf.protection {
        let _ = write!(
            xml,
            r#"<protection locked="{}" hidden="{}"/>"#,
            u8::from(protection.locked),
            u8::from(protection.hidden)
        );
    }
    xml.push_str("</xf>");
}
