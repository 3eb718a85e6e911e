//! Test fixtures for generating valid XLSX files in memory.
//!
//! The builders write the parts a spreadsheet application would: shared
//! strings (plain and rich), a theme, indexed styles, column widths, row
//! heights, merges and formulas with cached values.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, StyleBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Sheet1")
//!             .cell("A1", "Item", Some(StyleBuilder::new().bold()))
//!             .cell("B2", 42.0, None),
//!     )
//!     .build();
//!
//! let workbook = xlmerge::parser::parse(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Style Builder
// ============================================================================

/// Builder for creating cell styles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    font_name: Option<String>,
    font_size: Option<f64>,
    font_color: Option<String>,
    font_theme: Option<u32>,
    bold: bool,
    italic: bool,
    bg_color: Option<String>,
    border: Option<(String, Option<String>)>,
    align_horizontal: Option<String>,
    wrap_text: bool,
    number_format: Option<String>,
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn font_name(mut self, name: &str) -> Self {
        self.font_name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Font color as `RRGGBB` or `AARRGGBB`, `#` optional.
    #[must_use]
    pub fn font_color(mut self, color: &str) -> Self {
        self.font_color = Some(normalize_color(color));
        self
    }

    /// Font color as a theme slot.
    #[must_use]
    pub fn font_theme(mut self, theme: u32) -> Self {
        self.font_theme = Some(theme);
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Solid background fill.
    #[must_use]
    pub fn bg_color(mut self, color: &str) -> Self {
        self.bg_color = Some(normalize_color(color));
        self
    }

    /// Same border on all four sides.
    #[must_use]
    pub fn border_all(mut self, style: &str, color: Option<&str>) -> Self {
        self.border = Some((style.to_string(), color.map(normalize_color)));
        self
    }

    #[must_use]
    pub fn align_horizontal(mut self, align: &str) -> Self {
        self.align_horizontal = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn wrap_text(mut self) -> Self {
        self.wrap_text = true;
        self
    }

    #[must_use]
    pub fn number_format(mut self, format: &str) -> Self {
        self.number_format = Some(format.to_string());
        self
    }
}

// ============================================================================
// Cell Values
// ============================================================================

/// One run of a rich string.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub color: Option<String>,
}

impl Run {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: false,
            color: None,
        }
    }

    pub fn bold(text: &str) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }

    pub fn colored(text: &str, color: &str) -> Self {
        Self {
            color: Some(normalize_color(color)),
            ..Self::plain(text)
        }
    }
}

/// Cell value types for the fixture builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Shared string.
    Text(String),
    /// Inline string (`t="inlineStr"`).
    Inline(String),
    /// Rich shared string.
    Rich(Vec<Run>),
    Number(f64),
    Bool(bool),
    Error(String),
    /// Plain formula with a cached numeric result.
    Formula { expr: String, cached: f64 },
    /// Formula with a cached string result.
    StrFormula { expr: String, cached: String },
    /// Master cell of a shared formula group.
    SharedMaster {
        expr: String,
        range: String,
        index: u32,
        cached: f64,
    },
    /// Follower cell of a shared formula group.
    SharedFollower { index: u32, cached: f64 },
    /// Style only.
    Empty,
}

impl Value {
    pub fn formula(expr: &str, cached: f64) -> Self {
        Value::Formula {
            expr: expr.to_string(),
            cached,
        }
    }

    pub fn inline(text: &str) -> Self {
        Value::Inline(text.to_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: Value,
    pub style: Option<StyleBuilder>,
}

#[derive(Debug, Clone)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: f64,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub hidden: bool,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<ColumnWidth>,
    pub row_heights: Vec<(u32, f64)>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn cell<V: Into<Value>>(mut self, cell_ref: &str, value: V, style: Option<StyleBuilder>) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    /// Add an empty cell with only a style.
    #[must_use]
    pub fn styled_cell(self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cell(cell_ref, Value::Empty, Some(style))
    }

    /// Fill a row from column A with plain values.
    #[must_use]
    pub fn row<V: Into<Value> + Clone>(mut self, row: u32, values: &[V]) -> Self {
        for (i, v) in values.iter().enumerate() {
            let cell_ref = format!("{}{}", col_num_to_letter(i as u32 + 1), row);
            self = self.cell(&cell_ref, v.clone(), None);
        }
        self
    }

    /// Add a merge range (e.g., "A1:B2").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push(ColumnWidth { min, max, width });
        self
    }

    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push((row, height));
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    date1904: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum SharedEntry {
    Plain(String),
    Rich(Vec<Run>),
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    #[must_use]
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut styles = StylesCollector::new();
        let mut shared: Vec<SharedEntry> = Vec::new();

        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Some(style) = &cell.style {
                    styles.add_style(style);
                }
                let entry = match &cell.value {
                    Value::Text(s) => Some(SharedEntry::Plain(s.clone())),
                    Value::Rich(runs) => Some(SharedEntry::Rich(runs.clone())),
                    _ => None,
                };
                if let Some(entry) = entry {
                    if !shared.contains(&entry) {
                        shared.push(entry);
                    }
                }
            }
        }

        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let mut put = |name: &str, body: String| {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        put("[Content_Types].xml", generate_content_types(self.sheets.len()));
        put("_rels/.rels", generate_rels());
        put("xl/_rels/workbook.xml.rels", generate_workbook_rels(self.sheets.len()));
        put("xl/workbook.xml", generate_workbook(&self.sheets, self.date1904));
        put("xl/styles.xml", styles.generate_styles_xml());
        put("xl/sharedStrings.xml", generate_shared_strings(&shared));
        put("xl/theme/theme1.xml", generate_theme());
        for (i, sheet) in self.sheets.iter().enumerate() {
            put(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                generate_sheet_xml(sheet, &shared, &styles),
            );
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// Styles Collector
// ============================================================================

/// Collects and deduplicates styles; xf 0 is the unstyled default.
#[derive(Debug, Default)]
struct StylesCollector {
    fonts: Vec<String>,
    fills: Vec<String>,
    borders: Vec<String>,
    num_fmts: Vec<(u32, String)>,
    cell_xfs: Vec<String>,
    style_map: Vec<(StyleBuilder, u32)>,
}

fn intern(table: &mut Vec<String>, xml: String) -> u32 {
    if let Some(i) = table.iter().position(|x| *x == xml) {
        return i as u32;
    }
    table.push(xml);
    (table.len() - 1) as u32
}

impl StylesCollector {
    fn new() -> Self {
        let mut collector = Self::default();
        collector
            .fonts
            .push(r#"<font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/></font>"#.to_string());
        collector
            .fills
            .push(r#"<fill><patternFill patternType="none"/></fill>"#.to_string());
        collector
            .fills
            .push(r#"<fill><patternFill patternType="gray125"/></fill>"#.to_string());
        collector
            .borders
            .push("<border><left/><right/><top/><bottom/><diagonal/></border>".to_string());
        collector
            .cell_xfs
            .push(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#.to_string());
        collector
    }

    fn add_style(&mut self, style: &StyleBuilder) -> u32 {
        if let Some((_, idx)) = self.style_map.iter().find(|(s, _)| s == style) {
            return *idx;
        }

        let mut font = String::from("<font>");
        if style.bold {
            font.push_str("<b/>");
        }
        if style.italic {
            font.push_str("<i/>");
        }
        let _ = write!(font, r#"<sz val="{}"/>"#, style.font_size.unwrap_or(11.0));
        if let Some(c) = &style.font_color {
            let _ = write!(font, r#"<color rgb="{c}"/>"#);
        } else if let Some(t) = style.font_theme {
            let _ = write!(font, r#"<color theme="{t}"/>"#);
        }
        let _ = write!(
            font,
            r#"<name val="{}"/></font>"#,
            escape_xml(style.font_name.as_deref().unwrap_or("Calibri"))
        );
        let font_id = intern(&mut self.fonts, font);

        let fill_id = match &style.bg_color {
            Some(c) => intern(
                &mut self.fills,
                format!(r#"<fill><patternFill patternType="solid"><fgColor rgb="{c}"/><bgColor indexed="64"/></patternFill></fill>"#),
            ),
            None => 0,
        };

        let border_id = match &style.border {
            Some((kind, color)) => {
                let side = |tag: &str| match color {
                    Some(c) => format!(r#"<{tag} style="{kind}"><color rgb="{c}"/></{tag}>"#),
                    None => format!(r#"<{tag} style="{kind}"><color auto="1"/></{tag}>"#),
                };
                let xml = format!(
                    "<border>{}{}{}{}<diagonal/></border>",
                    side("left"),
                    side("right"),
                    side("top"),
                    side("bottom")
                );
                intern(&mut self.borders, xml)
            }
            None => 0,
        };

        let num_fmt_id = style.number_format.as_ref().map(|code| {
            get_builtin_format_id(code).unwrap_or_else(|| {
                if let Some((id, _)) = self.num_fmts.iter().find(|(_, c)| c == code) {
                    return *id;
                }
                let id = 164 + self.num_fmts.len() as u32;
                self.num_fmts.push((id, code.clone()));
                id
            })
        });

        let mut xf = format!(
            r#"<xf numFmtId="{}" fontId="{font_id}" fillId="{fill_id}" borderId="{border_id}" xfId="0" applyFont="1""#,
            num_fmt_id.unwrap_or(0)
        );
        if num_fmt_id.is_some() {
            xf.push_str(r#" applyNumberFormat="1""#);
        }
        if style.align_horizontal.is_some() || style.wrap_text {
            xf.push_str(r#" applyAlignment="1"><alignment"#);
            if let Some(h) = &style.align_horizontal {
                let _ = write!(xf, r#" horizontal="{h}""#);
            }
            if style.wrap_text {
                xf.push_str(r#" wrapText="1""#);
            }
            xf.push_str("/></xf>");
        } else {
            xf.push_str("/>");
        }

        self.cell_xfs.push(xf);
        let idx = (self.cell_xfs.len() - 1) as u32;
        self.style_map.push((style.clone(), idx));
        idx
    }

    fn get_style_index(&self, style: &StyleBuilder) -> u32 {
        self.style_map
            .iter()
            .find(|(s, _)| s == style)
            .map_or(0, |(_, idx)| *idx)
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
        if !self.num_fmts.is_empty() {
            let _ = write!(xml, r#"<numFmts count="{}">"#, self.num_fmts.len());
            for (id, code) in &self.num_fmts {
                let _ = write!(xml, r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#, escape_xml(code));
            }
            xml.push_str("</numFmts>");
        }
        let _ = write!(xml, r#"<fonts count="{}">{}</fonts>"#, self.fonts.len(), self.fonts.concat());
        let _ = write!(xml, r#"<fills count="{}">{}</fills>"#, self.fills.len(), self.fills.concat());
        let _ = write!(xml, r#"<borders count="{}">{}</borders>"#, self.borders.len(), self.borders.concat());
        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
        let _ = write!(xml, r#"<cellXfs count="{}">{}</cellXfs>"#, self.cell_xfs.len(), self.cell_xfs.concat());
        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str(r#"<dxfs count="0"/></styleSheet>"#);
        xml
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize color to ARGB format (without #).
fn normalize_color(color: &str) -> String {
    let color = color.trim_start_matches('#').to_uppercase();
    if color.len() == 6 {
        format!("FF{color}")
    } else {
        color
    }
}

fn get_builtin_format_id(format: &str) -> Option<u32> {
    match format {
        "General" => Some(0),
        "0" => Some(1),
        "0.00" => Some(2),
        "#,##0" => Some(3),
        "#,##0.00" => Some(4),
        "0%" => Some(9),
        "mm-dd-yy" | "m/d/yy" => Some(14),
        "@" => Some(49),
        _ => None,
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn col_num_to_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        col -= 1;
        letters.push(b'A' + (col % 26) as u8);
        col /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

/// Split "B12" into (row, col), both 1-based.
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let split = cell_ref.find(|c: char| c.is_ascii_digit()).unwrap();
    let (letters, digits) = cell_ref.split_at(split);
    let col = letters
        .bytes()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b - b'A' + 1));
    (digits.parse().unwrap(), col)
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

/// Sheets are rId1..rIdN, followed by styles, shared strings and theme.
fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    let ns = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{i}" Type="{ns}/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        );
    }
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{ns}/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    );
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{ns}/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 2
    );
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{ns}/theme" Target="theme/theme1.xml"/>"#,
        sheet_count + 3
    );
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder], date1904: bool) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    if date1904 {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        let state = if sheet.hidden { r#" state="hidden""# } else { "" };
        let _ = write!(
            xml,
            r#"<sheet name="{}" sheetId="{}"{state} r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        );
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn run_xml(run: &Run) -> String {
    let mut xml = String::from("<r>");
    if run.bold || run.color.is_some() {
        xml.push_str("<rPr>");
        if run.bold {
            xml.push_str("<b/>");
        }
        xml.push_str(r#"<sz val="11"/>"#);
        if let Some(c) = &run.color {
            let _ = write!(xml, r#"<color rgb="{c}"/>"#);
        }
        xml.push_str(r#"<rFont val="Calibri"/></rPr>"#);
    }
    let _ = write!(
        xml,
        r#"<t xml:space="preserve">{}</t></r>"#,
        escape_xml(&run.text)
    );
    xml
}

fn generate_shared_strings(strings: &[SharedEntry]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    let _ = write!(
        xml,
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for entry in strings {
        xml.push_str("<si>");
        match entry {
            SharedEntry::Plain(s) => {
                let _ = write!(xml, r#"<t xml:space="preserve">{}</t>"#, escape_xml(s));
            }
            SharedEntry::Rich(runs) => {
                for run in runs {
                    xml.push_str(&run_xml(run));
                }
            }
        }
        xml.push_str("</si>");
    }
    xml.push_str("</sst>");
    xml
}

/// Office 2013 default palette.
fn generate_theme() -> String {
    let colors = [
        ("dk1", r#"<a:sysClr val="windowText" lastClr="000000"/>"#),
        ("lt1", r#"<a:sysClr val="window" lastClr="FFFFFF"/>"#),
        ("dk2", r#"<a:srgbClr val="44546A"/>"#),
        ("lt2", r#"<a:srgbClr val="E7E6E6"/>"#),
        ("accent1", r#"<a:srgbClr val="4472C4"/>"#),
        ("accent2", r#"<a:srgbClr val="ED7D31"/>"#),
        ("accent3", r#"<a:srgbClr val="A5A5A5"/>"#),
        ("accent4", r#"<a:srgbClr val="FFC000"/>"#),
        ("accent5", r#"<a:srgbClr val="5B9BD5"/>"#),
        ("accent6", r#"<a:srgbClr val="70AD47"/>"#),
        ("hlink", r#"<a:srgbClr val="0563C1"/>"#),
        ("folHlink", r#"<a:srgbClr val="954F72"/>"#),
    ];
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office">"#);
    for (tag, color) in colors {
        let _ = write!(xml, "<a:{tag}>{color}</a:{tag}>");
    }
    xml.push_str("</a:clrScheme></a:themeElements></a:theme>");
    xml
}

fn cell_xml(entry: &CellEntry, shared: &[SharedEntry], styles: &StylesCollector) -> String {
    let mut xml = format!(r#"<c r="{}""#, entry.cell_ref);
    if let Some(style) = &entry.style {
        let _ = write!(xml, r#" s="{}""#, styles.get_style_index(style));
    }
    let shared_index = |e: SharedEntry| shared.iter().position(|s| *s == e).unwrap();
    match &entry.value {
        Value::Text(s) => {
            let idx = shared_index(SharedEntry::Plain(s.clone()));
            let _ = write!(xml, r#" t="s"><v>{idx}</v></c>"#);
        }
        Value::Rich(runs) => {
            let idx = shared_index(SharedEntry::Rich(runs.clone()));
            let _ = write!(xml, r#" t="s"><v>{idx}</v></c>"#);
        }
        Value::Inline(s) => {
            let _ = write!(
                xml,
                r#" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                escape_xml(s)
            );
        }
        Value::Number(n) => {
            let _ = write!(xml, "><v>{n}</v></c>");
        }
        Value::Bool(b) => {
            let _ = write!(xml, r#" t="b"><v>{}</v></c>"#, u8::from(*b));
        }
        Value::Error(e) => {
            let _ = write!(xml, r#" t="e"><v>{}</v></c>"#, escape_xml(e));
        }
        Value::Formula { expr, cached } => {
            let _ = write!(xml, "><f>{}</f><v>{cached}</v></c>", escape_xml(expr));
        }
        Value::StrFormula { expr, cached } => {
            let _ = write!(
                xml,
                r#" t="str"><f>{}</f><v>{}</v></c>"#,
                escape_xml(expr),
                escape_xml(cached)
            );
        }
        Value::SharedMaster {
            expr,
            range,
            index,
            cached,
        } => {
            let _ = write!(
                xml,
                r#"><f t="shared" ref="{range}" si="{index}">{}</f><v>{cached}</v></c>"#,
                escape_xml(expr)
            );
        }
        Value::SharedFollower { index, cached } => {
            let _ = write!(xml, r#"><f t="shared" si="{index}"/><v>{cached}</v></c>"#);
        }
        Value::Empty => xml.push_str("/>"),
    }
    xml
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared: &[SharedEntry], styles: &StylesCollector) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for cw in &sheet.col_widths {
            let _ = write!(
                xml,
                r#"<col min="{}" max="{}" width="{}" customWidth="1"/>"#,
                cw.min, cw.max, cw.width
            );
        }
        xml.push_str("</cols>");
    }

    // Group cells by row, keeping row order
    let mut rows: std::collections::BTreeMap<u32, Vec<(u32, &CellEntry)>> = Default::default();
    for entry in &sheet.cells {
        let (row, col) = parse_cell_ref(&entry.cell_ref);
        rows.entry(row).or_default().push((col, entry));
    }
    for (row, _) in &sheet.row_heights {
        rows.entry(*row).or_default();
    }

    xml.push_str("<sheetData>");
    for (row, mut cells) in rows {
        cells.sort_by_key(|(col, _)| *col);
        let _ = write!(xml, r#"<row r="{row}""#);
        if let Some((_, h)) = sheet.row_heights.iter().find(|(r, _)| *r == row) {
            let _ = write!(xml, r#" ht="{h}" customHeight="1""#);
        }
        xml.push('>');
        for (_, entry) in cells {
            xml.push_str(&cell_xml(entry, shared, styles));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        let _ = write!(xml, r#"<mergeCells count="{}">"#, sheet.merges.len());
        for range in &sheet.merges {
            let _ = write!(xml, r#"<mergeCell ref="{range}"/>"#);
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Convenience Functions
// ============================================================================

/// Workbook with one sheet.
pub fn single_sheet(sheet: SheetBuilder) -> Vec<u8> {
    XlsxBuilder::new().sheet(sheet).build()
}

/// A typical monthly report: title row, table header, data rows, a TOTAL
/// row, a blank row and a signature block.
pub fn report(name: &str, items: &[(&str, f64)]) -> SheetBuilder {
    let mut sheet = SheetBuilder::new(name)
        .cell("A1", format!("Report {name}"), Some(StyleBuilder::new().bold().font_size(14.0)))
        .merge("A1:C1")
        .cell("A2", "Item", Some(StyleBuilder::new().bold().bg_color("DDEBF7")))
        .cell("B2", "Qty", Some(StyleBuilder::new().bold().bg_color("DDEBF7")))
        .col_width(1, 1, 24.0)
        .col_width(2, 2, 12.5);
    let mut row = 3;
    let mut total = 0.0;
    for (item, qty) in items {
        sheet = sheet
            .cell(&format!("A{row}"), *item, None)
            .cell(&format!("B{row}"), *qty, Some(StyleBuilder::new().number_format("#,##0")));
        total += qty;
        row += 1;
    }
    sheet
        .cell(&format!("A{row}"), "TOTAL", Some(StyleBuilder::new().bold()))
        .cell(
            &format!("B{row}"),
            Value::formula(&format!("SUM(B3:B{})", row - 1), total),
            Some(StyleBuilder::new().bold().number_format("#,##0")),
        )
        .cell(&format!("A{}", row + 2), "Người lập", None)
        .cell(&format!("B{}", row + 2), "Người nhận", None)
        .cell(&format!("A{}", row + 3), format!("{name} clerk"), None)
        .merge(&format!("A{0}:B{0}", row + 3))
}
