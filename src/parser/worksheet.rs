//! Worksheet parsing - parses individual sheet XML into Sheet structs.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_ref_bytes, parse_range_ref};
use crate::error::Result;
use crate::rich_text::{parse_string_item, read_text, unexpected_eof};
use crate::types::{
    Cell, CellValue, ColumnWidth, Formula, FormulaKind, Scalar, SharedString, Sheet, SheetState,
};
use crate::xml_helpers::{attr_bool_default, attr_f64, attr_string, attr_u32};

use super::styles::StyleResolver;

/// Highest column index in a worksheet (XFD).
const MAX_COL: u32 = 16_384;

/// Sheet metadata from workbook.xml
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
    pub state: SheetState,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Number,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Number,
    }
}

/// Everything read from inside one `<c>` element.
#[derive(Default)]
struct RawCell {
    value: Option<String>,
    inline: Option<SharedString>,
    formula: Option<(String, FormulaKind)>,
}

/// Shared workbook-level lookups a sheet needs while parsing.
pub(super) struct SheetContext<'a> {
    pub shared_strings: &'a [SharedString],
    pub styles: &'a StyleResolver<'a>,
}

fn shared_to_value(s: &SharedString) -> CellValue {
    match s {
        SharedString::Plain(text) => CellValue::Text(text.clone()),
        SharedString::Rich(runs) => CellValue::RichText(runs.clone()),
    }
}

/// Interpret the `<v>` payload according to the cell type.
fn scalar_value(raw: &str, tag: CellTypeTag) -> Scalar {
    match tag {
        CellTypeTag::Bool => Scalar::Bool(matches!(raw.trim(), "1" | "true" | "TRUE")),
        CellTypeTag::Error => Scalar::Error(raw.to_string()),
        CellTypeTag::Date => Scalar::IsoDate(raw.to_string()),
        CellTypeTag::Number => raw
            .trim()
            .parse::<f64>()
            .map_or_else(|_| Scalar::Text(raw.to_string()), Scalar::Number),
        CellTypeTag::Shared | CellTypeTag::Inline | CellTypeTag::Str => {
            Scalar::Text(raw.to_string())
        }
    }
}

fn build_value(raw: RawCell, tag: CellTypeTag, ctx: &SheetContext<'_>) -> Option<CellValue> {
    let shared = || {
        raw.value
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|idx| ctx.shared_strings.get(idx))
    };

    if let Some((expr, kind)) = raw.formula.clone() {
        let cached = match tag {
            CellTypeTag::Shared => shared().map(|s| Scalar::Text(s.plain_text())),
            CellTypeTag::Inline => raw.inline.as_ref().map(|s| Scalar::Text(s.plain_text())),
            _ => raw.value.as_deref().map(|v| scalar_value(v, tag)),
        };
        return Some(CellValue::Formula(Formula { expr, kind, cached }));
    }

    match tag {
        CellTypeTag::Shared => shared().map(shared_to_value),
        CellTypeTag::Inline => raw
            .inline
            .as_ref()
            .map(shared_to_value)
            .or_else(|| raw.value.map(CellValue::Text)),
        _ => raw.value.as_deref().map(|v| scalar_value(v, tag).into()),
    }
}

fn formula_kind(e: &BytesStart) -> FormulaKind {
    match attr_string(e, b"t").as_deref() {
        Some("shared") => FormulaKind::Shared {
            index: attr_u32(e, b"si").unwrap_or(0),
            range: attr_string(e, b"ref"),
        },
        Some("array") => attr_string(e, b"ref")
            .map_or(FormulaKind::Normal, |range| FormulaKind::Array { range }),
        _ => FormulaKind::Normal,
    }
}

/// Read the children of a `<c>` start element up to `</c>`.
fn read_cell_children<R: BufRead>(
    xml: &mut Reader<R>,
    ctx: &SheetContext<'_>,
) -> Result<RawCell> {
    let mut raw = RawCell::default();
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"v" => raw.value = Some(read_text(xml, b"v")?),
                b"f" => {
                    let kind = formula_kind(e);
                    raw.formula = Some((read_text(xml, b"f")?, kind));
                }
                b"is" => raw.inline = Some(parse_string_item(xml, b"is", ctx.styles)?),
                _ => {}
            },
            // Shared formula followers carry no expression text
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"f" => {
                raw.formula = Some((String::new(), formula_kind(e)));
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"c" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(b"c")),
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(raw)
}

/// Parse a single worksheet
#[allow(clippy::too_many_lines)]
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    ctx: &SheetContext<'_>,
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut sheet = Sheet::new(info.name.clone());
    sheet.state = info.state;

    let mut buf = Vec::new();
    let mut current_row: u32 = 0;
    let mut next_col: u32 = 1;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"sheetFormatPr" => {
                        sheet.default_row_height = attr_f64(e, b"defaultRowHeight");
                        sheet.default_col_width = attr_f64(e, b"defaultColWidth");
                    }

                    b"row" => {
                        current_row = attr_u32(e, b"r").unwrap_or(current_row + 1);
                        next_col = 1;
                        let height = attr_f64(e, b"ht");
                        let hidden = attr_bool_default(e, b"hidden", false);
                        if height.is_some() || hidden {
                            let row = sheet.row_mut(current_row);
                            row.height = height;
                            row.hidden = hidden;
                        }
                    }

                    b"c" => {
                        let (row, col) = attr_string(e, b"r")
                            .and_then(|r| parse_cell_ref_bytes(r.as_bytes()))
                            .unwrap_or((current_row, next_col));
                        next_col = col + 1;
                        let tag = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"t")
                            .map_or(CellTypeTag::Number, |a| parse_cell_type_tag(&a.value));
                        let style = attr_u32(e, b"s").and_then(|idx| ctx.styles.cell_style(idx));

                        let raw = if is_start_event {
                            read_cell_children(&mut xml, ctx)?
                        } else {
                            RawCell::default()
                        };
                        let value = build_value(raw, tag, ctx);

                        if row >= 1 && (value.is_some() || style.is_some()) {
                            *sheet.cell_mut(row, col) = Cell { value, style };
                        }
                    }

                    b"col" => {
                        let min = attr_u32(e, b"min").unwrap_or(0).max(1);
                        let max = attr_u32(e, b"max").unwrap_or(min).min(MAX_COL);
                        if let Some(width) = attr_f64(e, b"width") {
                            let hidden = attr_bool_default(e, b"hidden", false);
                            for col in min..=max {
                                sheet.col_widths.insert(col, ColumnWidth { width, hidden });
                            }
                        }
                    }

                    b"mergeCell" => match attr_string(e, b"ref") {
                        Some(reference) => match parse_range_ref(&reference) {
                            Some(range) => sheet.merges.push(range),
                            None => log::debug!(
                                "sheet '{}': ignoring malformed merge range '{reference}'",
                                info.name
                            ),
                        },
                        None => log::debug!("sheet '{}': mergeCell without ref", info.name),
                    },

                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheet)
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
    use test_case::test_case;

    #[test_case(b"s", CellTypeTag::Shared)]
    #[test_case(b"inlineStr", CellTypeTag::Inline)]
    #[test_case(b"str", CellTypeTag::Str)]
    #[test_case(b"b", CellTypeTag::Bool)]
    #[test_case(b"e", CellTypeTag::Error)]
    #[test_case(b"d", CellTypeTag::Date)]
    #[test_case(b"n", CellTypeTag::Number)]
    fn type_tags(raw: &[u8], expected: CellTypeTag) {
        assert_eq!(parse_cell_type_tag(raw), expected);
    }

    #[test]
    fn scalar_interpretation() {
        assert_eq!(scalar_value("1", CellTypeTag::Bool), Scalar::Bool(true));
        assert_eq!(scalar_value("0", CellTypeTag::Bool), Scalar::Bool(false));
        assert_eq!(scalar_value("2.5", CellTypeTag::Number), Scalar::Number(2.5));
        assert_eq!(
            scalar_value("#N/A", CellTypeTag::Error),
            Scalar::Error("#N/A".into())
        );
        // A non-numeric payload on a numeric cell survives as text
        assert_eq!(
            scalar_value("abc", CellTypeTag::Number),
            Scalar::Text("abc".into())
        );
    }

    fn read_cell(xml_str: &str) -> Result<RawCell> {
        let stylesheet = crate::types::StyleSheet::default();
        let resolver = StyleResolver::new(&stylesheet, &[]);
        let ctx = SheetContext {
            shared_strings: &[],
            styles: &resolver,
        };
        let mut reader = Reader::from_reader(xml_str.as_bytes());
        reader.trim_text(false);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"c" => break,
                Ok(Event::Eof) => panic!("no <c> element"),
                Err(e) => panic!("Error: {e:?}"),
                _ => {}
            }
            buf.clear();
        }
        read_cell_children(&mut reader, &ctx)
    }

    #[test]
    fn cell_children_are_read() {
        let raw = read_cell(r#"<c r="A1"><f>B1*2</f><v>4</v></c>"#).unwrap();
        assert_eq!(raw.value.as_deref(), Some("4"));
        assert_eq!(raw.formula.map(|(expr, _)| expr).as_deref(), Some("B1*2"));
    }

    #[test]
    fn broken_cell_markup_is_an_error() {
        assert!(read_cell(r#"<c r="A1"><v>1</bogus></c>"#).is_err());
        assert!(read_cell(r#"<c r="A1"><v>1</v>"#).is_err());
        assert!(read_cell(r#"<c r="A1" t="inlineStr"><is><t>x</t></c>"#).is_err());
    }
}
