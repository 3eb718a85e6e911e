//! Rich text parsing module
//! Parses `<si>` (shared strings) and `<is>` (inline strings) items into
//! plain text or a list of formatted runs.

use crate::error::{Result, XlmergeError};
use crate::parser::styles::StyleResolver;
use crate::styles::apply_font_child;
use crate::types::{RawFont, RichTextRun, SharedString};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;

/// Parse a string item up to the closing `end_tag` (`si` or `is`).
///
/// Structure:
/// ```xml
/// <si>
///   <t>Plain text</t>  -- OR --
///   <r><rPr>...</rPr><t>Styled</t></r>
///   <r><t>Normal</t></r>
///   <rPh sb="0" eb="1"><t>phonetic hint, never part of the value</t></rPh>
/// </si>
/// ```
///
/// Malformed XML or a missing end tag is an error rather than a short item.
pub(crate) fn parse_string_item<R: BufRead>(
    xml: &mut Reader<R>,
    end_tag: &[u8],
    styles: &StyleResolver<'_>,
) -> Result<SharedString> {
    let mut buf = Vec::new();
    let mut plain = String::new();
    let mut runs: Vec<RichTextRun> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => plain.push_str(&read_text(xml, b"t")?),
                b"r" => runs.push(parse_run(xml, styles)?),
                b"rPh" => skip_element(xml, b"rPh")?,
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == end_tag => break,
            Ok(Event::Eof) => return Err(unexpected_eof(end_tag)),
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(if runs.is_empty() {
        SharedString::Plain(plain)
    } else {
        SharedString::Rich(runs)
    })
}

/// Parse a single `<r>` run; the reader is positioned just after `<r>`.
fn parse_run<R: BufRead>(
    xml: &mut Reader<R>,
    styles: &StyleResolver<'_>,
) -> Result<RichTextRun> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut font: Option<RawFont> = None;
    let mut in_rpr = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"rPr" => {
                        font = Some(RawFont::default());
                        in_rpr = is_start;
                    }
                    b"t" if is_start => text.push_str(&read_text(xml, b"t")?),
                    _ if in_rpr => {
                        if let Some(ref mut f) = font {
                            apply_font_child(f, e);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"rPr" => in_rpr = false,
                b"r" => break,
                _ => {}
            },
            Ok(Event::Eof) => return Err(unexpected_eof(b"r")),
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(RichTextRun {
        text,
        font: font.map(|f| styles.font(&f)),
    })
}

/// Read the text content of an element up to its end tag.
pub(crate) fn read_text<R: BufRead>(xml: &mut Reader<R>, tag: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Text(ref e)) => text.push_str(&e.unescape()?),
            Ok(Event::CData(ref e)) => match std::str::from_utf8(e.as_ref()) {
                Ok(t) => text.push_str(t),
                Err(err) => {
                    return Err(XlmergeError::Parse(format!(
                        "CDATA in <{}>: {err}",
                        tag_name(tag)
                    )))
                }
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == tag => break,
            Ok(Event::Eof) => return Err(unexpected_eof(tag)),
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Consume events until the matching end tag.
pub(crate) fn skip_element<R: BufRead>(xml: &mut Reader<R>, tag: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1usize;
    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == tag => depth += 1,
            Ok(Event::End(ref e)) if e.local_name().as_ref() == tag => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Ok(Event::Eof) => return Err(unexpected_eof(tag)),
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
}

fn tag_name(tag: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(tag)
}

/// The part ended while `<tag>` was still open.
pub(crate) fn unexpected_eof(tag: &[u8]) -> XlmergeError {
    XlmergeError::Parse(format!("unexpected end of XML inside <{}>", tag_name(tag)))
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
    use crate::types::{Color, StyleSheet};

    fn try_parse_item(xml_str: &str) -> Result<SharedString> {
        let mut reader = Reader::from_reader(xml_str.as_bytes());
        // Whitespace in <t> elements is significant
        reader.trim_text(false);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"si" => break,
                Ok(Event::Eof) => panic!("Unexpected EOF"),
                Err(e) => panic!("Error: {e:?}"),
                _ => {}
            }
            buf.clear();
        }

        let stylesheet = StyleSheet::default();
        let resolver = StyleResolver::new(&stylesheet, &[]);
        parse_string_item(&mut reader, b"si", &resolver)
    }

    fn parse_item(xml_str: &str) -> SharedString {
        try_parse_item(xml_str).unwrap()
    }

    #[test]
    fn plain_item() {
        match parse_item("<si><t>Hello World</t></si>") {
            SharedString::Plain(text) => assert_eq!(text, "Hello World"),
            SharedString::Rich(_) => panic!("Expected plain text"),
        }
    }

    #[test]
    fn rich_item_keeps_run_fonts() {
        let item = parse_item(
            r#"<si><r><rPr><b/><sz val="14"/><color rgb="FFFF0000"/><rFont val="Arial"/></rPr><t>Bold</t></r><r><t xml:space="preserve"> Normal</t></r></si>"#,
        );
        let SharedString::Rich(runs) = item else {
            panic!("Expected rich text");
        };
        assert_eq!(runs.len(), 2);
        let font = runs[0].font.as_ref().unwrap();
        assert!(font.bold);
        assert_eq!(font.size, Some(14.0));
        assert_eq!(font.name.as_deref(), Some("Arial"));
        assert_eq!(font.color, Some(Color::Argb("FFFF0000".into())));
        assert_eq!(runs[1].text, " Normal");
        assert!(runs[1].font.is_none());
    }

    #[test]
    fn phonetic_runs_are_not_part_of_the_text() {
        let item = parse_item(r#"<si><t>漢字</t><rPh sb="0" eb="2"><t>カンジ</t></rPh></si>"#);
        assert_eq!(item.plain_text(), "漢字");
    }

    #[test]
    fn empty_item() {
        assert_eq!(parse_item("<si><t/></si>").plain_text(), "");
        assert_eq!(parse_item("<si></si>").plain_text(), "");
    }

    #[test]
    fn truncated_item_is_an_error() {
        assert!(try_parse_item("<si><t>cut off").is_err());
        assert!(try_parse_item("<si><r><t>run</t>").is_err());
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        let err = try_parse_item("<si><r><t>Bold</x></r></si>").unwrap_err();
        assert!(matches!(err, XlmergeError::Xml(_)), "{err}");
    }

    #[test]
    fn unclosed_phonetic_run_is_an_error() {
        assert!(try_parse_item(r#"<si><t>a</t><rPh sb="0" eb="1"><t>b</t>"#).is_err());
    }
}
