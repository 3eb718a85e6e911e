//! Shared XML attribute parsing utilities for XLSX parsing.
//!
//! All functions handle UTF-8 conversion and entity unescaping safely.

use quick_xml::events::BytesStart;

use crate::types::ColorSpec;

/// Extract a string attribute value by key, with XML entities decoded.
///
/// Returns `None` if the attribute is missing or not valid UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a string attribute by local name (ignoring namespace prefix).
pub fn attr_string_local(e: &BytesStart, key: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            return attr.unescape_value().ok().map(|s| s.into_owned());
        }
    }
    None
}

/// Extract a `u32` attribute value by key.
pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `i32` attribute value by key.
pub fn attr_i32(e: &BytesStart, key: &[u8]) -> Option<i32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract an `f64` attribute value by key.
pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

/// Extract a boolean attribute value by key.
///
/// Returns `None` if missing. Recognizes `"1"`, `"true"` as true; anything else as false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

/// Extract a boolean attribute with a default value.
pub fn attr_bool_default(e: &BytesStart, key: &[u8], default: bool) -> bool {
    attr_bool(e, key).unwrap_or(default)
}

/// Extract the `val` attribute as a string. Very common in XLSX XML.
pub fn attr_val(e: &BytesStart) -> Option<String> {
    attr_string(e, b"val")
}

/// Extract the `val` attribute as `u32`.
pub fn attr_val_u32(e: &BytesStart) -> Option<u32> {
    attr_u32(e, b"val")
}

/// Extract the `val` attribute as `f64`.
pub fn attr_val_f64(e: &BytesStart) -> Option<f64> {
    attr_f64(e, b"val")
}

/// Boolean toggle elements like `<b/>` or `<b val="0"/>`.
pub fn toggle_val(e: &BytesStart) -> bool {
    attr_bool_default(e, b"val", true)
}

/// Parse color attributes from an XML element into a `ColorSpec`.
pub fn parse_color_attrs(e: &BytesStart) -> ColorSpec {
    ColorSpec {
        rgb: attr_string(e, b"rgb"),
        theme: attr_u32(e, b"theme"),
        tint: attr_f64(e, b"tint"),
        indexed: attr_u32(e, b"indexed"),
        auto: attr_bool_default(e, b"auto", false),
    }
}

/// Minimal XML escaping for attribute/text content.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            _ => out.push(c),
        }
    }
    out
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

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string_unescapes() {
        let e = make_start(r#"<numFmt formatCode="&quot;$&quot;#,##0" />"#);
        assert_eq!(
            attr_string(&e, b"formatCode"),
            Some("\"$\"#,##0".to_string())
        );
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_numbers() {
        let e = make_start(r#"<foo count="42" rot="-45" w="12.5" />"#);
        assert_eq!(attr_u32(&e, b"count"), Some(42));
        assert_eq!(attr_i32(&e, b"rot"), Some(-45));
        assert!((attr_f64(&e, b"w").unwrap() - 12.5).abs() < f64::EPSILON);
        assert_eq!(attr_u32(&e, b"missing"), None);
    }

    #[test]
    fn test_toggle_val() {
        assert!(toggle_val(&make_start("<b/>")));
        assert!(!toggle_val(&make_start(r#"<b val="0"/>"#)));
        assert!(toggle_val(&make_start(r#"<b val="true"/>"#)));
    }

    #[test]
    fn test_parse_color_attrs() {
        let e = make_start(r#"<color theme="1" tint="0.5" />"#);
        let color = parse_color_attrs(&e);
        assert_eq!(color.rgb, None);
        assert_eq!(color.theme, Some(1));
        assert!((color.tint.unwrap() - 0.5).abs() < f64::EPSILON);
        assert!(!color.auto);
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(xml_escape("x\u{1}y"), "xy");
    }
}
