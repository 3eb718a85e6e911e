//! Color resolution
//!
//! Source workbooks reference colors by theme slot, legacy palette index or
//! literal ARGB. The output workbook carries no theme of its own, so every
//! reference is flattened to a literal ARGB value while the source is parsed.

use crate::types::{Color, ColorSpec};

/// Excel's 64 indexed colors (legacy palette), `RRGGBB`.
pub const INDEXED_COLORS: [&str; 64] = [
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF", //
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF", //
    "800000", "008000", "000080", "808000", "800080", "008080", "C0C0C0", "808080", //
    "9999FF", "993366", "FFFFCC", "CCFFFF", "660066", "FF8080", "0066CC", "CCCCFF", //
    "000080", "FF00FF", "FFFF00", "00FFFF", "800080", "800000", "008080", "0000FF", //
    "00CCFF", "CCFFFF", "CCFFCC", "FFFF99", "99CCFF", "FF99CC", "CC99FF", "FFCC99", //
    "3366FF", "33CCCC", "99CC00", "FFCC00", "FF9900", "FF6600", "666699", "969696", //
    "003366", "339966", "003300", "333300", "993300", "993366", "333399", "333333",
];

/// Office theme palette used when a workbook ships no theme part.
///
/// Slot order follows the `clrScheme` mapping applied by spreadsheet
/// consumers: lt1, dk1, lt2, dk2, accent1..accent6, hlink, folHlink.
pub const DEFAULT_THEME_COLORS: [&str; 12] = [
    "FFFFFF", "000000", "E7E6E6", "44546A", "4472C4", "ED7D31", "A5A5A5", "FFC000", "5B9BD5",
    "70AD47", "0563C1", "954F72",
];

/// Normalize a hex string to uppercase `AARRGGBB`.
///
/// Accepts `RRGGBB` or `AARRGGBB`, with or without a leading `#`.
pub fn normalize_argb(hex: &str) -> Option<String> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        8 => Some(hex.to_ascii_uppercase()),
        6 => Some(format!("FF{}", hex.to_ascii_uppercase())),
        _ => None,
    }
}

/// Resolve a `ColorSpec` against the source workbook's palettes.
///
/// Priority is rgb, theme (+tint), indexed, auto.
pub fn resolve_color(
    color: &ColorSpec,
    theme_colors: &[String],
    indexed_colors: Option<&Vec<String>>,
) -> Option<Color> {
    if let Some(rgb) = &color.rgb {
        if let Some(argb) = normalize_argb(rgb) {
            return Some(Color::Argb(argb));
        }
    }

    if let Some(theme_idx) = color.theme {
        let idx = theme_idx as usize;
        let base = theme_colors
            .get(idx)
            .map(String::as_str)
            .or_else(|| DEFAULT_THEME_COLORS.get(idx).copied())?;
        let base = match color.tint {
            Some(tint) if tint.abs() > f64::EPSILON => apply_tint(base, tint),
            _ => base.trim_start_matches('#').to_ascii_uppercase(),
        };
        return normalize_argb(&base).map(Color::Argb);
    }

    if let Some(indexed) = color.indexed {
        // 64 is the system foreground, 65 the system background
        match indexed {
            64 => return Some(Color::Auto),
            65 => return Some(Color::Argb("FFFFFFFF".to_string())),
            _ => {}
        }
        let idx = indexed as usize;
        let custom = indexed_colors.and_then(|p| p.get(idx)).map(String::as_str);
        if let Some(hex) = custom.or_else(|| INDEXED_COLORS.get(idx).copied()) {
            return normalize_argb(hex).map(Color::Argb);
        }
    }

    if color.auto {
        return Some(Color::Auto);
    }

    None
}

/// Apply a tint to an `RRGGBB` color, returning `RRGGBB`.
///
/// Negative tints darken, positive tints lighten, both in HSL space.
#[allow(clippy::many_single_char_names)]
pub fn apply_tint(hex_color: &str, tint: f64) -> String {
    let hex = hex_color.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    let (r, g, b) = (channel(0..2), channel(2..4), channel(4..6));

    let (h, s, l) = rgb_to_hsl(r, g, b);
    let new_l = if tint < 0.0 {
        l * (1.0 + tint)
    } else {
        (1.0 - l).mul_add(tint, l)
    };
    let (r, g, b) = hsl_to_rgb(h, s, new_l.clamp(0.0, 1.0));

    format!("{r:02X}{g:02X}{b:02X}")
}

#[allow(clippy::many_single_char_names)]
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if (max - r).abs() < f64::EPSILON {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h / 6.0, s, l)
}

#[allow(clippy::many_single_char_names)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l.mul_add(-s, l + s)
    };
    let p = 2.0f64.mul_add(l, -q);

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        return ((q - p) * 6.0).mul_add(t, p);
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return ((q - p) * (2.0 / 3.0 - t)).mul_add(6.0, p);
    }
    p
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

    fn spec() -> ColorSpec {
        ColorSpec::default()
    }

    fn argb(s: &str) -> Option<Color> {
        Some(Color::Argb(s.to_string()))
    }

    #[test_case("FFFFFF00", Some("FFFFFF00"); "argb kept")]
    #[test_case("ff0000", Some("FFFF0000"); "rgb gets opaque alpha")]
    #[test_case("#00FF00", Some("FF00FF00"); "leading hash")]
    #[test_case("12345", None; "wrong length")]
    #[test_case("GG0000", None; "not hex")]
    fn normalizes_hex(input: &str, expected: Option<&str>) {
        assert_eq!(normalize_argb(input).as_deref(), expected);
    }

    #[test]
    fn tint_on_black_gives_gray() {
        assert_eq!(apply_tint("000000", 0.5), "808080");
        assert_eq!(apply_tint("#FFFFFF", -0.5), "808080");
    }

    #[test]
    fn resolves_theme_against_source_palette() {
        let theme: Vec<String> = vec!["FFFFFF".into(), "112233".into()];
        let color = ColorSpec {
            theme: Some(1),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &theme, None), argb("FF112233"));
    }

    #[test]
    fn theme_falls_back_to_office_palette() {
        let color = ColorSpec {
            theme: Some(4),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &[], None), argb("FF4472C4"));
    }

    #[test]
    fn theme_tint_is_applied() {
        let color = ColorSpec {
            theme: Some(1),
            tint: Some(0.5),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &[], None), argb("FF808080"));
    }

    #[test]
    fn rgb_wins_over_theme_and_indexed() {
        let color = ColorSpec {
            rgb: Some("FF00FF00".into()),
            theme: Some(4),
            indexed: Some(2),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &[], None), argb("FF00FF00"));
    }

    #[test]
    fn indexed_uses_custom_palette_first() {
        let color = ColorSpec {
            indexed: Some(2),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &[], None), argb("FFFF0000"));
        let custom = vec!["FF000000".into(), "FFFFFFFF".into(), "FF00FF00".into()];
        assert_eq!(resolve_color(&color, &[], Some(&custom)), argb("FF00FF00"));
    }

    #[test]
    fn system_and_auto_colors() {
        let fg = ColorSpec {
            indexed: Some(64),
            ..spec()
        };
        assert_eq!(resolve_color(&fg, &[], None), Some(Color::Auto));
        let auto = ColorSpec {
            auto: true,
            ..spec()
        };
        assert_eq!(resolve_color(&auto, &[], None), Some(Color::Auto));
    }

    #[test]
    fn unresolvable_references() {
        assert_eq!(resolve_color(&spec(), &[], None), None);
        let theme = ColorSpec {
            theme: Some(100),
            ..spec()
        };
        assert_eq!(resolve_color(&theme, &[], None), None);
        let indexed = ColorSpec {
            indexed: Some(100),
            ..spec()
        };
        assert_eq!(resolve_color(&indexed, &[], None), None);
    }
}
