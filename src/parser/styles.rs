//! Style resolution: raw styles.xml records into owned `CellStyle` values.
//!
//! Each cellXfs entry is resolved once per workbook and then cloned into the
//! cells that reference it. Colors are flattened to ARGB against the source
//! workbook's theme, so a resolved style carries no reference back into the
//! workbook it came from.

use crate::color::resolve_color;
use crate::types::{
    Border, BorderSide, CellStyle, CellXf, Color, ColorSpec, Fill, Font, NumFmt, RawBorderSide,
    RawFill, RawFont, StyleSheet,
};

/// Highest built-in number format id; custom formats start at 164.
pub const MAX_BUILTIN_NUM_FMT: u32 = 163;

pub(crate) struct StyleResolver<'a> {
    stylesheet: &'a StyleSheet,
    theme_colors: &'a [String],
    resolved: Vec<Option<CellStyle>>,
}

impl<'a> StyleResolver<'a> {
    pub(crate) fn new(stylesheet: &'a StyleSheet, theme_colors: &'a [String]) -> Self {
        let mut resolver = Self {
            stylesheet,
            theme_colors,
            resolved: Vec::new(),
        };
        let resolved = stylesheet
            .cell_xfs
            .iter()
            .map(|xf| resolver.resolve_xf(xf))
            .collect();
        resolver.resolved = resolved;
        resolver
    }

    /// Style for the `s` attribute of a cell; `None` for the default format.
    pub(crate) fn cell_style(&self, xf_index: u32) -> Option<CellStyle> {
        self.resolved.get(xf_index as usize).cloned().flatten()
    }

    pub(crate) fn color(&self, spec: &ColorSpec) -> Option<Color> {
        resolve_color(
            spec,
            self.theme_colors,
            self.stylesheet.indexed_colors.as_ref(),
        )
    }

    pub(crate) fn font(&self, raw: &RawFont) -> Font {
        Font {
            name: raw.name.clone(),
            size: raw.size,
            color: raw.color.as_ref().and_then(|c| self.color(c)),
            bold: raw.bold,
            italic: raw.italic,
            underline: raw.underline.clone(),
            strikethrough: raw.strikethrough,
            vert_align: raw.vert_align.clone(),
            family: raw.family,
            charset: raw.charset,
        }
    }

    fn fill(&self, raw: &RawFill) -> Option<Fill> {
        let pattern_type = raw.pattern_type.clone().unwrap_or_else(|| "none".to_string());
        if pattern_type == "none" {
            return None;
        }
        Some(Fill {
            pattern_type,
            fg_color: raw.fg_color.as_ref().and_then(|c| self.color(c)),
            bg_color: raw.bg_color.as_ref().and_then(|c| self.color(c)),
        })
    }

    fn side(&self, raw: Option<&RawBorderSide>) -> Option<BorderSide> {
        raw.map(|s| BorderSide {
            style: s.style.clone(),
            color: s.color.as_ref().and_then(|c| self.color(c)),
        })
    }

    fn resolve_xf(&self, xf: &CellXf) -> Option<CellStyle> {
        let sheet = self.stylesheet;

        // An empty `<font/>` carries nothing
        let font = xf
            .font_id
            .and_then(|id| sheet.fonts.get(id as usize))
            .map(|raw| self.font(raw))
            .filter(|f| *f != Font::default());

        let fill = xf
            .fill_id
            .and_then(|id| sheet.fills.get(id as usize))
            .and_then(|raw| self.fill(raw));

        let border = xf
            .border_id
            .and_then(|id| sheet.borders.get(id as usize))
            .map(|raw| Border {
                left: self.side(raw.left.as_ref()),
                right: self.side(raw.right.as_ref()),
                top: self.side(raw.top.as_ref()),
                bottom: self.side(raw.bottom.as_ref()),
                diagonal: self.side(raw.diagonal.as_ref()),
                diagonal_up: raw.diagonal_up,
                diagonal_down: raw.diagonal_down,
            })
            .filter(|b| !b.is_empty());

        let num_fmt = xf.num_fmt_id.filter(|id| *id != 0).and_then(|id| {
            match sheet.num_fmts.iter().find(|(fmt_id, _)| *fmt_id == id) {
                Some((_, code)) => Some(NumFmt::Custom(code.clone())),
                // Undeclared ids past the built-in table have no meaning
                None => (id <= MAX_BUILTIN_NUM_FMT).then_some(NumFmt::Builtin(id)),
            }
        });

        let style = CellStyle {
            font,
            fill,
            border,
            alignment: xf.alignment.clone(),
            num_fmt,
            protection: xf.protection,
        };

        (!style.is_empty()).then_some(style)
    }
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
    use crate::types::RawBorder;

    fn stylesheet() -> StyleSheet {
        StyleSheet {
            fonts: vec![
                RawFont::default(),
                RawFont {
                    bold: true,
                    color: Some(ColorSpec {
                        theme: Some(4),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ],
            fills: vec![
                RawFill {
                    pattern_type: Some("none".into()),
                    ..Default::default()
                },
                RawFill {
                    pattern_type: Some("solid".into()),
                    fg_color: Some(ColorSpec {
                        indexed: Some(5),
                        ..Default::default()
                    }),
                    bg_color: None,
                },
            ],
            borders: vec![
                RawBorder::default(),
                RawBorder {
                    bottom: Some(RawBorderSide {
                        style: "medium".into(),
                        color: None,
                    }),
                    ..Default::default()
                },
            ],
            cell_xfs: vec![
                CellXf::default(),
                CellXf {
                    font_id: Some(1),
                    fill_id: Some(1),
                    border_id: Some(1),
                    num_fmt_id: Some(164),
                    ..Default::default()
                },
                CellXf {
                    num_fmt_id: Some(14),
                    ..Default::default()
                },
            ],
            num_fmts: vec![(164, "#,##0.000".into())],
            indexed_colors: None,
        }
    }

    #[test]
    fn default_xf_resolves_to_none() {
        let sheet = stylesheet();
        let resolver = StyleResolver::new(&sheet, &[]);
        assert!(resolver.cell_style(0).is_none());
        assert!(resolver.cell_style(99).is_none());
    }

    #[test]
    fn resolves_components_to_owned_values() {
        let sheet = stylesheet();
        let theme = vec![
            "FFFFFF".to_string(),
            "000000".into(),
            "E7E6E6".into(),
            "44546A".into(),
            "123456".into(),
        ];
        let resolver = StyleResolver::new(&sheet, &theme);
        let style = resolver.cell_style(1).unwrap();

        let font = style.font.unwrap();
        assert!(font.bold);
        assert_eq!(font.color, Some(Color::Argb("FF123456".into())));

        let fill = style.fill.unwrap();
        assert_eq!(fill.pattern_type, "solid");
        assert_eq!(fill.fg_color, Some(Color::Argb("FFFFFF00".into())));

        assert_eq!(style.border.unwrap().bottom.unwrap().style, "medium");
        assert_eq!(style.num_fmt, Some(NumFmt::Custom("#,##0.000".into())));
    }

    #[test]
    fn builtin_number_format_kept_by_id() {
        let sheet = stylesheet();
        let resolver = StyleResolver::new(&sheet, &[]);
        assert_eq!(
            resolver.cell_style(2).unwrap().num_fmt,
            Some(NumFmt::Builtin(14))
        );
    }
}
