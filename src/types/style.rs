/// Resolved cell style.
///
/// Every component is an owned value. Cloning a `CellStyle` therefore yields a
/// fully independent copy, which is what the row copier relies on when it
/// moves formatting from a source workbook into the output workbook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub font: Option<Font>,
    pub fill: Option<Fill>,
    pub border: Option<Border>,
    pub alignment: Option<Alignment>,
    pub num_fmt: Option<NumFmt>,
    pub protection: Option<Protection>,
}

impl CellStyle {
    /// True when no component carries any formatting.
    pub fn is_empty(&self) -> bool {
        self.font.is_none()
            && self.fill.is_none()
            && self.border.is_none()
            && self.alignment.is_none()
            && self.num_fmt.is_none()
            && self.protection.is_none()
    }
}

/// A color after theme/indexed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    /// `AARRGGBB` hex, uppercase.
    Argb(String),
    /// System automatic color.
    Auto,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub color: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    /// Underline variant (`single`, `double`, ...); `None` means no underline.
    pub underline: Option<String>,
    pub strikethrough: bool,
    /// `superscript` / `subscript` / `baseline`
    pub vert_align: Option<String>,
    pub family: Option<u32>,
    pub charset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub pattern_type: String,
    pub fg_color: Option<Color>,
    pub bg_color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BorderSide {
    pub style: String,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Border {
    pub left: Option<BorderSide>,
    pub right: Option<BorderSide>,
    pub top: Option<BorderSide>,
    pub bottom: Option<BorderSide>,
    pub diagonal: Option<BorderSide>,
    pub diagonal_up: bool,
    pub diagonal_down: bool,
}

impl Border {
    pub fn is_empty(&self) -> bool {
        self.left.is_none()
            && self.right.is_none()
            && self.top.is_none()
            && self.bottom.is_none()
            && self.diagonal.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
    pub indent: Option<u32>,
    pub text_rotation: Option<i32>,
    pub reading_order: Option<u8>, // 0=context, 1=LTR, 2=RTL
}

/// Number format attached to a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumFmt {
    /// One of the implicit formats (ids 0..164) every workbook shares.
    Builtin(u32),
    /// Workbook-defined format code; ids are reassigned on write.
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Protection {
    pub locked: bool,
    pub hidden: bool,
}

impl Default for Protection {
    fn default() -> Self {
        Self {
            locked: true,
            hidden: false,
        }
    }
}

// ============================================================================
// Internal types for parsing (colors not yet resolved)
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ColorSpec {
    pub rgb: Option<String>,
    pub theme: Option<u32>,
    pub tint: Option<f64>,
    pub indexed: Option<u32>,
    pub auto: bool,
}

/// Raw font from styles.xml (or a rich text run's `<rPr>`).
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Clone)]
pub struct RawFont {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub color: Option<ColorSpec>,
    pub bold: bool,
    pub italic: bool,
    pub underline: Option<String>,
    pub strikethrough: bool,
    pub vert_align: Option<String>,
    pub family: Option<u32>,
    pub charset: Option<u32>,
}

#[derive(Debug, Default, Clone)]
pub struct RawFill {
    pub fg_color: Option<ColorSpec>,
    pub bg_color: Option<ColorSpec>,
    pub pattern_type: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct RawBorder {
    pub left: Option<RawBorderSide>,
    pub right: Option<RawBorderSide>,
    pub top: Option<RawBorderSide>,
    pub bottom: Option<RawBorderSide>,
    pub diagonal: Option<RawBorderSide>,
    pub diagonal_up: bool,
    pub diagonal_down: bool,
}

#[derive(Debug, Clone)]
pub struct RawBorderSide {
    pub style: String,
    pub color: Option<ColorSpec>,
}

/// Cell format (xf) from cellXfs.
#[derive(Debug, Clone, Default)]
pub struct CellXf {
    pub font_id: Option<u32>,
    pub fill_id: Option<u32>,
    pub border_id: Option<u32>,
    pub num_fmt_id: Option<u32>,
    pub alignment: Option<Alignment>,
    pub protection: Option<Protection>,
}

/// Complete parsed style data from styles.xml
#[derive(Debug, Default)]
pub struct StyleSheet {
    pub fonts: Vec<RawFont>,
    pub fills: Vec<RawFill>,
    pub borders: Vec<RawBorder>,
    pub cell_xfs: Vec<CellXf>,
    pub num_fmts: Vec<(u32, String)>, // (numFmtId, formatCode)
    /// Custom indexed colors from `<colors><indexedColors>` (if present)
    pub indexed_colors: Option<Vec<String>>,
}
