//! Cell formats: FONT and XF record bodies.
//!
//! A [`Format`] describes the font, number format, alignment, fill, borders
//! and protection of a cell. The workbook turns each registered format into
//! one XF record; fonts and number formats are shared between formats through
//! the resource tables.

use crate::biff::strings::{push_byte_string, push_unicode_string, LengthPrefix};
use crate::biff::BiffVersion;

/// Index of an XF record, as stored in cell records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XfIndex(pub(crate) u16);

impl XfIndex {
    /// The default cell XF that follows the 15 style XFs.
    pub const DEFAULT: XfIndex = XfIndex(0x0F);

    pub fn get(self) -> u16 {
        self.0
    }
}

impl Default for XfIndex {
    fn default() -> Self {
        XfIndex::DEFAULT
    }
}

/// Palette colour reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Blue,
    Brown,
    Cyan,
    Gray,
    Green,
    Lime,
    Magenta,
    Navy,
    Orange,
    Pink,
    Purple,
    Red,
    Silver,
    White,
    Yellow,
    /// Raw palette index (8–63 for palette entries).
    Indexed(u8),
    /// System colour: window text for fonts, default fill otherwise.
    Automatic,
}

impl Color {
    /// Palette index, or `None` for [`Color::Automatic`].
    pub fn palette_index(self) -> Option<u16> {
        let idx = match self {
            Color::Black => 0x08,
            Color::Blue => 0x0C,
            Color::Brown => 0x10,
            Color::Cyan => 0x0F,
            Color::Gray => 0x17,
            Color::Green => 0x11,
            Color::Lime => 0x0B,
            Color::Magenta => 0x0E,
            Color::Navy => 0x12,
            Color::Orange => 0x35,
            Color::Pink => 0x21,
            Color::Purple => 0x14,
            Color::Red => 0x0A,
            Color::Silver => 0x16,
            Color::White => 0x09,
            Color::Yellow => 0x0D,
            Color::Indexed(i) => u16::from(i),
            Color::Automatic => return None,
        };
        Some(idx)
    }

    fn or_default(self, default: u16) -> u16 {
        self.palette_index().unwrap_or(default)
    }
}

const FONT_COLOR_AUTO: u16 = 0x7FFF;
const FILL_FG_AUTO: u16 = 0x40;
const FILL_BG_AUTO: u16 = 0x41;
const BORDER_COLOR_AUTO: u16 = 0x40;

/// Underline style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    SingleAccounting,
    DoubleAccounting,
}

impl Underline {
    fn code(self) -> u8 {
        match self {
            Underline::None => 0x00,
            Underline::Single => 0x01,
            Underline::Double => 0x02,
            Underline::SingleAccounting => 0x21,
            Underline::DoubleAccounting => 0x22,
        }
    }
}

/// Superscript/subscript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Script {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlignment {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterAcrossSelection,
}

/// Vertical alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    Top,
    Center,
    #[default]
    Bottom,
    Justify,
}

/// Border line style (the subset shared by BIFF5 and BIFF8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
}

/// Number format of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    /// Excel built-in format code; no FORMAT record is written.
    BuiltIn(u16),
    /// Format string that needs its own FORMAT record.
    Custom(String),
}

impl NumberFormat {
    /// Classify a format string.
    ///
    /// A string of digits names a built-in format, except zero-padded digit
    /// strings such as `"00"`, which are real format strings. Digit strings
    /// too large for the 16-bit format index (such as `"70000"`) cannot name a
    /// built-in format either, so they are also kept as format strings.
    pub fn parse(format: &str) -> Self {
        let digits = !format.is_empty() && format.bytes().all(|b| b.is_ascii_digit());
        let zero_padded = format.len() > 1 && format.starts_with('0');
        if digits && !zero_padded {
            if let Ok(code) = format.parse::<u16>() {
                return NumberFormat::BuiltIn(code);
            }
        }
        NumberFormat::Custom(format.to_string())
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, NumberFormat::BuiltIn(_))
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::BuiltIn(0)
    }
}

/// Canonical identity of a font; equal keys share one FONT record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    name: String,
    height_twips: u16,
    bold: bool,
    italic: bool,
    underline: Underline,
    strikeout: bool,
    outline: bool,
    shadow: bool,
    script: Script,
    color: u16,
    family: u8,
    charset: u8,
}

/// Which flavour of XF record to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XfKind {
    /// Style XF (the 15 placeholders at the start of the XF table)
    Style,
    /// Cell XF
    Cell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct Edge {
    style: BorderStyle,
    color: u16,
}

impl Edge {
    /// Colour written for this edge; zero when the edge has no line.
    fn effective_color(&self) -> u32 {
        if self.style == BorderStyle::None {
            0
        } else {
            u32::from(self.color & 0x7F)
        }
    }

    fn code(&self) -> u32 {
        self.style as u32
    }
}

/// A cell format.
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    font_name: String,
    size: f64,
    bold: bool,
    italic: bool,
    underline: Underline,
    strikeout: bool,
    outline: bool,
    shadow: bool,
    script: Script,
    font_color: u16,
    font_family: u8,
    font_charset: u8,

    num_format: NumberFormat,

    locked: bool,
    hidden: bool,

    h_align: HorizontalAlignment,
    v_align: VerticalAlignment,
    text_wrap: bool,

    pattern: u8,
    fg_color: u16,
    bg_color: u16,

    top: Edge,
    bottom: Edge,
    left: Edge,
    right: Edge,
}

impl Default for Format {
    fn default() -> Self {
        let edge = Edge {
            style: BorderStyle::None,
            color: BORDER_COLOR_AUTO,
        };
        Self {
            font_name: "Arial".to_string(),
            size: 10.0,
            bold: false,
            italic: false,
            underline: Underline::None,
            strikeout: false,
            outline: false,
            shadow: false,
            script: Script::Normal,
            font_color: FONT_COLOR_AUTO,
            font_family: 0,
            font_charset: 0,
            num_format: NumberFormat::default(),
            locked: true,
            hidden: false,
            h_align: HorizontalAlignment::General,
            v_align: VerticalAlignment::Bottom,
            text_wrap: false,
            pattern: 0,
            fg_color: FILL_FG_AUTO,
            bg_color: FILL_BG_AUTO,
            top: edge,
            bottom: edge,
            left: edge,
            right: edge,
        }
    }
}

impl Format {
    /// Create the default format (Arial 10, General, bottom aligned, locked)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font_name<S: Into<String>>(mut self, name: S) -> Self {
        self.font_name = name.into();
        self
    }

    /// Font size in points
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn with_underline(mut self, underline: Underline) -> Self {
        self.underline = underline;
        self
    }

    pub fn with_strikeout(mut self, strikeout: bool) -> Self {
        self.strikeout = strikeout;
        self
    }

    pub fn with_outline(mut self, outline: bool) -> Self {
        self.outline = outline;
        self
    }

    pub fn with_shadow(mut self, shadow: bool) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    /// Font colour
    pub fn with_color(mut self, color: Color) -> Self {
        self.font_color = color.or_default(FONT_COLOR_AUTO);
        self
    }

    pub fn with_font_family(mut self, family: u8) -> Self {
        self.font_family = family;
        self
    }

    pub fn with_font_charset(mut self, charset: u8) -> Self {
        self.font_charset = charset;
        self
    }

    /// Number format from a format string or a built-in code such as `"14"`.
    pub fn with_num_format(mut self, format: &str) -> Self {
        self.num_format = NumberFormat::parse(format);
        self
    }

    pub fn with_builtin_num_format(mut self, code: u16) -> Self {
        self.num_format = NumberFormat::BuiltIn(code);
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_align(mut self, align: HorizontalAlignment) -> Self {
        self.h_align = align;
        self
    }

    pub fn with_valign(mut self, align: VerticalAlignment) -> Self {
        self.v_align = align;
        self
    }

    pub fn with_text_wrap(mut self, wrap: bool) -> Self {
        self.text_wrap = wrap;
        self
    }

    /// Fill pattern (0 = none, 1 = solid, 2–18 = hatches)
    pub fn with_pattern(mut self, pattern: u8) -> Self {
        self.pattern = pattern.min(18);
        self
    }

    pub fn with_fg_color(mut self, color: Color) -> Self {
        self.fg_color = color.or_default(FILL_FG_AUTO);
        self
    }

    pub fn with_bg_color(mut self, color: Color) -> Self {
        self.bg_color = color.or_default(FILL_BG_AUTO);
        self
    }

    /// Same line style on all four edges
    pub fn with_border(self, style: BorderStyle) -> Self {
        self.with_top(style)
            .with_bottom(style)
            .with_left(style)
            .with_right(style)
    }

    /// Same colour on all four edges
    pub fn with_border_color(mut self, color: Color) -> Self {
        let color = color.or_default(BORDER_COLOR_AUTO);
        for edge in [
            &mut self.top,
            &mut self.bottom,
            &mut self.left,
            &mut self.right,
        ] {
            edge.color = color;
        }
        self
    }

    pub fn with_top(mut self, style: BorderStyle) -> Self {
        self.top.style = style;
        self
    }

    pub fn with_bottom(mut self, style: BorderStyle) -> Self {
        self.bottom.style = style;
        self
    }

    pub fn with_left(mut self, style: BorderStyle) -> Self {
        self.left.style = style;
        self
    }

    pub fn with_right(mut self, style: BorderStyle) -> Self {
        self.right.style = style;
        self
    }

    pub fn num_format(&self) -> &NumberFormat {
        &self.num_format
    }

    pub fn font_key(&self) -> FontKey {
        FontKey {
            name: self.font_name.clone(),
            height_twips: self.height_twips(),
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            strikeout: self.strikeout,
            outline: self.outline,
            shadow: self.shadow,
            script: self.script,
            color: self.font_color,
            family: self.font_family,
            charset: self.font_charset,
        }
    }

    fn height_twips(&self) -> u16 {
        (self.size * 20.0).round().clamp(0.0, f64::from(u16::MAX)) as u16
    }

    /// FONT record body.
    pub fn font_payload(&self, version: BiffVersion) -> Vec<u8> {
        let mut grbit: u16 = 0;
        if self.italic {
            grbit |= 0x02;
        }
        if self.strikeout {
            grbit |= 0x08;
        }
        if self.outline {
            grbit |= 0x10;
        }
        if self.shadow {
            grbit |= 0x20;
        }
        let weight: u16 = if self.bold { 0x02BC } else { 0x0190 };

        let mut body = Vec::with_capacity(16 + self.font_name.len() * 2);
        body.extend_from_slice(&self.height_twips().to_le_bytes());
        body.extend_from_slice(&grbit.to_le_bytes());
        body.extend_from_slice(&self.font_color.to_le_bytes());
        body.extend_from_slice(&weight.to_le_bytes());
        body.extend_from_slice(&(self.script as u16).to_le_bytes());
        body.push(self.underline.code());
        body.push(self.font_family);
        body.push(self.font_charset);
        body.push(0x00); // reserved

        let name = crate::biff::strings::truncate_chars(&self.font_name, 255);
        match version {
            BiffVersion::Biff5 => push_byte_string(&mut body, name, LengthPrefix::Byte),
            BiffVersion::Biff8 => {
                push_unicode_string(&mut body, name, LengthPrefix::Byte);
            }
        }
        body
    }

    /// Attribute-group flags: number, font, alignment, border, pattern, protection.
    fn used_attributes(&self, font_index: u16, num_format_index: u16) -> u8 {
        let num = num_format_index != 0;
        let font = font_index != 0;
        let align = self.text_wrap
            || self.h_align != HorizontalAlignment::General
            || self.v_align != VerticalAlignment::Bottom;
        let border = [self.top, self.bottom, self.left, self.right]
            .iter()
            .any(|e| e.style != BorderStyle::None);
        let pattern =
            self.fg_color != FILL_FG_AUTO || self.bg_color != FILL_BG_AUTO || self.pattern != 0;
        let protection = self.locked || self.hidden;

        u8::from(num)
            | u8::from(font) << 1
            | u8::from(align) << 2
            | u8::from(border) << 3
            | u8::from(pattern) << 4
            | u8::from(protection) << 5
    }

    fn type_and_protection(&self, kind: XfKind) -> u16 {
        match kind {
            // Style XF, parent index 0xFFF
            XfKind::Style => 0xFFF5,
            XfKind::Cell => u16::from(self.locked) | u16::from(self.hidden) << 1,
        }
    }

    fn align_bits(&self) -> u8 {
        self.h_align as u8 | u8::from(self.text_wrap) << 3 | (self.v_align as u8) << 4
    }

    /// XF record body for this format.
    ///
    /// `font_index` and `num_format_index` are the indices the resource tables
    /// assigned to this format's font and number format.
    pub fn xf_payload(
        &self,
        version: BiffVersion,
        kind: XfKind,
        font_index: u16,
        num_format_index: u16,
    ) -> Vec<u8> {
        let used = self.used_attributes(font_index, num_format_index);
        let fg = u32::from(self.fg_color & 0x7F);
        let bg = u32::from(self.bg_color & 0x7F);
        let pattern = u32::from(self.pattern & 0x3F);

        let mut body = Vec::with_capacity(20);
        body.extend_from_slice(&font_index.to_le_bytes());
        body.extend_from_slice(&num_format_index.to_le_bytes());
        body.extend_from_slice(&self.type_and_protection(kind).to_le_bytes());

        match version {
            BiffVersion::Biff5 => {
                let align = u16::from(self.align_bits()) | u16::from(used) << 10;
                let fill = fg | bg << 7 | pattern << 16
                    | (self.bottom.code() & 0x07) << 22
                    | self.bottom.effective_color() << 25;
                let border = (self.top.code() & 0x07)
                    | (self.left.code() & 0x07) << 3
                    | (self.right.code() & 0x07) << 6
                    | self.top.effective_color() << 9
                    | self.left.effective_color() << 16
                    | self.right.effective_color() << 23;

                body.extend_from_slice(&align.to_le_bytes());
                body.extend_from_slice(&fill.to_le_bytes());
                body.extend_from_slice(&border.to_le_bytes());
            }
            BiffVersion::Biff8 => {
                let border1 = self.left.code()
                    | self.right.code() << 4
                    | self.top.code() << 8
                    | self.bottom.code() << 12
                    | self.left.effective_color() << 16
                    | self.right.effective_color() << 23;
                let border2 = self.top.effective_color()
                    | self.bottom.effective_color() << 7
                    | pattern << 26;
                let icv = (fg | bg << 7) as u16;

                body.push(self.align_bits());
                body.push(0x00); // rotation
                body.push(0x00); // indent, shrink, reading order
                body.push(used << 2);
                body.extend_from_slice(&border1.to_le_bytes());
                body.extend_from_slice(&border2.to_le_bytes());
                body.extend_from_slice(&icv.to_le_bytes());
            }
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_number_format_detection() {
        assert_eq!(NumberFormat::parse("0"), NumberFormat::BuiltIn(0));
        assert_eq!(NumberFormat::parse("14"), NumberFormat::BuiltIn(14));
        assert_eq!(
            NumberFormat::parse("00"),
            NumberFormat::Custom("00".to_string())
        );
        assert_eq!(
            NumberFormat::parse("007"),
            NumberFormat::Custom("007".to_string())
        );
        assert_eq!(
            NumberFormat::parse("0.00"),
            NumberFormat::Custom("0.00".to_string())
        );
        assert_eq!(NumberFormat::parse(""), NumberFormat::Custom(String::new()));
        assert_eq!(NumberFormat::parse("65535"), NumberFormat::BuiltIn(65535));
        assert_eq!(
            NumberFormat::parse("70000"),
            NumberFormat::Custom("70000".to_string())
        );
    }

    #[test]
    fn test_font_key_ignores_non_font_attributes() {
        let a = Format::new().with_bold(true).with_num_format("0.00");
        let b = Format::new()
            .with_bold(true)
            .with_align(HorizontalAlignment::Center);
        let c = Format::new().with_italic(true);
        assert_eq!(a.font_key(), b.font_key());
        assert_ne!(a.font_key(), c.font_key());
    }

    #[test]
    fn test_default_font_payload_biff8() {
        let body = Format::new().font_payload(BiffVersion::Biff8);
        let mut expected = vec![
            0xC8, 0x00, // 200 twips
            0x00, 0x00, // grbit
            0xFF, 0x7F, // automatic colour
            0x90, 0x01, // normal weight
            0x00, 0x00, // no script
            0x00, 0x00, 0x00, 0x00, // underline, family, charset, reserved
            0x05, 0x00, // cch, compressed
        ];
        expected.extend_from_slice(b"Arial");
        assert_eq!(body, expected);
    }

    #[test]
    fn test_font_payload_biff5_has_no_flags_byte() {
        let body = Format::new()
            .with_bold(true)
            .with_italic(true)
            .with_color(Color::Red)
            .font_payload(BiffVersion::Biff5);
        assert_eq!(body.len(), 15 + 5);
        assert_eq!(&body[2..8], &[0x02, 0x00, 0x0A, 0x00, 0xBC, 0x02]);
        assert_eq!(body[14], 5);
        assert_eq!(&body[15..], b"Arial");
    }

    #[test]
    fn test_xf_payload_sizes() {
        let f = Format::new();
        assert_eq!(f.xf_payload(BiffVersion::Biff5, XfKind::Cell, 0, 0).len(), 16);
        assert_eq!(f.xf_payload(BiffVersion::Biff8, XfKind::Cell, 0, 0).len(), 20);
    }

    #[test]
    fn test_style_xf_biff8() {
        let body = Format::new().xf_payload(BiffVersion::Biff8, XfKind::Style, 0, 0);
        assert_eq!(
            body,
            vec![
                0x00, 0x00, // font
                0x00, 0x00, // format
                0xF5, 0xFF, // style XF
                0x20, // bottom aligned
                0x00, 0x00, // rotation, options
                0x80, // protection attribute
                0x00, 0x00, 0x00, 0x00, // no borders
                0x00, 0x00, 0x00, 0x00, // no border colours, no pattern
                0xC0, 0x20, // fg 0x40 | bg 0x41 << 7
            ]
        );
    }

    #[test]
    fn test_cell_xf_with_border_and_fill_biff8() {
        let f = Format::new()
            .with_bottom(BorderStyle::Thin)
            .with_pattern(1)
            .with_fg_color(Color::Yellow);
        let body = f.xf_payload(BiffVersion::Biff8, XfKind::Cell, 6, 164);

        assert_eq!(&body[0..6], &[0x06, 0x00, 0xA4, 0x00, 0x01, 0x00]);
        // number, font, border, pattern, protection
        assert_eq!(body[9], 0b0011_1011 << 2);
        let border1 = u32::from_le_bytes(body[10..14].try_into().unwrap());
        assert_eq!(border1, 1 << 12);
        let border2 = u32::from_le_bytes(body[14..18].try_into().unwrap());
        assert_eq!(border2, 0x40 << 7 | 1 << 26);
        let icv = u16::from_le_bytes(body[18..20].try_into().unwrap());
        assert_eq!(icv, 0x0D | 0x41 << 7);
    }

    #[test]
    fn test_cell_xf_biff5_layout() {
        let f = Format::new()
            .with_align(HorizontalAlignment::Center)
            .with_text_wrap(true);
        let body = f.xf_payload(BiffVersion::Biff5, XfKind::Cell, 0, 0);

        let align = u16::from_le_bytes([body[6], body[7]]);
        assert_eq!(align & 0x07, 2);
        assert_eq!(align >> 3 & 1, 1);
        assert_eq!(align >> 4 & 0x07, 2);
        // alignment + protection used
        assert_eq!(align >> 10, 0b10_0100);
        let fill = u32::from_le_bytes(body[8..12].try_into().unwrap());
        assert_eq!(fill, 0x40 | 0x41 << 7);
    }
}
