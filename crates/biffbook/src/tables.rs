//! Deduplicated resource tables: FONT, FORMAT, XF and STYLE records.
//!
//! Every registered [`Format`] becomes one cell XF. Formats that share a font
//! share one FONT record, and formats that share a custom number format string
//! share one FORMAT record. The tables are rebuilt on every assembly, so the
//! registered formats themselves are never modified.

use ahash::AHashMap;

use crate::biff::strings::{
    push_byte_string, push_unicode_string, truncate_chars, truncate_utf16, LengthPrefix,
};
use crate::biff::{records, BiffVersion, RecordWriter};
use crate::format::{FontKey, Format, NumberFormat, XfKind};

/// Index of the first user font. Index 4 is never used by Excel, so the five
/// default FONT records occupy indices 0, 1, 2, 3 and 5.
pub const FIRST_USER_FONT: u16 = 6;

/// Number of FONT records written for the default font.
const DEFAULT_FONT_COPIES: usize = 5;

/// Index of the first custom number format; lower indices are built-in.
pub const FIRST_CUSTOM_NUM_FORMAT: u16 = 164;

/// Longest number format string Excel accepts.
pub const MAX_NUM_FORMAT_LEN: usize = 255;

/// Number of style XFs at the start of the XF table.
pub const STYLE_XF_COUNT: usize = 15;

/// Fonts used by the registered formats.
#[derive(Debug)]
pub struct FontTable {
    /// FONT bodies of the user fonts, in index order from [`FIRST_USER_FONT`]
    payloads: Vec<Vec<u8>>,
    /// Fast lookup for deduplication
    index_map: AHashMap<FontKey, u16>,
}

impl FontTable {
    /// Create a table where the font of `default` maps to index 0.
    pub fn new(default: &Format) -> Self {
        let mut index_map = AHashMap::with_capacity(16);
        index_map.insert(default.font_key(), 0);
        Self {
            payloads: Vec::new(),
            index_map,
        }
    }

    /// Font index for `format`, adding a FONT entry if the font is new.
    pub fn get_or_insert(&mut self, format: &Format, version: BiffVersion) -> u16 {
        let key = format.font_key();
        if let Some(&idx) = self.index_map.get(&key) {
            return idx;
        }

        let idx = FIRST_USER_FONT + self.payloads.len() as u16;
        self.index_map.insert(key, idx);
        self.payloads.push(format.font_payload(version));
        idx
    }

    /// Number of user fonts (excluding the default copies).
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    fn write_records(&self, writer: &mut RecordWriter, default: &Format) {
        let default_font = default.font_payload(writer.version());
        for _ in 0..DEFAULT_FONT_COPIES {
            writer.append_record(records::FONT, &default_font);
        }
        for payload in &self.payloads {
            writer.append_record(records::FONT, payload);
        }
    }
}

/// Custom number format strings.
#[derive(Debug, Default)]
pub struct NumberFormatTable {
    formats: Vec<String>,
    index_map: AHashMap<String, u16>,
}

impl NumberFormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number format index for `format`. Built-in codes pass through; custom
    /// strings are assigned indices from [`FIRST_CUSTOM_NUM_FORMAT`] in first-use
    /// order.
    pub fn resolve(&mut self, format: &NumberFormat) -> u16 {
        match format {
            NumberFormat::BuiltIn(code) => *code,
            NumberFormat::Custom(text) => {
                if let Some(&idx) = self.index_map.get(text) {
                    return idx;
                }
                let idx = FIRST_CUSTOM_NUM_FORMAT + self.formats.len() as u16;
                self.index_map.insert(text.clone(), idx);
                self.formats.push(text.clone());
                idx
            }
        }
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Custom format strings with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.formats
            .iter()
            .enumerate()
            .map(|(i, s)| (FIRST_CUSTOM_NUM_FORMAT + i as u16, s.as_str()))
    }

    fn write_records(&self, writer: &mut RecordWriter) {
        for (idx, text) in self.iter() {
            writer.append_record(records::FORMAT, &format_payload(writer.version(), idx, text));
        }
    }
}

/// FORMAT record body. Format strings are cut to [`MAX_NUM_FORMAT_LEN`].
fn format_payload(version: BiffVersion, index: u16, text: &str) -> Vec<u8> {
    let stored = match version {
        BiffVersion::Biff5 => truncate_chars(text, MAX_NUM_FORMAT_LEN),
        BiffVersion::Biff8 => truncate_utf16(text, MAX_NUM_FORMAT_LEN),
    };
    if stored.len() < text.len() {
        log::warn!(
            "number format {index} truncated to {} characters",
            stored.chars().count()
        );
    }

    let mut body = Vec::with_capacity(5 + stored.len() * 2);
    body.extend_from_slice(&index.to_le_bytes());
    match version {
        BiffVersion::Biff5 => push_byte_string(&mut body, stored, LengthPrefix::Byte),
        BiffVersion::Biff8 => {
            push_unicode_string(&mut body, stored, LengthPrefix::Word);
        }
    }
    body
}

/// Font and number format indices resolved for one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedXf {
    pub font_index: u16,
    pub num_format_index: u16,
}

/// All style resources of one workbook assembly.
#[derive(Debug)]
pub struct ResourceTables<'a> {
    version: BiffVersion,
    default: &'a Format,
    formats: &'a [Format],
    fonts: FontTable,
    num_formats: NumberFormatTable,
    resolved: Vec<ResolvedXf>,
}

impl<'a> ResourceTables<'a> {
    /// Build the tables for `formats`, one XF each, in registration order.
    pub fn build(version: BiffVersion, default: &'a Format, formats: &'a [Format]) -> Self {
        let mut fonts = FontTable::new(default);
        let mut num_formats = NumberFormatTable::new();

        let resolved = formats
            .iter()
            .map(|format| ResolvedXf {
                font_index: fonts.get_or_insert(format, version),
                num_format_index: num_formats.resolve(format.num_format()),
            })
            .collect();

        log::debug!(
            "resource tables: {} user fonts, {} custom number formats, {} cell formats",
            fonts.len(),
            num_formats.len(),
            formats.len()
        );

        Self {
            version,
            default,
            formats,
            fonts,
            num_formats,
            resolved,
        }
    }

    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    pub fn num_formats(&self) -> &NumberFormatTable {
        &self.num_formats
    }

    /// Resolved indices of the format registered at `position`.
    pub fn resolved(&self, position: usize) -> Option<ResolvedXf> {
        self.resolved.get(position).copied()
    }

    /// Total number of XF records written.
    pub fn xf_count(&self) -> usize {
        STYLE_XF_COUNT + 1 + self.formats.len()
    }

    /// Append FONT, FORMAT, XF and STYLE records.
    pub fn write_records(&self, writer: &mut RecordWriter) {
        self.fonts.write_records(writer, self.default);
        self.num_formats.write_records(writer);
        self.write_xfs(writer);
        write_style(writer);
    }

    fn write_xfs(&self, writer: &mut RecordWriter) {
        let style_xf = self.default.xf_payload(self.version, XfKind::Style, 0, 0);
        for _ in 0..STYLE_XF_COUNT {
            writer.append_record(records::XF, &style_xf);
        }

        // Default cell XF (index 15)
        let cell_xf = self.default.xf_payload(self.version, XfKind::Cell, 0, 0);
        writer.append_record(records::XF, &cell_xf);

        for (format, ids) in self.formats.iter().zip(&self.resolved) {
            let body = format.xf_payload(
                self.version,
                XfKind::Cell,
                ids.font_index,
                ids.num_format_index,
            );
            writer.append_record(records::XF, &body);
        }
    }
}

/// Built-in "Normal" style bound to XF 0.
fn write_style(writer: &mut RecordWriter) {
    let mut body = Vec::with_capacity(4);
    body.extend_from_slice(&0x8000u16.to_le_bytes()); // built-in, XF 0
    body.push(0x00); // Normal
    body.push(0xFF); // outline level
    writer.append_record(records::STYLE, &body);
}
