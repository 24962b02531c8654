//! BIFF string encoding.
//!
//! BIFF5 strings are 8-bit code page text behind a 1- or 2-byte length.
//!
//! BIFF8 strings carry a flags byte after the character count:
//! - Flags bit 0 (`fHighByte`): 0 = compressed Latin-1, 1 = uncompressed UTF-16LE
//!
//! Text made only of characters up to U+00FF is written compressed, anything
//! else as UTF-16LE. The character count is always in UTF-16 code units.

/// Width of the character-count prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    /// 1-byte count (BOUNDSHEET, FONT, BIFF5 FORMAT)
    Byte,
    /// 2-byte count (SST, LABEL, BIFF8 FORMAT)
    Word,
}

impl LengthPrefix {
    fn push(self, out: &mut Vec<u8>, count: usize) {
        match self {
            LengthPrefix::Byte => out.push(count as u8),
            LengthPrefix::Word => out.extend_from_slice(&(count as u16).to_le_bytes()),
        }
    }
}

/// `fHighByte` flag value for uncompressed UTF-16 data.
pub const FLAG_WIDE: u8 = 0x01;

/// True if every character fits in one compressed byte.
pub fn fits_latin1(text: &str) -> bool {
    text.chars().all(|c| (c as u32) <= 0xFF)
}

/// Number of UTF-16 code units in `text`.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Encode as 8-bit text; characters above U+00FF become `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    let mut lossy = false;
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| {
            let cp = c as u32;
            if cp <= 0xFF {
                cp as u8
            } else {
                lossy = true;
                b'?'
            }
        })
        .collect();
    if lossy {
        log::warn!("text {text:?} has characters outside the 8-bit code page; replaced with '?'");
    }
    bytes
}

/// Encode as UTF-16LE code units.
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Append a BIFF8 Unicode string: count + flags + character data.
///
/// Returns the flags byte that was written.
pub fn push_unicode_string(out: &mut Vec<u8>, text: &str, prefix: LengthPrefix) -> u8 {
    if fits_latin1(text) {
        prefix.push(out, text.chars().count());
        out.push(0x00);
        out.extend(text.chars().map(|c| c as u8));
        0x00
    } else {
        prefix.push(out, utf16_len(text));
        out.push(FLAG_WIDE);
        out.extend_from_slice(&encode_utf16le(text));
        FLAG_WIDE
    }
}

/// Append a UTF-16LE string with the wide flag forced, as Excel writes sheet
/// names in BIFF8 BOUNDSHEET records.
pub fn push_wide_string(out: &mut Vec<u8>, text: &str, prefix: LengthPrefix) {
    prefix.push(out, utf16_len(text));
    out.push(FLAG_WIDE);
    out.extend_from_slice(&encode_utf16le(text));
}

/// Append a BIFF5 byte string: count + 8-bit characters.
pub fn push_byte_string(out: &mut Vec<u8>, text: &str, prefix: LengthPrefix) {
    let bytes = encode_latin1(text);
    prefix.push(out, bytes.len());
    out.extend_from_slice(&bytes);
}

/// Truncate `text` to at most `max` UTF-16 code units without splitting a
/// surrogate pair.
pub fn truncate_utf16(text: &str, max: usize) -> &str {
    let mut units = 0;
    for (idx, c) in text.char_indices() {
        units += c.len_utf16();
        if units > max {
            return &text[..idx];
        }
    }
    text
}

/// Truncate `text` to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
