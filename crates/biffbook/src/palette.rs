//! Workbook colour palette and the PALETTE record.

use crate::biff::{records, RecordWriter};
use crate::error::{XlsError, XlsResult};

/// First user-definable palette index. Indices 0–7 are fixed EGA colours.
pub const FIRST_CUSTOM_INDEX: i32 = 8;

/// Last index accepted by [`Palette::set_custom_color`].
pub const LAST_CUSTOM_INDEX: i32 = 64;

/// Number of entries written into the PALETTE record.
pub const PALETTE_SIZE: usize = 56;

// ============================================================================
// Default BIFF8 color palette (56 entries, indices 8–63)
// ============================================================================

/// The Excel 97 default palette. Indices 8–63 in the workbook map to entries
/// 0–55 here.
pub(crate) const DEFAULT_PALETTE: [(u8, u8, u8); PALETTE_SIZE] = [
    (0, 0, 0),       //  8: Black
    (255, 255, 255), //  9: White
    (255, 0, 0),     // 10: Red
    (0, 255, 0),     // 11: Bright Green
    (0, 0, 255),     // 12: Blue
    (255, 255, 0),   // 13: Yellow
    (255, 0, 255),   // 14: Pink
    (0, 255, 255),   // 15: Turquoise
    (128, 0, 0),     // 16: Dark Red
    (0, 128, 0),     // 17: Green
    (0, 0, 128),     // 18: Dark Blue
    (128, 128, 0),   // 19: Dark Yellow
    (128, 0, 128),   // 20: Violet
    (0, 128, 128),   // 21: Teal
    (192, 192, 192), // 22: Silver (25% Gray)
    (128, 128, 128), // 23: Gray (50% Gray)
    (153, 153, 255), // 24: Periwinkle
    (153, 51, 102),  // 25: Plum
    (255, 255, 204), // 26: Ivory
    (204, 255, 255), // 27: Light Turquoise
    (102, 0, 102),   // 28: Dark Purple
    (255, 128, 128), // 29: Coral
    (0, 102, 204),   // 30: Ocean Blue
    (204, 204, 255), // 31: Ice Blue
    (0, 0, 128),     // 32: Dark Blue (dup)
    (255, 0, 255),   // 33: Pink (dup)
    (255, 255, 0),   // 34: Yellow (dup)
    (0, 255, 255),   // 35: Turquoise (dup)
    (128, 0, 128),   // 36: Violet (dup)
    (128, 0, 0),     // 37: Dark Red (dup)
    (0, 128, 128),   // 38: Teal (dup)
    (0, 0, 255),     // 39: Blue (dup)
    (0, 204, 255),   // 40: Sky Blue
    (204, 255, 255), // 41: Light Turquoise (dup)
    (204, 255, 204), // 42: Light Green
    (255, 255, 153), // 43: Light Yellow
    (153, 204, 255), // 44: Pale Blue
    (255, 153, 204), // 45: Rose
    (204, 153, 255), // 46: Lavender
    (255, 204, 153), // 47: Tan
    (51, 102, 255),  // 48: Light Blue
    (51, 204, 204),  // 49: Aqua
    (153, 204, 0),   // 50: Lime
    (255, 204, 0),   // 51: Gold
    (255, 153, 0),   // 52: Light Orange
    (255, 102, 0),   // 53: Orange
    (102, 102, 153), // 54: Blue-Gray
    (150, 150, 150), // 55: 40% Gray
    (0, 51, 102),    // 56: Dark Teal
    (51, 153, 102),  // 57: Sea Green
    (0, 51, 0),      // 58: Dark Green
    (51, 51, 0),     // 59: Olive Green
    (153, 51, 0),    // 60: Brown
    (153, 51, 102),  // 61: Plum (dup)
    (51, 51, 153),   // 62: Indigo
    (51, 51, 51),    // 63: 80% Gray
];

/// Colour table of a workbook.
///
/// Slots 8–63 are written to the PALETTE record. Slot 64 (system window text)
/// can be customised and read back but has no place in the 56-entry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [(u8, u8, u8); PALETTE_SIZE],
    system_text: Option<(u8, u8, u8)>,
}

impl Palette {
    /// Palette initialised to the Excel 97 defaults.
    pub fn new() -> Self {
        Self {
            entries: DEFAULT_PALETTE,
            system_text: None,
        }
    }

    /// Replace the RGB value of palette slot `index` (8..=64).
    ///
    /// Validation happens before anything changes; on error the palette is
    /// left untouched. Returns the index that was set.
    pub fn set_custom_color(
        &mut self,
        index: i32,
        red: i32,
        green: i32,
        blue: i32,
    ) -> XlsResult<u8> {
        if !(FIRST_CUSTOM_INDEX..=LAST_CUSTOM_INDEX).contains(&index) {
            return Err(XlsError::InvalidColorIndex(index));
        }
        let rgb = (channel(red)?, channel(green)?, channel(blue)?);

        let slot = (index - FIRST_CUSTOM_INDEX) as usize;
        match self.entries.get_mut(slot) {
            Some(entry) => *entry = rgb,
            None => self.system_text = Some(rgb),
        }
        Ok(index as u8)
    }

    /// RGB value at palette index `index` (8..=64).
    pub fn get(&self, index: u8) -> Option<(u8, u8, u8)> {
        let index = i32::from(index);
        if !(FIRST_CUSTOM_INDEX..=LAST_CUSTOM_INDEX).contains(&index) {
            return None;
        }
        let slot = (index - FIRST_CUSTOM_INDEX) as usize;
        match self.entries.get(slot) {
            Some(rgb) => Some(*rgb),
            None => Some(self.system_text.unwrap_or((0, 0, 0))),
        }
    }

    /// The 56 entries written to the PALETTE record, in index order.
    pub fn entries(&self) -> &[(u8, u8, u8); PALETTE_SIZE] {
        &self.entries
    }

    /// PALETTE body: count + (R, G, B, 0) per entry.
    pub fn payload(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(2 + 4 * PALETTE_SIZE);
        body.extend_from_slice(&(PALETTE_SIZE as u16).to_le_bytes());
        for &(r, g, b) in &self.entries {
            body.extend_from_slice(&[r, g, b, 0x00]);
        }
        body
    }

    pub fn write_record(&self, writer: &mut RecordWriter) {
        if self.system_text.is_some() {
            log::warn!("custom colour for palette index 64 is not stored in the PALETTE record");
        }
        writer.append_record(records::PALETTE, &self.payload());
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

fn channel(value: i32) -> XlsResult<u8> {
    u8::try_from(value).map_err(|_| XlsError::InvalidColorComponent(value))
}
