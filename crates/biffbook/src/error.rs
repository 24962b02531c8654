//! XLS writer error types

use thiserror::Error;

/// Result type for XLS operations
pub type XlsResult<T> = std::result::Result<T, XlsError>;

/// Errors that can occur while building or writing a workbook
#[derive(Debug, Error)]
pub enum XlsError {
    /// IO error (also covers CFB errors which use std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Palette index outside the user-definable range
    #[error("Color index {0} outside range: 8 <= index <= 64")]
    InvalidColorIndex(i32),

    /// RGB component outside 0..=255
    #[error("Color component {0} outside range: 0 <= color <= 255")]
    InvalidColorComponent(i32),

    /// A worksheet with this name already exists
    #[error("Worksheet '{0}' already exists")]
    DuplicateSheetName(String),

    /// Sheet name exceeds the format's limit
    #[error("Sheet name '{name}' must be <= {max} characters")]
    SheetNameTooLong { name: String, max: usize },

    /// No room for another worksheet
    #[error("A workbook can hold at most {max} worksheets")]
    TooManySheets { max: usize },

    /// BIFF version number other than 5 or 8
    #[error("Unsupported BIFF version: {0}")]
    UnsupportedVersion(u16),

    /// Version change requested after worksheets were created
    #[error("BIFF version cannot change once worksheets have been added")]
    VersionLocked,

    /// Cell coordinates outside the format's grid
    #[error("Cell ({row}, {col}) is outside the worksheet limits")]
    CellOutOfRange { row: u32, col: u16 },

    /// Malformed print area or title range
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Sheet offsets no longer fit the 32-bit BOUNDSHEET field
    #[error("Workbook stream too large: {0} bytes")]
    StreamTooLarge(usize),

    /// The container packager rejected the workbook
    #[error("Container write failed: {0}")]
    ContainerWrite(String),
}
