//! BIFF5/BIFF8 record type constants.
//!
//! Reference: [MS-XLS] §2.3, Record Enumeration

// ── Stream structure ────────────────────────────────────────────────────
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

// ── Workbook globals ────────────────────────────────────────────────────
pub const CODEPAGE: u16 = 0x0042; // 1252 for BIFF5, 1200 (UTF-16) for BIFF8
pub const WINDOW1: u16 = 0x003D; // Workbook window geometry and tab selection
pub const EXTERNCOUNT: u16 = 0x0016; // BIFF5 only: number of EXTERNSHEETs
pub const EXTERNSHEET: u16 = 0x0017; // BIFF5 only: sheet reference for NAME
pub const NAME: u16 = 0x0018; // Built-in names (print area, print titles)
pub const DATEMODE: u16 = 0x0022; // 1900 vs 1904 date system
pub const FONT: u16 = 0x0031; // Font definition
pub const FORMAT: u16 = 0x041E; // Number format string
pub const XF: u16 = 0x00E0; // Extended Format (cell format record)
pub const STYLE: u16 = 0x0293; // Named cell style
pub const PALETTE: u16 = 0x0092; // Custom color palette
pub const BOUNDSHEET: u16 = 0x0085; // Sheet name, visibility, stream offset
pub const COUNTRY: u16 = 0x008C; // Locale codes
pub const SST: u16 = 0x00FC; // Shared String Table

// ── Cell records ────────────────────────────────────────────────────────
pub const DIMENSION: u16 = 0x0200; // Used range (first/last row/col)
pub const LABELSST: u16 = 0x00FD; // Cell containing SST string index
pub const LABEL: u16 = 0x0204; // Cell with inline string (BIFF5)
pub const NUMBER: u16 = 0x0203; // Cell with IEEE 754 double
pub const BLANK: u16 = 0x0201; // Empty cell with formatting
pub const BOOLERR: u16 = 0x0205; // Boolean or error cell

// ── Sheet structure ─────────────────────────────────────────────────────
pub const WINDOW2: u16 = 0x023E; // Sheet view settings

// ── BOF subtypes (the `dt` field) ───────────────────────────────────────
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BOF_WORKSHEET: u16 = 0x0010;

/// Version field written into BOF.
pub const BIFF5_VERSION: u16 = 0x0500;
pub const BIFF8_VERSION: u16 = 0x0600;
