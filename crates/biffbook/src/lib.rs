//! # biffbook
//!
//! Writer for the legacy Excel binary format (.xls).
//!
//! A [`Workbook`] collects worksheets, cell formats and strings, lays out the
//! workbook globals stream (BIFF5 or BIFF8 records) and hands the finished
//! streams to a compound-document [`Container`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use biffbook::{BiffVersion, Format, Workbook};
//!
//! let mut workbook = Workbook::new("report.xls", BiffVersion::Biff8);
//! let bold = workbook.add_format(Format::new().with_bold(true));
//!
//! let sheet = workbook.add_worksheet("Example").unwrap();
//! let ws = workbook.worksheet_mut(sheet).unwrap();
//! ws.write_string(0, 0, "Example", Some(bold)).unwrap();
//! ws.write_number(1, 0, 42.0, None).unwrap();
//!
//! workbook.close().unwrap();
//! ```

pub mod biff;
pub mod container;
pub mod error;
pub mod format;
pub mod layout;
pub mod palette;
pub mod sst;
pub mod tables;
pub mod workbook;
pub mod worksheet;

pub use biff::{BiffVersion, RecordWriter};
pub use container::{CfbFileContainer, Container, MemoryContainer, StreamHandle};
pub use error::{XlsError, XlsResult};
pub use format::{
    BorderStyle, Color, Format, HorizontalAlignment, NumberFormat, Script, Underline,
    VerticalAlignment, XfIndex,
};
pub use palette::Palette;
pub use sst::SharedStringTable;
pub use workbook::{WindowGeometry, Workbook, WorkbookSettings};
pub use worksheet::{CellRange, CellValue, PrintTitles, SheetStream, Worksheet};
