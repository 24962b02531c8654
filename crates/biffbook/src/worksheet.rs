//! Worksheets and their BIFF substreams.
//!
//! A worksheet collects cell values until the workbook is closed. Closing
//! encodes the substream (BOF, DIMENSIONS, cells, WINDOW2, EOF); the workbook
//! only needs the encoded bytes and a few header fields, which it reads
//! through [`SheetStream`].

use std::collections::BTreeMap;

use crate::biff::strings::{push_byte_string, truncate_chars, truncate_utf16, LengthPrefix};
use crate::biff::{records, BiffVersion, RecordWriter};
use crate::error::{XlsError, XlsResult};
use crate::format::XfIndex;
use crate::sst::SharedStringTable;

/// Number of columns in a BIFF5/BIFF8 worksheet.
pub const MAX_COLS: u16 = 256;

/// Longest cell string in BIFF5 (bytes).
pub const BIFF5_MAX_STRING: usize = 255;

/// Longest cell string in BIFF8 (UTF-16 code units).
pub const BIFF8_MAX_STRING: usize = 32_767;

/// WINDOW2 option flags: show zeros, gridlines, headers, outline symbols and
/// use the default gridline colour.
const WINDOW2_DEFAULT: u16 = 0x00B6;
const WINDOW2_SELECTED: u16 = 0x0200;
const WINDOW2_ACTIVE: u16 = 0x0400;

/// Rectangular block of cells (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

/// Rows and columns repeated on every printed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintTitles {
    pub rows: Option<(u32, u32)>,
    pub cols: Option<(u16, u16)>,
}

impl PrintTitles {
    pub fn is_empty(&self) -> bool {
        self.rows.is_none() && self.cols.is_none()
    }
}

/// What the workbook needs from a closed sheet.
pub trait SheetStream {
    fn name(&self) -> &str;

    fn is_selected(&self) -> bool;

    fn is_hidden(&self) -> bool;

    /// Length of the encoded substream.
    fn data_size(&self) -> usize {
        self.data().len()
    }

    /// The encoded substream, BOF to EOF.
    fn data(&self) -> &[u8];

    fn print_area(&self) -> Option<CellRange>;

    fn print_titles(&self) -> PrintTitles;
}

/// Value stored in a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
struct Cell {
    value: CellValue,
    xf: XfIndex,
}

/// A worksheet.
#[derive(Debug)]
pub struct Worksheet {
    name: String,
    index: usize,
    version: BiffVersion,
    /// Cells keyed by (row, col), iterated in row-major order
    cells: BTreeMap<(u32, u16), Cell>,
    selected: bool,
    hidden: bool,
    print_area: Option<CellRange>,
    print_titles: PrintTitles,
    /// Encoded substream, filled on close
    data: Vec<u8>,
}

impl Worksheet {
    pub(crate) fn new(name: String, index: usize, version: BiffVersion) -> Self {
        Self {
            name,
            index,
            version,
            cells: BTreeMap::new(),
            selected: false,
            hidden: false,
            print_area: None,
            print_titles: PrintTitles::default(),
            data: Vec::new(),
        }
    }

    /// Position of the sheet in the workbook.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn check_cell(&self, row: u32, col: u16) -> XlsResult<()> {
        if row >= self.version.max_rows() || col >= MAX_COLS {
            return Err(XlsError::CellOutOfRange { row, col });
        }
        Ok(())
    }

    fn insert(
        &mut self,
        row: u32,
        col: u16,
        value: CellValue,
        xf: Option<XfIndex>,
    ) -> XlsResult<()> {
        self.check_cell(row, col)?;
        self.cells.insert(
            (row, col),
            Cell {
                value,
                xf: xf.unwrap_or_default(),
            },
        );
        Ok(())
    }

    pub fn write_number(
        &mut self,
        row: u32,
        col: u16,
        value: f64,
        xf: Option<XfIndex>,
    ) -> XlsResult<()> {
        self.insert(row, col, CellValue::Number(value), xf)
    }

    /// Write a string cell. Text over the version's limit is truncated.
    pub fn write_string(
        &mut self,
        row: u32,
        col: u16,
        text: &str,
        xf: Option<XfIndex>,
    ) -> XlsResult<()> {
        self.check_cell(row, col)?;
        let stored = match self.version {
            BiffVersion::Biff5 => truncate_chars(text, BIFF5_MAX_STRING),
            BiffVersion::Biff8 => truncate_utf16(text, BIFF8_MAX_STRING),
        };
        if stored.len() < text.len() {
            log::warn!(
                "string in {}!R{}C{} truncated to {} characters",
                self.name,
                row + 1,
                col + 1,
                stored.chars().count()
            );
        }
        self.insert(row, col, CellValue::Text(stored.to_string()), xf)
    }

    pub fn write_boolean(
        &mut self,
        row: u32,
        col: u16,
        value: bool,
        xf: Option<XfIndex>,
    ) -> XlsResult<()> {
        self.insert(row, col, CellValue::Boolean(value), xf)
    }

    /// Write an empty cell that only carries a format.
    pub fn write_blank(&mut self, row: u32, col: u16, xf: XfIndex) -> XlsResult<()> {
        self.insert(row, col, CellValue::Blank, Some(xf))
    }

    pub fn value_at(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col)).map(|c| &c.value)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn range(
        &self,
        first_row: u32,
        last_row: u32,
        first_col: u16,
        last_col: u16,
    ) -> XlsResult<CellRange> {
        if first_row > last_row || first_col > last_col {
            return Err(XlsError::InvalidRange(format!(
                "rows {first_row}..={last_row}, columns {first_col}..={last_col}"
            )));
        }
        if last_row >= self.version.max_rows() || last_col >= MAX_COLS {
            return Err(XlsError::InvalidRange(format!(
                "rows {first_row}..={last_row}, columns {first_col}..={last_col} exceed the sheet"
            )));
        }
        Ok(CellRange {
            first_row,
            last_row,
            first_col,
            last_col,
        })
    }

    /// Restrict printing to a block of cells.
    pub fn set_print_area(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_row: u32,
        last_col: u16,
    ) -> XlsResult<()> {
        self.print_area = Some(self.range(first_row, last_row, first_col, last_col)?);
        Ok(())
    }

    /// Repeat rows `first..=last` at the top of each printed page.
    pub fn repeat_rows(&mut self, first: u32, last: u32) -> XlsResult<()> {
        self.range(first, last, 0, 0)?;
        self.print_titles.rows = Some((first, last));
        Ok(())
    }

    /// Repeat columns `first..=last` at the left of each printed page.
    pub fn repeat_columns(&mut self, first: u16, last: u16) -> XlsResult<()> {
        self.range(0, 0, first, last)?;
        self.print_titles.cols = Some((first, last));
        Ok(())
    }

    /// Encode the substream. Strings go to `sst` in BIFF8.
    ///
    /// `selected` and `active` are the tab state decided by the workbook for
    /// this assembly; the sheet's own flags are left as the caller set them.
    pub(crate) fn close(
        &mut self,
        sst: &mut SharedStringTable,
        selected: bool,
        active: bool,
    ) {
        let mut writer = RecordWriter::new(self.version);
        writer.write_bof(records::BOF_WORKSHEET);
        self.write_dimensions(&mut writer);

        for (&(row, col), cell) in &self.cells {
            let mut body = Vec::with_capacity(16);
            body.extend_from_slice(&(row as u16).to_le_bytes());
            body.extend_from_slice(&col.to_le_bytes());
            body.extend_from_slice(&cell.xf.get().to_le_bytes());

            let record_type = match &cell.value {
                CellValue::Number(value) => {
                    body.extend_from_slice(&value.to_le_bytes());
                    records::NUMBER
                }
                CellValue::Text(text) => match self.version {
                    BiffVersion::Biff8 => {
                        body.extend_from_slice(&sst.intern(text).to_le_bytes());
                        records::LABELSST
                    }
                    BiffVersion::Biff5 => {
                        push_byte_string(&mut body, text, LengthPrefix::Word);
                        records::LABEL
                    }
                },
                CellValue::Boolean(value) => {
                    body.push(u8::from(*value));
                    body.push(0x00); // boolean, not an error code
                    records::BOOLERR
                }
                CellValue::Blank => records::BLANK,
            };
            writer.append_record(record_type, &body);
        }

        self.write_window2(&mut writer, selected, active);
        writer.write_eof();

        self.data = writer.into_bytes();
        log::debug!(
            "sheet {:?}: {} cells, {} bytes",
            self.name,
            self.cells.len(),
            self.data.len()
        );
    }

    fn write_dimensions(&self, writer: &mut RecordWriter) {
        let (first_row, last_row, first_col, last_col) = match self.used_bounds() {
            Some((r0, r1, c0, c1)) => (r0, r1 + 1, c0, c1 + 1),
            None => (0, 0, 0, 0),
        };

        let mut body = Vec::with_capacity(14);
        match self.version {
            BiffVersion::Biff5 => {
                body.extend_from_slice(&(first_row as u16).to_le_bytes());
                body.extend_from_slice(&(last_row as u16).to_le_bytes());
            }
            BiffVersion::Biff8 => {
                body.extend_from_slice(&first_row.to_le_bytes());
                body.extend_from_slice(&last_row.to_le_bytes());
            }
        }
        body.extend_from_slice(&first_col.to_le_bytes());
        body.extend_from_slice(&last_col.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes()); // reserved
        writer.append_record(records::DIMENSION, &body);
    }

    fn used_bounds(&self) -> Option<(u32, u32, u16, u16)> {
        let first_row = self.cells.keys().next()?.0;
        let last_row = self.cells.keys().next_back()?.0;
        let first_col = self.cells.keys().map(|&(_, c)| c).min()?;
        let last_col = self.cells.keys().map(|&(_, c)| c).max()?;
        Some((first_row, last_row, first_col, last_col))
    }

    fn write_window2(&self, writer: &mut RecordWriter, selected: bool, active: bool) {
        let mut grbit = WINDOW2_DEFAULT;
        if selected {
            grbit |= WINDOW2_SELECTED;
        }
        if active {
            grbit |= WINDOW2_ACTIVE;
        }

        let mut body = Vec::with_capacity(18);
        body.extend_from_slice(&grbit.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes()); // top row
        body.extend_from_slice(&0u16.to_le_bytes()); // left column
        body.extend_from_slice(&0x0000_0040u32.to_le_bytes()); // gridline colour
        if self.version.is_biff8() {
            body.extend_from_slice(&0u16.to_le_bytes()); // page break preview zoom
            body.extend_from_slice(&0u16.to_le_bytes()); // normal zoom
            body.extend_from_slice(&0u32.to_le_bytes()); // reserved
        }
        writer.append_record(records::WINDOW2, &body);
    }
}

impl SheetStream for Worksheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn print_area(&self) -> Option<CellRange> {
        self.print_area
    }

    fn print_titles(&self) -> PrintTitles {
        self.print_titles
    }
}
