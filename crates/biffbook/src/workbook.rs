//! Workbook assembly.
//!
//! The workbook owns the worksheets, formats, palette and shared strings and
//! writes the globals substream when it is closed:
//!
//! ```text
//! BOF, CODEPAGE,
//!   BIFF8: WINDOW1, NAME*
//!   BIFF5: EXTERNCOUNT, EXTERNSHEET*, NAME*, WINDOW1
//! DATEMODE, FONT*, FORMAT*, XF*, STYLE, PALETTE,
//! BOUNDSHEET*, [COUNTRY], [SST + CONTINUE*], EOF
//! ```
//!
//! followed by one substream per worksheet.

use std::path::{Path, PathBuf};

use ahash::AHashSet;

use crate::biff::strings::{encode_latin1, utf16_len};
use crate::biff::{records, BiffVersion, RecordWriter};
use crate::container::{CfbFileContainer, Container};
use crate::error::{XlsError, XlsResult};
use crate::format::{Color, Format, Underline, XfIndex};
use crate::layout::{boundsheet_payload, country_payload, WorkbookLayout};
use crate::palette::Palette;
use crate::sst::SharedStringTable;
use crate::tables::{ResourceTables, STYLE_XF_COUNT};
use crate::worksheet::{SheetStream, Worksheet};

/// Longest sheet name in BIFF5.
pub const BIFF5_MAX_SHEET_NAME: usize = 31;

/// Longest sheet name in BIFF8 (one-byte length field, UTF-16 units).
pub const BIFF8_MAX_SHEET_NAME: usize = 255;

/// Most worksheets in one workbook. Sheet indices, the selected tab count and
/// the 1-based NAME sheet references all have to fit in 16 bits.
pub const MAX_SHEETS: usize = u16::MAX as usize;

/// WINDOW1 option flags: show horizontal/vertical scroll bars and sheet tabs.
const WINDOW1_FLAGS: u16 = 0x0038;

/// NAME built-in name codes.
const NAME_PRINT_AREA: u8 = 0x06;
const NAME_PRINT_TITLES: u8 = 0x07;

/// Geometry of the workbook window (WINDOW1), in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    /// Width of the tab bar relative to the horizontal scroll bar, in 1/1000.
    pub tab_ratio: u16,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0x25BC,
            height: 0x1572,
            tab_ratio: 0x0258,
        }
    }
}

/// Workbook-level settings
#[derive(Debug, Clone, Default)]
pub struct WorkbookSettings {
    /// Use the 1904 date system
    pub date_1904: bool,
    /// Country code for the COUNTRY record; none is written when unset
    pub country: Option<u16>,
    /// Sheet shown when the file is opened
    pub active_sheet: usize,
    /// First visible sheet tab
    pub first_sheet: usize,
    pub window: WindowGeometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Closed,
}

/// An Excel workbook being written.
#[derive(Debug)]
pub struct Workbook {
    target: PathBuf,
    version: BiffVersion,
    settings: WorkbookSettings,
    /// Format behind the default style and cell XFs
    default_format: Format,
    /// Registered formats; format `i` is XF `16 + i`
    formats: Vec<Format>,
    url_format: XfIndex,
    palette: Palette,
    worksheets: Vec<Worksheet>,
    /// Lowercased sheet names, for the duplicate check
    sheet_names: AHashSet<String>,
    sst: SharedStringTable,
    state: State,
}

impl Workbook {
    /// Create a workbook that [`Workbook::close`] writes to `target`.
    pub fn new<P: AsRef<Path>>(target: P, version: BiffVersion) -> Self {
        let mut workbook = Self {
            target: target.as_ref().to_path_buf(),
            version,
            settings: WorkbookSettings::default(),
            default_format: Format::default(),
            formats: Vec::new(),
            url_format: XfIndex::DEFAULT,
            palette: Palette::new(),
            worksheets: Vec::new(),
            sheet_names: AHashSet::new(),
            sst: SharedStringTable::new(),
            state: State::Open,
        };
        workbook.url_format = workbook.add_format(
            Format::new()
                .with_color(Color::Blue)
                .with_underline(Underline::Single),
        );
        workbook
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn version(&self) -> BiffVersion {
        self.version
    }

    /// Switch between BIFF5 (`5`) and BIFF8 (`8`) before any worksheet exists.
    pub fn set_version(&mut self, version: u16) -> XlsResult<()> {
        let version = BiffVersion::from_number(version)?;
        if !self.worksheets.is_empty() {
            return Err(XlsError::VersionLocked);
        }
        self.version = version;
        Ok(())
    }

    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    /// Write a COUNTRY record with this country code.
    pub fn set_country(&mut self, code: u16) {
        self.settings.country = Some(code);
    }

    pub fn set_1904(&mut self, date_1904: bool) {
        self.settings.date_1904 = date_1904;
    }

    pub fn set_active_sheet(&mut self, index: usize) {
        self.settings.active_sheet = index;
    }

    pub fn set_first_sheet(&mut self, index: usize) {
        self.settings.first_sheet = index;
    }

    /// Add a worksheet and return its index. An empty name becomes `Sheet{n}`.
    pub fn add_worksheet(&mut self, name: &str) -> XlsResult<usize> {
        let index = self.worksheets.len();
        if index >= MAX_SHEETS {
            return Err(XlsError::TooManySheets { max: MAX_SHEETS });
        }
        let name = if name.is_empty() {
            format!("Sheet{}", index + 1)
        } else {
            name.to_string()
        };

        let (len, max) = match self.version {
            BiffVersion::Biff5 => (name.chars().count(), BIFF5_MAX_SHEET_NAME),
            BiffVersion::Biff8 => (utf16_len(&name), BIFF8_MAX_SHEET_NAME),
        };
        if len > max {
            return Err(XlsError::SheetNameTooLong { name, max });
        }

        let folded = name.to_lowercase();
        if self.sheet_names.contains(&folded) {
            return Err(XlsError::DuplicateSheetName(name));
        }

        self.sheet_names.insert(folded);
        self.worksheets.push(Worksheet::new(name, index, self.version));
        Ok(index)
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Register a cell format and return its XF index.
    pub fn add_format(&mut self, format: Format) -> XfIndex {
        let index = STYLE_XF_COUNT + 1 + self.formats.len();
        self.formats.push(format);
        XfIndex(index as u16)
    }

    pub fn format(&self, xf: XfIndex) -> Option<&Format> {
        let position = (xf.get() as usize).checked_sub(STYLE_XF_COUNT + 1)?;
        self.formats.get(position)
    }

    /// Format for hyperlinks (blue, underlined).
    pub fn url_format(&self) -> XfIndex {
        self.url_format
    }

    /// Replace palette colour `index` (8..=64). See [`Palette::set_custom_color`].
    pub fn set_custom_color(
        &mut self,
        index: i32,
        red: i32,
        green: i32,
        blue: i32,
    ) -> XlsResult<u8> {
        self.palette.set_custom_color(index, red, green, blue)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Shared strings collected by the last assembly.
    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.sst
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Write the workbook to its target file.
    ///
    /// Closing twice is a no-op. If writing fails the workbook stays open and
    /// `close` can be called again.
    pub fn close(&mut self) -> XlsResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        let mut container = CfbFileContainer::new(&self.target);
        self.close_with(&mut container)
    }

    /// Write the workbook into `container`.
    pub fn close_with<C: Container>(&mut self, container: &mut C) -> XlsResult<()> {
        if self.is_closed() {
            return Ok(());
        }

        let globals = self.assemble()?;

        let mut handle = container.open(self.version.stream_name())?;
        container.append(&mut handle, &globals)?;
        for sheet in &self.worksheets {
            container.append(&mut handle, sheet.data())?;
        }
        container.commit(handle)?;

        self.state = State::Closed;
        Ok(())
    }

    /// Close every sheet and build the globals substream.
    ///
    /// The result depends only on the workbook contents, so assembling again
    /// after a failed commit produces the same bytes.
    pub(crate) fn assemble(&mut self) -> XlsResult<Vec<u8>> {
        let version = self.version;
        let mut writer = RecordWriter::new(version);
        self.sst.clear();

        if self.worksheets.is_empty() {
            writer.write_bof(records::BOF_WORKBOOK_GLOBALS);
            writer.write_eof();
            log::debug!("workbook has no worksheets; writing an empty globals stream");
            return Ok(writer.into_bytes());
        }

        let active = self.active_sheet_index();
        let first = self.sheet_index_or_first(self.settings.first_sheet, "first");
        // the active tab is always selected, without touching the sheet itself
        let selection: Vec<bool> = self
            .worksheets
            .iter()
            .enumerate()
            .map(|(i, ws)| i == active || ws.is_selected())
            .collect();
        let selected = selection.iter().filter(|&&s| s).count();

        for (i, sheet) in self.worksheets.iter_mut().enumerate() {
            sheet.close(&mut self.sst, selection[i], i == active);
        }

        writer.write_bof(records::BOF_WORKBOOK_GLOBALS);
        writer.append_record(records::CODEPAGE, &version.codepage().to_le_bytes());
        match version {
            BiffVersion::Biff8 => {
                self.write_window1(&mut writer, active, first, selected);
                self.write_names(&mut writer);
            }
            BiffVersion::Biff5 => {
                self.write_externs(&mut writer);
                self.write_names(&mut writer);
                self.write_window1(&mut writer, active, first, selected);
            }
        }
        writer.append_record(
            records::DATEMODE,
            &u16::from(self.settings.date_1904).to_le_bytes(),
        );

        let tables = ResourceTables::build(version, &self.default_format, &self.formats);
        tables.write_records(&mut writer);
        self.palette.write_record(&mut writer);

        let layout = WorkbookLayout::compute(
            version,
            writer.len(),
            &self.worksheets,
            self.settings.country,
            &self.sst,
        )?;

        for (sheet, &offset) in self.worksheets.iter().zip(&layout.sheet_offsets) {
            let body = boundsheet_payload(version, sheet.name(), offset, sheet.is_hidden());
            writer.append_record(records::BOUNDSHEET, &body);
        }
        if let Some(code) = self.settings.country {
            writer.append_record(records::COUNTRY, &country_payload(code));
        }
        if version.is_biff8() {
            self.sst.write_records(&mut writer);
        }
        writer.write_eof();

        debug_assert_eq!(writer.len(), layout.globals_end());
        Ok(writer.into_bytes())
    }

    /// The requested active sheet, or the first visible one when it is hidden.
    fn active_sheet_index(&self) -> usize {
        let requested = self.sheet_index_or_first(self.settings.active_sheet, "active");
        if !self.worksheets[requested].is_hidden() {
            return requested;
        }
        match self.worksheets.iter().position(|ws| !ws.is_hidden()) {
            Some(visible) => {
                log::warn!("active sheet {requested} is hidden; using sheet {visible}");
                visible
            }
            None => {
                log::warn!("all sheets are hidden; sheet {requested} stays active");
                requested
            }
        }
    }

    fn sheet_index_or_first(&self, index: usize, what: &str) -> usize {
        if index < self.worksheets.len() {
            index
        } else {
            log::warn!(
                "{what} sheet {index} does not exist ({} sheets); using sheet 0",
                self.worksheets.len()
            );
            0
        }
    }

    fn write_window1(
        &self,
        writer: &mut RecordWriter,
        active: usize,
        first: usize,
        selected: usize,
    ) {
        let window = &self.settings.window;
        let mut body = Vec::with_capacity(18);
        for value in [
            window.x,
            window.y,
            window.width,
            window.height,
            WINDOW1_FLAGS,
            active as u16,
            first as u16,
            selected as u16,
            window.tab_ratio,
        ] {
            body.extend_from_slice(&value.to_le_bytes());
        }
        writer.append_record(records::WINDOW1, &body);
    }

    /// EXTERNCOUNT and one EXTERNSHEET per sheet, referenced by BIFF5 NAMEs.
    fn write_externs(&self, writer: &mut RecordWriter) {
        writer.append_record(
            records::EXTERNCOUNT,
            &(self.worksheets.len() as u16).to_le_bytes(),
        );
        for sheet in &self.worksheets {
            let name = encode_latin1(sheet.name());
            let mut body = Vec::with_capacity(2 + name.len());
            body.push(name.len() as u8);
            body.push(0x03); // reference to a sheet in this workbook
            body.extend_from_slice(&name);
            writer.append_record(records::EXTERNSHEET, &body);
        }
    }

    /// Built-in NAMEs for print areas, then for print titles.
    fn write_names(&self, writer: &mut RecordWriter) {
        for (index, sheet) in self.worksheets.iter().enumerate() {
            if let Some(area) = sheet.print_area() {
                let body = name_short(
                    index as u16,
                    NAME_PRINT_AREA,
                    (area.first_row as u16, area.last_row as u16),
                    (area.first_col as u8, area.last_col as u8),
                );
                writer.append_record(records::NAME, &body);
            }
        }

        for (index, sheet) in self.worksheets.iter().enumerate() {
            let titles = sheet.print_titles();
            let index = index as u16;
            let rows = titles.rows.map(|(r0, r1)| (r0 as u16, r1 as u16));
            let cols = titles.cols.map(|(c0, c1)| (c0 as u8, c1 as u8));
            let body = match (rows, cols) {
                (Some(rows), Some(cols)) => name_long(index, NAME_PRINT_TITLES, rows, cols),
                (Some(rows), None) => name_short(index, NAME_PRINT_TITLES, rows, (0x00, 0xFF)),
                (None, Some(cols)) => name_short(index, NAME_PRINT_TITLES, (0x0000, 0x3FFF), cols),
                (None, None) => continue,
            };
            writer.append_record(records::NAME, &body);
        }
    }
}

/// Fixed part of a built-in NAME: flags, sizes, sheet references and the
/// one-character built-in name.
fn name_header(body: &mut Vec<u8>, index: u16, name_type: u8, formula_len: u16) {
    let ixals = index + 1;
    body.extend_from_slice(&0x0020u16.to_le_bytes()); // built-in name
    body.push(0x00); // keyboard shortcut
    body.push(0x01); // name length
    body.extend_from_slice(&formula_len.to_le_bytes());
    body.extend_from_slice(&ixals.to_le_bytes());
    body.extend_from_slice(&ixals.to_le_bytes());
    body.extend_from_slice(&[0x00; 4]); // menu, description, help, status text lengths
    body.push(name_type);
}

/// 3-D area reference to rows and columns of sheet `index`.
fn area_ref(
    body: &mut Vec<u8>,
    index: u16,
    area_token: u16,
    rows: (u16, u16),
    cols: (u8, u8),
) {
    body.push(0x3B); // tArea3d
    body.extend_from_slice(&(0xFFFF - index).to_le_bytes());
    body.extend_from_slice(&[0x00; 4]);
    body.extend_from_slice(&0x1087u16.to_le_bytes());
    body.extend_from_slice(&area_token.to_le_bytes());
    body.extend_from_slice(&index.to_le_bytes());
    body.extend_from_slice(&index.to_le_bytes());
    body.extend_from_slice(&rows.0.to_le_bytes());
    body.extend_from_slice(&rows.1.to_le_bytes());
    body.push(cols.0);
    body.push(cols.1);
}

/// NAME for a single area.
fn name_short(index: u16, name_type: u8, rows: (u16, u16), cols: (u8, u8)) -> Vec<u8> {
    let mut body = Vec::with_capacity(36);
    name_header(&mut body, index, name_type, 0x0015);
    area_ref(&mut body, index, 0x8005, rows, cols);
    body
}

/// NAME for repeated columns and rows (a union of two areas).
fn name_long(index: u16, name_type: u8, rows: (u16, u16), cols: (u8, u8)) -> Vec<u8> {
    let mut body = Vec::with_capacity(61);
    name_header(&mut body, index, name_type, 0x002E);
    body.push(0x29); // tMemFunc
    body.extend_from_slice(&0x002Bu16.to_le_bytes());
    area_ref(&mut body, index, 0x8008, (0x0000, 0x3FFF), cols);
    area_ref(&mut body, index, 0x8008, rows, (0x00, 0xFF));
    body.push(0x10); // tList
    body
}
