//! Sheet offset calculation.
//!
//! BOUNDSHEET records carry the absolute stream offset of each sheet's BOF,
//! but they are written before the SST and before the sheets themselves. The
//! calculator adds up every record still to come after the globals written so
//! far, using the same encoders and the same SST chunker as the real writer.

use crate::biff::strings::{push_byte_string, push_wide_string, LengthPrefix};
use crate::biff::{framed_len, BiffVersion, RECORD_HEADER_LEN};
use crate::error::{XlsError, XlsResult};
use crate::sst::{SharedStringTable, SstLayout};
use crate::worksheet::SheetStream;

/// BOUNDSHEET visibility flag for hidden sheets.
const SHEET_HIDDEN: u16 = 0x0001;

/// BOUNDSHEET record body.
pub fn boundsheet_payload(version: BiffVersion, name: &str, offset: u32, hidden: bool) -> Vec<u8> {
    let grbit = if hidden { SHEET_HIDDEN } else { 0 };
    let mut body = Vec::with_capacity(8 + name.len() * 2);
    body.extend_from_slice(&offset.to_le_bytes());
    body.extend_from_slice(&grbit.to_le_bytes());
    match version {
        BiffVersion::Biff5 => push_byte_string(&mut body, name, LengthPrefix::Byte),
        BiffVersion::Biff8 => push_wide_string(&mut body, name, LengthPrefix::Byte),
    }
    body
}

/// COUNTRY record body: the same code for the default and the current locale.
pub fn country_payload(code: u16) -> Vec<u8> {
    let mut body = Vec::with_capacity(4);
    body.extend_from_slice(&code.to_le_bytes());
    body.extend_from_slice(&code.to_le_bytes());
    body
}

/// Byte layout of the tail of the globals substream and of the sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookLayout {
    /// Globals written before the BOUNDSHEET records.
    pub globals_len: usize,
    /// Framed size of each BOUNDSHEET record.
    pub boundsheet_lens: Vec<usize>,
    /// Framed size of the COUNTRY record, 0 when none is written.
    pub country_len: usize,
    /// SST layout (BIFF8 only).
    pub sst: Option<SstLayout>,
    /// Offset of each sheet's BOF from the start of the stream.
    pub sheet_offsets: Vec<u32>,
    /// Length of the whole workbook stream.
    pub total_len: usize,
}

impl WorkbookLayout {
    /// Compute the layout for `sheets`, which must already be closed.
    pub fn compute<S: SheetStream>(
        version: BiffVersion,
        globals_len: usize,
        sheets: &[S],
        country: Option<u16>,
        sst: &SharedStringTable,
    ) -> XlsResult<Self> {
        let boundsheet_lens: Vec<usize> = sheets
            .iter()
            .map(|sheet| {
                let body = boundsheet_payload(version, sheet.name(), 0, sheet.is_hidden());
                framed_len(version, body.len())
            })
            .collect();

        let country_len = country
            .map(|code| framed_len(version, country_payload(code).len()))
            .unwrap_or(0);

        let sst = version.is_biff8().then(|| sst.measure());
        let sst_len = sst.as_ref().map(|l| l.serialized_len).unwrap_or(0);

        let mut offset = globals_len
            + boundsheet_lens.iter().sum::<usize>()
            + country_len
            + sst_len
            + RECORD_HEADER_LEN; // EOF

        let mut sheet_offsets = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            let start = u32::try_from(offset).map_err(|_| XlsError::StreamTooLarge(offset))?;
            sheet_offsets.push(start);
            offset += sheet.data_size();
        }
        u32::try_from(offset).map_err(|_| XlsError::StreamTooLarge(offset))?;

        log::debug!(
            "layout: globals {globals_len} bytes, SST {sst_len} bytes, sheet offsets {sheet_offsets:?}, stream {offset} bytes"
        );

        Ok(Self {
            globals_len,
            boundsheet_lens,
            country_len,
            sst,
            sheet_offsets,
            total_len: offset,
        })
    }

    /// Length of the globals substream including its EOF.
    pub fn globals_end(&self) -> usize {
        self.sheet_offsets
            .first()
            .map(|&o| o as usize)
            .unwrap_or(self.total_len)
    }
}
