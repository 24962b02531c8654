//! BIFF record emission.
//!
//! A BIFF stream is a sequence of records, each with a 4-byte header
//! (2 bytes record type + 2 bytes body length) followed by the body.
//!
//! Bodies longer than the per-record limit of the format version are split:
//! the first chunk keeps the record type, the remainder follows in
//! CONTINUE records (type 0x003C).

pub mod records;
pub mod strings;

use crate::error::{XlsError, XlsResult};

/// Length of a record header (type + length).
pub const RECORD_HEADER_LEN: usize = 4;

/// BIFF format version of the workbook being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BiffVersion {
    /// Excel 5.0/95 (legacy): 8-bit strings, 2080-byte records.
    Biff5,
    /// Excel 97-2003 (extended): UTF-16 strings, SST, 8224-byte records.
    Biff8,
}

impl BiffVersion {
    /// Map the user-facing version number (5 or 8).
    pub fn from_number(number: u16) -> XlsResult<Self> {
        match number {
            5 => Ok(BiffVersion::Biff5),
            8 => Ok(BiffVersion::Biff8),
            other => Err(XlsError::UnsupportedVersion(other)),
        }
    }

    /// Version field of the BOF record.
    pub fn bof_version(self) -> u16 {
        match self {
            BiffVersion::Biff5 => records::BIFF5_VERSION,
            BiffVersion::Biff8 => records::BIFF8_VERSION,
        }
    }

    /// Maximum body length of a single record.
    pub fn max_record_data(self) -> usize {
        match self {
            BiffVersion::Biff5 => 2080,
            BiffVersion::Biff8 => 8224,
        }
    }

    /// Code page written into the CODEPAGE record.
    pub fn codepage(self) -> u16 {
        match self {
            BiffVersion::Biff5 => 0x04E4, // Windows-1252
            BiffVersion::Biff8 => 0x04B0, // UTF-16
        }
    }

    /// Name of the container stream holding the workbook.
    pub fn stream_name(self) -> &'static str {
        match self {
            BiffVersion::Biff5 => "Book",
            BiffVersion::Biff8 => "Workbook",
        }
    }

    /// Maximum number of rows in a worksheet.
    pub fn max_rows(self) -> u32 {
        match self {
            BiffVersion::Biff5 => 16_384,
            BiffVersion::Biff8 => 65_536,
        }
    }

    pub fn is_biff8(self) -> bool {
        self == BiffVersion::Biff8
    }
}

/// Size of a record once framed, including any CONTINUE records needed to
/// carry a body of `payload_len` bytes.
pub fn framed_len(version: BiffVersion, payload_len: usize) -> usize {
    let max = version.max_record_data();
    let chunks = ((payload_len + max - 1) / max).max(1);
    chunks * RECORD_HEADER_LEN + payload_len
}

/// Growing buffer of framed BIFF records.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    version: BiffVersion,
    data: Vec<u8>,
}

impl RecordWriter {
    pub fn new(version: BiffVersion) -> Self {
        Self {
            version,
            data: Vec::new(),
        }
    }

    pub fn version(&self) -> BiffVersion {
        self.version
    }

    /// Append one record, splitting oversized bodies into CONTINUE records.
    pub fn append_record(&mut self, record_type: u16, payload: &[u8]) {
        let max = self.version.max_record_data();
        let mut chunks = payload.chunks(max);

        let head = chunks.next().unwrap_or(&[]);
        self.push_header(record_type, head.len());
        self.data.extend_from_slice(head);

        for chunk in chunks {
            self.push_header(records::CONTINUE, chunk.len());
            self.data.extend_from_slice(chunk);
        }
    }

    fn push_header(&mut self, record_type: u16, len: usize) {
        self.data.extend_from_slice(&record_type.to_le_bytes());
        self.data.extend_from_slice(&(len as u16).to_le_bytes());
    }

    /// BOF record opening a substream of type `substream_type`.
    pub fn write_bof(&mut self, substream_type: u16) {
        let mut body = Vec::with_capacity(16);
        body.extend_from_slice(&self.version.bof_version().to_le_bytes());
        body.extend_from_slice(&substream_type.to_le_bytes());
        match self.version {
            BiffVersion::Biff5 => {
                // Build and year must be non-zero or Excel 5 complains.
                body.extend_from_slice(&0x096Cu16.to_le_bytes());
                body.extend_from_slice(&0x07C9u16.to_le_bytes());
            }
            BiffVersion::Biff8 => {
                body.extend_from_slice(&0x0DBBu16.to_le_bytes());
                body.extend_from_slice(&0x07CCu16.to_le_bytes());
                body.extend_from_slice(&0x0000_0041u32.to_le_bytes()); // history flags
                body.extend_from_slice(&0x0000_0006u32.to_le_bytes()); // lowest BIFF version
            }
        }
        self.append_record(records::BOF, &body);
    }

    pub fn write_eof(&mut self) {
        self.append_record(records::EOF, &[]);
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
