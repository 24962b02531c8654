//! Common utilities for writer E2E tests.

use std::io::{Cursor, Read};

use biffbook::{BiffVersion, MemoryContainer, Workbook};

/// One BIFF record as found in a stream.
#[derive(Debug, Clone)]
pub struct Record {
    /// Byte position of the record header in the stream
    pub offset: usize,
    pub record_type: u16,
    pub data: Vec<u8>,
}

pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;
pub const FONT: u16 = 0x0031;
pub const FORMAT: u16 = 0x041E;
pub const XF: u16 = 0x00E0;
pub const PALETTE: u16 = 0x0092;
pub const BOUNDSHEET: u16 = 0x0085;
pub const COUNTRY: u16 = 0x008C;
pub const SST: u16 = 0x00FC;
pub const LABEL: u16 = 0x0204;
pub const LABELSST: u16 = 0x00FD;

/// Split a BIFF stream into records.
pub fn records(stream: &[u8]) -> Vec<Record> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + 4 <= stream.len() {
        let record_type = u16::from_le_bytes([stream[pos], stream[pos + 1]]);
        let len = u16::from_le_bytes([stream[pos + 2], stream[pos + 3]]) as usize;
        assert!(
            pos + 4 + len <= stream.len(),
            "record 0x{record_type:04X} at {pos} runs past the end of the stream"
        );
        out.push(Record {
            offset: pos,
            record_type,
            data: stream[pos + 4..pos + 4 + len].to_vec(),
        });
        pos += 4 + len;
    }
    assert_eq!(pos, stream.len(), "trailing bytes after the last record");
    out
}

/// Records of the globals substream, up to and including its EOF.
pub fn globals(stream: &[u8]) -> Vec<Record> {
    let mut out = Vec::new();
    for rec in records(stream) {
        let done = rec.record_type == EOF;
        out.push(rec);
        if done {
            break;
        }
    }
    out
}

pub fn of_type(records: &[Record], record_type: u16) -> Vec<&Record> {
    records
        .iter()
        .filter(|r| r.record_type == record_type)
        .collect()
}

pub fn u16_at(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

pub fn u32_at(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// Read a stream back out of a compound file.
pub fn read_stream(compound: &[u8], name: &str) -> Vec<u8> {
    let mut cfb = cfb::CompoundFile::open(Cursor::new(compound)).unwrap();
    let mut stream = cfb.open_stream(name).unwrap();
    let mut data = Vec::new();
    stream.read_to_end(&mut data).unwrap();
    data
}

pub fn new_workbook(version: BiffVersion) -> Workbook {
    Workbook::new("unused.xls", version)
}

/// Close `workbook` into memory and return the raw workbook stream.
pub fn close_to_stream(workbook: &mut Workbook) -> Vec<u8> {
    let mut container = MemoryContainer::new();
    workbook.close_with(&mut container).unwrap();
    let compound = container.bytes().unwrap().to_vec();
    let name = format!("/{}", workbook.version().stream_name());
    let stream = read_stream(&compound, &name);
    assert_eq!(Some(stream.as_slice()), container.stream());
    stream
}

/// Check that every BOUNDSHEET offset points at a worksheet BOF, in order.
pub fn assert_sheet_offsets(stream: &[u8]) -> Vec<u32> {
    let all = records(stream);
    let offsets: Vec<u32> = of_type(&globals(stream), BOUNDSHEET)
        .iter()
        .map(|r| u32_at(&r.data, 0))
        .collect();

    let sheet_bofs: Vec<u32> = all
        .iter()
        .filter(|r| r.record_type == BOF && u16_at(&r.data, 2) == 0x0010)
        .map(|r| r.offset as u32)
        .collect();
    assert_eq!(offsets, sheet_bofs);
    offsets
}
