//! Shared String Table (SST) builder.
//!
//! Cell strings in BIFF8 are stored once in the SST record and referenced by
//! index from LABELSST cells. The SST rarely fits one record, so it is
//! written as an SST record followed by CONTINUE records ("blocks").
//!
//! Block boundaries follow Excel's rules:
//! - a string header (character count + flags) is never split;
//! - UTF-16 character data is only split between characters;
//! - a block that continues a split string starts with that string's flags
//!   byte.
//!
//! Sheet offsets in BOUNDSHEET records depend on the SST size, so the blocks
//! have to be measured before they are written. Both passes run the same
//! [`chunk`] routine, once into a [`MeasureSink`] and once into an
//! [`EmitSink`], so the measured and the written sizes cannot diverge.

use ahash::AHashMap;

use crate::biff::strings::{push_unicode_string, LengthPrefix, FLAG_WIDE};
use crate::biff::{records, RecordWriter, RECORD_HEADER_LEN};

/// Maximum string data per SST/CONTINUE block.
///
/// 8228 (record limit incl. header) - 4 (header) - 8 (SST counts) - 8 (slack).
pub const SST_CONTINUE_LIMIT: usize = 8208;

/// SST record header plus the two string counts.
const SST_HEADER_LEN: usize = RECORD_HEADER_LEN + 8;

/// One unique string, pre-encoded as a BIFF8 Unicode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SstEntry {
    text: String,
    flags: u8,
    encoded: Vec<u8>,
}

impl SstEntry {
    fn new(text: &str) -> Self {
        let mut encoded = Vec::with_capacity(3 + text.len());
        let flags = push_unicode_string(&mut encoded, text, LengthPrefix::Word);
        Self {
            text: text.to_string(),
            flags,
            encoded,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Count, flags and character data as written to the SST.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn is_wide(&self) -> bool {
        self.flags & FLAG_WIDE != 0
    }
}

/// Deduplicated pool of cell strings.
#[derive(Debug, Default)]
pub struct SharedStringTable {
    /// Unique strings in first-insertion order
    entries: Vec<SstEntry>,
    /// Fast lookup for deduplication
    index_map: AHashMap<String, u32>,
    /// Number of string cells referencing the table
    total: u32,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `text`, adding it on first use. Every call counts as one
    /// reference in the SST total.
    pub fn intern(&mut self, text: &str) -> u32 {
        self.total = self.total.saturating_add(1);
        if let Some(&idx) = self.index_map.get(text) {
            return idx;
        }

        let idx = self.entries.len() as u32;
        self.entries.push(SstEntry::new(text));
        self.index_map.insert(text.to_string(), idx);
        idx
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.entries.get(index as usize).map(SstEntry::text)
    }

    /// Number of unique strings.
    pub fn unique_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of string references.
    pub fn total_count(&self) -> u32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &SstEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index_map.clear();
        self.total = 0;
    }

    /// Compute the block layout without producing any bytes.
    pub fn measure(&self) -> SstLayout {
        let mut sink = MeasureSink::default();
        chunk(&self.entries, &mut sink);
        SstLayout::new(sink.sizes)
    }

    /// Append the SST record and its CONTINUE records.
    ///
    /// Returns the layout that was written, which always equals
    /// [`SharedStringTable::measure`].
    pub fn write_records(&self, writer: &mut RecordWriter) -> SstLayout {
        let mut sink = EmitSink::default();
        chunk(&self.entries, &mut sink);

        let mut blocks = sink.blocks.into_iter();
        let mut body = Vec::with_capacity(8 + SST_CONTINUE_LIMIT);
        body.extend_from_slice(&self.total.to_le_bytes());
        body.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());

        let mut sizes = Vec::new();
        if let Some(first) = blocks.next() {
            sizes.push(first.len());
            body.extend_from_slice(&first);
        }
        writer.append_record(records::SST, &body);

        for block in blocks {
            sizes.push(block.len());
            writer.append_record(records::CONTINUE, &block);
        }

        let layout = SstLayout::new(sizes);
        log::debug!(
            "SST: {} unique / {} total strings in {} blocks, {} bytes",
            self.entries.len(),
            self.total,
            layout.block_sizes.len(),
            layout.serialized_len
        );
        layout
    }
}

/// Block sizes of an SST and its total framed length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SstLayout {
    /// String data bytes per block; the first block shares the SST record
    /// with the string counts.
    pub block_sizes: Vec<usize>,
    /// Bytes the SST and its CONTINUE records occupy in the stream.
    pub serialized_len: usize,
}

impl SstLayout {
    fn new(block_sizes: Vec<usize>) -> Self {
        let mut serialized_len = SST_HEADER_LEN;
        let mut sizes = block_sizes.iter();
        if let Some(first) = sizes.next() {
            serialized_len += first;
        }
        serialized_len += sizes.map(|size| RECORD_HEADER_LEN + size).sum::<usize>();
        Self {
            block_sizes,
            serialized_len,
        }
    }
}

/// Destination of the block chunker.
pub(crate) trait BlockSink {
    /// Append bytes to the current block.
    fn write(&mut self, bytes: &[u8]);
    /// Close the current block and start a new, empty one.
    fn end_block(&mut self);
    /// Bytes in the current block.
    fn current_len(&self) -> usize;
}

/// Records block sizes only.
#[derive(Debug, Default)]
pub(crate) struct MeasureSink {
    sizes: Vec<usize>,
    current: usize,
}

impl BlockSink for MeasureSink {
    fn write(&mut self, bytes: &[u8]) {
        self.current += bytes.len();
    }

    fn end_block(&mut self) {
        self.sizes.push(self.current);
        self.current = 0;
    }

    fn current_len(&self) -> usize {
        self.current
    }
}

/// Collects the block contents.
#[derive(Debug, Default)]
pub(crate) struct EmitSink {
    blocks: Vec<Vec<u8>>,
    current: Vec<u8>,
}

impl BlockSink for EmitSink {
    fn write(&mut self, bytes: &[u8]) {
        self.current.extend_from_slice(bytes);
    }

    fn end_block(&mut self) {
        self.blocks.push(std::mem::take(&mut self.current));
    }

    fn current_len(&self) -> usize {
        self.current.len()
    }
}

/// Split the encoded strings into blocks of at most [`SST_CONTINUE_LIMIT`] bytes.
pub(crate) fn chunk<S: BlockSink>(entries: &[SstEntry], sink: &mut S) {
    let limit = SST_CONTINUE_LIMIT;
    // String bytes placed into the current block, without a continuation flag
    let mut block_length = 0usize;
    // Bytes of the current block already accounted for
    let mut written = 0usize;
    // 1 when the current block starts with a continuation flags byte
    let mut cont = 0usize;

    for entry in entries {
        let mut rest = entry.encoded();
        block_length += rest.len();

        if block_length < limit {
            sink.write(rest);
            written += rest.len();
            continue;
        }

        let header_length = if entry.is_wide() { 4 } else { 3 };
        let mut split = false;

        while block_length >= limit {
            let mut space = limit.saturating_sub(written + cont);
            let mut align = 0;

            if entry.is_wide() && space > header_length {
                // With the 3-byte header in this block, the data after it must
                // end on a character boundary: odd split. Without it: even.
                let misaligned = if split { space % 2 == 1 } else { space % 2 == 0 };
                if misaligned {
                    space -= 1;
                    align = 1;
                }
                split = true;
            }

            if space > header_length {
                let (head, tail) = rest.split_at(space.min(rest.len()));
                sink.write(head);
                rest = tail;
                block_length -= limit - cont - align;
                cont = usize::from(block_length > 0);
            } else {
                // Too little room for the header; the string starts the next block.
                block_length -= written;
                cont = 0;
            }

            sink.end_block();
            if cont == 1 {
                sink.write(&[entry.flags]);
            }

            if block_length < limit {
                sink.write(rest);
                rest = &[];
                written = block_length;
            } else {
                written = 0;
            }
        }
    }

    if sink.current_len() > 0 {
        sink.end_block();
    }
}
