//! Tests for the shared string table and its CONTINUE blocks.

use crate::{
    assert_sheet_offsets, close_to_stream, globals, new_workbook, of_type, records, u16_at,
    u32_at, CONTINUE, LABELSST, SST,
};
use biffbook::BiffVersion;
use pretty_assertions::assert_eq;

/// SST record followed by the CONTINUE records directly after it.
fn sst_blocks(stream: &[u8]) -> (Vec<u8>, Vec<Vec<u8>>) {
    let globals = globals(stream);
    let start = globals
        .iter()
        .position(|r| r.record_type == SST)
        .expect("no SST record");
    let continues = globals[start + 1..]
        .iter()
        .take_while(|r| r.record_type == CONTINUE)
        .map(|r| r.data.clone())
        .collect();
    (globals[start].data.clone(), continues)
}

#[test]
fn test_long_ascii_string_is_split() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    wb.add_worksheet("Example").unwrap();
    let text = "x".repeat(9000);
    wb.worksheet_mut(0)
        .unwrap()
        .write_string(0, 0, &text, None)
        .unwrap();

    let stream = close_to_stream(&mut wb);
    let (sst, continues) = sst_blocks(&stream);

    assert_eq!(sst.len(), 8 + 8208);
    assert_eq!(&sst[8..11], &[0x28, 0x23, 0x00]);
    assert_eq!(continues.len(), 1);
    assert_eq!(continues[0].len(), 796);
    // the continued string restates its flags
    assert_eq!(continues[0][0], 0x00);
    assert!(continues[0][1..].iter().all(|&b| b == b'x'));

    assert_sheet_offsets(&stream);
}

#[test]
fn test_wide_string_splits_between_characters() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    wb.add_worksheet("Example").unwrap();
    let text = "\u{0416}".repeat(5000);
    wb.worksheet_mut(0)
        .unwrap()
        .write_string(0, 0, &text, None)
        .unwrap();

    let stream = close_to_stream(&mut wb);
    let (sst, continues) = sst_blocks(&stream);

    assert_eq!(sst.len(), 8 + 8207);
    assert_eq!(&sst[8..11], &[0x88, 0x13, 0x01]);
    assert_eq!(continues.len(), 1);
    assert_eq!(continues[0].len(), 1797);
    assert_eq!(continues[0][0], 0x01);
    assert_eq!(&continues[0][1..3], &[0x16, 0x04]);
}

#[test]
fn test_many_strings_keep_offsets_correct() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    for name in ["Words", "More words"] {
        let sheet = wb.add_worksheet(name).unwrap();
        let ws = wb.worksheet_mut(sheet).unwrap();
        for row in 0..2000u32 {
            let text = if row % 3 == 0 {
                format!("{name} \u{00FC}ber {row}")
            } else if row % 3 == 1 {
                format!("{name} \u{65E5}\u{672C} {row}")
            } else {
                format!("shared {}", row % 50)
            };
            ws.write_string(row, 0, &text, None).unwrap();
        }
    }

    let stream = close_to_stream(&mut wb);
    let offsets = assert_sheet_offsets(&stream);
    assert_eq!(offsets.len(), 2);

    let (sst, continues) = sst_blocks(&stream);
    assert!(continues.len() > 1);
    assert_eq!(u32_at(&sst, 0), 4000);
    assert!(sst.len() <= 8 + 8208);
    assert!(continues.iter().all(|c| !c.is_empty() && c.len() <= 8208));

    let unique = u32_at(&sst, 4);
    assert!(unique < 4000);
    let labels = of_type(&records(&stream), LABELSST)
        .iter()
        .map(|r| u32_at(&r.data, 6))
        .collect::<Vec<_>>();
    assert_eq!(labels.len(), 4000);
    assert!(labels.iter().all(|&i| i < unique));
    // first cell of the first sheet gets the first string
    assert_eq!(labels[0], 0);
}

#[test]
fn test_repeated_string_is_stored_once() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    wb.add_worksheet("A").unwrap();
    wb.add_worksheet("B").unwrap();
    for sheet in 0..2 {
        let ws = wb.worksheet_mut(sheet).unwrap();
        ws.write_string(0, 0, "same", None).unwrap();
        ws.write_string(1, 0, "same", None).unwrap();
    }

    let stream = close_to_stream(&mut wb);
    let (sst, continues) = sst_blocks(&stream);
    assert!(continues.is_empty());
    assert_eq!(u32_at(&sst, 0), 4);
    assert_eq!(u32_at(&sst, 4), 1);
    assert_eq!(u16_at(&sst, 8), 4);
    assert_eq!(wb.shared_strings().unique_count(), 1);
}
