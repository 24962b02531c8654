//! Tests for the workbook globals substream.

use crate::{
    assert_sheet_offsets, close_to_stream, globals, new_workbook, of_type, records, u16_at,
    u32_at, BOF, BOUNDSHEET, COUNTRY, EOF, FONT, FORMAT, LABEL, LABELSST, PALETTE, SST, XF,
};
use biffbook::{BiffVersion, Format, MemoryContainer, Palette};
use pretty_assertions::assert_eq;

#[test]
fn test_single_text_cell_offset() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    let sheet = wb.add_worksheet("Example").unwrap();
    wb.worksheet_mut(sheet)
        .unwrap()
        .write_string(0, 0, "Example", None)
        .unwrap();

    let stream = close_to_stream(&mut wb);
    let globals = globals(&stream);
    let globals_len: usize = globals.iter().map(|r| 4 + r.data.len()).sum();

    let boundsheets = of_type(&globals, BOUNDSHEET);
    assert_eq!(boundsheets.len(), 1);
    let entry = &boundsheets[0].data;
    assert_eq!(u32_at(entry, 0) as usize, globals_len);
    assert_eq!(u16_at(entry, 4), 0x0000);
    assert_eq!(&entry[6..8], &[7, 0x01]);
    assert_eq!(&entry[8..10], &[b'E', 0x00]);
    assert_sheet_offsets(&stream);

    let sst = of_type(&globals, SST);
    assert_eq!(sst.len(), 1);
    assert_eq!(u32_at(&sst[0].data, 0), 1);
    assert_eq!(u32_at(&sst[0].data, 4), 1);
    assert_eq!(&sst[0].data[8..], b"\x07\x00\x00Example");

    let all = records(&stream);
    let label = all.iter().find(|r| r.record_type == LABELSST).unwrap();
    assert_eq!(label.data, vec![0, 0, 0, 0, 0x0F, 0x00, 0, 0, 0, 0]);
}

#[test]
fn test_default_palette_round_trips() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    wb.add_worksheet("Example").unwrap();

    let stream = close_to_stream(&mut wb);
    let globals = globals(&stream);
    let palette = of_type(&globals, PALETTE);
    assert_eq!(palette.len(), 1);

    let data = &palette[0].data;
    assert_eq!(u16_at(data, 0), 56);
    let entries: Vec<(u8, u8, u8)> = data[2..]
        .chunks(4)
        .map(|c| {
            assert_eq!(c[3], 0);
            (c[0], c[1], c[2])
        })
        .collect();
    assert_eq!(entries.as_slice(), Palette::new().entries().as_slice());
    assert_eq!(entries[0], (0, 0, 0));
    assert_eq!(entries[2], (255, 0, 0));
    assert_eq!(entries[55], (51, 51, 51));
}

#[test]
fn test_custom_color_written() {
    let mut wb = new_workbook(BiffVersion::Biff5);
    wb.add_worksheet("S").unwrap();
    assert_eq!(wb.set_custom_color(12, 0x10, 0x20, 0x30).unwrap(), 12);
    assert!(wb.set_custom_color(7, 0, 0, 0).is_err());
    assert!(wb.set_custom_color(12, 0, 0, 256).is_err());

    let stream = close_to_stream(&mut wb);
    let palette = of_type(&globals(&stream), PALETTE)[0].data.clone();
    // index 12 is entry 4
    assert_eq!(&palette[2 + 4 * 4..2 + 4 * 5], &[0x10, 0x20, 0x30, 0x00]);
}

#[test]
fn test_zero_sheet_workbook() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    let stream = close_to_stream(&mut wb);

    let recs = records(&stream);
    let types: Vec<u16> = recs.iter().map(|r| r.record_type).collect();
    assert_eq!(types, vec![BOF, EOF]);
    assert_eq!(u16_at(&recs[0].data, 2), 0x0005);
    assert!(wb.is_closed());
}

#[test]
fn test_close_is_idempotent() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    wb.add_worksheet("S").unwrap();

    let mut container = MemoryContainer::new();
    wb.close_with(&mut container).unwrap();
    let first = container.bytes().unwrap().to_vec();
    wb.close_with(&mut container).unwrap();
    wb.close().unwrap();

    assert_eq!(container.commits(), 1);
    assert_eq!(container.bytes().unwrap(), first.as_slice());
}

#[test]
fn test_same_number_format_shares_one_record() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    let a = wb.add_format(Format::new().with_num_format("0.000"));
    let b = wb.add_format(Format::new().with_num_format("0.000").with_italic(true));
    let c = wb.add_format(Format::new().with_num_format("14"));
    wb.add_worksheet("S").unwrap();

    let stream = close_to_stream(&mut wb);
    let globals = globals(&stream);

    let formats = of_type(&globals, FORMAT);
    assert_eq!(formats.len(), 1);
    assert_eq!(u16_at(&formats[0].data, 0), 164);
    assert_eq!(&formats[0].data[2..], b"\x05\x00\x000.000");

    let xfs = of_type(&globals, XF);
    assert_eq!(xfs.len(), 15 + 1 + 4);
    let ifmt = |xf: biffbook::XfIndex| u16_at(&xfs[xf.get() as usize].data, 2);
    assert_eq!(ifmt(a), 164);
    assert_eq!(ifmt(b), 164);
    assert_eq!(ifmt(c), 14);
}

#[test]
fn test_identical_fonts_share_one_record() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    let a = wb.add_format(Format::new().with_bold(true).with_num_format("0.0"));
    let b = wb.add_format(Format::new().with_bold(true).with_text_wrap(true));
    let plain = wb.add_format(Format::new().with_text_wrap(true));
    wb.add_worksheet("S").unwrap();

    let stream = close_to_stream(&mut wb);
    let globals = globals(&stream);

    // 5 default copies, the hyperlink font and one bold font
    assert_eq!(of_type(&globals, FONT).len(), 7);

    let xfs = of_type(&globals, XF);
    let ifnt = |xf: biffbook::XfIndex| u16_at(&xfs[xf.get() as usize].data, 0);
    assert_eq!(ifnt(wb.url_format()), 6);
    assert_eq!(ifnt(a), 7);
    assert_eq!(ifnt(b), 7);
    assert_eq!(ifnt(plain), 0);
}

#[test]
fn test_multiple_sheets_offsets() {
    let mut wb = new_workbook(BiffVersion::Biff8);
    for (i, name) in ["First", "Second", "Third"].iter().enumerate() {
        let idx = wb.add_worksheet(name).unwrap();
        let ws = wb.worksheet_mut(idx).unwrap();
        for row in 0..(i as u32 + 1) * 10 {
            ws.write_number(row, 0, f64::from(row), None).unwrap();
            ws.write_string(row, 1, &format!("row {row}"), None).unwrap();
        }
    }
    wb.worksheet_mut(1).unwrap().set_hidden(true);
    wb.set_country(1);

    let stream = close_to_stream(&mut wb);
    let offsets = assert_sheet_offsets(&stream);
    assert_eq!(offsets.len(), 3);

    let globals = globals(&stream);
    let boundsheets = of_type(&globals, BOUNDSHEET);
    assert_eq!(u16_at(&boundsheets[1].data, 4), 0x0001);
    assert_eq!(of_type(&globals, COUNTRY)[0].data, vec![1, 0, 1, 0]);
}

#[test]
fn test_biff5_workbook() {
    let mut wb = new_workbook(BiffVersion::Biff5);
    wb.add_worksheet("Legacy").unwrap();
    wb.add_worksheet("").unwrap();
    wb.worksheet_mut(0)
        .unwrap()
        .write_string(2, 3, "caf\u{e9}", None)
        .unwrap();
    wb.set_country(49);

    let stream = close_to_stream(&mut wb);
    let globals = globals(&stream);

    assert_eq!(u16_at(&globals[0].data, 0), 0x0500);
    assert!(of_type(&globals, SST).is_empty());
    let boundsheets = of_type(&globals, BOUNDSHEET);
    assert_eq!(&boundsheets[0].data[6..], b"\x06Legacy");
    assert_eq!(&boundsheets[1].data[6..], b"\x06Sheet2");
    assert_sheet_offsets(&stream);

    let all = records(&stream);
    let label = all.iter().find(|r| r.record_type == LABEL).unwrap();
    assert_eq!(&label.data[6..], &[0x04, 0x00, b'c', b'a', b'f', 0xE9]);
}
