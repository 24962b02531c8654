//! Tests for writing workbooks to disk.

use crate::{assert_sheet_offsets, read_stream, records, u16_at, BOF};
use biffbook::{BiffVersion, Workbook, XlsError};
use pretty_assertions::assert_eq;

#[test]
fn test_close_writes_compound_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.xls");

    let mut wb = Workbook::new(&path, BiffVersion::Biff8);
    let sheet = wb.add_worksheet("Report").unwrap();
    let ws = wb.worksheet_mut(sheet).unwrap();
    ws.write_string(0, 0, "Total", None).unwrap();
    ws.write_number(0, 1, 42.5, None).unwrap();
    ws.write_boolean(1, 0, true, None).unwrap();
    wb.close().unwrap();
    assert!(wb.is_closed());

    let bytes = std::fs::read(&path).unwrap();
    let stream = read_stream(&bytes, "/Workbook");
    let recs = records(&stream);
    assert_eq!(recs[0].record_type, BOF);
    assert_eq!(u16_at(&recs[0].data, 0), 0x0600);
    assert_sheet_offsets(&stream);

    // a second close does not touch the file
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
    wb.close().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);
}

#[test]
fn test_biff5_file_uses_book_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.xls");

    let mut wb = Workbook::new(&path, BiffVersion::Biff5);
    wb.add_worksheet("Legacy").unwrap();
    wb.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let stream = read_stream(&bytes, "/Book");
    assert_eq!(u16_at(&records(&stream)[0].data, 0), 0x0500);
}

#[test]
fn test_unwritable_target_keeps_workbook_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.xls");

    let mut wb = Workbook::new(&path, BiffVersion::Biff8);
    wb.add_worksheet("S").unwrap();
    let err = wb.close().unwrap_err();
    assert!(matches!(err, XlsError::ContainerWrite(_)));
    assert!(!wb.is_closed());
    assert!(!path.exists());

    std::fs::create_dir(dir.path().join("missing")).unwrap();
    wb.close().unwrap();
    assert!(wb.is_closed());
    assert!(path.exists());
}
