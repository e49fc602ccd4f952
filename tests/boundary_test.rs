//! Boundary Tests for xlmd
//!
//! Edge cases at the limits of the sheet model: empty workbooks, the last
//! addressable column, long and non-ASCII text, and damaged worksheet parts.

use pretty_assertions::assert_eq;
use rust_xlsxwriter::*;
use std::io::{Cursor, Write};
use xlmd::{ConverterBuilder, Sheet};
use zip::write::{FileOptions, ZipWriter};

// Helper module for generating boundary test fixtures
mod fixtures {
    use super::*;

    /// Generate a workbook with a single sheet and no cells
    pub fn generate_empty_sheet() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("EmptySheet")?;
        workbook.save_to_buffer()
    }

    /// Generate a workbook with data in A1 and the last column (XFD1)
    pub fn generate_max_column() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("MaxCols")?;
        worksheet.write_string(0, 0, "FirstCol")?;
        worksheet.write_string(0, 16_383, "LastCol")?;
        workbook.save_to_buffer()
    }

    /// Generate a workbook with data in the first and last rows
    pub fn generate_max_rows() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "FirstRow")?;
        worksheet.write_string(1_048_575, 0, "LastRow")?;
        workbook.save_to_buffer()
    }

    /// Generate a cell holding the maximum string length Excel accepts (32,767)
    pub fn generate_long_cell() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "A".repeat(32_767))?;
        workbook.save_to_buffer()
    }

    /// Build a package by hand from (part name, content) pairs
    pub fn build_package(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip_data = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut zip_data));
            for (name, content) in entries {
                zip.start_file(*name, FileOptions::default()).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        zip_data
    }
}

const TWO_SHEET_WORKBOOK: &str = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>
<sheet name="Good" sheetId="1" r:id="rId1"/>
<sheet name="Broken" sheetId="2" r:id="rId2"/>
</sheets></workbook>"#;

const TWO_SHEET_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

const GOOD_WORKSHEET: &str = r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>fine</t></is></c></row></sheetData></worksheet>"#;

#[test]
fn test_empty_sheet() {
    let converter = ConverterBuilder::new().build().unwrap();

    let excel_data = fixtures::generate_empty_sheet().unwrap();
    let sheets = converter.read_xlsx(Cursor::new(excel_data)).unwrap();

    // 空のシートも読み込まれるが、Markdownには出力されない
    assert_eq!(sheets, vec![Sheet::new("EmptySheet")]);
    assert_eq!(converter.write_markdown(&sheets), "");
}

#[test]
fn test_empty_workbook_written_and_read() {
    let converter = ConverterBuilder::new().build().unwrap();

    let package = converter
        .write_xlsx(&[], Cursor::new(Vec::new()))
        .unwrap()
        .into_inner();
    let sheets = converter.read_xlsx(Cursor::new(package)).unwrap();

    assert!(sheets.is_empty());
}

#[test]
fn test_maximum_column() {
    let converter = ConverterBuilder::new().build().unwrap();

    let excel_data = fixtures::generate_max_column().unwrap();
    let sheets = converter.read_xlsx(Cursor::new(excel_data)).unwrap();

    let row = &sheets[0].rows[0];
    assert_eq!(row.len(), 16_384);
    assert_eq!(row[0], "FirstCol");
    assert_eq!(row[16_383], "LastCol");
    assert!(row[1..16_383].iter().all(String::is_empty));

    // 書き戻した後もXFD列に値が残る
    let package = converter
        .write_xlsx(&sheets, Cursor::new(Vec::new()))
        .unwrap()
        .into_inner();
    let reread = converter.read_xlsx(Cursor::new(package)).unwrap();
    assert_eq!(reread, sheets);
}

#[test]
#[ignore] // Time-consuming test
fn test_maximum_rows() {
    let converter = ConverterBuilder::new().build().unwrap();

    let excel_data = fixtures::generate_max_rows().unwrap();
    let sheets = converter.read_xlsx(Cursor::new(excel_data)).unwrap();

    // 空行は保持されないため、値のある2行だけが残る
    assert_eq!(sheets[0].rows, vec![vec!["FirstRow"], vec!["LastRow"]]);
}

#[test]
fn test_very_long_cell_content() {
    let converter = ConverterBuilder::new().build().unwrap();

    let excel_data = fixtures::generate_long_cell().unwrap();
    let sheets = converter.read_xlsx(Cursor::new(excel_data)).unwrap();
    assert_eq!(sheets[0].rows[0][0].len(), 32_767);

    let markdown = converter.write_markdown(&sheets);
    assert!(
        markdown.len() > 32_767,
        "Markdown should contain long cell content. Length: {}",
        markdown.len()
    );
}

#[test]
fn test_whitespace_and_unicode_survive_round_trip() {
    let converter = ConverterBuilder::new().build().unwrap();

    let sheets = vec![Sheet::with_rows(
        "データ",
        vec![
            vec!["  leading", "trailing  ", " both "],
            vec!["日本語", "emoji 🎉", "tab\there"],
            vec!["<tag>", "a & b", "\"quoted\""],
        ],
    )];

    let package = converter
        .write_xlsx(&sheets, Cursor::new(Vec::new()))
        .unwrap()
        .into_inner();
    let reread = converter.read_xlsx(Cursor::new(package)).unwrap();

    assert_eq!(reread, sheets);
}

#[test]
fn test_special_characters_in_sheet_names() {
    let converter = ConverterBuilder::new().build().unwrap();

    let sheets = vec![
        Sheet::with_rows("P&L <2024>", vec![vec!["x"]]),
        Sheet::with_rows("O'Brien \"Q1\"", vec![vec!["y"]]),
        Sheet::with_rows("", vec![vec!["z"]]),
    ];

    let package = converter
        .write_xlsx(&sheets, Cursor::new(Vec::new()))
        .unwrap()
        .into_inner();
    let reread = converter.read_xlsx(Cursor::new(package)).unwrap();

    let names: Vec<&str> = reread.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["P&L <2024>", "O'Brien \"Q1\"", "Sheet3"]);
}

#[test]
fn test_header_only_markdown_table() {
    let converter = ConverterBuilder::new().build().unwrap();

    let sheets = converter.read_markdown("## Only\n\n| A | B |\n| --- | --- |\n");

    assert_eq!(sheets, vec![Sheet::with_rows("Only", vec![vec!["A", "B"]])]);
    assert_eq!(
        converter.write_markdown(&sheets),
        "## Only\n\n| A | B |\n| --- | --- |\n\n"
    );
}

#[test]
fn test_pipe_and_newline_in_cells() {
    let converter = ConverterBuilder::new().build().unwrap();

    let sheets = vec![Sheet::with_rows(
        "Escapes",
        vec![vec!["a|b", "line1\nline2"]],
    )];
    let markdown = converter.write_markdown(&sheets);
    assert!(markdown.contains("| a\\|b | line1<br>line2 |"));

    // パイプは復元されるが、<br>はそのまま残る
    let reread = converter.read_markdown(&markdown);
    assert_eq!(reread[0].rows[0], vec!["a|b", "line1<br>line2"]);
}

#[test]
fn test_malformed_worksheet_is_skipped() {
    let converter = ConverterBuilder::new().build().unwrap();

    let package = fixtures::build_package(&[
        ("xl/workbook.xml", TWO_SHEET_WORKBOOK),
        ("xl/_rels/workbook.xml.rels", TWO_SHEET_RELS),
        ("xl/worksheets/sheet1.xml", GOOD_WORKSHEET),
        (
            "xl/worksheets/sheet2.xml",
            r#"<worksheet><sheetData><row r="1"><c r="A1"><v>x</v></c>"#,
        ),
    ]);

    let report = converter.read_xlsx_report(Cursor::new(package)).unwrap();

    assert_eq!(report.sheets, vec![Sheet::with_rows("Good", vec![vec!["fine"]])]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "Broken");
    assert_eq!(report.skipped[0].part, "xl/worksheets/sheet2.xml");
}

#[test]
fn test_missing_worksheet_part_is_skipped() {
    let converter = ConverterBuilder::new().build().unwrap();

    let package = fixtures::build_package(&[
        ("xl/workbook.xml", TWO_SHEET_WORKBOOK),
        ("xl/_rels/workbook.xml.rels", TWO_SHEET_RELS),
        ("xl/worksheets/sheet1.xml", GOOD_WORKSHEET),
    ]);

    let sheets = converter.read_xlsx(Cursor::new(package.clone())).unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].name, "Good");

    let report = converter.read_xlsx_report(Cursor::new(package)).unwrap();
    assert_eq!(report.skipped[0].name, "Broken");
}

#[test]
fn test_package_without_workbook_part() {
    let converter = ConverterBuilder::new().build().unwrap();

    // workbook.xmlがない場合はファイル名の規約でシートを探す
    let package = fixtures::build_package(&[
        ("xl/worksheets/sheet2.xml", GOOD_WORKSHEET),
        ("xl/worksheets/sheet1.xml", GOOD_WORKSHEET),
    ]);

    let sheets = converter.read_xlsx(Cursor::new(package)).unwrap();
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sheet1", "Sheet2"]);
}
