//! Integration Tests for xlmd
//!
//! End-to-end conversions between workbooks built with rust_xlsxwriter,
//! packages written by this crate (cross-checked with calamine), and Markdown.

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::*;
use std::io::Cursor;
use xlmd::{ConverterBuilder, Direction, MarkdownStyle, Sheet, XlmdError};

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// Generate a simple 2x2 table Excel file
    pub fn generate_simple_table() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        // Header row
        worksheet.write_string(0, 0, "Header1")?;
        worksheet.write_string(0, 1, "Header2")?;

        // Data row
        worksheet.write_string(1, 0, "Data1")?;
        worksheet.write_string(1, 1, "Data2")?;

        workbook.save_to_buffer()
    }

    /// Generate a workbook with 3 named sheets
    pub fn generate_multi_sheets() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet1 = workbook.add_worksheet();
        sheet1.set_name("Summary")?;
        sheet1.write_string(0, 0, "Summary_Data")?;

        let sheet2 = workbook.add_worksheet();
        sheet2.set_name("R&D")?;
        sheet2.write_string(0, 0, "RD_Data")?;

        let sheet3 = workbook.add_worksheet();
        sheet3.set_name("売上")?;
        sheet3.write_string(0, 0, "合計")?;

        workbook.save_to_buffer()
    }

    /// Generate a sheet with gaps: A1 and C1 only, row 2 empty, B3
    pub fn generate_sparse_cells() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(0, 0, "Name")?;
        worksheet.write_string(0, 2, "Score")?;
        worksheet.write_string(2, 1, "Bob")?;

        workbook.save_to_buffer()
    }

    /// Generate a sheet with numeric and boolean cells
    pub fn generate_mixed_types() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        worksheet.write_string(0, 0, "sepal.length")?;
        worksheet.write_string(0, 1, "valid")?;
        worksheet.write_number(1, 0, 5.1)?;
        worksheet.write_boolean(1, 1, true)?;

        workbook.save_to_buffer()
    }

    /// Generate a workbook whose second sheet has no cells
    pub fn generate_with_empty_sheet() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let sheet1 = workbook.add_worksheet();
        sheet1.set_name("Data")?;
        sheet1.write_string(0, 0, "x")?;

        let sheet2 = workbook.add_worksheet();
        sheet2.set_name("Blank")?;

        workbook.save_to_buffer()
    }
}

/// Open a package written by this crate with calamine
fn open_with_calamine(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    open_workbook_from_rs(Cursor::new(bytes)).expect("calamine should open the package")
}

fn write_package(sheets: &[Sheet]) -> Vec<u8> {
    let converter = ConverterBuilder::new().build().unwrap();
    converter
        .write_xlsx(sheets, Cursor::new(Vec::new()))
        .unwrap()
        .into_inner()
}

#[test]
fn test_simple_table_conversion() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_simple_table().unwrap();

    let mut output = Vec::new();
    converter
        .xlsx_to_markdown(Cursor::new(excel_data), &mut output)
        .unwrap();

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "## Sheet1\n\n| Header1 | Header2 |\n| --- | --- |\n| Data1 | Data2 |\n\n"
    );
}

#[test]
fn test_multiple_sheets_keep_workbook_order_and_names() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_multi_sheets().unwrap();

    let sheets = converter.read_xlsx(Cursor::new(excel_data)).unwrap();

    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Summary", "R&D", "売上"]);
    assert_eq!(sheets[2].rows, vec![vec!["合計"]]);
}

#[test]
fn test_sparse_cells_read_dense() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_sparse_cells().unwrap();

    let sheets = converter.read_xlsx(Cursor::new(excel_data)).unwrap();

    // 空行はスキップされる
    assert_eq!(
        sheets[0].rows,
        vec![vec!["Name", "", "Score"], vec!["", "Bob"]]
    );
}

#[test]
fn test_literal_values_read_as_text() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_mixed_types().unwrap();

    let sheets = converter.read_xlsx(Cursor::new(excel_data)).unwrap();

    assert_eq!(
        sheets[0].rows,
        vec![vec!["sepal.length", "valid"], vec!["5.1", "1"]]
    );
}

#[test]
fn test_empty_sheet_omitted_from_markdown() {
    let converter = ConverterBuilder::new().build().unwrap();
    let excel_data = fixtures::generate_with_empty_sheet().unwrap();

    let sheets = converter.read_xlsx(Cursor::new(excel_data)).unwrap();
    assert_eq!(sheets.len(), 2);
    assert!(sheets[1].rows.is_empty());

    let markdown = converter.write_markdown(&sheets);
    assert_eq!(markdown, "## Data\n\n| x |\n| --- |\n\n");
}

#[test]
fn test_markdown_to_package_and_back() {
    let converter = ConverterBuilder::new().build().unwrap();
    let markdown = "| sepal.length | variety |\n| --- | --- |\n| 5.1 | Setosa |\n";

    let sheets = converter.read_markdown(markdown);
    let package = write_package(&sheets);
    let back = converter.read_xlsx(Cursor::new(package)).unwrap();

    assert_eq!(
        back,
        vec![Sheet::with_rows(
            "Sheet1",
            vec![vec!["sepal.length", "variety"], vec!["5.1", "Setosa"]]
        )]
    );
}

#[test]
fn test_written_package_opens_in_calamine() {
    let sheets = vec![
        Sheet::with_rows(
            "Scores",
            vec![vec!["Name", "", "Score"], vec!["Alice", "", "90"]],
        ),
        Sheet::with_rows("P&L <draft>", vec![vec!["Q&A", "a\"b"]]),
    ];
    let mut workbook = open_with_calamine(write_package(&sheets));

    assert_eq!(workbook.sheet_names(), vec!["Scores", "P&L <draft>"]);

    let range = workbook.worksheet_range("Scores").unwrap();
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("Name".to_string())));
    assert_eq!(range.get_value((0, 2)), Some(&Data::String("Score".to_string())));
    assert_eq!(range.get_value((1, 2)), Some(&Data::String("90".to_string())));
    assert_eq!(range.get_value((0, 1)), Some(&Data::Empty));

    let range = workbook.worksheet_range("P&L <draft>").unwrap();
    assert_eq!(
        range.get_value((0, 0)),
        Some(&Data::String("Q&A".to_string()))
    );
    assert_eq!(range.get_value((0, 1)), Some(&Data::String("a\"b".to_string())));
}

#[test]
fn test_sparse_write_dense_read_symmetry() {
    let converter = ConverterBuilder::new().build().unwrap();
    let sheets = vec![Sheet::with_rows(
        "S",
        vec![vec!["first", "", "", "", "", "sixth", "", ""]],
    )];

    let back = converter
        .read_xlsx(Cursor::new(write_package(&sheets)))
        .unwrap();

    assert_eq!(back[0].rows, vec![vec!["first", "", "", "", "", "sixth"]]);
}

#[test]
fn test_default_name_for_unnamed_sheet() {
    let converter = ConverterBuilder::new().build().unwrap();
    let sheets = vec![
        Sheet::with_rows("", vec![vec!["a"]]),
        Sheet::with_rows("", vec![vec!["b"]]),
    ];

    let back = converter
        .read_xlsx(Cursor::new(write_package(&sheets)))
        .unwrap();

    let names: Vec<&str> = back.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sheet1", "Sheet2"]);
}

#[test]
fn test_multi_section_markdown_round_trip() {
    let converter = ConverterBuilder::new().build().unwrap();
    let markdown = "## Sales\n\n| Item | Qty | Note |\n| --- | --- | --- |\n| Pen | 3 |  |\n| Ink | 10 | a\\|b |\n\n## Q1-Q2\n\n| x |\n| --- |\n| 1 |\n\n";

    let sheets = converter.read_markdown(markdown);
    let back = converter
        .read_xlsx(Cursor::new(write_package(&sheets)))
        .unwrap();
    assert_eq!(back[0].rows[2], vec!["Ink", "10", "a|b"]);

    // 末尾の空セルはパッケージ上では失われるが、Markdown出力時に補完される
    assert_eq!(converter.write_markdown(&back), markdown);
}

#[test]
fn test_aligned_style_output() {
    let converter = ConverterBuilder::new()
        .with_markdown_style(MarkdownStyle::Aligned)
        .build()
        .unwrap();
    let sheets = vec![Sheet::with_rows(
        "S",
        vec![vec!["id", "name"], vec!["1", "Alice"]],
    )];

    assert_eq!(
        converter.write_markdown(&sheets),
        "## S\n\n| id  | name  |\n|-----|-------|\n| 1   | Alice |\n\n"
    );
}

#[test]
fn test_convert_file_both_directions() {
    let dir = tempfile::tempdir().unwrap();
    let md_path = dir.path().join("in.md");
    let xlsx_path = dir.path().join("out.xlsx");
    let md_back_path = dir.path().join("back.MD");

    let markdown = "## Iris\n\n| sepal.length | variety |\n| --- | --- |\n| 5.1 | Setosa |\n| 4.9 | Setosa |\n\n";
    std::fs::write(&md_path, markdown).unwrap();

    let converter = ConverterBuilder::new().build().unwrap();
    assert_eq!(
        converter.convert_file(&md_path, &xlsx_path).unwrap(),
        Direction::MarkdownToXlsx
    );
    assert_eq!(
        converter.convert_file(&xlsx_path, &md_back_path).unwrap(),
        Direction::XlsxToMarkdown
    );

    assert_eq!(std::fs::read_to_string(&md_back_path).unwrap(), markdown);
}

#[test]
fn test_convert_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let converter = ConverterBuilder::new().build().unwrap();

    // 拡張子から方向を推定できない
    let result = converter.convert_file(&dir.path().join("a.csv"), &dir.path().join("b.md"));
    assert!(matches!(result, Err(XlmdError::Config(_))));

    // 入力ファイルが存在しない
    let result = converter.convert_file(&dir.path().join("missing.xlsx"), &dir.path().join("b.md"));
    assert!(matches!(result, Err(XlmdError::ContainerOpen(_))));

    // ZIPではない入力
    let not_zip = dir.path().join("fake.xlsx");
    std::fs::write(&not_zip, "| a |\n").unwrap();
    let result = converter.convert_file(&not_zip, &dir.path().join("b.md"));
    assert!(matches!(result, Err(XlmdError::ContainerOpen(_))));

    // 出力先ディレクトリが存在しない
    let md_path = dir.path().join("ok.md");
    std::fs::write(&md_path, "| a |\n| - |\n").unwrap();
    let result = converter.convert_file(&md_path, &dir.path().join("no/such/dir/out.xlsx"));
    assert!(matches!(result, Err(XlmdError::WriteIo(_))));
}

#[test]
fn test_read_markdown_from_reader() {
    let converter = ConverterBuilder::new().build().unwrap();
    let sheets = converter
        .read_markdown_from(Cursor::new("## A\n\n| 1 | 2 |\n|---|---|\n"))
        .unwrap();
    assert_eq!(sheets, vec![Sheet::with_rows("A", vec![vec!["1", "2"]])]);
}
