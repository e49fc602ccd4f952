//! Markdown Writer
//!
//! 空でないシートごとに`## シート名`の見出しと1つのテーブルを出力します。
//! 1行目をヘッダー行とし、全行をシート内で最も長い行の列数に揃えます。

use std::io::Write;

use unicode_width::UnicodeWidthStr;

use crate::api::MarkdownStyle;
use crate::types::{Row, Sheet};

/// シートのリストをMarkdown文字列に変換
pub(crate) fn render_markdown(sheets: &[Sheet], style: MarkdownStyle) -> String {
    let mut out = String::new();
    for sheet in sheets {
        render_sheet(sheet, style, &mut out);
    }
    out
}

/// シートのリストをMarkdownとしてライターに書き込む
pub(crate) fn write_markdown<W: Write>(
    sheets: &[Sheet],
    style: MarkdownStyle,
    writer: &mut W,
) -> std::io::Result<()> {
    let mut out = String::new();
    for sheet in sheets {
        out.clear();
        render_sheet(sheet, style, &mut out);
        writer.write_all(out.as_bytes())?;
    }
    writer.flush()
}

/// 1シート分の見出しとテーブルを出力（行がないシートは何も出力しない）
fn render_sheet(sheet: &Sheet, style: MarkdownStyle, out: &mut String) {
    if sheet.is_empty() {
        return;
    }

    out.push_str("## ");
    out.push_str(&sheet.name);
    out.push_str("\n\n");

    // 入力は変更せず、エスケープ済みのコピーを列数に揃える
    let col_count = sheet.column_count();
    let rows: Vec<Row> = sheet
        .rows
        .iter()
        .map(|row| {
            let mut cells: Row = row.iter().map(|cell| escape_cell(cell)).collect();
            cells.resize(col_count, String::new());
            cells
        })
        .collect();

    match style {
        MarkdownStyle::Compact => render_compact(&rows, col_count, out),
        MarkdownStyle::Aligned => render_aligned(&rows, col_count, out),
    }

    out.push('\n');
}

fn render_compact(rows: &[Row], col_count: usize, out: &mut String) {
    for (row_idx, row) in rows.iter().enumerate() {
        out.push_str("| ");
        out.push_str(&row.join(" | "));
        out.push_str(" |\n");

        if row_idx == 0 {
            out.push('|');
            out.push_str(&" --- |".repeat(col_count));
            out.push('\n');
        }
    }
}

fn render_aligned(rows: &[Row], col_count: usize, out: &mut String) {
    // 最小幅は3文字（区切り行の"---"）
    let mut widths = vec![3; col_count];
    for row in rows {
        for (col_idx, cell) in row.iter().enumerate() {
            widths[col_idx] = widths[col_idx].max(cell.width());
        }
    }

    for (row_idx, row) in rows.iter().enumerate() {
        out.push('|');
        for (cell, &width) in row.iter().zip(&widths) {
            out.push(' ');
            out.push_str(cell);
            out.push_str(&" ".repeat(width.saturating_sub(cell.width())));
            out.push_str(" |");
        }
        out.push('\n');

        if row_idx == 0 {
            out.push('|');
            for &width in &widths {
                out.push_str(&"-".repeat(width + 2));
                out.push('|');
            }
            out.push('\n');
        }
    }
}

/// セル内のパイプと改行をエスケープ
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}
