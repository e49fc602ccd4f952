//! Markdown Reader
//!
//! `## シート名`の見出しでブロックに分割し、各ブロックから1つのテーブルを読み取ります。
//! 列数の不揃いや途中で途切れたテーブルはエラーにせず、正規化して扱います。

use regex::Regex;

use crate::types::{Row, Sheet};

/// レベル2見出し（`## 名前`）
fn heading_regex() -> &'static Regex {
    static HEADING_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    HEADING_RE.get_or_init(|| {
        Regex::new(r"(?m)^##[ \t]+(\S[^\n]*?)[ \t]*$").expect("valid regex")
    })
}

/// 区切り行のセル（ダッシュ・コロン・空白のみ）
fn separator_cell_regex() -> &'static Regex {
    static SEPARATOR_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    SEPARATOR_RE.get_or_init(|| Regex::new(r"^[:\s-]*$").expect("valid regex"))
}

/// Markdownテキストをシートのリストに変換
///
/// 見出しが1つもない場合は、テキスト全体を`default_sheet_name`という名前の1シートとして扱います。
/// 最初の見出しより前の内容は無視します。テーブルが空のシートは結果に含めません。
pub(crate) fn read_markdown(text: &str, default_sheet_name: &str) -> Vec<Sheet> {
    let text = text.replace("\r\n", "\n");
    let headings: Vec<_> = heading_regex().captures_iter(&text).collect();

    if headings.is_empty() {
        let rows = parse_table(&text);
        if rows.is_empty() {
            return Vec::new();
        }
        return vec![Sheet {
            name: default_sheet_name.to_string(),
            rows,
        }];
    }

    let mut sheets = Vec::with_capacity(headings.len());
    for (i, captures) in headings.iter().enumerate() {
        let (Some(heading), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let block_end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());

        let rows = parse_table(&text[heading.end()..block_end]);
        if rows.is_empty() {
            tracing::debug!("Section '{}' has no table, skipped", name.as_str());
            continue;
        }

        sheets.push(Sheet {
            // スラッシュはシート名として使用できない
            name: name.as_str().replace('/', "-"),
            rows,
        });
    }

    sheets
}

/// 1ブロック分のテーブルを解析
///
/// - 空行は無視し、テーブル行を読み始めた後の非テーブル行で解析を終了
/// - 区切り行は読み捨てる
/// - 最初のデータ行の列数に合わせて、以降の行を空文字列で補完または切り詰める
pub(crate) fn parse_table(block: &str) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();
    let mut expected_cols = 0;

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(mut cells) = split_table_line(line) else {
            if !rows.is_empty() {
                break;
            }
            continue;
        };

        if is_separator_row(&cells) {
            continue;
        }

        if expected_cols == 0 {
            expected_cols = cells.len();
        }
        cells.resize(expected_cols, String::new());
        rows.push(cells);
    }

    rows
}

/// パイプで始まりパイプで終わる行をセルに分割（テーブル行でなければ`None`）
///
/// エスケープされたパイプ（`\|`）はセル内の文字として扱います。
fn split_table_line(line: &str) -> Option<Vec<String>> {
    if line.len() < 2 || !line.starts_with('|') || !line.ends_with('|') {
        return None;
    }
    let inner = &line[1..line.len() - 1];

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());

    Some(cells)
}

/// 区切り行の判定
///
/// すべてのセルがダッシュ・コロン・空白のみで構成され、かつ各セルにダッシュを含む場合に区切り行とみなします。
/// 空白のみのセルからなる行は区切り行ではなく、空のデータ行です。
fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|cell| separator_cell_regex().is_match(cell) && cell.contains('-'))
}
