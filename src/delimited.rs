//! Pasted Grid Reader
//!
//! 表計算アプリケーションからコピーした表（タブ区切り、またはカンマ区切り）を読み取るモジュール。
//! 空行を入力の終わりとみなすため、端末への貼り付けをそのまま受け付けられます。

use std::io::BufRead;

use crate::error::Result;
use crate::types::{Row, Sheet};

/// 貼り付けられた表を1シートとして読み取る
///
/// 各行はタブで分割し、タブを含まない行はカンマで分割します。
/// 先頭の空行は読み飛ばし、データ行の後の最初の空行（または入力の終わり）で読み取りを終了します。
/// 行の長さは揃えません（Markdownライターが出力時に揃えます）。
pub(crate) fn read_pasted<R: BufRead>(reader: R, sheet_name: &str) -> Result<Sheet> {
    let mut sheet = Sheet::new(sheet_name);

    for line in reader.lines() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.trim().is_empty() {
            if sheet.is_empty() {
                continue;
            }
            break;
        }

        sheet.push_row(split_line(line));
    }

    tracing::debug!("Read {} pasted row(s)", sheet.rows.len());
    Ok(sheet)
}

fn split_line(line: &str) -> Row {
    let delimiter = if line.contains('\t') { '\t' } else { ',' };
    line.split(delimiter).map(str::to_string).collect()
}
