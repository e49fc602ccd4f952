//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! 表形式モデル（`Sheet`）と、XLSX境界でのみ使用するセル座標・列アドレス変換を提供します。

use crate::package::SharedStringTable;

/// 1行分のセル文字列（0始まりの列インデックス）
///
/// 行の長さは揃っている必要はありません。列幅の正規化は出力形式ごとに行われます。
pub type Row = Vec<String>;

/// 名前付きシート（表形式モデル）
///
/// XLSXリーダー・Markdownリーダーが生成し、両ライターが消費する唯一の中間表現です。
/// シートの順序は挿入順で、変換パイプライン全体で保持されます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    /// シート名（空の場合、XLSXライターは`SheetN`を補完する）
    pub name: String,

    /// 行のリスト
    pub rows: Vec<Row>,
}

impl Sheet {
    /// 空のシートを生成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// 行データを指定してシートを生成
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlmd::Sheet;
    ///
    /// let sheet = Sheet::with_rows("Scores", vec![
    ///     vec!["Name", "Score"],
    ///     vec!["Alice", "90"],
    /// ]);
    /// assert_eq!(sheet.rows[1][0], "Alice");
    /// ```
    pub fn with_rows<N, S>(name: N, rows: Vec<Vec<S>>) -> Self
    where
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// 行を末尾に追加
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// 行が1つもないかどうか
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// シート内で最も長い行の長さ（Markdown出力時の列数）
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// 列インデックスを列名に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
///
/// 'A'..'Z'を1..26とする、ゼロを持たない26進数表記です。
///
/// ```rust
/// use xlmd::column_index_to_letters;
///
/// assert_eq!(column_index_to_letters(0), "A");
/// assert_eq!(column_index_to_letters(27), "AB");
/// assert_eq!(column_index_to_letters(701), "ZZ");
/// ```
pub fn column_index_to_letters(index: u32) -> String {
    let mut col = index as u64;
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// セル参照から0始まりの列インデックスを取り出す（"AB12" -> 27）
///
/// 先頭の英大文字（A-Z）の連続のみを列名として扱い、後続の行番号は無視します。
/// 列名が存在しない場合、または`u32`に収まらない場合は`None`を返します。
///
/// ```rust
/// use xlmd::cell_reference_to_column_index;
///
/// assert_eq!(cell_reference_to_column_index("A1"), Some(0));
/// assert_eq!(cell_reference_to_column_index("ZZ9"), Some(701));
/// assert_eq!(cell_reference_to_column_index("12"), None);
/// ```
pub fn cell_reference_to_column_index(reference: &str) -> Option<u32> {
    let mut value: u64 = 0;
    let mut letters = 0;

    for byte in reference.bytes() {
        if !byte.is_ascii_uppercase() {
            break;
        }
        value = value
            .checked_mul(26)?
            .checked_add((byte - b'A') as u64 + 1)?;
        letters += 1;
    }

    if letters == 0 {
        return None;
    }

    // 1始まりの値を0始まりに変換
    u32::try_from(value - 1).ok()
}

/// セル座標（0始まり）
///
/// XLSX境界でのみ使用し、表形式モデルには現れません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        format!("{}{}", column_index_to_letters(self.col), self.row as u64 + 1)
    }
}

/// ワークシートXMLから読み取ったセル値
///
/// `t="s"`の場合は共有文字列インデックス、それ以外はリテラル値として扱います。
/// ライターは常に`SharedString`のみを生成します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CellValue {
    /// 共有文字列テーブルのインデックス
    SharedString(usize),

    /// リテラル値（数値、論理値、インライン文字列など）
    Inline(String),
}

impl CellValue {
    /// `t`属性と`<v>`の内容からセル値を生成
    ///
    /// 数値として解釈できない共有文字列インデックスは空文字列として扱います。
    pub fn from_raw(cell_type: Option<&str>, payload: String) -> Self {
        match cell_type {
            Some("s") => match payload.trim().parse::<usize>() {
                Ok(index) => CellValue::SharedString(index),
                Err(_) => CellValue::Inline(String::new()),
            },
            _ => CellValue::Inline(payload),
        }
    }

    /// 共有文字列テーブルを参照して表示文字列を解決
    ///
    /// 範囲外のインデックスは空文字列になります。
    pub fn resolve(self, shared_strings: &SharedStringTable) -> String {
        match self {
            CellValue::SharedString(index) => shared_strings
                .get(index)
                .map(str::to_string)
                .unwrap_or_default(),
            CellValue::Inline(text) => text,
        }
    }
}

/// ワークシートXMLから読み取った1セル分の生データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawCell {
    /// 0始まりの列インデックス
    pub col: u32,

    /// セル値
    pub value: CellValue,
}
