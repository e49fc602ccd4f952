//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlmdクレート全体で使用するエラー型
///
/// XLSXパッケージの読み書き、Markdownの変換処理中に発生する
/// すべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `ContainerOpen`: 入力がZIPアーカイブとして開けない
/// - `PartParse`: 必須XMLパート（共有文字列、ワークブック等）の解析失敗（読み込み全体が中断）
/// - `WorksheetPart`: 個別ワークシートの欠落・破損（リーダー内部で警告に格下げされ、そのシートのみスキップ）
/// - `WriteIo`: パッケージ書き込み中の失敗（出力は使用不可として扱う）
/// - `Config`: 設定の検証に失敗したエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use xlmd::XlmdError;
/// use std::fs::File;
///
/// fn open_input(path: &str) -> Result<File, XlmdError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(file)
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlmdError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8文字列の変換エラー
    ///
    /// Markdown入力がUTF-8として不正な場合などに発生します。
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// コンテナ（ZIPアーカイブ）を開けないエラー
    ///
    /// ファイルが存在しない、またはZIP形式ではない場合に発生します。
    #[error("Failed to open package container: {0}")]
    ContainerOpen(String),

    /// 必須XMLパートの解析エラー
    ///
    /// `xl/sharedStrings.xml`、`xl/workbook.xml`、`xl/_rels/workbook.xml.rels`
    /// のいずれかが不正な場合に発生し、読み込み全体を中断します。
    #[error("Failed to parse part '{part}': {message}")]
    PartParse {
        /// パッケージ内のパート名
        part: String,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// 個別ワークシートの欠落・破損
    ///
    /// パッケージリーダーの内部でのみ生成され、警告ログとスキップに格下げされます。
    /// `Converter::read_xlsx_report`の結果から参照できます。
    #[error("Worksheet '{sheet}' ({part}) could not be read: {message}")]
    WorksheetPart {
        /// ワークブックで宣言されたシート名
        sheet: String,
        /// パッケージ内のパート名
        part: String,
        /// エラーの詳細メッセージ
        message: String,
    },

    /// パッケージ書き込みエラー
    ///
    /// アーカイブまたはパートの作成に失敗した場合に発生します。
    /// 書き込み途中の出力は使用不可として扱ってください。
    #[error("Failed to write package: {0}")]
    WriteIo(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`時の検証や、拡張子から変換方向を
    /// 推定できなかった場合に発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use xlmd::{ConverterBuilder, XlmdError};
    ///
    /// let result = ConverterBuilder::new()
    ///     .with_default_sheet_name("")  // 空のシート名は無効
    ///     .build();
    ///
    /// match result {
    ///     Err(XlmdError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl From<zip::result::ZipError> for XlmdError {
    fn from(err: zip::result::ZipError) -> Self {
        XlmdError::WriteIo(err.to_string())
    }
}

/// クレート内で使用するResult型のエイリアス
pub type Result<T> = std::result::Result<T, XlmdError>;
