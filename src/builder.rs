//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use std::fs::File;
use std::io::{BufRead, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use crate::api::{Direction, MarkdownStyle};
use crate::error::{Result, XlmdError};
use crate::package::{PackageReader, PackageWriter, ReadReport};
use crate::security::SecurityConfig;
use crate::types::Sheet;
use crate::{delimited, markdown};

/// 変換処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ConversionConfig {
    /// パッケージ読み込み時のセキュリティ制限
    pub security: SecurityConfig,

    /// Markdownテーブルの出力形式
    pub markdown_style: MarkdownStyle,

    /// 見出しのないMarkdown・貼り付け入力に付けるシート名
    pub default_sheet_name: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            security: SecurityConfig::default(),
            markdown_style: MarkdownStyle::Compact,
            default_sheet_name: "Sheet1".to_string(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use xlmd::{ConverterBuilder, MarkdownStyle};
///
/// # fn main() -> Result<(), xlmd::XlmdError> {
/// let converter = ConverterBuilder::new()
///     .with_markdown_style(MarkdownStyle::Aligned)
///     .with_default_sheet_name("Data")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - セキュリティ制限: `SecurityConfig::default()`
    /// - Markdown出力形式: `MarkdownStyle::Compact`
    /// - 既定のシート名: `Sheet1`
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// パッケージ読み込み時のセキュリティ制限を指定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlmd::{ConverterBuilder, SecurityConfig};
    ///
    /// let builder = ConverterBuilder::new().with_security_config(SecurityConfig {
    ///     max_file_count: 100,
    ///     ..SecurityConfig::default()
    /// });
    /// ```
    pub fn with_security_config(mut self, security: SecurityConfig) -> Self {
        self.config.security = security;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を指定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.security.max_input_file_size = bytes;
        self
    }

    /// Markdownテーブルの出力形式を指定する
    pub fn with_markdown_style(mut self, style: MarkdownStyle) -> Self {
        self.config.markdown_style = style;
        self
    }

    /// 見出しのないMarkdown入力に付けるシート名を指定する
    ///
    /// 空文字列、またはスラッシュを含む名前は`build()`でエラーになります。
    pub fn with_default_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.default_sheet_name = name.into();
        self
    }

    /// ビルダーの設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # エラー
    ///
    /// 以下の場合に`XlmdError::Config`を返します。
    ///
    /// * セキュリティ制限のいずれかが0
    /// * 既定のシート名が空、またはスラッシュを含む
    pub fn build(self) -> Result<Converter> {
        // 1. セキュリティ制限の検証
        self.config.security.validate()?;

        // 2. 既定のシート名の検証
        let name = &self.config.default_sheet_name;
        if name.trim().is_empty() {
            return Err(XlmdError::Config(
                "Default sheet name must not be empty".to_string(),
            ));
        }
        if name.contains('/') {
            return Err(XlmdError::Config(format!(
                "Default sheet name must not contain '/': '{}'",
                name
            )));
        }

        // 3. Converterインスタンス生成
        Ok(Converter {
            config: self.config,
        })
    }
}

/// 変換処理のファサード
///
/// XLSXとMarkdownの相互変換のメインエントリーポイントです。
/// 1回の呼び出しごとに表形式モデルと共有文字列テーブルを新しく構築し、呼び出し間で状態を共有しません。
///
/// # 使用例
///
/// ```rust
/// use std::io::Cursor;
/// use xlmd::ConverterBuilder;
///
/// # fn main() -> Result<(), xlmd::XlmdError> {
/// let converter = ConverterBuilder::new().build()?;
///
/// let sheets = converter.read_markdown("| Name | Score |\n| --- | --- |\n| Alice | 90 |\n");
/// let package = converter.write_xlsx(&sheets, Cursor::new(Vec::new()))?;
///
/// let back = converter.read_xlsx(Cursor::new(package.into_inner()))?;
/// assert_eq!(back, sheets);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Converter {
    /// 変換設定
    config: ConversionConfig,
}

impl Converter {
    /// XLSXパッケージを読み込み、シートのリストを返す
    ///
    /// 欠落・破損したワークシートは警告ログを出してスキップします。
    /// スキップされたシートを確認する場合は`read_xlsx_report`を使用してください。
    pub fn read_xlsx<R: Read + Seek>(&self, input: R) -> Result<Vec<Sheet>> {
        Ok(self.read_xlsx_report(input)?.sheets)
    }

    /// XLSXパッケージを読み込み、スキップされたワークシートの一覧も含めて返す
    ///
    /// # エラー
    ///
    /// * `ContainerOpen` - 入力がZIPアーカイブではない
    /// * `PartParse` - 共有文字列・ワークブック・リレーションシップのいずれかが不正
    /// * `SecurityViolation` - セキュリティ制限を超えた
    pub fn read_xlsx_report<R: Read + Seek>(&self, input: R) -> Result<ReadReport> {
        // 上限を1バイト超えるまでだけ読み込み、超過を検出する
        let limit = self.config.security.max_input_file_size.saturating_add(1);
        let mut buffer = Vec::new();
        let bytes_read = input.take(limit).read_to_end(&mut buffer)?;
        self.config.security.check_input_size(bytes_read as u64)?;

        PackageReader::open(Cursor::new(buffer), &self.config.security)?.read()
    }

    /// シートのリストをXLSXパッケージとして書き込み、ライターを返す
    ///
    /// 失敗した場合は`WriteIo`を返します。書き込み途中の出力は使用しないでください。
    pub fn write_xlsx<W: Write + Seek>(&self, sheets: &[Sheet], output: W) -> Result<W> {
        let mut writer = PackageWriter::new(sheets).write(output)?;
        writer
            .flush()
            .map_err(|e| XlmdError::WriteIo(e.to_string()))?;
        Ok(writer)
    }

    /// Markdownテキストをシートのリストに変換
    pub fn read_markdown(&self, text: &str) -> Vec<Sheet> {
        markdown::read_markdown(text, &self.config.default_sheet_name)
    }

    /// リーダーからUTF-8のMarkdownを読み込み、シートのリストに変換
    pub fn read_markdown_from<R: Read>(&self, mut input: R) -> Result<Vec<Sheet>> {
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;
        let text = std::str::from_utf8(&buffer)?;
        Ok(self.read_markdown(text))
    }

    /// シートのリストをMarkdown文字列に変換
    pub fn write_markdown(&self, sheets: &[Sheet]) -> String {
        markdown::render_markdown(sheets, self.config.markdown_style)
    }

    /// シートのリストをMarkdownとしてライターに書き込む
    pub fn write_markdown_to<W: Write>(&self, sheets: &[Sheet], mut output: W) -> Result<()> {
        markdown::write_markdown(sheets, self.config.markdown_style, &mut output)?;
        Ok(())
    }

    /// 表計算アプリケーションから貼り付けられた表（タブ区切り・カンマ区切り）を読み込む
    ///
    /// 空行で入力の終わりとみなします。シート名は既定のシート名です。
    pub fn read_pasted<R: BufRead>(&self, input: R) -> Result<Sheet> {
        delimited::read_pasted(input, &self.config.default_sheet_name)
    }

    /// XLSXパッケージを読み込み、Markdownとして書き込む
    pub fn xlsx_to_markdown<R: Read + Seek, W: Write>(&self, input: R, output: W) -> Result<()> {
        let sheets = self.read_xlsx(input)?;
        self.write_markdown_to(&sheets, output)
    }

    /// Markdownを読み込み、XLSXパッケージとして書き込む
    pub fn markdown_to_xlsx<R: Read, W: Write + Seek>(&self, input: R, output: W) -> Result<()> {
        let sheets = self.read_markdown_from(input)?;
        self.write_xlsx(&sheets, output)?;
        Ok(())
    }

    /// 拡張子から変換方向を推定し、ファイルを変換する
    ///
    /// 入力全体を読み込んでから出力全体を書き込みます。実行した変換方向を返します。
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use std::path::Path;
    /// use xlmd::{ConverterBuilder, Direction};
    ///
    /// # fn main() -> Result<(), xlmd::XlmdError> {
    /// let converter = ConverterBuilder::new().build()?;
    /// let direction = converter.convert_file(Path::new("report.xlsx"), Path::new("report.md"))?;
    /// assert_eq!(direction, Direction::XlsxToMarkdown);
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_file(&self, input: &Path, output: &Path) -> Result<Direction> {
        let direction = Direction::infer(input, output)?;
        tracing::debug!(
            "Converting '{}' -> '{}' ({:?})",
            input.display(),
            output.display(),
            direction
        );

        match direction {
            Direction::XlsxToMarkdown => {
                let file = File::open(input).map_err(|e| {
                    XlmdError::ContainerOpen(format!("{}: {}", input.display(), e))
                })?;
                let sheets = self.read_xlsx(file)?;
                let output_file = create_output(output)?;
                self.write_markdown_to(&sheets, BufWriter::new(output_file))?;
            }
            Direction::MarkdownToXlsx => {
                let file = File::open(input)?;
                let sheets = self.read_markdown_from(file)?;
                let output_file = create_output(output)?;
                self.write_xlsx(&sheets, BufWriter::new(output_file))?;
            }
        }

        Ok(direction)
    }
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| XlmdError::WriteIo(format!("{}: {}", path.display(), e)))
}
