//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use std::path::Path;

use crate::error::{Result, XlmdError};

/// 変換方向
///
/// `Converter::convert_file`は入出力ファイルの拡張子から変換方向を推定し、
/// 実行した方向を返します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Direction {
    /// XLSX → Markdown
    XlsxToMarkdown,

    /// Markdown → XLSX
    MarkdownToXlsx,
}

impl Direction {
    /// 入出力パスの拡張子から変換方向を推定
    ///
    /// 拡張子の大文字・小文字は区別しません。
    /// `.xlsx`→`.md`、`.md`→`.xlsx`以外の組み合わせは`Config`エラーになります。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use std::path::Path;
    /// use xlmd::Direction;
    ///
    /// let direction = Direction::infer(Path::new("in.XLSX"), Path::new("out.md")).unwrap();
    /// assert_eq!(direction, Direction::XlsxToMarkdown);
    ///
    /// assert!(Direction::infer(Path::new("in.csv"), Path::new("out.md")).is_err());
    /// ```
    pub fn infer(input: &Path, output: &Path) -> Result<Self> {
        let extension = |path: &Path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
        };

        match (extension(input).as_deref(), extension(output).as_deref()) {
            (Some("xlsx"), Some("md")) => Ok(Direction::XlsxToMarkdown),
            (Some("md"), Some("xlsx")) => Ok(Direction::MarkdownToXlsx),
            _ => Err(XlmdError::Config(format!(
                "Unsupported conversion: '{}' -> '{}' (expected .xlsx -> .md or .md -> .xlsx)",
                input.display(),
                output.display()
            ))),
        }
    }
}

/// Markdownテーブルの出力形式
///
/// どちらの形式もMarkdownリーダーで読み戻すことができます。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum MarkdownStyle {
    /// セルを1つの空白で区切る最小限の形式（デフォルト）
    ///
    /// # 出力例
    ///
    /// ```markdown
    /// | Name | Score |
    /// | --- | --- |
    /// | Alice | 90 |
    /// ```
    #[default]
    Compact,

    /// 列ごとに表示幅を揃えた形式
    ///
    /// 全角文字（日本語など）は表示幅2として計算します。区切り行のダッシュも列幅に合わせます。
    ///
    /// # 出力例
    ///
    /// ```markdown
    /// | Name  | Score |
    /// |-------|-------|
    /// | Alice | 90    |
    /// ```
    Aligned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_direction() {
        assert_eq!(
            Direction::infer(Path::new("a.xlsx"), Path::new("b.md")).unwrap(),
            Direction::XlsxToMarkdown
        );
        assert_eq!(
            Direction::infer(Path::new("dir/a.MD"), Path::new("b.Xlsx")).unwrap(),
            Direction::MarkdownToXlsx
        );
    }

    #[test]
    fn test_infer_direction_unsupported() {
        for (input, output) in [
            ("a.xlsx", "b.xlsx"),
            ("a.md", "b.md"),
            ("a.csv", "b.md"),
            ("a", "b.md"),
        ] {
            assert!(matches!(
                Direction::infer(Path::new(input), Path::new(output)),
                Err(XlmdError::Config(_))
            ));
        }
    }

    #[test]
    fn test_default_style() {
        assert_eq!(MarkdownStyle::default(), MarkdownStyle::Compact);
    }
}
