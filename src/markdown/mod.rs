//! Markdown Module
//!
//! GitHub Flavored Markdownのテーブルと表形式モデルの相互変換を提供するモジュール。
//!
//! ドキュメントは`## シート名`の見出しでシートごとに区切られ、
//! 各見出しの後に1つのパイプ区切りテーブルが続きます。

mod reader;
mod writer;

pub(crate) use reader::read_markdown;
pub(crate) use writer::{render_markdown, write_markdown};
