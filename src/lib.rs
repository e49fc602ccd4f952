//! xlmd - Pure-Rust converter between Excel (XLSX) workbooks and Markdown tables
//!
//! This crate converts plain string-valued grid data in both directions between
//! OOXML spreadsheet packages and GitHub-flavored Markdown tables. Each sheet of a
//! workbook becomes a `## <sheet name>` section holding one table.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use xlmd::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a converter with default settings
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     // The direction is inferred from the file extensions
//!     converter.convert_file(Path::new("report.xlsx"), Path::new("report.md"))?;
//!     converter.convert_file(Path::new("report.md"), Path::new("copy.xlsx"))?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Working with Sheets
//!
//! Both readers produce a list of [`Sheet`]s and both writers consume one,
//! so the model can be inspected or edited between the two steps:
//!
//! ```rust
//! use std::io::Cursor;
//! use xlmd::{ConverterBuilder, Sheet};
//!
//! # fn main() -> Result<(), xlmd::XlmdError> {
//! let converter = ConverterBuilder::new().build()?;
//!
//! let mut sheets = converter.read_markdown("## Scores\n\n| Name | Score |\n| --- | --- |\n| Alice | 90 |\n");
//! sheets.push(Sheet::with_rows("Notes", vec![vec!["checked"]]));
//!
//! let package = converter.write_xlsx(&sheets, Cursor::new(Vec::new()))?;
//! let markdown = converter.write_markdown(&converter.read_xlsx(Cursor::new(package.into_inner()))?);
//! assert!(markdown.starts_with("## Scores\n\n| Name | Score |\n| --- | --- |\n| Alice | 90 |\n"));
//! # Ok(())
//! # }
//! ```
//!
//! # Skipped Worksheets
//!
//! A missing or malformed worksheet does not abort a read. It is skipped with a
//! `tracing` warning, and [`Converter::read_xlsx_report`] lists every skipped sheet:
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlmd::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new().build()?;
//!     let report = converter.read_xlsx_report(File::open("damaged.xlsx")?)?;
//!     for skipped in &report.skipped {
//!         eprintln!("skipped {} ({}): {}", skipped.name, skipped.part, skipped.reason);
//!     }
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod delimited;
mod error;
mod markdown;
mod package;
mod security;
mod types;

// 公開API
pub use api::{Direction, MarkdownStyle};
pub use builder::{Converter, ConverterBuilder};
pub use error::{Result, XlmdError};
pub use package::{ReadReport, SkippedSheet};
pub use security::SecurityConfig;
pub use types::{cell_reference_to_column_index, column_index_to_letters, Row, Sheet};
