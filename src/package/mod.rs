//! Package Module
//!
//! XLSX（OOXMLパッケージ）の読み書きを提供するモジュール。
//! `zip`でアーカイブを扱い、`quick-xml`で各XMLパートを直接解析します。

mod reader;
mod shared_strings;
mod writer;

pub use reader::{ReadReport, SkippedSheet};
pub(crate) use reader::PackageReader;
pub(crate) use shared_strings::SharedStringTable;
pub(crate) use writer::PackageWriter;

/// ワークシートの最大列インデックス（XFD列、0始まり）
pub(crate) const MAX_COLUMN_INDEX: u32 = 16_383;

/// ワークシートの最大行インデックス（1,048,576行目、0始まり）
pub(crate) const MAX_ROW_INDEX: u32 = 1_048_575;

/// パッケージ内の固定パート名
pub(crate) mod parts {
    pub const CONTENT_TYPES: &str = "[Content_Types].xml";
    pub const ROOT_RELS: &str = "_rels/.rels";
    pub const WORKBOOK: &str = "xl/workbook.xml";
    pub const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
    pub const STYLES: &str = "xl/styles.xml";
    pub const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
    pub const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";
}

/// XML名前空間
pub(crate) mod ns {
    pub const SPREADSHEETML: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    pub const RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    pub const PACKAGE_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";
    pub const CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
}
