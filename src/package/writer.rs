//! Package Writer
//!
//! 表形式モデルをXLSXパッケージに符号化します。
//! すべての値は共有文字列テーブルを経由して書き込まれ（`t="s"`）、空セルと空行は省略されます。

use std::io::{Seek, Write};

use quick_xml::escape::escape;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ns, parts, SharedStringTable, MAX_COLUMN_INDEX, MAX_ROW_INDEX};
use crate::error::{Result, XlmdError};
use crate::types::{CellCoord, Row, Sheet};

const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

/// XLSXパッケージライター
pub(crate) struct PackageWriter<'a> {
    sheets: &'a [Sheet],
    shared_strings: SharedStringTable,
}

impl<'a> PackageWriter<'a> {
    /// シートから共有文字列テーブルを構築してライターを生成
    pub fn new(sheets: &'a [Sheet]) -> Self {
        Self {
            sheets,
            shared_strings: SharedStringTable::build(sheets),
        }
    }

    /// パッケージ全体を書き込む
    ///
    /// いずれかのパートの書き込みに失敗した場合は`WriteIo`を返します。
    /// その時点の出力は不完全なため、使用しないでください。
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<W> {
        // 出力を始める前に検証し、読み戻せないパッケージは作らない
        self.validate()?;

        let mut zip = ZipWriter::new(writer);

        write_part(&mut zip, parts::CONTENT_TYPES, &self.content_types_xml())?;
        write_part(&mut zip, parts::ROOT_RELS, &root_rels_xml())?;
        write_part(&mut zip, parts::WORKBOOK, &self.workbook_xml())?;
        write_part(&mut zip, parts::WORKBOOK_RELS, &self.workbook_rels_xml())?;
        write_part(&mut zip, parts::STYLES, &styles_xml())?;
        write_part(&mut zip, parts::SHARED_STRINGS, &self.shared_strings.to_xml())?;

        for (i, sheet) in self.sheets.iter().enumerate() {
            let part = format!("{}{}.xml", parts::WORKSHEET_PREFIX, i + 1);
            write_part(&mut zip, &part, &self.worksheet_xml(&sheet.rows))?;
        }

        tracing::debug!(
            "Wrote {} worksheet(s), {} shared string(s)",
            self.sheets.len(),
            self.shared_strings.len()
        );

        let writer = zip.finish()?;
        Ok(writer)
    }

    /// シート名とセル値がワークシートの範囲とXML 1.0の文字に収まることを検証
    ///
    /// 空でないセルだけを対象にします（空セルは書き込まれないため）。
    fn validate(&self) -> Result<()> {
        for (i, sheet) in self.sheets.iter().enumerate() {
            let label = if sheet.name.is_empty() {
                format!("Sheet{}", i + 1)
            } else {
                sheet.name.clone()
            };

            if sheet.name.chars().any(|c| !is_xml_char(c)) {
                return Err(XlmdError::WriteIo(format!(
                    "Sheet name {:?} contains a character that XML cannot represent",
                    sheet.name
                )));
            }

            for (row_idx, row) in sheet.rows.iter().enumerate() {
                let Some(last) = row.iter().rposition(|value| !value.is_empty()) else {
                    continue;
                };

                let row_index = u32::try_from(row_idx).unwrap_or(u32::MAX);
                let col_index = u32::try_from(last).unwrap_or(u32::MAX);
                if row_index > MAX_ROW_INDEX || col_index > MAX_COLUMN_INDEX {
                    return Err(XlmdError::WriteIo(format!(
                        "Sheet '{}': cell {} is outside the worksheet limits (max: XFD1048576)",
                        label,
                        CellCoord::new(row_index, col_index).to_a1_notation()
                    )));
                }

                for (col_idx, value) in row[..=last].iter().enumerate() {
                    if value.chars().any(|c| !is_xml_char(c)) {
                        return Err(XlmdError::WriteIo(format!(
                            "Sheet '{}': cell {} contains a character that XML cannot represent",
                            label,
                            CellCoord::new(row_index, col_idx as u32).to_a1_notation()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn content_types_xml(&self) -> String {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{}">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/{}" ContentType="{}"/>
    <Override PartName="/{}" ContentType="{}"/>
    <Override PartName="/{}" ContentType="{}"/>"#,
            ns::CONTENT_TYPES,
            parts::WORKBOOK,
            CT_WORKBOOK,
            parts::STYLES,
            CT_STYLES,
            parts::SHARED_STRINGS,
            CT_SHARED_STRINGS
        );

        for i in 0..self.sheets.len() {
            content.push_str(&format!(
                r#"
    <Override PartName="/{}{}.xml" ContentType="{}"/>"#,
                parts::WORKSHEET_PREFIX,
                i + 1,
                CT_WORKSHEET
            ));
        }

        content.push_str("\n</Types>");
        content
    }

    fn workbook_xml(&self) -> String {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}">
    <sheets>"#,
            ns::SPREADSHEETML,
            ns::RELATIONSHIPS
        );

        for (i, sheet) in self.sheets.iter().enumerate() {
            let name = if sheet.name.is_empty() {
                format!("Sheet{}", i + 1)
            } else {
                sheet.name.clone()
            };
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(name.as_str()),
                i + 1,
                i + 1
            ));
        }

        content.push_str(
            r#"
    </sheets>
</workbook>"#,
        );
        content
    }

    /// ワークシートはrId1..rIdN、スタイルはrId(N+1)、共有文字列はrId(N+2)
    fn workbook_rels_xml(&self) -> String {
        let sheet_count = self.sheets.len();
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
            ns::PACKAGE_RELATIONSHIPS
        );

        for i in 0..sheet_count {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                REL_WORKSHEET,
                i + 1
            ));
        }

        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="{}" Target="styles.xml"/>
    <Relationship Id="rId{}" Type="{}" Target="sharedStrings.xml"/>
</Relationships>"#,
            sheet_count + 1,
            REL_STYLES,
            sheet_count + 2,
            REL_SHARED_STRINGS
        ));
        content
    }

    /// 1シート分のワークシートXML
    ///
    /// 行番号は行の位置+1です。空でない値を持たない行は省略するため、行番号に欠番が生じます。
    fn worksheet_xml(&self, rows: &[Row]) -> String {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}">
    <sheetData>"#,
            ns::SPREADSHEETML,
            ns::RELATIONSHIPS
        );

        for (row_idx, row) in rows.iter().enumerate() {
            // 行ごとに最後の空でないセルまでを対象にする
            let Some(last) = row.iter().rposition(|value| !value.is_empty()) else {
                continue;
            };

            content.push_str(&format!("\n        <row r=\"{}\">", row_idx + 1));
            for (col_idx, value) in row[..=last].iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                // build()で全値を登録済み
                let Some(index) = self.shared_strings.index_of(value) else {
                    continue;
                };
                let reference = CellCoord::new(row_idx as u32, col_idx as u32).to_a1_notation();
                content.push_str(&format!(
                    r#"<c r="{}" t="s"><v>{}</v></c>"#,
                    reference, index
                ));
            }
            content.push_str("</row>");
        }

        content.push_str(
            r#"
    </sheetData>
</worksheet>"#,
        );
        content
    }
}

fn root_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">
    <Relationship Id="rId1" Type="{}" Target="{}"/>
</Relationships>"#,
        ns::PACKAGE_RELATIONSHIPS,
        REL_OFFICE_DOCUMENT,
        parts::WORKBOOK
    )
}

/// 最小限のスタイルシート（既定のフォント・塗りつぶし・罫線・書式を1つずつ）
fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="{}">
    <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
    <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
    <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
    <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
    <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#,
        ns::SPREADSHEETML
    )
}

/// XML 1.0で使用できる文字（タブ・改行・復帰以外の制御文字とU+FFFE/U+FFFFを除く）
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

fn write_part<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, content: &str) -> Result<()> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(content.as_bytes())
        .map_err(|e| XlmdError::WriteIo(format!("{}: {}", name, e)))?;
    Ok(())
}
