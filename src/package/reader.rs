//! Package Reader
//!
//! XLSXパッケージを表形式モデル（`Sheet`のリスト）に復号します。
//!
//! 処理の流れ:
//!
//! 1. 共有文字列テーブル（`xl/sharedStrings.xml`）を解析（存在しない場合は空）
//! 2. `xl/workbook.xml`のシート一覧と`xl/_rels/workbook.xml.rels`を`r:id`で結合し、
//!    ワークブックの宣言順にワークシートパートを特定
//! 3. 各ワークシートの疎なセルリストを密な行に展開
//!
//! 個別ワークシートの欠落・破損は警告ログを出してスキップし、残りのシートの読み込みを続けます。
//! 共有文字列・ワークブック・リレーションシップの破損は読み込み全体を中断します。

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{parts, SharedStringTable, MAX_COLUMN_INDEX};
use crate::error::{Result, XlmdError};
use crate::security::SecurityConfig;
use crate::types::{cell_reference_to_column_index, CellValue, RawCell, Row, Sheet};

/// 読み込み時にスキップされたワークシート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSheet {
    /// ワークブックで宣言されたシート名
    pub name: String,
    /// 対象のパート名（リレーションシップが解決できない場合はリレーションシップパート）
    pub part: String,
    /// スキップの理由
    pub reason: String,
}

/// パッケージ読み込みの結果
///
/// 読み込めたシート（ワークブックの宣言順）と、スキップされたシートの一覧を保持します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// 読み込めたシート
    pub sheets: Vec<Sheet>,
    /// スキップされたシート
    pub skipped: Vec<SkippedSheet>,
}

/// ワークブックで宣言されたシート
#[derive(Debug, Clone, PartialEq, Eq)]
struct DeclaredSheet {
    name: String,
    relationship_id: Option<String>,
}

/// 名前とパートの解決結果
enum SheetLocation {
    Part(String),
    Unresolved(String),
}

/// XLSXパッケージリーダー
pub(crate) struct PackageReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    max_part_size: u64,
}

impl<R: Read + Seek> PackageReader<R> {
    /// アーカイブを開き、セキュリティ制限を検証
    ///
    /// ZIPとして開けない場合は`ContainerOpen`エラーを返します。
    pub fn open(reader: R, security: &SecurityConfig) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| XlmdError::ContainerOpen(e.to_string()))?;
        security.check_archive(&mut archive)?;

        Ok(Self {
            archive,
            max_part_size: security.max_file_size,
        })
    }

    /// パッケージ全体を読み込む
    pub fn read(mut self) -> Result<ReadReport> {
        let shared_strings = match self.read_part(parts::SHARED_STRINGS)? {
            Some(xml) => SharedStringTable::parse(&xml)?,
            None => SharedStringTable::default(),
        };
        tracing::debug!("Loaded {} shared string(s)", shared_strings.len());

        let locations = match self.read_part(parts::WORKBOOK)? {
            Some(workbook_xml) => {
                let declared = parse_workbook(&workbook_xml)?;
                let relationships = match self.read_part(parts::WORKBOOK_RELS)? {
                    Some(rels_xml) => parse_relationships(&rels_xml)?,
                    None => HashMap::new(),
                };
                resolve_sheets(declared, &relationships)
            }
            None => {
                tracing::debug!(
                    "{} not found, discovering worksheets by file name",
                    parts::WORKBOOK
                );
                self.discover_worksheets()
            }
        };

        let mut report = ReadReport::default();
        for (name, location) in locations {
            let outcome = match location {
                SheetLocation::Part(part) => self
                    .read_worksheet(&part, &shared_strings)?
                    .map_err(|message| (part, message)),
                SheetLocation::Unresolved(message) => {
                    Err((parts::WORKBOOK_RELS.to_string(), message))
                }
            };

            match outcome {
                Ok(rows) => {
                    tracing::debug!("Read worksheet '{}' ({} row(s))", name, rows.len());
                    report.sheets.push(Sheet { name, rows });
                }
                Err((part, message)) => {
                    let error = XlmdError::WorksheetPart {
                        sheet: name.clone(),
                        part: part.clone(),
                        message: message.clone(),
                    };
                    tracing::warn!("Skipping worksheet: {}", error);
                    report.skipped.push(SkippedSheet {
                        name,
                        part,
                        reason: message,
                    });
                }
            }
        }

        Ok(report)
    }

    /// ワークシートパートを読み込んで行に展開
    ///
    /// 内側の`Err`はシート単位でスキップする失敗、外側の`Err`はセキュリティ違反です。
    fn read_worksheet(
        &mut self,
        part: &str,
        shared_strings: &SharedStringTable,
    ) -> Result<std::result::Result<Vec<Row>, String>> {
        Ok(match self.read_part(part) {
            Ok(Some(xml)) => parse_worksheet(&xml, shared_strings),
            Ok(None) => Err("part not found in package".to_string()),
            Err(e @ XlmdError::SecurityViolation(_)) => return Err(e),
            Err(e) => Err(e.to_string()),
        })
    }

    /// パートの内容を読み込む（存在しない場合は`None`）
    fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(XlmdError::PartParse {
                    part: name.to_string(),
                    message: e.to_string(),
                })
            }
        };

        // 宣言サイズを偽った圧縮データに備え、実際の展開量も制限する
        let mut content = Vec::new();
        file.take(self.max_part_size.saturating_add(1))
            .read_to_end(&mut content)
            .map_err(|e| XlmdError::PartParse {
                part: name.to_string(),
                message: e.to_string(),
            })?;

        if content.len() as u64 > self.max_part_size {
            return Err(XlmdError::SecurityViolation(format!(
                "File '{}' exceeds maximum size when decompressed (max: {} bytes)",
                name, self.max_part_size
            )));
        }

        Ok(Some(content))
    }

    /// ファイル名の規約（`xl/worksheets/sheetN.xml`）でワークシートを列挙
    ///
    /// `xl/workbook.xml`が存在しない場合のみ使用します。Nの昇順に並べます。
    fn discover_worksheets(&self) -> Vec<(String, SheetLocation)> {
        let mut found: Vec<(u32, String)> = self
            .archive
            .file_names()
            .filter_map(|path| {
                let number = path
                    .strip_prefix(parts::WORKSHEET_PREFIX)?
                    .strip_suffix(".xml")?
                    .parse::<u32>()
                    .ok()?;
                Some((number, path.to_string()))
            })
            .collect();
        found.sort();

        found
            .into_iter()
            .map(|(_, path)| (sheet_name_from_path(&path), SheetLocation::Part(path)))
            .collect()
    }
}

/// 宣言されたシートとリレーションシップを`r:id`で結合
fn resolve_sheets(
    declared: Vec<DeclaredSheet>,
    relationships: &HashMap<String, String>,
) -> Vec<(String, SheetLocation)> {
    declared
        .into_iter()
        .map(|sheet| {
            let location = match sheet.relationship_id {
                Some(id) => match relationships.get(&id) {
                    Some(target) => SheetLocation::Part(resolve_target(target)),
                    None => SheetLocation::Unresolved(format!(
                        "relationship '{}' not found in {}",
                        id,
                        parts::WORKBOOK_RELS
                    )),
                },
                None => SheetLocation::Unresolved("sheet has no relationship id".to_string()),
            };
            (sheet.name, location)
        })
        .collect()
}

/// リレーションシップのターゲットをパッケージ内のパスに変換
///
/// 相対パスは`xl/`を基準に解決し、`/`で始まる絶対パスはパッケージルートからのパスとして扱います。
fn resolve_target(target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// ファイルパスからシート名を推定（"xl/worksheets/sheet3.xml" -> "Sheet3"）
fn sheet_name_from_path(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name.strip_suffix(".xml").unwrap_or(file_name);

    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn part_error(part: &str, message: impl ToString) -> XlmdError {
    XlmdError::PartParse {
        part: part.to_string(),
        message: message.to_string(),
    }
}

/// 要素の属性値を取得（名前空間接頭辞は無視）
///
/// quick-xmlの`encoding`機能の有無に依存しないよう、UTF-8として復号してから実体参照を展開します。
fn attribute(
    element: &BytesStart<'_>,
    local_name: &[u8],
    prefixed: bool,
) -> std::result::Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| format!("XML attribute error: {}", e))?;
        if attr.key.local_name().as_ref() == local_name && attr.key.prefix().is_some() == prefixed
        {
            let raw = std::str::from_utf8(&attr.value).map_err(|e| e.to_string())?;
            let value = unescape(raw).map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `xl/workbook.xml`のシート一覧を宣言順に解析
fn parse_workbook(xml: &[u8]) -> Result<Vec<DeclaredSheet>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    let name = attribute(&e, b"name", false)
                        .map_err(|err| part_error(parts::WORKBOOK, err))?
                        .unwrap_or_else(|| format!("Sheet{}", sheets.len() + 1));
                    let relationship_id = attribute(&e, b"id", true)
                        .map_err(|err| part_error(parts::WORKBOOK, err))?;
                    sheets.push(DeclaredSheet {
                        name,
                        relationship_id,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(part_error(parts::WORKBOOK, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// `xl/_rels/workbook.xml.rels`を解析（Id -> Target）
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let id = attribute(&e, b"Id", false)
                        .map_err(|err| part_error(parts::WORKBOOK_RELS, err))?;
                    let target = attribute(&e, b"Target", false)
                        .map_err(|err| part_error(parts::WORKBOOK_RELS, err))?;
                    // IdまたはTargetが欠落しているエントリは無視
                    if let (Some(id), Some(target)) = (id, target) {
                        relationships.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(part_error(parts::WORKBOOK_RELS, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// ワークシートXMLの解析中の状態
#[derive(Default)]
struct CellState {
    col: u32,
    cell_type: Option<String>,
    value: String,
    inline: String,
    in_value: bool,
    in_inline: bool,
    in_phonetic: bool,
    in_text: bool,
}

/// `<c>`要素から列インデックスと型を取り出す
fn start_cell(
    element: &BytesStart<'_>,
    previous_col: Option<u32>,
) -> std::result::Result<CellState, String> {
    let reference = attribute(element, b"r", false)?;
    let cell_type = attribute(element, b"t", false)?;

    let col = match reference {
        Some(reference) => cell_reference_to_column_index(&reference)
            .ok_or_else(|| format!("invalid cell reference '{}'", reference))?,
        // r属性がない場合は直前のセルの次の列
        None => previous_col.map_or(0, |col| col.saturating_add(1)),
    };

    if col > MAX_COLUMN_INDEX {
        return Err(format!(
            "column index {} exceeds the maximum of {}",
            col, MAX_COLUMN_INDEX
        ));
    }

    Ok(CellState {
        col,
        cell_type,
        ..CellState::default()
    })
}

/// 疎なセルリストを密な行に展開
///
/// 行の幅は最大の列インデックス+1で、存在しないセルは空文字列になります。
fn densify(cells: Vec<RawCell>, shared_strings: &SharedStringTable) -> Row {
    let width = cells.iter().map(|cell| cell.col as usize + 1).max().unwrap_or(0);
    let mut row = vec![String::new(); width];
    for cell in cells {
        row[cell.col as usize] = cell.value.resolve(shared_strings);
    }
    row
}

/// ワークシートXMLを解析し、セルを持つ行のみを密な行として返す
///
/// エラーはシート単位でスキップするため、メッセージ文字列として返します。
fn parse_worksheet(
    xml: &[u8],
    shared_strings: &SharedStringTable,
) -> std::result::Result<Vec<Row>, String> {
    let mut reader = Reader::from_reader(xml);
    // インライン文字列の空白を保持するため、テキストはトリムしない
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut rows = Vec::new();
    let mut current_row: Option<Vec<RawCell>> = None;
    let mut cell: Option<CellState> = None;
    let mut previous_col: Option<u32> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = Some(Vec::new());
                    previous_col = None;
                }
                b"c" if current_row.is_some() => {
                    cell = Some(start_cell(&e, previous_col)?);
                }
                b"v" => {
                    if let Some(state) = cell.as_mut() {
                        state.in_value = true;
                    }
                }
                b"is" => {
                    if let Some(state) = cell.as_mut() {
                        state.in_inline = true;
                    }
                }
                b"rPh" => {
                    if let Some(state) = cell.as_mut() {
                        state.in_phonetic = true;
                    }
                }
                b"t" => {
                    if let Some(state) = cell.as_mut() {
                        state.in_text = state.in_inline && !state.in_phonetic;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                // 自己終了の<c/>は値を持たないが、行の幅には数える
                if e.local_name().as_ref() == b"c" {
                    if let Some(row) = current_row.as_mut() {
                        let state = start_cell(&e, previous_col)?;
                        previous_col = Some(state.col);
                        row.push(RawCell {
                            col: state.col,
                            value: CellValue::Inline(String::new()),
                        });
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(state) = cell.as_mut() {
                    if state.in_value || state.in_text {
                        let text = e.unescape().map_err(|err| err.to_string())?;
                        if state.in_value {
                            state.value.push_str(&text);
                        } else {
                            state.inline.push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(state) = cell.as_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    if state.in_value {
                        state.value.push_str(&text);
                    } else if state.in_text {
                        state.inline.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => {
                    if let Some(state) = cell.as_mut() {
                        state.in_value = false;
                    }
                }
                b"t" => {
                    if let Some(state) = cell.as_mut() {
                        state.in_text = false;
                    }
                }
                b"rPh" => {
                    if let Some(state) = cell.as_mut() {
                        state.in_phonetic = false;
                    }
                }
                b"is" => {
                    if let Some(state) = cell.as_mut() {
                        state.in_inline = false;
                    }
                }
                b"c" => {
                    if let (Some(state), Some(row)) = (cell.take(), current_row.as_mut()) {
                        let payload = match state.cell_type.as_deref() {
                            Some("inlineStr") => state.inline,
                            _ => state.value,
                        };
                        previous_col = Some(state.col);
                        row.push(RawCell {
                            col: state.col,
                            value: CellValue::from_raw(state.cell_type.as_deref(), payload),
                        });
                    }
                }
                b"row" => {
                    // セルを持たない行はスキップ
                    if let Some(cells) = current_row.take() {
                        if !cells.is_empty() {
                            rows.push(densify(cells, shared_strings));
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    if current_row.is_some() {
        return Err("unterminated <row> element".to_string());
    }

    Ok(rows)
}
