//! Shared String Table
//!
//! 共有文字列テーブル（`xl/sharedStrings.xml`）の構築・解析・シリアライズ。
//! 変換呼び出しごとに新しく生成し、呼び出しをまたいで保持しません。

use std::collections::HashMap;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::{ns, parts};
use crate::error::{Result, XlmdError};
use crate::types::Sheet;

/// 共有文字列テーブル
///
/// 出現順に並んだ一意な文字列リストと、値からインデックスへの逆引きを保持します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SharedStringTable {
    /// インデックス順の文字列
    items: Vec<String>,
    /// 文字列 -> 最初に出現したインデックス
    lookup: HashMap<String, usize>,
}

impl SharedStringTable {
    /// 全シート・全行・全セルを走査してテーブルを構築（書き込み側）
    ///
    /// 空文字列は登録せず、初出順に一意な値を並べます。
    pub fn build(sheets: &[Sheet]) -> Self {
        let mut table = Self::default();
        for sheet in sheets {
            for row in &sheet.rows {
                for value in row {
                    if !value.is_empty() {
                        table.intern(value);
                    }
                }
            }
        }
        table
    }

    /// 文字列リストからテーブルを生成（読み込み側）
    ///
    /// 読み込んだパッケージ内の重複はそのまま保持し、インデックスを変えません。
    pub fn from_items(items: Vec<String>) -> Self {
        let mut lookup = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            lookup.entry(item.clone()).or_insert(index);
        }
        Self { items, lookup }
    }

    /// 値を登録し、そのインデックスを返す
    fn intern(&mut self, value: &str) -> usize {
        if let Some(&index) = self.lookup.get(value) {
            return index;
        }
        let index = self.items.len();
        self.items.push(value.to_string());
        self.lookup.insert(value.to_string(), index);
        index
    }

    /// インデックスから文字列を取得
    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    /// 文字列からインデックスを取得
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.lookup.get(value).copied()
    }

    /// 登録されている文字列の数
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `xl/sharedStrings.xml`の内容を解析
    ///
    /// `<si>`ごとに1エントリを生成します。リッチテキスト（複数の`<r>`）は
    /// 各`<t>`を連結し、ふりがな（`<rPh>`）は無視します。
    /// XMLが不正な場合は`PartParse`エラーを返し、読み込み全体を中断します。
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        // xml:space="preserve"の空白を保持するため、テキストはトリムしない
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut items = Vec::new();
        let mut in_si = false;
        let mut in_phonetic = false;
        let mut in_t = false;
        let mut current = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" if in_si => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => {
                    // <si/> は空文字列のエントリ
                    if e.local_name().as_ref() == b"si" {
                        items.push(String::new());
                    }
                }
                Ok(Event::Text(e)) if in_t => {
                    let text = e.unescape().map_err(|err| parse_error(&err))?;
                    current.push_str(&text);
                }
                Ok(Event::CData(e)) if in_t => {
                    current.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        items.push(std::mem::take(&mut current));
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(err) => return Err(parse_error(&err)),
                _ => {}
            }
            buf.clear();
        }

        if in_si {
            return Err(XlmdError::PartParse {
                part: parts::SHARED_STRINGS.to_string(),
                message: "unterminated <si> element".to_string(),
            });
        }

        Ok(Self::from_items(items))
    }

    /// `xl/sharedStrings.xml`としてシリアライズ
    ///
    /// 値はすでに一意なので、`count`と`uniqueCount`は同じ値になります。
    pub fn to_xml(&self) -> String {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            ns::SPREADSHEETML,
            self.len(),
            self.len()
        );

        for item in &self.items {
            // 前後の空白はxml:space="preserve"がないと読み込み側で失われる
            let preserve = item.starts_with(char::is_whitespace)
                || item.ends_with(char::is_whitespace);
            if preserve {
                content.push_str(&format!(
                    "<si><t xml:space=\"preserve\">{}</t></si>",
                    escape(item.as_str())
                ));
            } else {
                content.push_str(&format!("<si><t>{}</t></si>", escape(item.as_str())));
            }
        }

        content.push_str("</sst>");
        content
    }
}

fn parse_error(err: &quick_xml::Error) -> XlmdError {
    XlmdError::PartParse {
        part: parts::SHARED_STRINGS.to_string(),
        message: err.to_string(),
    }
}
