//! APIレスポンスパーサー
//!
//! 画像Data URLの分解と、AIレスポンスからの SafetyAnalysis 抽出を行う

use crate::error::{Error, Result};
use crate::prompts::REQUIRED_FIELDS;
use crate::types::SafetyAnalysis;

/// Data URLが省略されたときのMIMEタイプ
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Data URLをMIMEタイプとBase64データに分解
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式のData URL
///
/// # Returns
/// (MIMEタイプ, Base64データ)。カンマがない、またはデータが空ならNone
///
/// # Examples
/// ```
/// use safescan_common::split_data_url;
///
/// let (mime, data) = split_data_url("data:image/png;base64,iVBORw0").unwrap();
/// assert_eq!(mime, "image/png");
/// assert_eq!(data, "iVBORw0");
/// ```
pub fn split_data_url(data_url: &str) -> Option<(&str, &str)> {
    let (header, data) = data_url.split_once(',')?;
    if data.is_empty() {
        return None;
    }

    let mime = header
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE);

    Some((mime, data))
}

/// MIMEタイプとBase64データからData URLを組み立てる
pub fn to_data_url(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}

/// APIレスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 最初の `{` から最後の `}` まで
/// 3. エラー
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7;
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSONが見つかりません".into()))
}

/// 解析レスポンスをパース
///
/// 空のレスポンス、必須フィールドの欠落、型不一致はすべてエラー
pub fn parse_analysis_response(response: &str) -> Result<SafetyAnalysis> {
    if response.trim().is_empty() {
        return Err(Error::Parse("空のレスポンス".into()));
    }

    let json_str = extract_json(response)?;
    let value: serde_json::Value = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("JSONパースエラー: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| Error::Parse("JSONオブジェクトではありません".into()))?;

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Parse(format!("必須フィールドがありません: {}", missing.join(", "))));
    }

    serde_json::from_value(value)
        .map_err(|e| Error::Parse(format!("スキーマ不一致: {}", e)))
}
