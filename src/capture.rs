//! 画像の取り込み
//!
//! 画像ファイルを読み込み、解析・履歴で共通に使う Data URL に変換する。

use crate::error::{Result, SafeScanError};
use base64::{engine::general_purpose::STANDARD, Engine};
use safescan_common::{split_data_url, to_data_url};
use std::path::Path;

/// 対応形式（拡張子, MIMEタイプ）
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

/// 拡張子からMIMEタイプを判定
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// 画像ファイルを Data URL として読み込む
pub fn load_image(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(SafeScanError::FileNotFound(path.display().to_string()));
    }

    let mime = mime_for_path(path)
        .ok_or_else(|| SafeScanError::UnsupportedImage(path.display().to_string()))?;

    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(SafeScanError::ImageLoad(format!("空のファイル: {}", path.display())));
    }

    Ok(to_data_url(mime, &STANDARD.encode(&bytes)))
}

/// Data URL を (MIMEタイプ, バイト列) に戻す
pub fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let (mime, data) = split_data_url(data_url)
        .ok_or_else(|| SafeScanError::ImageLoad("Data URLの形式が不正です".into()))?;
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| SafeScanError::ImageLoad(format!("Base64デコードエラー: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

/// Data URL の概算サイズ（表示用、KB）
pub fn approx_size_kb(data_url: &str) -> usize {
    split_data_url(data_url)
        .map(|(_, data)| data.len() * 3 / 4 / 1024)
        .unwrap_or(0)
}
