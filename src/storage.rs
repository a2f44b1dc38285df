//! 履歴スロットのファイル保存
//!
//! 名前付きの単一ファイルにJSON配列として全件を書き出す。
//! 書き込みは一時ファイル経由で置き換える。

use safescan_common::{Error as CommonError, HistoryBackend, Result as CommonResult};
use std::path::{Path, PathBuf};

/// スロット名
pub const HISTORY_SLOT: &str = "safescan_history.json";

/// ファイルを1つのスロットとして扱うバックエンド
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// フォルダ内の既定スロット
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(HISTORY_SLOT))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// スロットファイルを削除。存在しなければfalse
    pub fn remove(&self) -> CommonResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }
}

impl HistoryBackend for FileBackend {
    fn read(&self) -> CommonResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CommonError::Io(e)),
        }
    }

    fn write(&self, contents: &str) -> CommonResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            CommonError::Storage(format!("{} の置き換えに失敗: {}", self.path.display(), e))
        })
    }
}
