use crate::error::{Result, SafeScanError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    /// 履歴スロットの保存先（省略時はデータディレクトリ）
    pub history_path: Option<PathBuf>,
    /// 報告書用TTFフォント（省略時は組み込みHelvetica）
    pub report_font: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeout_seconds: 120,
            temperature: 0.1,
            history_path: None,
            report_font: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SafeScanError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("safescan").join("config.json"))
    }

    /// 履歴スロットのパス
    pub fn history_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.history_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SafeScanError::Config("データディレクトリが見つかりません".into()))?;
        Ok(data_dir.join("safescan").join(crate::storage::HISTORY_SLOT))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        for var in ["GEMINI_API_KEY", "API_KEY"] {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    return Ok(key);
                }
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(SafeScanError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_model(&mut self, model: String) -> Result<()> {
        self.model = model;
        self.save()
    }
}
