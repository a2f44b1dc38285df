//! アプリケーション状態

use crate::history::HistoryStore;
use crate::job::JobCategory;
use crate::types::SafetyAnalysis;

/// 表示中の画面（解析状態とは独立）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Main,
    History,
}

impl View {
    pub fn toggled(self) -> Self {
        match self {
            View::Main => View::History,
            View::History => View::Main,
        }
    }
}

/// 状態フィールドから導出される段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 画像なし
    Idle,
    /// 画像あり・未解析
    Staged,
    /// 解析中
    Analyzing,
    /// 結果あり
    Completed,
    /// エラーあり・結果なし
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Staged => "staged",
            Phase::Analyzing => "analyzing",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        }
    }
}

/// 点検セッションの状態（遷移ごとに新しい値を作る）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub current_image: Option<String>,
    pub selected_job: JobCategory,
    pub is_analyzing: bool,
    pub result: Option<SafetyAnalysis>,
    pub error: Option<String>,
    pub view: View,
    pub history: HistoryStore,
}

impl AppState {
    /// 読み込み済みの履歴から初期状態を作る
    pub fn with_history(history: HistoryStore) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_analyzing {
            Phase::Analyzing
        } else if self.result.is_some() {
            Phase::Completed
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.current_image.is_some() {
            Phase::Staged
        } else {
            Phase::Idle
        }
    }

    /// 解析を開始できるか（画面側のボタン無効化にも使う）
    pub fn can_start_analysis(&self) -> bool {
        self.current_image.is_some() && !self.is_analyzing
    }
}
