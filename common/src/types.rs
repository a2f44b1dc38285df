//! 解析結果の型定義
//!
//! CLIと共通ライブラリで共有される型:
//! - PpeItem: 個々のEPI判定
//! - SafetyAnalysis: 1回の点検の総合判定（AIの出力そのもの）
//! - InspectionRecord: 履歴に保存される点検記録

use crate::job::JobCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// EPIの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PpeStatus {
    /// 検出され正しく使用されている
    Present,
    /// 必須だが検出されない
    Missing,
    /// 検出されたが使用方法が不適切
    Incorrect,
}

/// 正規化バウンディングボックス（千分率、原点は左上）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub y_min: f64,
    pub x_min: f64,
    pub y_max: f64,
    pub x_max: f64,
}

impl BoundingBox {
    /// 座標の上限（千分率）
    pub const SCALE: f64 = 1000.0;

    /// `[ymin, xmin, ymax, xmax]` から生成。要素数が4でなければNone
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match components {
            [y_min, x_min, y_max, x_max] if components.iter().all(|v| v.is_finite()) => {
                Some(Self {
                    y_min: *y_min,
                    x_min: *x_min,
                    y_max: *y_max,
                    x_max: *x_max,
                })
            }
            _ => None,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// EPI 1件分の判定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpeItem {
    pub name: String,
    pub status: PpeStatus,
    pub observation: String,
    /// `[ymin, xmin, ymax, xmax]`（0〜1000）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<f64>>,
}

impl PpeItem {
    /// 位置情報。要素数が不正な場合は「枠なし」として扱う
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.location
            .as_deref()
            .and_then(BoundingBox::from_components)
    }
}

/// 最終判定
///
/// スキーマ上は3値だが、それ以外の値もそのまま `Unknown` として保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Approved,
    Restricted,
    Critical,
    Unknown(String),
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Approved => "approved",
            Verdict::Restricted => "restricted",
            Verdict::Critical => "critical",
            Verdict::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Verdict::Unknown(_))
    }
}

impl From<String> for Verdict {
    fn from(value: String) -> Self {
        match value.as_str() {
            "approved" => Verdict::Approved,
            "restricted" => Verdict::Restricted,
            "critical" => Verdict::Critical,
            _ => Verdict::Unknown(value),
        }
    }
}

impl From<Verdict> for String {
    fn from(value: Verdict) -> Self {
        match value {
            Verdict::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AIによる安全点検結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAnalysis {
    pub worker_detected: bool,
    pub job_context: String,
    #[serde(rename = "identifiedPPE")]
    pub identified_ppe: Vec<PpeItem>,
    #[serde(rename = "missingCriticalPPE")]
    pub missing_critical_ppe: Vec<String>,
    pub compliance_score: f64,
    #[serde(rename = "relevantNRs")]
    pub relevant_nrs: Vec<String>,
    pub final_verdict: Verdict,
    pub recommendations: Vec<String>,
}

impl SafetyAnalysis {
    /// 0〜100に丸めたスコア（AI出力値そのものは保持する）
    pub fn clamped_score(&self) -> f64 {
        if self.compliance_score.is_nan() {
            return 0.0;
        }
        self.compliance_score.clamp(0.0, 100.0)
    }

    /// 表示用スコア文字列（整数なら小数点なし）
    pub fn score_label(&self) -> String {
        let score = self.clamped_score();
        if score.fract() == 0.0 {
            format!("{}%", score as i64)
        } else {
            format!("{:.1}%", score)
        }
    }

    /// 状態ごとの件数 (present, missing, incorrect)
    pub fn status_counts(&self) -> (usize, usize, usize) {
        self.identified_ppe
            .iter()
            .fold((0, 0, 0), |(p, m, i), item| match item.status {
                PpeStatus::Present => (p + 1, m, i),
                PpeStatus::Missing => (p, m + 1, i),
                PpeStatus::Incorrect => (p, m, i + 1),
            })
    }
}

/// 履歴に保存される点検記録（作成後は不変）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    /// 短いランダムID（衝突は許容）
    pub id: String,
    /// 作成時のローカル時刻（表示専用、ソート不可）
    pub timestamp: String,
    /// 解析に使ったData URL
    pub image: String,
    pub analysis: SafetyAnalysis,
    pub job_type: JobCategory,
}
