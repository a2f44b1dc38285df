//! Report export core shared by the CLI renderers and the PDF writer.
//!
//! 解析結果から、報告書1枚分の完全なスナップショット（ReportDocument）を組み立てる。
//! 描画側はこの値だけを見ればよい。

use crate::job::JobCategory;
use crate::types::{PpeItem, PpeStatus, SafetyAnalysis, Verdict};

pub const PRODUCT_NAME: &str = "SafeScan Pro Intelligence";
pub const PRODUCT_SUBTITLE: &str = "Inspeção de Segurança e Saúde no Trabalho";
pub const REPORT_TITLE: &str = "Laudo de Auditoria de EPI";
pub const REPORT_NORMS: &str = "Em conformidade com a Norma Regulamentadora NR-01 e NR-06";
pub const LEGAL_NOTE: &str = "Este laudo foi gerado eletronicamente e certifica o estado de conservação e uso dos equipamentos no ato da digitalização. Baseado na NR-06, o empregador deve fornecer gratuitamente EPIs adequados ao risco.";
pub const FOOTER_LEFT: &str = "SafeScan Intelligence - Documento Controlado";

/// 表示上の色分け
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Warning,
    Critical,
    Neutral,
}

impl Tone {
    /// 報告書で使うRGB（0.0〜1.0）
    pub fn rgb(&self) -> (f32, f32, f32) {
        match self {
            Tone::Good => (0.086, 0.502, 0.239),
            Tone::Warning => (0.706, 0.325, 0.035),
            Tone::Critical => (0.725, 0.110, 0.110),
            Tone::Neutral => (0.200, 0.255, 0.333),
        }
    }
}

/// 判定の表示（ラベル + 色）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictDisplay {
    pub label: &'static str,
    pub tone: Tone,
}

impl VerdictDisplay {
    pub fn of(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Approved => Self { label: "APROVADO", tone: Tone::Good },
            Verdict::Restricted => Self { label: "RESTRIÇÃO", tone: Tone::Warning },
            Verdict::Critical => Self { label: "INTERDITADO", tone: Tone::Critical },
            Verdict::Unknown(_) => Self { label: "EM ANÁLISE", tone: Tone::Neutral },
        }
    }
}

/// EPI状態のラベル
pub fn status_label(status: PpeStatus) -> &'static str {
    match status {
        PpeStatus::Present => "CONFORME",
        PpeStatus::Missing => "AUSENTE",
        PpeStatus::Incorrect => "IRREGULAR",
    }
}

pub fn status_tone(status: PpeStatus) -> Tone {
    match status {
        PpeStatus::Present => Tone::Good,
        PpeStatus::Missing => Tone::Critical,
        PpeStatus::Incorrect => Tone::Warning,
    }
}

/// 適合スコアの色分け（履歴一覧用）: 90以上 / 70以上 / それ未満
pub fn score_tone(score: f64) -> Tone {
    if score >= 90.0 {
        Tone::Good
    } else if score >= 70.0 {
        Tone::Warning
    } else {
        Tone::Critical
    }
}

/// 画像に対する百分率の矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// 画像上のマーカー
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub index: usize,
    pub name: String,
    pub status: PpeStatus,
    pub tone: Tone,
    pub rect: PercentRect,
}

/// 枠を持つ項目だけをマーカーに変換（不正な枠は描かない）
pub fn build_markers(items: &[PpeItem]) -> Vec<Marker> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let bbox = item.bounding_box()?;
            Some(Marker {
                index,
                name: item.name.clone(),
                status: item.status,
                tone: status_tone(item.status),
                rect: PercentRect {
                    top: bbox.y_min / 10.0,
                    left: bbox.x_min / 10.0,
                    width: bbox.width() / 10.0,
                    height: bbox.height() / 10.0,
                },
            })
        })
        .collect()
}

/// チェックリストの1行
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistRow {
    pub equipment: String,
    pub status_label: &'static str,
    pub tone: Tone,
    pub observation: String,
}

/// 署名欄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlock {
    pub caption: &'static str,
    pub role: &'static str,
    pub note: &'static str,
}

pub const SIGNATURES: [SignatureBlock; 2] = [
    SignatureBlock {
        caption: "Validado Eletronicamente",
        role: "Responsável Técnico",
        note: "Engenharia de Segurança do Trabalho",
    },
    SignatureBlock {
        caption: "",
        role: "Colaborador Ciente",
        note: "Confirmação de Recebimento de Auditoria",
    },
];

/// 報告書の発行情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    /// 文書プロトコル番号
    pub protocol: String,
    /// 発行日時（表示用）
    pub issued_at: String,
    /// 解析に使ったモデル名
    pub model: String,
}

/// 報告書スナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub meta: ReportMeta,
    pub job: JobCategory,
    pub job_context: String,
    pub worker_detected: bool,
    pub verdict: VerdictDisplay,
    pub score_label: String,
    pub score_tone: Tone,
    pub image: Option<String>,
    pub evidence_caption: String,
    pub markers: Vec<Marker>,
    pub checklist: Vec<ChecklistRow>,
    pub missing_critical: Vec<String>,
    pub relevant_nrs: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ReportDocument {
    pub fn build(
        analysis: &SafetyAnalysis,
        image: Option<&str>,
        job: JobCategory,
        meta: ReportMeta,
    ) -> Self {
        let checklist = analysis
            .identified_ppe
            .iter()
            .map(|item| ChecklistRow {
                equipment: item.name.clone(),
                status_label: status_label(item.status),
                tone: status_tone(item.status),
                observation: item.observation.clone(),
            })
            .collect();

        let evidence_caption = format!(
            "Digitalização via Visão Computacional {}",
            if meta.model.is_empty() { "Gemini" } else { meta.model.as_str() }
        );

        Self {
            job,
            job_context: analysis.job_context.clone(),
            worker_detected: analysis.worker_detected,
            verdict: VerdictDisplay::of(&analysis.final_verdict),
            score_label: analysis.score_label(),
            score_tone: score_tone(analysis.clamped_score()),
            image: image.map(str::to_string),
            evidence_caption,
            markers: build_markers(&analysis.identified_ppe),
            checklist,
            missing_critical: analysis.missing_critical_ppe.clone(),
            relevant_nrs: analysis.relevant_nrs.clone(),
            recommendations: analysis.recommendations.clone(),
            meta,
        }
    }

    /// 右下のフッター参照
    pub fn footer_reference(&self) -> String {
        format!("Ref: {}", self.meta.protocol)
    }
}

/// 出力ファイル名: `LAUDO_TECNICO_{状況先頭12文字}_{ミリ秒}.pdf`
pub fn report_file_name(job_context: &str, millis: i64) -> String {
    let fragment: String = job_context
        .chars()
        .take(12)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_uppercase();
    let fragment = if fragment.is_empty() { "DOCUMENTO".to_string() } else { fragment };
    format!("LAUDO_TECNICO_{}_{}.pdf", fragment, millis)
}
