//! 端末表示
//!
//! 状態から表示文字列を作る純粋関数のみ。出力は呼び出し側が行う。

use crate::capture::approx_size_kb;
use safescan_common::export::report_core::{score_tone, status_label, status_tone};
use safescan_common::{
    AppState, InspectionRecord, JobCategory, SafetyAnalysis, Tone, VerdictDisplay, View,
};
use std::fmt::Write;

fn tone_mark(tone: Tone) -> &'static str {
    match tone {
        Tone::Good => "[OK]",
        Tone::Warning => "[!!]",
        Tone::Critical => "[XX]",
        Tone::Neutral => "[..]",
    }
}

/// 解析結果の表示
pub fn render_result(analysis: &SafetyAnalysis) -> String {
    let mut out = String::new();
    let verdict = VerdictDisplay::of(&analysis.final_verdict);
    let score_mark = tone_mark(score_tone(analysis.clamped_score()));

    let _ = writeln!(out, "=== Parecer Técnico ===");
    let _ = writeln!(out, "{} {}", tone_mark(verdict.tone), verdict.label);
    if analysis.final_verdict.is_unknown() {
        let _ = writeln!(out, "    (veredito recebido: \"{}\")", analysis.final_verdict.as_str());
    }
    let _ = writeln!(out, "{} Conformidade: {}", score_mark, analysis.score_label());
    let _ = writeln!(out, "Contexto: {}", analysis.job_context);

    if !analysis.worker_detected {
        let _ = writeln!(out);
        let _ = writeln!(out, "!! Trabalhador não detectado");
        let _ = writeln!(
            out,
            "   Não foi possível identificar um trabalhador na imagem. Capture novamente."
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Equipamentos ({}):", analysis.identified_ppe.len());
    if analysis.identified_ppe.is_empty() {
        let _ = writeln!(out, "  (nenhum equipamento identificado)");
    }
    for (i, item) in analysis.identified_ppe.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {} {:<9} {}",
            i + 1,
            tone_mark(status_tone(item.status)),
            status_label(item.status),
            item.name
        );
        if !item.observation.is_empty() {
            let _ = writeln!(out, "        {}", item.observation);
        }
        if let Some(bbox) = item.bounding_box() {
            let _ = writeln!(
                out,
                "        caixa: [{:.0}, {:.0}, {:.0}, {:.0}]",
                bbox.y_min, bbox.x_min, bbox.y_max, bbox.x_max
            );
        }
    }

    if !analysis.missing_critical_ppe.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "EPIs críticos ausentes:");
        for item in &analysis.missing_critical_ppe {
            let _ = writeln!(out, "  - {}", item);
        }
    }

    if !analysis.relevant_nrs.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Normas: {}", analysis.relevant_nrs.join(", "));
    }

    if !analysis.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Recomendações:");
        for (i, rec) in analysis.recommendations.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, rec);
        }
    }

    out
}

/// 履歴一覧の1行
pub fn render_history_row(record: &InspectionRecord) -> String {
    let score = record.analysis.clamped_score();
    format!(
        "{} {}  {:<24} {:>6}  {}  ({} itens)",
        tone_mark(score_tone(score)),
        record.id,
        record.job_type.label(),
        record.analysis.score_label(),
        record.timestamp,
        record.analysis.identified_ppe.len()
    )
}

/// 履歴一覧
pub fn render_history(records: &[InspectionRecord]) -> String {
    if records.is_empty() {
        return "Nenhuma inspeção registrada.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Histórico de Inspeções ({}):", records.len());
    for record in records {
        let _ = writeln!(out, "{}", render_history_row(record));
    }
    out
}

/// 状態の要約
pub fn render_state(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Estado: {}  |  Atividade: {}  |  Vista: {}",
        state.phase().as_str(),
        state.selected_job.label(),
        match state.view {
            View::Main => "principal",
            View::History => "histórico",
        }
    );
    match &state.current_image {
        Some(image) => {
            let _ = writeln!(out, "Imagem: capturada (~{} KB)", approx_size_kb(image));
        }
        None => {
            let _ = writeln!(out, "Imagem: nenhuma");
        }
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "Erro: {}", error);
    }
    let _ = writeln!(out, "Histórico: {} registro(s)", state.history.len());
    out
}

/// 作業区分と確認項目の一覧
pub fn render_jobs() -> String {
    let mut out = String::new();
    for job in JobCategory::ALL {
        let _ = writeln!(out, "{:<13} {}", job.key(), job.label());
        let _ = writeln!(out, "              {}", job.requirements());
    }
    out
}
