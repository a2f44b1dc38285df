//! 対話式点検セッション
//!
//! メニューから各遷移を実行する。表示は render、状態変更はすべて
//! InspectionSession 経由で行う。

use crate::capture::load_image;
use crate::error::Result;
use crate::export::{snapshot, ExportJob, ExportOptions};
use crate::render::{render_history, render_history_row, render_result, render_state};
use crate::stamp::short_id;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use safescan_common::{
    AnalysisGateway, HistoryBackend, InspectionSession, JobCategory, Phase, StampSource, View,
};
use std::time::Duration;
use tracing::debug;

/// 解析中に順番に表示する進捗文
pub const LOADING_STEPS: [&str; 5] = [
    "Digitalizando Ambiente...",
    "Localizando Trabalhador...",
    "Consultando NR-06...",
    "Avaliando Integridade...",
    "Gerando Parecer Técnico...",
];

/// メニュー項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Capture,
    SelectJob,
    Analyze,
    Discard,
    ShowResult,
    Export,
    NewInspection,
    ShowHistory,
    OpenRecord,
    DeleteRecord,
    ClearHistory,
    BackToMain,
    Quit,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Capture => "Capturar imagem",
            MenuAction::SelectJob => "Selecionar atividade",
            MenuAction::Analyze => "Executar auditoria técnica",
            MenuAction::Discard => "Descartar imagem",
            MenuAction::ShowResult => "Ver parecer",
            MenuAction::Export => "Exportar laudo PDF",
            MenuAction::NewInspection => "Nova inspeção",
            MenuAction::ShowHistory => "Histórico",
            MenuAction::OpenRecord => "Abrir registro",
            MenuAction::DeleteRecord => "Excluir registro",
            MenuAction::ClearHistory => "Limpar histórico",
            MenuAction::BackToMain => "Voltar",
            MenuAction::Quit => "Sair",
        }
    }
}

/// 状態に応じて選べる操作
pub fn menu_for(state: &safescan_common::AppState) -> Vec<MenuAction> {
    use MenuAction::*;

    if state.view == View::History {
        let mut actions = Vec::new();
        if !state.history.is_empty() {
            actions.extend([OpenRecord, DeleteRecord, ClearHistory]);
        }
        actions.extend([BackToMain, Quit]);
        return actions;
    }

    match state.phase() {
        Phase::Idle => vec![Capture, SelectJob, ShowHistory, Quit],
        Phase::Staged => vec![Analyze, Capture, SelectJob, Discard, ShowHistory, Quit],
        Phase::Failed => vec![Analyze, Capture, SelectJob, ShowHistory, Quit],
        Phase::Completed => vec![ShowResult, Export, NewInspection, ShowHistory, Quit],
        // 解析中はメニューを出さない
        Phase::Analyzing => vec![Quit],
    }
}

/// スピナーと進捗文を出しながら解析を待つ
pub async fn analyze_with_progress<G, B, S>(session: &mut InspectionSession<G, B, S>) -> bool
where
    G: AnalysisGateway,
    B: HistoryBackend,
    S: StampSource,
{
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(LOADING_STEPS[0]);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let analysis = session.run_analysis();
    tokio::pin!(analysis);
    let mut ticker = tokio::time::interval(Duration::from_millis(1500));
    ticker.tick().await;
    let mut step = 1;

    let started = loop {
        tokio::select! {
            started = &mut analysis => break started,
            _ = ticker.tick() => {
                spinner.set_message(LOADING_STEPS[step % LOADING_STEPS.len()]);
                step += 1;
            }
        }
    };

    spinner.finish_and_clear();
    started
}

fn choose_job(current: JobCategory) -> Result<JobCategory> {
    let labels: Vec<&str> = JobCategory::ALL.iter().map(|j| j.label()).collect();
    let default = JobCategory::ALL.iter().position(|j| *j == current).unwrap_or(0);
    let index = Select::new()
        .with_prompt("Atividade")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(JobCategory::ALL[index])
}

fn choose_record<G, B, S>(session: &InspectionSession<G, B, S>, prompt: &str) -> Result<Option<String>>
where
    G: AnalysisGateway,
    B: HistoryBackend,
    S: StampSource,
{
    let records = session.state().history.records();
    if records.is_empty() {
        return Ok(None);
    }
    let rows: Vec<String> = records.iter().map(render_history_row).collect();
    let index = Select::new()
        .with_prompt(prompt)
        .items(&rows)
        .default(0)
        .interact_opt()?;
    Ok(index.map(|i| records[i].id.clone()))
}

/// 現在の結果を報告書として出力
async fn export_current<G, B, S>(
    session: &InspectionSession<G, B, S>,
    job: &ExportJob,
    options: &ExportOptions,
) where
    G: AnalysisGateway,
    B: HistoryBackend,
    S: StampSource,
{
    let state = session.state();
    let Some(result) = &state.result else {
        return;
    };

    // 履歴にある結果なら記録IDを文書番号にする
    let protocol = state
        .history
        .records()
        .iter()
        .find(|r| Some(&r.image) == state.current_image.as_ref() && &r.analysis == result)
        .map(|r| r.id.clone())
        .unwrap_or_else(short_id);

    let report = snapshot(
        result,
        state.current_image.as_deref(),
        state.selected_job,
        &protocol,
        &options.model,
    );

    println!("- Gerando laudo PDF... (qualidade: {})", options.quality);
    match job
        .run(report, options.output.clone(), options.quality, options.font.clone())
        .await
    {
        Some(outcome) => println!("{}", outcome.notification()),
        None => debug!("出力中のため無視"),
    }
}

/// 対話セッションを実行
pub async fn run_session<G, B, S>(
    session: &mut InspectionSession<G, B, S>,
    options: &ExportOptions,
) -> Result<()>
where
    G: AnalysisGateway,
    B: HistoryBackend,
    S: StampSource,
{
    let export_job = ExportJob::new();

    loop {
        println!();
        print!("{}", render_state(session.state()));
        if session.state().view == View::History {
            print!("{}", render_history(session.state().history.records()));
        }

        let actions = menu_for(session.state());
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let index = Select::new()
            .with_prompt("Ação")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[index] {
            MenuAction::Capture => {
                let path: String = Input::new()
                    .with_prompt("Caminho da imagem")
                    .allow_empty(true)
                    .interact_text()?;
                let path = path.trim();
                if path.is_empty() {
                    session.capture(None);
                    continue;
                }
                match load_image(std::path::Path::new(path)) {
                    Ok(image) => session.capture(Some(image)),
                    Err(e) => println!("✗ {}", e),
                }
            }
            MenuAction::SelectJob => {
                let job = choose_job(session.state().selected_job)?;
                session.select_job(job);
            }
            MenuAction::Analyze => {
                analyze_with_progress(session).await;
                match (&session.state().result, &session.state().error) {
                    (Some(result), _) => print!("{}", render_result(result)),
                    (None, Some(error)) => println!("✗ {}", error),
                    _ => {}
                }
            }
            MenuAction::Discard => session.discard_image(),
            MenuAction::ShowResult => {
                if let Some(result) = &session.state().result {
                    print!("{}", render_result(result));
                }
            }
            MenuAction::Export => export_current(session, &export_job, options).await,
            MenuAction::NewInspection => session.reset(),
            MenuAction::ShowHistory | MenuAction::BackToMain => session.toggle_view(),
            MenuAction::OpenRecord => {
                if let Some(id) = choose_record(session, "Abrir registro")? {
                    session.select_history_record(&id);
                    if let Some(result) = &session.state().result {
                        print!("{}", render_result(result));
                    }
                }
            }
            MenuAction::DeleteRecord => {
                if let Some(id) = choose_record(session, "Excluir registro")? {
                    session.delete_history_record(&id);
                    println!("✔ Registro {} excluído", id);
                }
            }
            MenuAction::ClearHistory => {
                let confirmed = Confirm::new()
                    .with_prompt("Deseja apagar todo o histórico?")
                    .default(false)
                    .interact()?;
                if confirmed {
                    session.clear_history();
                    println!("✔ Histórico apagado");
                }
            }
            MenuAction::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use safescan_common::{AppState, HistoryStore};

    #[test]
    fn test_menu_idle() {
        let state = AppState::default();
        let menu = menu_for(&state);
        assert_eq!(menu[0], MenuAction::Capture);
        assert!(!menu.contains(&MenuAction::Analyze));
        assert!(menu.contains(&MenuAction::Quit));
    }

    #[test]
    fn test_menu_staged_offers_analysis_and_discard() {
        let state = AppState {
            current_image: Some("data:image/png;base64,AAAA".into()),
            ..Default::default()
        };
        let menu = menu_for(&state);
        assert_eq!(menu[0], MenuAction::Analyze);
        assert!(menu.contains(&MenuAction::Discard));
    }

    #[test]
    fn test_menu_failed_has_no_discard() {
        let state = AppState {
            current_image: Some("data:image/png;base64,AAAA".into()),
            error: Some("falha".into()),
            ..Default::default()
        };
        let menu = menu_for(&state);
        assert_eq!(menu[0], MenuAction::Analyze);
        assert!(!menu.contains(&MenuAction::Discard), "失敗状態では破棄できない");
    }

    #[test]
    fn test_menu_analyzing_only_quit() {
        let state = AppState {
            current_image: Some("data:image/png;base64,AAAA".into()),
            is_analyzing: true,
            ..Default::default()
        };
        assert_eq!(menu_for(&state), vec![MenuAction::Quit]);
    }

    #[test]
    fn test_menu_empty_history_view() {
        let state = AppState {
            view: View::History,
            ..AppState::with_history(HistoryStore::new())
        };
        assert_eq!(menu_for(&state), vec![MenuAction::BackToMain, MenuAction::Quit]);
    }

    #[test]
    fn test_loading_steps() {
        assert_eq!(LOADING_STEPS.len(), 5);
        assert!(LOADING_STEPS.iter().any(|s| s.contains("NR-06")));
    }
}
