use anyhow::{bail, Context};
use clap::Parser;
use dialoguer::Confirm;
use safescan::analyzer::GeminiGateway;
use safescan::cli::{Cli, Commands, HistoryAction, PdfQuality};
use safescan::config::Config;
use safescan::error::SafeScanError;
use safescan::export::{snapshot, ExportJob, ExportOptions};
use safescan::stamp::ClockStamps;
use safescan::storage::FileBackend;
use safescan::{capture, interactive, logging, render};
use safescan_common::{HistoryStore, InspectionSession};
use std::path::PathBuf;

fn export_options(config: &Config, output: Option<PathBuf>, quality: PdfQuality) -> ExportOptions {
    ExportOptions {
        output: output.unwrap_or_else(|| PathBuf::from(".")),
        quality,
        font: config.report_font.clone(),
        model: config.model.clone(),
    }
}

fn history_backend(config: &Config) -> anyhow::Result<FileBackend> {
    let path = config.history_path().context("履歴の保存先を決定できません")?;
    Ok(FileBackend::new(path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);
    let config = Config::load().context("設定ファイルの読み込みに失敗")?;

    match cli.command {
        Commands::Inspect { image, job, export, output, pdf_quality } => {
            println!("🦺 safescan - EPI点検\n");

            println!("[1/3] 画像を読み込み中...");
            let data_url = capture::load_image(&image)
                .with_context(|| format!("画像を読み込めません: {}", image.display()))?;
            println!("✔ {} (~{} KB)\n", image.display(), capture::approx_size_kb(&data_url));

            let gateway = GeminiGateway::new(&config)?;
            let mut session =
                InspectionSession::open(gateway, history_backend(&config)?, ClockStamps);
            session.capture(Some(data_url));
            session.select_job(job);

            println!("[2/3] AI解析中... ({})", job.label());
            interactive::analyze_with_progress(&mut session).await;

            let state = session.state();
            let Some(result) = &state.result else {
                let message = state.error.clone().unwrap_or_default();
                bail!(message);
            };
            println!("{}", render::render_result(result));

            if export {
                println!("[3/3] 報告書を出力中...");
                let options = export_options(&config, output, pdf_quality);
                let protocol = state
                    .history
                    .records()
                    .first()
                    .map(|r| r.id.clone())
                    .unwrap_or_default();
                let report = snapshot(
                    result,
                    state.current_image.as_deref(),
                    state.selected_job,
                    &protocol,
                    &options.model,
                );
                if let Some(outcome) = ExportJob::new()
                    .run(report, options.output, options.quality, options.font)
                    .await
                {
                    println!("{}", outcome.notification());
                }
            }

            println!("\n✅ 点検完了");
        }

        Commands::Session { output, pdf_quality } => {
            let gateway = GeminiGateway::new(&config)?;
            let mut session =
                InspectionSession::open(gateway, history_backend(&config)?, ClockStamps);
            let options = export_options(&config, output, pdf_quality);

            println!("🦺 safescan - Sessão de inspeção ({})", config.model);
            interactive::run_session(&mut session, &options).await?;
        }

        Commands::History { action } => {
            let backend = history_backend(&config)?;
            let mut store = HistoryStore::load(&backend);

            match action {
                HistoryAction::List => print!("{}", render::render_history(store.records())),
                HistoryAction::Show { id } => {
                    let record = store
                        .get(&id)
                        .ok_or_else(|| SafeScanError::RecordNotFound(id.clone()))?;
                    println!("{} | {} | {}\n", record.id, record.timestamp, record.job_type);
                    print!("{}", render::render_result(&record.analysis));
                }
                HistoryAction::Delete { id } => {
                    if store.remove(&id) {
                        store.persist(&backend).context("履歴の保存に失敗")?;
                        println!("✔ 記録を削除しました: {}", id);
                    } else {
                        println!("記録が見つかりません: {}", id);
                    }
                }
                HistoryAction::Clear { yes } => {
                    let confirmed = yes
                        || Confirm::new()
                            .with_prompt(format!("履歴{}件をすべて削除しますか?", store.len()))
                            .default(false)
                            .interact()
                            .map_err(SafeScanError::from)?;
                    if confirmed {
                        store.clear();
                        store.persist(&backend).context("履歴の保存に失敗")?;
                        println!("✔ 履歴を削除しました");
                    }
                }
            }
        }

        Commands::Export { id, output, pdf_quality } => {
            println!("📄 safescan - 報告書出力\n");

            let store = HistoryStore::load(&history_backend(&config)?);
            let record = store
                .get(&id)
                .ok_or_else(|| SafeScanError::RecordNotFound(id.clone()))?;

            let options = export_options(&config, output, pdf_quality);
            let report = snapshot(
                &record.analysis,
                Some(&record.image),
                record.job_type,
                &record.id,
                &options.model,
            );

            println!("- PDFを生成中... (品質: {})", options.quality);
            if let Some(outcome) = ExportJob::new()
                .run(report, options.output, options.quality, options.font)
                .await
            {
                println!("{}", outcome.notification());
            }
        }

        Commands::Jobs => print!("{}", render::render_jobs()),

        Commands::Config { set_api_key, set_model, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(model) = set_model {
                config.set_model(model)?;
                println!("✔ モデルを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  APIエンドポイント: {}", config.api_base_url);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  温度: {}", config.temperature);
                match config.history_path() {
                    Ok(path) => println!("  履歴: {}", path.display()),
                    Err(e) => println!("  履歴: {}", e),
                }
                println!(
                    "  報告書フォント: {}",
                    config
                        .report_font
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "Helvetica（組み込み）".to_string())
                );
                println!(
                    "  APIキー: {}",
                    if config.get_api_key().is_ok() { "設定済み" } else { "未設定" }
                );
            }
        }
    }

    Ok(())
}
