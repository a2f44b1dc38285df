pub mod pdf;

use crate::cli::PdfQuality;
use crate::error::{Result, SafeScanError};
use crate::stamp::{now_label, now_millis};
use regex::Regex;
use safescan_common::export::report_core::report_file_name;
use safescan_common::{JobCategory, ReportDocument, ReportMeta, SafetyAnalysis};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 出力失敗時の通知文
pub const EXPORT_FAILED_MESSAGE: &str = "Erro ao gerar PDF. Tente novamente.";

/// ファイル名に使えない文字を `_` に置換
pub fn sanitize_file_name(name: &str) -> String {
    lazy_static::lazy_static! {
        static ref INVALID_RE: Regex = Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).unwrap();
    }
    INVALID_RE.replace_all(name, "_").into_owned()
}

/// 出力先がフォルダ（または拡張子なし）ならファイル名を付ける
fn output_path_for(output: &Path, file_name: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(file_name)
    } else {
        output.to_path_buf()
    }
}

/// 現在の解析結果から報告書スナップショットを作る
pub fn snapshot(
    analysis: &SafetyAnalysis,
    image: Option<&str>,
    job: JobCategory,
    protocol: &str,
    model: &str,
) -> ReportDocument {
    let meta = ReportMeta {
        protocol: protocol.to_string(),
        issued_at: now_label(),
        model: model.to_string(),
    };
    ReportDocument::build(analysis, image, job, meta)
}

/// 報告書PDFを書き出し、出力パスを返す
pub fn export_report(
    report: &ReportDocument,
    output: &Path,
    quality: PdfQuality,
    font: Option<&Path>,
) -> Result<PathBuf> {
    let file_name = sanitize_file_name(&report_file_name(&report.job_context, now_millis()));
    let output_path = output_path_for(output, &file_name);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    pdf::generate_report_pdf(report, &output_path, quality, font)?;
    info!("報告書出力: {}", output_path.display());
    Ok(output_path)
}

/// 報告書出力の設定
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// 出力フォルダまたはファイル
    pub output: PathBuf,
    pub quality: PdfQuality,
    pub font: Option<PathBuf>,
    /// 報告書に記載するモデル名
    pub model: String,
}

/// 出力中フラグ
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// 空いていれば立ててガードを返す。出力中ならNone
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(self.0.clone()))
    }
}

/// ドロップでフラグを下ろす
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 出力結果の一回限りの通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Failed(String),
}

impl ExportOutcome {
    pub fn notification(&self) -> String {
        match self {
            ExportOutcome::Saved(path) => format!("Laudo salvo: {}", path.display()),
            ExportOutcome::Failed(_) => EXPORT_FAILED_MESSAGE.to_string(),
        }
    }
}

/// バックグラウンドでの報告書出力（点検状態には触れない）
#[derive(Debug, Clone, Default)]
pub struct ExportJob {
    busy: BusyFlag,
}

impl ExportJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn busy(&self) -> &BusyFlag {
        &self.busy
    }

    /// 出力を実行。すでに出力中なら何もせずNone
    pub async fn run(
        &self,
        report: ReportDocument,
        output: PathBuf,
        quality: PdfQuality,
        font: Option<PathBuf>,
    ) -> Option<ExportOutcome> {
        let _guard = self.busy.try_acquire()?;

        let handle = tokio::task::spawn_blocking(move || {
            export_report(&report, &output, quality, font.as_deref())
        });

        let outcome = match handle.await {
            Ok(Ok(path)) => ExportOutcome::Saved(path),
            Ok(Err(e)) => {
                warn!("報告書出力エラー: {}", e);
                ExportOutcome::Failed(e.to_string())
            }
            Err(e) => {
                let err = SafeScanError::PdfGeneration(format!("出力タスク異常終了: {}", e));
                warn!("{}", err);
                ExportOutcome::Failed(err.to_string())
            }
        };
        Some(outcome)
    }
}
