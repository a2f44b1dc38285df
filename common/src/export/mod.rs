//! 報告書の共通モデル（CLIのPDF描画から利用）

pub mod report_core;
