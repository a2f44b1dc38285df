//! SafeScan
//!
//! EPI点検の対話CLI。解析は Gemini、履歴はローカルファイル、報告書はPDF。

pub mod analyzer;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod interactive;
pub mod logging;
pub mod render;
pub mod stamp;
pub mod storage;
