//! SafeScan Common Library
//!
//! EPI点検の共通型・ステートマシン・履歴ストア。
//! ネットワークやファイルへのアクセスは持たず、境界はトレイトで受け取る。

pub mod types;
pub mod job;
pub mod layout;
pub mod error;
pub mod prompts;
pub mod parser;
pub mod history;
pub mod gateway;
pub mod inspection;
pub mod export;

pub use types::{BoundingBox, InspectionRecord, PpeItem, PpeStatus, SafetyAnalysis, Verdict};
pub use job::JobCategory;
pub use layout::ReportLayout;
pub use error::{Error, Result};
pub use prompts::{build_analysis_prompt, response_schema, ANALYSIS_SYSTEM_INSTRUCTION};
pub use parser::{extract_json, parse_analysis_response, split_data_url, to_data_url};
pub use history::{HistoryBackend, HistoryStore, MemoryBackend, MAX_HISTORY};
pub use gateway::{AnalysisError, AnalysisGateway, ANALYSIS_FAILED_MESSAGE};
pub use inspection::{
    apply, AppState, Effect, Event, InspectionSession, Phase, RecordStamp, SequentialStamps,
    StampSource, Transition, View,
};
pub use export::report_core::{ReportDocument, ReportMeta, Tone, VerdictDisplay};
