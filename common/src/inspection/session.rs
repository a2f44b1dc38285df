//! ステートマシンのドライバ
//!
//! 遷移を適用し、返された副作用を実行する。
//! 解析ゲートウェイの失敗はここで捕捉し、汎用メッセージに変換する。

use super::{apply, AppState, Effect, Event, RecordStamp};
use crate::gateway::AnalysisGateway;
use crate::history::{HistoryBackend, HistoryStore};
use crate::job::JobCategory;
use crate::types::InspectionRecord;
use std::cell::Cell;
use tracing::{debug, info, warn};

/// 新しい記録のID・時刻の発行元
pub trait StampSource {
    fn next_stamp(&self) -> RecordStamp;
}

/// 連番で発行する決定的なスタンプ（テスト用）
#[derive(Debug, Default)]
pub struct SequentialStamps {
    next: Cell<u64>,
}

impl SequentialStamps {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StampSource for SequentialStamps {
    fn next_stamp(&self) -> RecordStamp {
        let n = self.next.get();
        self.next.set(n + 1);
        RecordStamp {
            id: format!("REC{:04}", n),
            timestamp: format!("01/01/2026, 00:00:{:02}", n % 60),
        }
    }
}

/// 点検セッション
pub struct InspectionSession<G, B, S> {
    state: AppState,
    gateway: G,
    backend: B,
    stamps: S,
}

impl<G, B, S> InspectionSession<G, B, S>
where
    G: AnalysisGateway,
    B: HistoryBackend,
    S: StampSource,
{
    /// 起動時に一度だけ履歴を読み込んでセッションを開く
    pub fn open(gateway: G, backend: B, stamps: S) -> Self {
        let history = HistoryStore::load(&backend);
        info!("セッション開始: 履歴{}件", history.len());
        Self {
            state: AppState::with_history(history),
            gateway,
            backend,
            stamps,
        }
    }

    /// 現在の状態（読み取り専用スナップショット）
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// イベントを適用して永続化を実行する
    ///
    /// ゲートウェイ呼び出しは実行せずに返す（[`Self::run_analysis`] が処理）
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let transition = apply(&self.state, event);
        self.state = transition.state;

        let mut pending = Vec::new();
        for effect in transition.effects {
            match effect {
                Effect::Persist(records) => self.persist(&records),
                call @ Effect::CallGateway { .. } => pending.push(call),
            }
        }
        pending
    }

    /// 解析を実行する
    ///
    /// 画像がない、または既に解析中の場合は何もせずfalseを返す
    pub async fn run_analysis(&mut self) -> bool {
        let call = self.dispatch(Event::StartAnalysis).into_iter().find_map(|effect| match effect {
            Effect::CallGateway { image, job } => Some((image, job)),
            Effect::Persist(_) => None,
        });

        let Some((image, job)) = call else {
            debug!("解析開始条件を満たさないためスキップ");
            return false;
        };

        info!("解析開始: {}", job);
        match self.gateway.analyze(&image, job).await {
            Ok(analysis) => {
                let stamp = self.stamps.next_stamp();
                info!(
                    "解析完了: id={} score={} verdict={}",
                    stamp.id, analysis.compliance_score, analysis.final_verdict
                );
                self.dispatch(Event::AnalysisSucceeded { analysis, stamp });
            }
            Err(err) => {
                warn!("解析失敗: {}", err.cause());
                self.dispatch(Event::AnalysisFailed(err.user_message().to_string()));
            }
        }
        true
    }

    pub fn capture(&mut self, image: Option<String>) {
        self.dispatch(Event::Capture(image));
    }

    pub fn select_job(&mut self, job: JobCategory) {
        self.dispatch(Event::SelectJob(job));
    }

    pub fn toggle_view(&mut self) {
        self.dispatch(Event::ToggleView);
    }

    pub fn reset(&mut self) {
        self.dispatch(Event::Reset);
    }

    pub fn discard_image(&mut self) {
        self.dispatch(Event::DiscardImage);
    }

    pub fn select_history_record(&mut self, id: &str) {
        self.dispatch(Event::SelectHistoryRecord(id.to_string()));
    }

    pub fn delete_history_record(&mut self, id: &str) {
        self.dispatch(Event::DeleteHistoryRecord(id.to_string()));
    }

    pub fn clear_history(&mut self) {
        self.dispatch(Event::ClearHistory);
    }

    /// 永続化の失敗は致命的ではない（メモリ上の履歴はそのまま）
    fn persist(&self, records: &[InspectionRecord]) {
        let result = serde_json::to_string(records)
            .map_err(crate::error::Error::from)
            .and_then(|json| self.backend.write(&json));
        match result {
            Ok(()) => debug!("履歴を保存: {}件", records.len()),
            Err(e) => warn!("履歴の保存に失敗: {}", e),
        }
    }
}
