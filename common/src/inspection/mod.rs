//! 点検ステートマシン
//!
//! 遷移は純粋関数 `apply(&AppState, Event) -> Transition` で表す。
//! 副作用（ゲートウェイ呼び出し・履歴の永続化）は [`Effect`] として返し、
//! 実行は [`InspectionSession`] が受け持つ。
//!
//! ```text
//! Idle ──Capture──▶ Staged ──StartAnalysis──▶ Analyzing ──Succeeded──▶ Completed
//!  ▲                  │                           │                       │
//!  └──DiscardImage────┘                           └──Failed──▶ Failed     │
//!  ▲                                                                      │
//!  └──────────────────────────────Reset───────────────────────────────────┘
//! ```
//!
//! 解析中は Capture / Reset / DiscardImage / SelectJob / SelectHistoryRecord を受け付けない。

mod session;
mod state;

pub use session::{InspectionSession, SequentialStamps, StampSource};
pub use state::{AppState, Phase, View};

use crate::job::JobCategory;
use crate::types::{InspectionRecord, SafetyAnalysis};

/// 新しい記録に付与するIDと時刻（ドライバ側で生成）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStamp {
    pub id: String,
    pub timestamp: String,
}

/// ステートマシンへの入力
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// 画像の取り込み（Noneは無視）
    Capture(Option<String>),
    StartAnalysis,
    AnalysisSucceeded {
        analysis: SafetyAnalysis,
        stamp: RecordStamp,
    },
    /// 利用者向けメッセージ
    AnalysisFailed(String),
    Reset,
    DiscardImage,
    SelectJob(JobCategory),
    ToggleView,
    SelectHistoryRecord(String),
    DeleteHistoryRecord(String),
    ClearHistory,
}

/// 遷移に伴う副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// 解析ゲートウェイの呼び出し
    CallGateway { image: String, job: JobCategory },
    /// 履歴全件の書き出し
    Persist(Vec<InspectionRecord>),
}

/// 遷移結果
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }

    fn to(state: AppState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn persisting(state: AppState) -> Self {
        let snapshot = state.history.records().to_vec();
        Self {
            state,
            effects: vec![Effect::Persist(snapshot)],
        }
    }

    /// 状態が変わらず副作用もない遷移か
    pub fn is_noop(&self, previous: &AppState) -> bool {
        self.effects.is_empty() && self.state == *previous
    }
}

/// 状態遷移
pub fn apply(state: &AppState, event: Event) -> Transition {
    match event {
        Event::Capture(image) => match image {
            Some(image) if !state.is_analyzing => Transition::to(AppState {
                current_image: Some(image),
                result: None,
                error: None,
                ..state.clone()
            }),
            _ => Transition::unchanged(state),
        },

        Event::StartAnalysis => match &state.current_image {
            Some(image) if !state.is_analyzing => {
                let effect = Effect::CallGateway {
                    image: image.clone(),
                    job: state.selected_job,
                };
                Transition {
                    state: AppState {
                        is_analyzing: true,
                        error: None,
                        ..state.clone()
                    },
                    effects: vec![effect],
                }
            }
            _ => Transition::unchanged(state),
        },

        Event::AnalysisSucceeded { analysis, stamp } => {
            let image = match (&state.current_image, state.is_analyzing) {
                (Some(image), true) => image.clone(),
                _ => return Transition::unchanged(state),
            };

            let mut next = AppState {
                result: Some(analysis.clone()),
                is_analyzing: false,
                ..state.clone()
            };
            next.history.prepend(InspectionRecord {
                id: stamp.id,
                timestamp: stamp.timestamp,
                image,
                analysis,
                job_type: state.selected_job,
            });
            Transition::persisting(next)
        }

        Event::AnalysisFailed(message) => {
            if !state.is_analyzing {
                return Transition::unchanged(state);
            }
            Transition::to(AppState {
                error: Some(message),
                is_analyzing: false,
                result: None,
                ..state.clone()
            })
        }

        Event::Reset => {
            if state.phase() != Phase::Completed {
                return Transition::unchanged(state);
            }
            Transition::to(AppState {
                result: None,
                current_image: None,
                ..state.clone()
            })
        }

        Event::DiscardImage => {
            if state.phase() != Phase::Staged {
                return Transition::unchanged(state);
            }
            Transition::to(AppState {
                current_image: None,
                ..state.clone()
            })
        }

        Event::SelectJob(job) => {
            if state.is_analyzing {
                return Transition::unchanged(state);
            }
            Transition::to(AppState {
                selected_job: job,
                ..state.clone()
            })
        }

        Event::ToggleView => Transition::to(AppState {
            view: state.view.toggled(),
            ..state.clone()
        }),

        Event::SelectHistoryRecord(id) => {
            if state.is_analyzing {
                return Transition::unchanged(state);
            }
            match state.history.get(&id) {
                Some(record) => Transition::to(AppState {
                    view: View::Main,
                    current_image: Some(record.image.clone()),
                    result: Some(record.analysis.clone()),
                    selected_job: record.job_type,
                    error: None,
                    ..state.clone()
                }),
                None => Transition::unchanged(state),
            }
        }

        Event::DeleteHistoryRecord(id) => {
            let mut next = state.clone();
            if next.history.remove(&id) {
                Transition::persisting(next)
            } else {
                Transition::unchanged(state)
            }
        }

        Event::ClearHistory => {
            let mut next = state.clone();
            next.history.clear();
            Transition::persisting(next)
        }
    }
}
