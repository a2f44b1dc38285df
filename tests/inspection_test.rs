//! 点検セッションの統合テスト
//!
//! モックの解析ゲートウェイとファイル保存の履歴で、点検の一連の流れを検証

use async_trait::async_trait;
use safescan::storage::FileBackend;
use safescan_common::{
    apply, AnalysisError, AnalysisGateway, AppState, Event, HistoryBackend, HistoryStore,
    InspectionSession, JobCategory, Phase, PpeItem, PpeStatus, SafetyAnalysis, SequentialStamps,
    Verdict, MAX_HISTORY,
};
use std::cell::Cell;
use tempfile::tempdir;

const IMAGE_X: &str = "data:image/jpeg;base64,/9j/AAAA";

fn analysis(score: f64, verdict: Verdict) -> SafetyAnalysis {
    SafetyAnalysis {
        worker_detected: true,
        job_context: "Soldador em bancada".to_string(),
        identified_ppe: vec![PpeItem {
            name: "Máscara de solda".to_string(),
            status: PpeStatus::Present,
            observation: "Lente escurecida adequada".to_string(),
            location: Some(vec![100.0, 400.0, 300.0, 600.0]),
        }],
        missing_critical_ppe: vec![],
        compliance_score: score,
        relevant_nrs: vec!["NR-06".to_string()],
        final_verdict: verdict,
        recommendations: vec![],
    }
}

/// 固定の結果を返すゲートウェイ
struct MockGateway {
    result: Result<SafetyAnalysis, AnalysisError>,
    calls: Cell<usize>,
}

impl MockGateway {
    fn ok(score: f64, verdict: Verdict) -> Self {
        Self {
            result: Ok(analysis(score, verdict)),
            calls: Cell::new(0),
        }
    }

    fn failing(cause: &str) -> Self {
        Self {
            result: Err(AnalysisError::new(cause)),
            calls: Cell::new(0),
        }
    }
}

#[async_trait(?Send)]
impl AnalysisGateway for MockGateway {
    async fn analyze(&self, _image: &str, _job: JobCategory) -> Result<SafetyAnalysis, AnalysisError> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }
}

/// シナリオA: 溶接で92点・承認
#[tokio::test]
async fn test_scenario_successful_welding_inspection() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = FileBackend::in_dir(dir.path());
    let gateway = MockGateway::ok(92.0, Verdict::Approved);

    let mut session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
    session.capture(Some(IMAGE_X.to_string()));
    session.select_job(JobCategory::Welding);
    assert!(session.run_analysis().await);

    let state = session.state();
    assert_eq!(state.phase(), Phase::Completed);
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.result.as_ref().unwrap().compliance_score, 92.0);

    let record = &state.history.records()[0];
    assert_eq!(record.job_type, JobCategory::Welding);
    assert_eq!(record.image, IMAGE_X);

    let stored = std::fs::read_to_string(backend.path()).expect("履歴ファイルがない");
    assert!(stored.contains("\"jobType\":\"Soldagem e Corte\""), "保存形式: {}", stored);
    assert_eq!(gateway.calls.get(), 1);
}

/// シナリオB: ゲートウェイ失敗
#[tokio::test]
async fn test_scenario_gateway_failure() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = FileBackend::in_dir(dir.path());
    let gateway = MockGateway::failing("HTTP 500");

    let mut session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
    session.capture(Some(IMAGE_X.to_string()));
    assert!(session.run_analysis().await);

    let state = session.state();
    let error = state.error.as_deref().expect("エラーが設定されていない");
    assert!(!error.is_empty());
    assert!(!error.contains("HTTP 500"), "内部原因が利用者に見えている");
    assert!(state.result.is_none());
    assert!(!state.is_analyzing);
    assert!(state.history.is_empty());
    assert_eq!(state.current_image.as_deref(), Some(IMAGE_X), "再試行できるよう画像は残す");
    assert!(!backend.path().exists(), "失敗時に保存されている");
}

/// シナリオC: 51回成功すると最古の1件が消える
#[tokio::test]
async fn test_scenario_history_cap() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = FileBackend::in_dir(dir.path());
    let gateway = MockGateway::ok(80.0, Verdict::Restricted);

    let mut session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
    session.capture(Some(IMAGE_X.to_string()));
    for _ in 0..51 {
        assert!(session.run_analysis().await);
    }

    let records = session.state().history.records();
    assert_eq!(records.len(), MAX_HISTORY);
    assert_eq!(records[0].id, "REC0050", "先頭が最新ではない");
    assert_eq!(records[49].id, "REC0001");
    assert!(records.iter().all(|r| r.id != "REC0000"), "最古の記録が残っている");

    // 保存内容も上限どおり
    let reloaded = HistoryStore::load(&backend);
    assert_eq!(reloaded.len(), MAX_HISTORY);
}

/// シナリオD: 存在しないIDの削除
#[tokio::test]
async fn test_scenario_delete_unknown_id() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = FileBackend::in_dir(dir.path());
    let gateway = MockGateway::ok(95.0, Verdict::Approved);

    let mut session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
    session.capture(Some(IMAGE_X.to_string()));
    session.run_analysis().await;
    let before = session.state().history.clone();
    let stored_before = std::fs::read_to_string(backend.path()).unwrap();

    session.delete_history_record("NAO-EXISTE");

    assert_eq!(session.state().history, before);
    assert_eq!(std::fs::read_to_string(backend.path()).unwrap(), stored_before);
}

/// 解析中の二重開始は無視される
#[test]
fn test_single_flight_guard() {
    let staged = apply(&AppState::default(), Event::Capture(Some(IMAGE_X.to_string()))).state;

    let first = apply(&staged, Event::StartAnalysis);
    assert_eq!(first.effects.len(), 1);
    assert!(first.state.is_analyzing);

    let second = apply(&first.state, Event::StartAnalysis);
    assert!(second.effects.is_empty(), "ゲートウェイが二重に呼ばれる");
    assert!(second.is_noop(&first.state));
}

/// 画像なしの解析開始は何もしない
#[tokio::test]
async fn test_analysis_without_image_is_noop() {
    let dir = tempdir().expect("Failed to create temp dir");
    let gateway = MockGateway::ok(95.0, Verdict::Approved);

    let mut session =
        InspectionSession::open(&gateway, FileBackend::in_dir(dir.path()), SequentialStamps::new());
    session.capture(None);
    assert!(!session.run_analysis().await);
    assert_eq!(gateway.calls.get(), 0);
    assert_eq!(session.state().phase(), Phase::Idle);
    assert!(session.state().error.is_none());
}

/// 空の履歴の全削除はエラーにならない
#[tokio::test]
async fn test_idempotent_clear() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = FileBackend::in_dir(dir.path());
    let gateway = MockGateway::ok(95.0, Verdict::Approved);

    let mut session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
    session.clear_history();
    session.clear_history();

    assert!(session.state().history.is_empty());
    assert!(HistoryStore::load(&backend).is_empty());
}

/// 履歴の記録を開くと画像・結果・作業区分が戻る
#[tokio::test]
async fn test_round_trip_restore() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = FileBackend::in_dir(dir.path());
    let gateway = MockGateway::ok(70.0, Verdict::Restricted);

    let mut session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
    session.capture(Some(IMAGE_X.to_string()));
    session.select_job(JobCategory::Chemical);
    session.run_analysis().await;

    session.reset();
    session.capture(Some("data:image/png;base64,iVBO".to_string()));
    session.select_job(JobCategory::Heights);
    session.run_analysis().await;

    let history_before = session.state().history.clone();
    let target = history_before.records()[1].clone();

    session.toggle_view();
    session.select_history_record(&target.id);

    let state = session.state();
    assert_eq!(state.current_image.as_deref(), Some(target.image.as_str()));
    assert_eq!(state.result.as_ref(), Some(&target.analysis));
    assert_eq!(state.selected_job, JobCategory::Chemical);
    assert_eq!(state.history, history_before, "履歴が変化している");
}

/// 壊れた保存データからは空の履歴で起動する
#[test]
fn test_corrupt_store_resilience() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = FileBackend::in_dir(dir.path());
    backend.write("{not valid json").expect("書き込み失敗");

    let gateway = MockGateway::ok(95.0, Verdict::Approved);
    let session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
    assert!(session.state().history.is_empty());
}

/// 別セッションで履歴が復元される
#[tokio::test]
async fn test_history_survives_restart() {
    let dir = tempdir().expect("Failed to create temp dir");
    let backend = FileBackend::in_dir(dir.path());
    let gateway = MockGateway::ok(88.5, Verdict::Restricted);

    {
        let mut session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
        session.capture(Some(IMAGE_X.to_string()));
        session.run_analysis().await;
    }

    let session = InspectionSession::open(&gateway, &backend, SequentialStamps::new());
    let records = session.state().history.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].analysis.score_label(), "88.5%");
    assert!(session.state().result.is_none(), "起動時に結果が復元されている");
}
