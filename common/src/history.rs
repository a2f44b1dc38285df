//! 点検履歴ストア
//!
//! 新しい順に最大 [`MAX_HISTORY`] 件を保持する。
//! 永続化先は単一スロットの [`HistoryBackend`] に委譲し、
//! 変更のたびに全件を書き出す。

use crate::error::{Error, Result};
use crate::types::InspectionRecord;
use std::cell::{Cell, RefCell};
use tracing::{debug, warn};

/// 履歴の上限件数
pub const MAX_HISTORY: usize = 50;

/// 履歴の永続化先（名前付きの単一スロット）
pub trait HistoryBackend {
    /// 保存済みの内容。未保存ならNone
    fn read(&self) -> Result<Option<String>>;

    /// スロット全体を上書き
    fn write(&self, contents: &str) -> Result<()>;
}

/// 点検履歴（新しい順）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStore {
    records: Vec<InspectionRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存の記録列から生成（上限を超えた分は切り捨て）
    pub fn from_records(mut records: Vec<InspectionRecord>) -> Self {
        records.truncate(MAX_HISTORY);
        Self { records }
    }

    /// 永続化先から読み込み
    ///
    /// 未保存・読み込み失敗・破損データはすべて空の履歴として扱う
    pub fn load(backend: &impl HistoryBackend) -> Self {
        let contents = match backend.read() {
            Ok(Some(contents)) => contents,
            Ok(None) => return Self::default(),
            Err(e) => {
                warn!("履歴の読み込みに失敗、空で開始します: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Vec<InspectionRecord>>(&contents) {
            Ok(records) => {
                debug!("履歴を読み込み: {}件", records.len());
                Self::from_records(records)
            }
            Err(e) => {
                warn!("履歴データが破損しています、空で開始します: {}", e);
                Self::default()
            }
        }
    }

    /// 全件を書き出し
    pub fn persist(&self, backend: &impl HistoryBackend) -> Result<()> {
        let json = serde_json::to_string(&self.records)?;
        backend.write(&json)
    }

    /// 先頭に追加し、上限件数に切り詰める
    pub fn prepend(&mut self, record: InspectionRecord) {
        self.records.insert(0, record);
        self.records.truncate(MAX_HISTORY);
    }

    /// IDが一致する記録を削除。削除したらtrue
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    /// 全件削除（空でも可）
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn get(&self, id: &str) -> Option<&InspectionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[InspectionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// メモリ上のスロット（テスト・ドライラン用）
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: RefCell<Option<String>>,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 初期内容を持つスロット
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let backend = Self::default();
        backend.slot.replace(Some(contents.into()));
        backend
    }

    /// 書き込み回数
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// 以降の書き込みを失敗させる
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl HistoryBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.slot.borrow().clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::Storage("書き込みが無効化されています".into()));
        }
        self.writes.set(self.writes.get() + 1);
        self.slot.replace(Some(contents.to_string()));
        Ok(())
    }
}

impl<B: HistoryBackend + ?Sized> HistoryBackend for &B {
    fn read(&self) -> Result<Option<String>> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<()> {
        (**self).write(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobCategory;
    use crate::types::fixtures::analysis;
    use crate::types::Verdict;

    fn record(id: &str) -> InspectionRecord {
        InspectionRecord {
            id: id.to_string(),
            timestamp: "17/10/2026, 09:30:00".to_string(),
            image: "data:image/jpeg;base64,AAAA".to_string(),
            analysis: analysis(80.0, Verdict::Restricted),
            job_type: JobCategory::Construction,
        }
    }

    #[test]
    fn test_prepend_keeps_newest_first() {
        let mut store = HistoryStore::new();
        store.prepend(record("A"));
        store.prepend(record("B"));
        let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_prepend_caps_at_max() {
        let mut store = HistoryStore::new();
        for i in 0..(MAX_HISTORY + 5) {
            store.prepend(record(&format!("R{}", i)));
        }
        assert_eq!(store.len(), MAX_HISTORY);
        assert_eq!(store.records()[0].id, format!("R{}", MAX_HISTORY + 4));
        assert_eq!(store.records()[MAX_HISTORY - 1].id, "R5");
        assert!(store.get("R4").is_none());
    }

    #[test]
    fn test_remove_existing_and_missing() {
        let mut store = HistoryStore::from_records(vec![record("A"), record("B")]);
        assert!(store.remove("A"));
        assert_eq!(store.len(), 1);
        assert!(!store.remove("ZZZ"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = HistoryStore::from_records(vec![record("A")]);
        store.clear();
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_absent_slot_is_empty() {
        let backend = MemoryBackend::new();
        assert!(HistoryStore::load(&backend).is_empty());
    }

    #[test]
    fn test_load_corrupt_slot_is_empty() {
        let backend = MemoryBackend::with_contents("{ not json ]");
        assert!(HistoryStore::load(&backend).is_empty());

        let backend = MemoryBackend::with_contents(r#"[{"id": 1}]"#);
        assert!(HistoryStore::load(&backend).is_empty());
    }

    #[test]
    fn test_load_truncates_oversized_slot() {
        let records: Vec<InspectionRecord> =
            (0..60).map(|i| record(&format!("R{}", i))).collect();
        let backend = MemoryBackend::with_contents(serde_json::to_string(&records).unwrap());
        let store = HistoryStore::load(&backend);
        assert_eq!(store.len(), MAX_HISTORY);
        assert_eq!(store.records()[0].id, "R0");
    }

    #[test]
    fn test_persist_then_load() {
        let backend = MemoryBackend::new();
        let mut store = HistoryStore::new();
        store.prepend(record("A"));
        store.prepend(record("B"));
        store.persist(&backend).expect("保存失敗");

        assert_eq!(backend.write_count(), 1);
        assert_eq!(HistoryStore::load(&backend), store);
    }

    #[test]
    fn test_persist_surfaces_backend_error() {
        let backend = MemoryBackend::new();
        backend.fail_writes(true);
        let err = HistoryStore::new().persist(&backend).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(backend.write_count(), 0);
    }
}
