//! In-Memory Result Store
//!
//! Keeps the record log in process memory behind a tokio RwLock.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::clock::Clock;
use crate::core::record::{GameType, NewResult, RecordId, ResultRecord};
use crate::core::window::Window;
use crate::store::{ResultStore, StoreError};

/// Append-only record log with an id index.
///
/// Shared by the in-memory and file stores.
#[derive(Debug, Default)]
pub(crate) struct RecordLog {
    records: Vec<ResultRecord>,
    by_id: BTreeMap<RecordId, usize>,
}

impl RecordLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a record. Returns false if its id is already taken.
    pub(crate) fn push(&mut self, record: ResultRecord) -> bool {
        if self.by_id.contains_key(&record.id) {
            return false;
        }
        self.by_id.insert(record.id, self.records.len());
        self.records.push(record);
        true
    }

    /// Draw a fresh id not present in the log.
    pub(crate) fn fresh_id(&self) -> RecordId {
        loop {
            let id = RecordId::generate();
            if !self.by_id.contains_key(&id) {
                return id;
            }
        }
    }

    pub(crate) fn matching(&self, game_type: GameType, window: Option<&Window>) -> Vec<ResultRecord> {
        self.records
            .iter()
            .filter(|r| r.game_type == game_type)
            .filter(|r| window.map_or(true, |w| w.contains(r.created_at)))
            .cloned()
            .collect()
    }

    pub(crate) fn find(&self, id: &RecordId) -> Option<&ResultRecord> {
        self.by_id.get(id).map(|&idx| &self.records[idx])
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// Process-local result store.
pub struct MemoryStore {
    log: RwLock<RecordLog>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            log: RwLock::new(RecordLog::new()),
            clock,
        }
    }

    /// Create a store pre-loaded with records. Duplicate ids are dropped.
    pub fn with_records(records: impl IntoIterator<Item = ResultRecord>, clock: Arc<dyn Clock>) -> Self {
        let mut log = RecordLog::new();
        for record in records {
            log.push(record);
        }
        Self {
            log: RwLock::new(log),
            clock,
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    /// Check if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn fetch_records(
        &self,
        game_type: GameType,
        window: Option<Window>,
    ) -> Result<Vec<ResultRecord>, StoreError> {
        let log = self.log.read().await;
        Ok(log.matching(game_type, window.as_ref()))
    }

    async fn insert_record(&self, result: NewResult) -> Result<ResultRecord, StoreError> {
        let mut log = self.log.write().await;
        let record = result.into_record(log.fresh_id(), self.clock.now());
        log.push(record.clone());
        Ok(record)
    }

    async fn find_record(&self, id: RecordId) -> Result<Option<ResultRecord>, StoreError> {
        let log = self.log.read().await;
        Ok(log.find(&id).cloned())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::record::UserId;
    use chrono::{Duration, TimeZone, Utc};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 29, 0, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_time() {
        let clock = clock();
        let store = MemoryStore::new(clock.clone());

        let record = store
            .insert_record(NewResult::new("u1", GameType::SkyDrop, 100).with_play_time(30))
            .await
            .unwrap();

        assert_eq!(record.user_id, UserId::new("u1"));
        assert_eq!(record.score, 100);
        assert_eq!(record.play_time, Some(30));
        assert_eq!(record.created_at, clock.now());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = MemoryStore::new(clock());
        let mut ids = Vec::new();
        for i in 0..50 {
            let r = store
                .insert_record(NewResult::new("u", GameType::SkyDrop, i))
                .await
                .unwrap();
            ids.push(r.id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn test_fetch_filters_game_type_and_window() {
        let clock = clock();
        let store = MemoryStore::new(clock.clone());

        store.insert_record(NewResult::new("u1", GameType::SkyDrop, 1)).await.unwrap();
        clock.advance(Duration::hours(1));
        let inside = store.insert_record(NewResult::new("u2", GameType::SkyDrop, 2)).await.unwrap();
        store.insert_record(NewResult::new("u3", GameType::BlockTower, 3)).await.unwrap();

        let all = store.fetch_records(GameType::SkyDrop, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let window = Window::new(inside.created_at, inside.created_at + Duration::hours(1));
        let windowed = store.fetch_records(GameType::SkyDrop, Some(window)).await.unwrap();
        assert_eq!(windowed, vec![inside]);
    }

    #[tokio::test]
    async fn test_find_record() {
        let store = MemoryStore::new(clock());
        let record = store.insert_record(NewResult::new("u1", GameType::SkyDrop, 7)).await.unwrap();

        assert_eq!(store.find_record(record.id).await.unwrap(), Some(record));
        assert_eq!(store.find_record(RecordId::new([0; 16])).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_with_records_drops_duplicate_ids() {
        let clock = clock();
        let record = NewResult::new("u1", GameType::SkyDrop, 7).into_record(RecordId::new([1; 16]), clock.now());
        let store = MemoryStore::with_records(vec![record.clone(), record], clock);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts() {
        let store = Arc::new(MemoryStore::new(clock()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    for n in 0..25 {
                        store
                            .insert_record(NewResult::new(format!("u{}", i), GameType::SkyDrop, n))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 200);
        assert_eq!(store.fetch_records(GameType::SkyDrop, None).await.unwrap().len(), 200);
    }
}
