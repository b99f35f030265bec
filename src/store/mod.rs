//! Result Store
//!
//! Durable, append-only storage of result records. The ranking engine only
//! ever sees snapshots returned by `fetch_records`; every snapshot is taken
//! under a single read guard, so a record is visible all at once or not at all.
//!
//! - `memory`: process-local store
//! - `file`: JSON-lines log on disk, replayed on open

pub mod memory;
pub mod file;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::record::{GameType, NewResult, RecordId, ResultRecord};
use crate::core::window::Window;

pub use memory::MemoryStore;
pub use file::FileStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted line could not be decoded.
    #[error("corrupt result log at line {line}: {source}")]
    Corrupt {
        /// 1-based line number.
        line: usize,
        /// Decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be encoded for persistence.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Append-only result storage.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Snapshot of all records for `game_type`, restricted to `window` if given.
    async fn fetch_records(
        &self,
        game_type: GameType,
        window: Option<Window>,
    ) -> Result<Vec<ResultRecord>, StoreError>;

    /// Append a result. The store assigns `id` and `created_at`.
    async fn insert_record(&self, result: NewResult) -> Result<ResultRecord, StoreError>;

    /// Look up a single record.
    async fn find_record(&self, id: RecordId) -> Result<Option<ResultRecord>, StoreError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
