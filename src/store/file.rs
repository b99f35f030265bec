//! File-Backed Result Store
//!
//! One JSON record per line, appended and synced before the record becomes
//! visible to readers. The whole log is replayed into memory on open.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::core::clock::Clock;
use crate::core::record::{GameType, NewResult, RecordId, ResultRecord};
use crate::core::window::Window;
use crate::store::memory::RecordLog;
use crate::store::{ResultStore, StoreError};

struct FileInner {
    log: RecordLog,
    file: File,
    /// Length of the file up to the last fully synced record.
    committed: u64,
}

impl FileInner {
    /// Append one line and sync it. On failure the file is cut back to the
    /// last committed length so a torn write never precedes a later record.
    async fn append(&mut self, line: &[u8]) -> std::io::Result<()> {
        if let Err(e) = self.write_synced(line).await {
            if let Err(rollback) = self.file.set_len(self.committed).await {
                warn!("Failed to roll back torn append: {}", rollback);
            }
            return Err(e);
        }
        self.committed += line.len() as u64;
        Ok(())
    }

    async fn write_synced(&mut self, line: &[u8]) -> std::io::Result<()> {
        // A previous rollback may itself have failed.
        if self.file.metadata().await?.len() != self.committed {
            warn!("Result log longer than committed length, truncating to {}", self.committed);
            self.file.set_len(self.committed).await?;
        }
        self.file.write_all(line).await?;
        self.file.flush().await?;
        self.file.sync_data().await
    }
}

/// Durable append-only result store.
pub struct FileStore {
    path: PathBuf,
    inner: RwLock<FileInner>,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    /// Open (or create) a result log and replay it.
    ///
    /// An unterminated last line that fails to decode is a torn write and is
    /// cut off. Any other undecodable line is an error.
    pub async fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let (body, tail) = split_unterminated_tail(&content);

        let mut log = RecordLog::new();
        for (idx, line) in body.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: ResultRecord = serde_json::from_str(line)
                .map_err(|source| StoreError::Corrupt { line: idx + 1, source })?;
            if !log.push(record) {
                warn!("Duplicate record id at line {} of {}", idx + 1, path.display());
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        if let Some(tail) = tail {
            match serde_json::from_str::<ResultRecord>(tail) {
                Ok(record) => {
                    log.push(record);
                    file.write_all(b"\n").await?;
                    file.flush().await?;
                }
                Err(e) => {
                    warn!("Dropping torn tail of {}: {}", path.display(), e);
                    file.set_len(body.len() as u64).await?;
                }
            }
        }

        let committed = file.metadata().await?.len();
        info!("Opened result log {} ({} records)", path.display(), log.len());

        Ok(Self {
            path,
            inner: RwLock::new(FileInner { log, file, committed }),
            clock,
        })
    }

    /// Location of the log on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.inner.read().await.log.len()
    }

    /// Check if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Split content into newline-terminated lines and an unterminated remainder.
fn split_unterminated_tail(content: &str) -> (&str, Option<&str>) {
    if content.is_empty() || content.ends_with('\n') {
        return (content, None);
    }
    match content.rfind('\n') {
        Some(idx) => (&content[..=idx], Some(&content[idx + 1..])),
        None => ("", Some(content)),
    }
}

#[async_trait]
impl ResultStore for FileStore {
    async fn fetch_records(
        &self,
        game_type: GameType,
        window: Option<Window>,
    ) -> Result<Vec<ResultRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.log.matching(game_type, window.as_ref()))
    }

    async fn insert_record(&self, result: NewResult) -> Result<ResultRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = result.into_record(inner.log.fresh_id(), self.clock.now());

        let mut line = serde_json::to_vec(&record).map_err(StoreError::Encode)?;
        line.push(b'\n');

        // Durable first, visible second.
        inner.append(&line).await?;
        inner.log.push(record.clone());
        Ok(record)
    }

    async fn find_record(&self, id: RecordId) -> Result<Option<ResultRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.log.find(&id).cloned())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
