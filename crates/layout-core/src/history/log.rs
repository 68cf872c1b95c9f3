//! Canonical history list implementations

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

use crate::db::{Database, LibSqlHistoryLogRepository};
use crate::error::Result;
use crate::models::HistoryEntry;

/// The authoritative, append-only list of history entries
#[allow(async_fn_in_trait)]
pub trait HistoryLog {
    /// Snapshot of every entry in append order
    async fn entries(&self) -> Result<Vec<HistoryEntry>>;

    /// Append one entry at the end
    async fn append(&self, entry: HistoryEntry) -> Result<()>;

    /// Number of entries
    async fn count(&self) -> Result<usize> {
        Ok(self.entries().await?.len())
    }
}

/// Canonical list held in process memory
#[derive(Debug, Default)]
pub struct MemoryHistoryLog {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl HistoryLog for MemoryHistoryLog {
    async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn append(&self, entry: HistoryEntry) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len())
    }
}

/// Canonical list persisted in the embedded database
#[derive(Clone)]
pub struct StoredHistoryLog {
    db: Arc<AsyncMutex<Database>>,
}

impl StoredHistoryLog {
    pub const fn new(db: Arc<AsyncMutex<Database>>) -> Self {
        Self { db }
    }
}

impl HistoryLog for StoredHistoryLog {
    async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        let db = self.db.lock().await;
        LibSqlHistoryLogRepository::new(db.connection()).list().await
    }

    async fn append(&self, entry: HistoryEntry) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlHistoryLogRepository::new(db.connection())
            .append(&entry)
            .await
    }

    async fn count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        LibSqlHistoryLogRepository::new(db.connection()).count().await
    }
}

/// Either canonical list, picked at startup depending on store availability
pub enum CanonicalHistory {
    Memory(MemoryHistoryLog),
    Stored(StoredHistoryLog),
}

impl CanonicalHistory {
    /// Durable when the database is available, session-only otherwise.
    pub fn for_database(db: Option<Arc<AsyncMutex<Database>>>) -> Self {
        match db {
            Some(db) => Self::Stored(StoredHistoryLog::new(db)),
            None => {
                tracing::warn!("Canonical history is not persisted for this session");
                Self::Memory(MemoryHistoryLog::new())
            }
        }
    }

    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::Stored(_))
    }
}

impl HistoryLog for CanonicalHistory {
    async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        match self {
            Self::Memory(log) => log.entries().await,
            Self::Stored(log) => log.entries().await,
        }
    }

    async fn append(&self, entry: HistoryEntry) -> Result<()> {
        match self {
            Self::Memory(log) => log.append(entry).await,
            Self::Stored(log) => log.append(entry).await,
        }
    }

    async fn count(&self) -> Result<usize> {
        match self {
            Self::Memory(log) => log.count().await,
            Self::Stored(log) => log.count().await,
        }
    }
}
