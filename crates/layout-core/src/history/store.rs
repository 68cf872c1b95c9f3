//! Fail-soft local history store over the embedded database.
//!
//! Every operation degrades to `false`/empty when the database could not be
//! opened, so history logging never blocks the caller.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::db::{
    Database, HistoryRepository, LibSqlHistoryRepository, LibSqlMetadataRepository,
    MetadataRepository,
};
use crate::models::{IncomingEntry, LocalHistoryRecord, NewLocalRecord};
use crate::util::{iso_now, parse_iso_timestamp};

/// Durable per-device record of history entries
#[derive(Clone)]
pub struct LocalHistoryStore {
    db: Option<Arc<Mutex<Database>>>,
    device_id: String,
    last_local_timestamp: Arc<AtomicI64>,
}

impl LocalHistoryStore {
    /// Open or create the embedded database at `path`.
    ///
    /// Never fails: when the database cannot be opened the store is returned
    /// in its unavailable state.
    pub async fn init(path: impl AsRef<Path>, device_id: impl Into<String>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                tracing::warn!(
                    "History store directory {} unavailable: {}",
                    parent.display(),
                    error
                );
                return Self::unavailable(device_id);
            }
        }

        match Database::open(path).await {
            Ok(db) => {
                tracing::info!("History store opened at {}", path.display());
                Self::with_database(db, device_id)
            }
            Err(error) => {
                tracing::warn!(
                    "History store unavailable at {}: {}",
                    path.display(),
                    error
                );
                Self::unavailable(device_id)
            }
        }
    }

    /// In-memory store (primarily for tests).
    pub async fn open_in_memory(device_id: impl Into<String>) -> Self {
        match Database::open_in_memory().await {
            Ok(db) => Self::with_database(db, device_id),
            Err(error) => {
                tracing::warn!("In-memory history store unavailable: {}", error);
                Self::unavailable(device_id)
            }
        }
    }

    /// A store whose every operation is a no-op.
    pub fn unavailable(device_id: impl Into<String>) -> Self {
        Self {
            db: None,
            device_id: device_id.into(),
            last_local_timestamp: Arc::new(AtomicI64::new(0)),
        }
    }

    fn with_database(db: Database, device_id: impl Into<String>) -> Self {
        Self {
            db: Some(Arc::new(Mutex::new(db))),
            device_id: device_id.into(),
            last_local_timestamp: Arc::new(AtomicI64::new(0)),
        }
    }

    pub const fn is_available(&self) -> bool {
        self.db.is_some()
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Handle to the underlying database, shared with the canonical log.
    pub fn shared_database(&self) -> Option<Arc<Mutex<Database>>> {
        self.db.clone()
    }

    /// Persist one entry. Returns `false` on any failure.
    pub async fn save(&self, entry: &IncomingEntry) -> bool {
        let Some(db) = self.db.as_ref() else {
            return false;
        };

        let record = NewLocalRecord::from_incoming(
            entry,
            &self.device_id,
            self.next_local_timestamp(),
            &iso_now(),
        );

        let db = db.lock().await;
        let repo = LibSqlHistoryRepository::new(db.connection());
        match repo.insert(&record).await {
            Ok(id) => {
                tracing::debug!(
                    "Saved history record {} for machine {}",
                    id,
                    record
                        .machine_id
                        .as_ref()
                        .map_or_else(|| "-".to_string(), ToString::to_string)
                );
                true
            }
            Err(error) => {
                tracing::warn!("History store save failed: {}", error);
                false
            }
        }
    }

    /// Every record, newest `timestamp` first.
    pub async fn load_all(&self) -> Vec<LocalHistoryRecord> {
        let Some(db) = self.db.as_ref() else {
            return Vec::new();
        };

        let loaded = {
            let db = db.lock().await;
            let repo = LibSqlHistoryRepository::new(db.connection());
            repo.list_all().await
        };

        match loaded {
            Ok(mut records) => {
                sort_newest_first(&mut records);
                tracing::debug!("Loaded {} history records", records.len());
                records
            }
            Err(error) => {
                tracing::warn!("History store load failed: {}", error);
                Vec::new()
            }
        }
    }

    /// Number of stored records; zero when unavailable.
    pub async fn count(&self) -> usize {
        let Some(db) = self.db.as_ref() else {
            return 0;
        };
        let db = db.lock().await;
        let repo = LibSqlHistoryRepository::new(db.connection());
        repo.count().await.unwrap_or_else(|error| {
            tracing::warn!("History store count failed: {}", error);
            0
        })
    }

    /// Write a sync metadata value. Returns `false` on any failure.
    pub async fn set_metadata(&self, key: &str, value: &str) -> bool {
        let Some(db) = self.db.as_ref() else {
            return false;
        };
        let db = db.lock().await;
        let repo = LibSqlMetadataRepository::new(db.connection());
        match repo.set(key, value).await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!("Failed to write sync metadata '{}': {}", key, error);
                false
            }
        }
    }

    /// Read a sync metadata value.
    pub async fn metadata(&self, key: &str) -> Option<String> {
        let db = self.db.as_ref()?;
        let db = db.lock().await;
        let repo = LibSqlMetadataRepository::new(db.connection());
        repo.get(key).await.unwrap_or_else(|error| {
            tracing::warn!("Failed to read sync metadata '{}': {}", key, error);
            None
        })
    }

    /// Wall-clock Unix ms, bumped when needed so consecutive inserts from this
    /// store never share or go back in time.
    fn next_local_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_local_timestamp
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or(now);
        now.max(previous.saturating_add(1))
    }
}

/// Newest first by parsed timestamp. Unparseable timestamps go last; ties
/// keep their incoming order.
fn sort_newest_first(records: &mut [LocalHistoryRecord]) {
    records.sort_by(|left, right| {
        match (
            parse_iso_timestamp(&left.timestamp),
            parse_iso_timestamp(&right.timestamp),
        ) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MachineRef, RecordSyncStatus};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn entry(machine: i64, date: &str) -> IncomingEntry {
        IncomingEntry {
            machine: Some(MachineRef::Number(machine)),
            date: Some(date.to_string()),
            editor: Some("alice".to_string()),
            ..IncomingEntry::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_stamps_local_fields() {
        let store = LocalHistoryStore::open_in_memory("device_one").await;

        assert!(store.save(&entry(4, "2024-01-01T00:00:00Z")).await);

        let records = store.load_all().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_id, "device_one");
        assert_eq!(records[0].sync_status, RecordSyncStatus::Local);
        assert!(records[0].local_timestamp > 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_defaults_missing_timestamp_to_now() {
        let store = LocalHistoryStore::open_in_memory("device_one").await;
        let before = Utc::now();

        assert!(store.save(&IncomingEntry::default()).await);

        let records = store.load_all().await;
        let stamped = parse_iso_timestamp(&records[0].timestamp).unwrap();
        assert!(stamped >= before - chrono::Duration::seconds(1));
        assert_eq!(records[0].machine_id, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_all_is_newest_first() {
        let store = LocalHistoryStore::open_in_memory("device_one").await;

        store.save(&entry(2, "2024-01-02T00:00:00Z")).await;
        store.save(&entry(1, "2024-01-01T00:00:00Z")).await;
        store.save(&entry(3, "2024-01-03T00:00:00Z")).await;

        let timestamps = store
            .load_all()
            .await
            .into_iter()
            .map(|record| record.timestamp)
            .collect::<Vec<_>>();
        assert_eq!(
            timestamps,
            vec![
                "2024-01-03T00:00:00Z",
                "2024-01-02T00:00:00Z",
                "2024-01-01T00:00:00Z"
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_all_compares_instants_not_text() {
        let store = LocalHistoryStore::open_in_memory("device_one").await;

        // 08:00+07:00 is 01:00Z, earlier than 02:00Z even though it sorts later as text
        store.save(&entry(1, "2024-01-01T08:00:00+07:00")).await;
        store.save(&entry(2, "2024-01-01T02:00:00Z")).await;
        store.save(&entry(3, "not a date")).await;

        let machines = store
            .load_all()
            .await
            .into_iter()
            .filter_map(|record| record.machine_id)
            .collect::<Vec<_>>();
        assert_eq!(
            machines,
            vec![
                MachineRef::Number(2),
                MachineRef::Number(1),
                MachineRef::Number(3)
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn local_timestamps_are_strictly_increasing() {
        let store = LocalHistoryStore::open_in_memory("device_one").await;
        for machine in 0..20 {
            store.save(&entry(machine, "2024-01-01T00:00:00Z")).await;
        }

        let mut stamps = store
            .load_all()
            .await
            .into_iter()
            .map(|record| (record.id, record.local_timestamp))
            .collect::<Vec<_>>();
        stamps.sort_unstable();
        assert!(stamps.windows(2).all(|pair| pair[0].1 < pair[1].1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unavailable_store_is_noop() {
        let store = LocalHistoryStore::unavailable("device_one");

        assert!(!store.is_available());
        assert!(!store.save(&entry(1, "2024-01-01T00:00:00Z")).await);
        assert!(store.load_all().await.is_empty());
        assert_eq!(store.count().await, 0);
        assert!(!store.set_metadata("k", "v").await);
        assert_eq!(store.metadata("k").await, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn init_on_unusable_path_degrades() {
        let tmp = tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = LocalHistoryStore::init(blocker.join("layout.db"), "device_one").await;
        assert!(!store.is_available());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn init_persists_across_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("layout.db");

        {
            let store = LocalHistoryStore::init(&path, "device_one").await;
            assert!(store.save(&entry(9, "2024-01-01T00:00:00Z")).await);
        }

        let reopened = LocalHistoryStore::init(&path, "device_one").await;
        assert_eq!(reopened.count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn metadata_roundtrip() {
        let store = LocalHistoryStore::open_in_memory("device_one").await;
        assert!(store.set_metadata("last_import_at", "2024-01-01T00:00:00.000Z").await);
        assert_eq!(
            store.metadata("last_import_at").await.as_deref(),
            Some("2024-01-01T00:00:00.000Z")
        );
    }
}
