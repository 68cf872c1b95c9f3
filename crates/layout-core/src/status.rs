//! Point-in-time sync status report.

use serde::{Deserialize, Serialize};

use crate::device::DeviceIdentity;
use crate::error::Result;
use crate::history::{HistoryLog, LocalHistoryStore};
use crate::prefs::{PreferenceStore, LAST_CLOUD_SYNC_KEY};
use crate::util::iso_now;

/// Shown when no remote mirror has ever succeeded
pub const NEVER_SYNCED: &str = "Never";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusSnapshot {
    pub device_id: String,
    pub device_name: String,
    /// Entries in the canonical list
    pub local_entries: usize,
    /// Records in the embedded store
    pub store_entries: usize,
    pub cloud_available: bool,
    pub last_cloud_sync: String,
    /// When this snapshot was taken
    pub timestamp: String,
}

pub async fn collect_status<L: HistoryLog>(
    identity: &DeviceIdentity,
    log: &L,
    store: &LocalHistoryStore,
    prefs: &dyn PreferenceStore,
    cloud_available: bool,
) -> Result<SyncStatusSnapshot> {
    Ok(SyncStatusSnapshot {
        device_id: identity.id.clone(),
        device_name: identity.name.clone(),
        local_entries: log.count().await?,
        store_entries: store.load_all().await.len(),
        cloud_available,
        last_cloud_sync: prefs
            .get(LAST_CLOUD_SYNC_KEY)
            .unwrap_or_else(|| NEVER_SYNCED.to_string()),
        timestamp: iso_now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryLog;
    use crate::models::{HistoryEntry, IncomingEntry};
    use crate::prefs::MemoryPreferences;
    use pretty_assertions::assert_eq;

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            id: "device_abc123xyz_1".to_string(),
            name: "Mac (2/2/2024)".to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fresh_device_reports_never() {
        let store = LocalHistoryStore::open_in_memory("device_abc123xyz_1").await;
        let status = collect_status(
            &identity(),
            &MemoryHistoryLog::new(),
            &store,
            &MemoryPreferences::new(),
            false,
        )
        .await
        .unwrap();

        assert_eq!(status.last_cloud_sync, NEVER_SYNCED);
        assert_eq!(status.local_entries, 0);
        assert_eq!(status.store_entries, 0);
        assert!(!status.cloud_available);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn counts_log_and_store_separately() {
        let store = LocalHistoryStore::open_in_memory("device_abc123xyz_1").await;
        store.save(&IncomingEntry::default()).await;
        store.save(&IncomingEntry::default()).await;
        let log = MemoryHistoryLog::with_entries(vec![HistoryEntry::new(
            1_i64,
            None,
            Some("C1".into()),
            "alice",
            "2024-01-01T00:00:00Z",
        )]);
        let prefs = MemoryPreferences::new();
        prefs
            .set(LAST_CLOUD_SYNC_KEY, "2024-01-01T00:00:00.000Z")
            .unwrap();

        let status = collect_status(&identity(), &log, &store, &prefs, true)
            .await
            .unwrap();

        assert_eq!(status.local_entries, 1);
        assert_eq!(status.store_entries, 2);
        assert_eq!(status.last_cloud_sync, "2024-01-01T00:00:00.000Z");
        assert_eq!(status.device_name, "Mac (2/2/2024)");
    }
}
