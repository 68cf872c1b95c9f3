//! Explicit application context.
//!
//! A [`Session`] owns the preferences, device identity, local store,
//! canonical list and optional remote backend, and exposes the operations
//! the command-line shell drives.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::auth::{AuthUser, CredentialTable};
use crate::device::{set_device_name, DeviceIdentity, Platform};
use crate::error::{Error, Result};
use crate::history::{
    export_to_dir, import_from_path, merge_into, parse_history_entries, CanonicalHistory,
    HistoryLog, LocalHistoryStore,
};
use crate::models::{Construction, HistoryEntry, IncomingEntry, LocalHistoryRecord, MachineChange};
use crate::prefs::{PreferenceStore, CURRENT_USER_ID_KEY, CURRENT_USER_KEY, LAST_CLOUD_SYNC_KEY};
use crate::remote::{ChangeWatcher, RemoteBackend, RemoteChange, UNKNOWN_USER};
use crate::status::{collect_status, SyncStatusSnapshot};
use crate::util::iso_now;

pub struct Session {
    prefs: Arc<dyn PreferenceStore>,
    identity: DeviceIdentity,
    store: LocalHistoryStore,
    log: CanonicalHistory,
    remote: Option<Arc<dyn RemoteBackend>>,
    current_user: Option<String>,
}

impl Session {
    /// Initialize identity, open the store at `db_path` and attach `remote`.
    ///
    /// An unusable database does not fail the session; the store then
    /// reports unavailable and the canonical list lives in memory.
    pub async fn open(
        prefs: Arc<dyn PreferenceStore>,
        db_path: &Path,
        remote: Option<Arc<dyn RemoteBackend>>,
    ) -> Result<Self> {
        let identity = DeviceIdentity::load_or_init(prefs.as_ref(), Platform::current())?;
        let store = LocalHistoryStore::init(db_path, identity.id.clone()).await;
        Ok(Self::assemble(prefs, identity, store, remote))
    }

    /// Session over an in-memory database (primarily for tests).
    pub async fn in_memory(
        prefs: Arc<dyn PreferenceStore>,
        remote: Option<Arc<dyn RemoteBackend>>,
    ) -> Result<Self> {
        let identity = DeviceIdentity::load_or_init(prefs.as_ref(), Platform::current())?;
        let store = LocalHistoryStore::open_in_memory(identity.id.clone()).await;
        Ok(Self::assemble(prefs, identity, store, remote))
    }

    fn assemble(
        prefs: Arc<dyn PreferenceStore>,
        identity: DeviceIdentity,
        store: LocalHistoryStore,
        remote: Option<Arc<dyn RemoteBackend>>,
    ) -> Self {
        let log = CanonicalHistory::for_database(store.shared_database());
        let current_user = prefs.get(CURRENT_USER_ID_KEY);
        if let Some(remote) = &remote {
            tracing::info!("Remote backend attached: {}", remote.name());
        }

        Self {
            prefs,
            identity,
            store,
            log,
            remote,
            current_user,
        }
    }

    pub const fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub const fn store(&self) -> &LocalHistoryStore {
        &self.store
    }

    pub const fn log(&self) -> &CanonicalHistory {
        &self.log
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub const fn cloud_available(&self) -> bool {
        self.remote.is_some()
    }

    pub fn sign_in(
        &mut self,
        credentials: &CredentialTable,
        email: &str,
        password: &str,
    ) -> Result<AuthUser> {
        let user = credentials.sign_in(email, password)?;
        self.prefs.set(CURRENT_USER_KEY, &user.email)?;
        self.prefs.set(CURRENT_USER_ID_KEY, &user.uid)?;
        self.current_user = Some(user.uid.clone());
        Ok(user)
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.prefs.remove(CURRENT_USER_KEY)?;
        self.prefs.remove(CURRENT_USER_ID_KEY)?;
        self.current_user = None;
        Ok(())
    }

    /// Email of the signed-in user, if any
    pub fn signed_in_email(&self) -> Option<String> {
        self.prefs.get(CURRENT_USER_KEY)
    }

    pub fn rename_device(&mut self, name: &str) -> bool {
        let renamed = set_device_name(self.prefs.as_ref(), name);
        self.identity.name = name.trim().to_string();
        renamed
    }

    /// Record a construct change on `machine`.
    ///
    /// Appends to the canonical list, saves into the local store and mirrors
    /// to the remote backend when one is attached. Store and remote failures
    /// are logged, not returned.
    pub async fn record_change(
        &self,
        machine: i64,
        from: Option<String>,
        to: Option<String>,
    ) -> Result<HistoryEntry> {
        let editor = self
            .current_user
            .clone()
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        let entry = HistoryEntry::new(machine, from.clone(), to.clone(), editor, iso_now());

        self.log.append(entry.clone()).await?;
        if !self.store.save(&IncomingEntry::from(&entry)).await {
            tracing::warn!("Change on machine {} was not saved to the local store", machine);
        }

        self.mirror_change(&MachineChange {
            machine_id: machine,
            construct_id: to,
            previous_construct_id: from,
            user_id: self.current_user.clone(),
        })
        .await;

        Ok(entry)
    }

    async fn mirror_change(&self, change: &MachineChange) {
        let Some(remote) = &self.remote else {
            return;
        };
        match remote.save_machine(change).await {
            Ok(()) => self.mark_cloud_sync(),
            Err(error) => {
                tracing::warn!(
                    "Mirroring machine {} to {} failed: {}",
                    change.machine_id,
                    remote.name(),
                    error
                );
            }
        }
    }

    fn mark_cloud_sync(&self) {
        if let Err(error) = self.prefs.set(LAST_CLOUD_SYNC_KEY, &iso_now()) {
            tracing::warn!("Failed to record last cloud sync: {}", error);
        }
    }

    pub async fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        export_to_dir(&self.log, &self.identity, dir).await
    }

    /// Save an export file's entries into the local store.
    pub async fn import_from_path(&self, path: &Path) -> Result<usize> {
        import_from_path(&self.store, path).await
    }

    pub async fn merge(&self, entries: &[HistoryEntry]) -> Result<usize> {
        merge_into(&self.log, entries).await
    }

    /// Merge an export file's entries straight into the canonical list.
    pub async fn merge_file(&self, path: &Path) -> Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let entries = parse_history_entries(&text)?;
        self.merge(&entries).await
    }

    /// Merge every store record that has a machine into the canonical list,
    /// in store insertion order.
    pub async fn merge_store_into_log(&self) -> Result<usize> {
        let mut records = self.store.load_all().await;
        records.sort_by_key(|record| record.id);
        let entries = records
            .iter()
            .filter_map(LocalHistoryRecord::to_entry)
            .collect::<Vec<_>>();
        self.merge(&entries).await
    }

    /// Load remote history and merge it, oldest first.
    pub async fn pull_remote_history(&self, limit: usize) -> Result<usize> {
        let remote = self.require_remote()?;
        let mut entries = remote.load_history(limit).await?;
        entries.reverse();

        let added = self.merge(&entries).await?;
        self.mark_cloud_sync();
        Ok(added)
    }

    pub async fn constructions(&self) -> Result<Vec<Construction>> {
        self.require_remote()?.load_constructions().await
    }

    /// Upsert a construct on the remote backend. New constructs are
    /// attributed to the signed-in user.
    pub async fn save_construction(&self, construction: &Construction, is_new: bool) -> Result<()> {
        let remote = self.require_remote()?;
        remote
            .save_construction(construction, self.current_user(), is_new)
            .await?;
        self.mark_cloud_sync();
        Ok(())
    }

    pub async fn delete_construction(&self, id: &str) -> Result<()> {
        self.require_remote()?.delete_construction(id).await?;
        self.mark_cloud_sync();
        Ok(())
    }

    /// Change feed over the remote backend.
    pub fn watch_remote(
        &self,
        interval: Duration,
    ) -> Result<(ChangeWatcher, mpsc::Receiver<RemoteChange>)> {
        Ok(ChangeWatcher::new(Arc::clone(self.require_remote()?), interval))
    }

    pub async fn status(&self) -> Result<SyncStatusSnapshot> {
        collect_status(
            &self.identity,
            &self.log,
            &self.store,
            self.prefs.as_ref(),
            self.cloud_available(),
        )
        .await
    }

    fn require_remote(&self) -> Result<&Arc<dyn RemoteBackend>> {
        self.remote.as_ref().ok_or_else(|| {
            Error::CapabilityUnavailable("no remote backend is configured".to_string())
        })
    }
}
