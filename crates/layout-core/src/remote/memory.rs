//! In-process backend used by tests and offline runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Construction, HistoryEntry, Machine, MachineChange};
use crate::util::{iso_now, parse_iso_timestamp};

use super::{construction_upsert, machine_upsert, HistoryRow, RemoteBackend};

#[derive(Debug, Default)]
struct Tables {
    machines: BTreeMap<i64, Machine>,
    constructions: BTreeMap<String, Construction>,
    history: Vec<HistoryRow>,
}

/// Backend holding its tables in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Insert a history row directly, as another device would.
    pub fn push_history(&self, row: HistoryRow) {
        self.lock().history.push(row);
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(&self) -> Result<MutexGuard<'_, Tables>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Remote("backend is offline".to_string()));
        }
        Ok(self.lock())
    }
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn load_machines(&self) -> Result<Vec<Machine>> {
        Ok(self.online()?.machines.values().cloned().collect())
    }

    async fn save_machine(&self, change: &MachineChange) -> Result<()> {
        let timestamp = iso_now();
        let mut tables = self.online()?;
        tables
            .machines
            .insert(change.machine_id, machine_upsert(change, &timestamp));
        tables.history.push(HistoryRow::for_change(change, &timestamp));
        Ok(())
    }

    async fn load_constructions(&self) -> Result<Vec<Construction>> {
        Ok(self.online()?.constructions.values().cloned().collect())
    }

    async fn save_construction(
        &self,
        construction: &Construction,
        user_id: Option<&str>,
        is_new: bool,
    ) -> Result<()> {
        let row = construction_upsert(construction, user_id, is_new, &iso_now());
        self.online()?.constructions.insert(row.id.clone(), row);
        Ok(())
    }

    async fn delete_construction(&self, id: &str) -> Result<()> {
        self.online()?.constructions.remove(id);
        Ok(())
    }

    async fn load_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut rows = self.online()?.history.clone();
        rows.sort_by_key(|row| std::cmp::Reverse(parse_iso_timestamp(&row.timestamp)));
        Ok(rows
            .into_iter()
            .take(limit)
            .filter_map(HistoryRow::into_entry)
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
