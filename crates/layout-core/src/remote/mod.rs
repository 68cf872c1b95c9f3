//! Remote backend adapter.
//!
//! The hosted backend mirrors machines, constructions and history. Local
//! state stays authoritative: callers log and ignore remote failures.

mod memory;
mod supabase;
mod watch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Construction, HistoryEntry, Machine, MachineChange, MachineRef};

pub use memory::MemoryBackend;
pub use supabase::SupabaseBackend;
pub use watch::{ChangeWatcher, RemoteChange, WatchedResource};

/// Default number of history rows loaded from the backend
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
/// Editor recorded when a change has no signed-in user
pub const UNKNOWN_USER: &str = "unknown";
/// `action` column written for construct reassignments
pub const UPDATE_MACHINE_ACTION: &str = "UPDATE_MACHINE";

/// Operations of the hosted backend
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Every machine, ordered by id
    async fn load_machines(&self) -> Result<Vec<Machine>>;

    /// Upsert the machine and append a history row for the change
    async fn save_machine(&self, change: &MachineChange) -> Result<()>;

    async fn load_constructions(&self) -> Result<Vec<Construction>>;

    /// Upsert a construct. `created_by` is `user_id` for new constructs.
    async fn save_construction(
        &self,
        construction: &Construction,
        user_id: Option<&str>,
        is_new: bool,
    ) -> Result<()>;

    async fn delete_construction(&self, id: &str) -> Result<()>;

    /// Newest history rows first, at most `limit`
    async fn load_history(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Short label for logs
    fn name(&self) -> &'static str;
}

/// A row of the remote `history` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub timestamp: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub machine_id: Option<MachineRef>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub editor: Option<String>,
}

impl HistoryRow {
    /// Row recorded for a construct reassignment at `timestamp`.
    pub fn for_change(change: &MachineChange, timestamp: &str) -> Self {
        let user = change
            .user_id
            .clone()
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        Self {
            timestamp: timestamp.to_string(),
            user: Some(user.clone()),
            action: Some(UPDATE_MACHINE_ACTION.to_string()),
            machine_id: Some(MachineRef::Number(change.machine_id)),
            from: change.previous_construct_id.clone(),
            to: change.construct_id.clone(),
            editor: Some(user),
        }
    }

    /// Canonical form; rows without a machine are dropped.
    pub fn into_entry(self) -> Option<HistoryEntry> {
        let machine = self.machine_id?;
        Some(HistoryEntry {
            machine,
            from: self.from,
            to: self.to,
            editor: self.editor.unwrap_or_default(),
            date: self.timestamp,
            user: self.user,
            action: self.action,
        })
    }
}

/// Machine row written for a construct reassignment at `timestamp`.
pub fn machine_upsert(change: &MachineChange, timestamp: &str) -> Machine {
    Machine {
        id: change.machine_id,
        construct_id: change.construct_id.clone(),
        last_edited_by: Some(
            change
                .user_id
                .clone()
                .unwrap_or_else(|| UNKNOWN_USER.to_string()),
        ),
        last_edited_at: Some(timestamp.to_string()),
    }
}

/// Construct row written by an upsert.
pub fn construction_upsert(
    construction: &Construction,
    user_id: Option<&str>,
    is_new: bool,
    now: &str,
) -> Construction {
    Construction {
        id: construction.id.clone(),
        name: construction.name.clone(),
        color: construction.color.clone(),
        created_by: if is_new {
            user_id.map(str::to_string)
        } else {
            construction.created_by.clone()
        },
        created_at: construction
            .created_at
            .clone()
            .or_else(|| Some(now.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn change(user: Option<&str>) -> MachineChange {
        MachineChange {
            machine_id: 12,
            construct_id: Some("C2".to_string()),
            previous_construct_id: Some("C1".to_string()),
            user_id: user.map(str::to_string),
        }
    }

    #[test]
    fn change_without_user_is_recorded_as_unknown() {
        let row = HistoryRow::for_change(&change(None), "2024-01-01T00:00:00.000Z");
        assert_eq!(row.user.as_deref(), Some(UNKNOWN_USER));
        assert_eq!(row.editor.as_deref(), Some(UNKNOWN_USER));
        assert_eq!(row.action.as_deref(), Some(UPDATE_MACHINE_ACTION));

        let machine = machine_upsert(&change(None), "2024-01-01T00:00:00.000Z");
        assert_eq!(machine.last_edited_by.as_deref(), Some(UNKNOWN_USER));
    }

    #[test]
    fn history_row_maps_to_entry_with_remote_columns() {
        let entry = HistoryRow::for_change(&change(Some("nur")), "2024-01-01T00:00:00.000Z")
            .into_entry()
            .unwrap();

        assert_eq!(entry.machine, MachineRef::Number(12));
        assert_eq!(entry.date, "2024-01-01T00:00:00.000Z");
        assert_eq!(entry.editor, "nur");
        assert_eq!(entry.user.as_deref(), Some("nur"));
        assert_eq!(entry.action.as_deref(), Some(UPDATE_MACHINE_ACTION));
    }

    #[test]
    fn history_row_without_machine_is_dropped() {
        let row: HistoryRow =
            serde_json::from_str(r#"{"timestamp": "2024-01-01T00:00:00Z", "machine_id": null}"#)
                .unwrap();
        assert!(row.into_entry().is_none());
    }

    #[test]
    fn construction_creator_depends_on_is_new() {
        let existing = Construction {
            id: "C1".to_string(),
            name: "Frame".to_string(),
            color: "#ff0000".to_string(),
            created_by: Some("didin".to_string()),
            created_at: None,
        };

        let updated =
            construction_upsert(&existing, Some("nur"), false, "2024-01-01T00:00:00.000Z");
        assert_eq!(updated.created_by.as_deref(), Some("didin"));
        assert_eq!(updated.created_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));

        let created = construction_upsert(&existing, Some("nur"), true, "2024-01-01T00:00:00.000Z");
        assert_eq!(created.created_by.as_deref(), Some("nur"));
    }
}
