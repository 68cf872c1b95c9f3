//! History entry models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a machine as it appears in history.
///
/// The tracker writes plain machine numbers, but imported files may carry
/// string ids. The two are never equal to each other: `1` and `"1"` are
/// different machines as far as dedup is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MachineRef {
    Number(i64),
    Text(String),
}

impl MachineRef {
    /// Lenient conversion from an arbitrary JSON value.
    ///
    /// Integers stay numeric, strings stay textual, and anything else is kept
    /// as its JSON text. `null` means "no machine".
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(number) => Some(
                number
                    .as_i64()
                    .map_or_else(|| Self::Text(number.to_string()), Self::Number),
            ),
            Value::String(text) => Some(Self::Text(text.clone())),
            other => Some(Self::Text(other.to_string())),
        }
    }

    /// Numeric machine number, if this reference is numeric or a numeric string.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl fmt::Display for MachineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for MachineRef {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MachineRef {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Natural key used for cross-device dedup: (machine, date).
pub type HistoryKey = (MachineRef, String);

/// A construct change as held in the canonical history list and in export files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Machine whose construct changed
    pub machine: MachineRef,
    /// Previous construct id
    pub from: Option<String>,
    /// New construct id
    pub to: Option<String>,
    /// User who made the change
    #[serde(default)]
    pub editor: String,
    /// ISO-8601 time of the change
    pub date: String,
    /// Remote-only: user column of the history row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Remote-only: action column of the history row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl HistoryEntry {
    /// Create an entry without the remote-only columns.
    pub fn new(
        machine: impl Into<MachineRef>,
        from: Option<String>,
        to: Option<String>,
        editor: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            machine: machine.into(),
            from,
            to,
            editor: editor.into(),
            date: date.into(),
            user: None,
            action: None,
        }
    }

    /// The (machine, date) pair used for dedup.
    pub fn natural_key(&self) -> HistoryKey {
        (self.machine.clone(), self.date.clone())
    }

    /// Lenient conversion from an import or merge file item.
    ///
    /// Reads the same shapes as [`IncomingEntry::from_json`]. Only the
    /// machine and the date are required since they form the natural key; a
    /// missing editor becomes empty.
    pub fn from_json(value: &Value) -> Option<Self> {
        let incoming = IncomingEntry::from_json(value);
        let machine = incoming.machine.or(incoming.machine_id)?;
        let date = incoming
            .date
            .or(incoming.timestamp)
            .filter(|date| !date.trim().is_empty())?;
        let remote_text = |key: &str| value.get(key).and_then(json_text);

        Some(Self {
            machine,
            from: incoming.from,
            to: incoming.to,
            editor: incoming.editor.unwrap_or_default(),
            date,
            user: remote_text("user"),
            action: remote_text("action"),
        })
    }
}

/// Sync marker of an embedded-store record.
///
/// Records are written as `Local` and nothing transitions them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordSyncStatus {
    #[default]
    Local,
    Synced,
    Pending,
}

impl RecordSyncStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Synced => "synced",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for RecordSyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordSyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "synced" => Ok(Self::Synced),
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown sync status '{other}'")),
        }
    }
}

/// A loosely shaped entry as it arrives from an import file or a caller.
///
/// Accepts both the canonical shape (`machine`/`date`) and the store shape
/// (`machine_id`/`timestamp`). Every field is optional; defaults are applied
/// by [`NewLocalRecord::from_incoming`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingEntry {
    pub machine: Option<MachineRef>,
    pub machine_id: Option<MachineRef>,
    pub date: Option<String>,
    pub timestamp: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub editor: Option<String>,
}

impl IncomingEntry {
    /// Read an incoming entry out of any JSON value. Non-objects yield an
    /// entry with every field missing.
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        let machine_ref = |key: &str| object.get(key).and_then(MachineRef::from_json);
        let text = |key: &str| object.get(key).and_then(json_text);

        Self {
            machine: machine_ref("machine"),
            machine_id: machine_ref("machine_id"),
            date: text("date"),
            timestamp: text("timestamp"),
            from: text("from"),
            to: text("to"),
            editor: text("editor"),
        }
    }
}

impl From<&HistoryEntry> for IncomingEntry {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            machine: Some(entry.machine.clone()),
            machine_id: None,
            date: Some(entry.date.clone()),
            timestamp: None,
            from: entry.from.clone(),
            to: entry.to.clone(),
            editor: Some(entry.editor.clone()),
        }
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Record ready for insertion into the embedded store (no id yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocalRecord {
    pub timestamp: String,
    pub machine_id: Option<MachineRef>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub editor: Option<String>,
    pub sync_status: RecordSyncStatus,
    pub local_timestamp: i64,
    pub device_id: String,
}

impl NewLocalRecord {
    /// Convert an incoming entry into a store record.
    ///
    /// Defaulting rules:
    /// - `machine_id`: `machine`, then `machine_id`, else none
    /// - `timestamp`: `date`, then `timestamp`, else `now_iso`
    /// - `from`, `to`, `editor`: as given, else none
    /// - `sync_status` is always `local`; `local_timestamp` and `device_id`
    ///   come from the store doing the insert
    pub fn from_incoming(
        entry: &IncomingEntry,
        device_id: &str,
        local_timestamp: i64,
        now_iso: &str,
    ) -> Self {
        let timestamp = entry
            .date
            .clone()
            .or_else(|| entry.timestamp.clone())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| now_iso.to_string());

        Self {
            timestamp,
            machine_id: entry.machine.clone().or_else(|| entry.machine_id.clone()),
            from: entry.from.clone(),
            to: entry.to.clone(),
            editor: entry.editor.clone(),
            sync_status: RecordSyncStatus::Local,
            local_timestamp,
            device_id: device_id.to_string(),
        }
    }
}

/// History record as persisted in the embedded store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalHistoryRecord {
    /// Store-assigned primary key, never reused
    pub id: i64,
    pub timestamp: String,
    pub machine_id: Option<MachineRef>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub editor: Option<String>,
    pub sync_status: RecordSyncStatus,
    /// Insertion time (Unix ms)
    pub local_timestamp: i64,
    /// Device that inserted the record
    pub device_id: String,
}

impl LocalHistoryRecord {
    /// Map back to the canonical shape. Records without a machine have no
    /// canonical counterpart.
    pub fn to_entry(&self) -> Option<HistoryEntry> {
        let machine = self.machine_id.clone()?;
        Some(HistoryEntry::new(
            machine,
            self.from.clone(),
            self.to.clone(),
            self.editor.clone().unwrap_or_default(),
            self.timestamp.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn machine_ref_numbers_and_strings_differ() {
        assert_ne!(MachineRef::Number(1), MachineRef::Text("1".to_string()));
        assert_eq!(MachineRef::Text("42".to_string()).as_number(), Some(42));
    }

    #[test]
    fn machine_ref_serializes_untagged() {
        let entry = HistoryEntry::new(
            12_i64,
            Some("C1".into()),
            None,
            "alice",
            "2024-01-01T00:00:00Z",
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "machine": 12,
                "from": "C1",
                "to": null,
                "editor": "alice",
                "date": "2024-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn history_entry_keeps_remote_columns_when_present() {
        let raw = json!({
            "machine": "M1",
            "from": null,
            "to": "C2",
            "editor": "bob",
            "date": "2024-01-01T00:00:00Z",
            "action": "UPDATE_MACHINE"
        });
        let entry: HistoryEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.action.as_deref(), Some("UPDATE_MACHINE"));
        assert_eq!(entry.user, None);
    }

    #[test]
    fn incoming_entry_reads_both_shapes() {
        let canonical = IncomingEntry::from_json(&json!({
            "machine": 5,
            "date": "2024-02-02T00:00:00Z",
            "editor": "alice",
            "from": "C1",
            "to": 7
        }));
        assert_eq!(canonical.machine, Some(MachineRef::Number(5)));
        assert_eq!(canonical.to.as_deref(), Some("7"));

        let stored = IncomingEntry::from_json(&json!({
            "machine_id": "M9",
            "timestamp": "2024-02-03T00:00:00Z"
        }));
        assert_eq!(stored.machine_id, Some(MachineRef::Text("M9".into())));
        assert_eq!(stored.timestamp.as_deref(), Some("2024-02-03T00:00:00Z"));
    }

    #[test]
    fn history_entry_from_json_accepts_loose_fields() {
        let entry = HistoryEntry::from_json(&json!({
            "machine": 2,
            "from": 3,
            "to": 4,
            "editor": null,
            "date": "2024-01-02T00:00:00Z",
            "user": "bob"
        }))
        .unwrap();

        assert_eq!(
            entry,
            HistoryEntry {
                user: Some("bob".into()),
                ..HistoryEntry::new(
                    2_i64,
                    Some("3".into()),
                    Some("4".into()),
                    "",
                    "2024-01-02T00:00:00Z"
                )
            }
        );
    }

    #[test]
    fn history_entry_from_json_needs_machine_and_date() {
        assert_eq!(
            HistoryEntry::from_json(&json!({"date": "2024-01-01T00:00:00Z"})),
            None
        );
        assert_eq!(HistoryEntry::from_json(&json!({"machine": 1, "date": " "})), None);
        assert_eq!(HistoryEntry::from_json(&json!("row")), None);

        let stored = HistoryEntry::from_json(&json!({
            "machine_id": "M9",
            "timestamp": "2024-02-03T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            stored.natural_key(),
            (MachineRef::from("M9"), "2024-02-03T00:00:00Z".to_string())
        );
    }

    #[test]
    fn incoming_entry_from_non_object_is_empty() {
        assert_eq!(IncomingEntry::from_json(&json!(3)), IncomingEntry::default());
    }

    #[test]
    fn new_record_applies_defaults() {
        let entry = IncomingEntry {
            machine_id: Some(MachineRef::Number(3)),
            ..IncomingEntry::default()
        };
        let record =
            NewLocalRecord::from_incoming(&entry, "device_abc", 10, "2024-05-05T00:00:00.000Z");

        assert_eq!(record.timestamp, "2024-05-05T00:00:00.000Z");
        assert_eq!(record.machine_id, Some(MachineRef::Number(3)));
        assert_eq!(record.sync_status, RecordSyncStatus::Local);
        assert_eq!(record.local_timestamp, 10);
        assert_eq!(record.device_id, "device_abc");
        assert_eq!(record.editor, None);
    }

    #[test]
    fn new_record_prefers_canonical_fields() {
        let entry = IncomingEntry {
            machine: Some(MachineRef::Number(1)),
            machine_id: Some(MachineRef::Number(2)),
            date: Some("2024-01-01T00:00:00Z".into()),
            timestamp: Some("2023-01-01T00:00:00Z".into()),
            ..IncomingEntry::default()
        };
        let record = NewLocalRecord::from_incoming(&entry, "d", 1, "now");
        assert_eq!(record.machine_id, Some(MachineRef::Number(1)));
        assert_eq!(record.timestamp, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn sync_status_parses_case_insensitively() {
        assert_eq!("SYNCED".parse::<RecordSyncStatus>().unwrap(), RecordSyncStatus::Synced);
        assert!("done".parse::<RecordSyncStatus>().is_err());
    }

    #[test]
    fn record_without_machine_has_no_entry() {
        let record = LocalHistoryRecord {
            id: 1,
            timestamp: "2024-01-01T00:00:00Z".into(),
            machine_id: None,
            from: None,
            to: None,
            editor: None,
            sync_status: RecordSyncStatus::Local,
            local_timestamp: 1,
            device_id: "d".into(),
        };
        assert!(record.to_entry().is_none());
    }
}
