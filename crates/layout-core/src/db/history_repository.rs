//! Embedded history store repository

use libsql::{Connection, Row, Value};

use crate::error::{Error, Result};
use crate::models::{LocalHistoryRecord, NewLocalRecord};

use super::values::{machine_to_value, text_to_value, value_to_machine, value_to_text};

/// Trait for embedded history record storage (async)
#[allow(async_fn_in_trait)]
pub trait HistoryRepository {
    /// Insert a record and return its store-assigned id
    async fn insert(&self, record: &NewLocalRecord) -> Result<i64>;

    /// Every record, read through the timestamp index
    async fn list_all(&self) -> Result<Vec<LocalHistoryRecord>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;
}

/// libSQL implementation of `HistoryRepository`
pub struct LibSqlHistoryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlHistoryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_record(row: &Row) -> Result<LocalHistoryRecord> {
        let sync_status: String = row.get(6)?;
        Ok(LocalHistoryRecord {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            machine_id: value_to_machine(row.get_value(2)?),
            from: value_to_text(row.get_value(3)?),
            to: value_to_text(row.get_value(4)?),
            editor: value_to_text(row.get_value(5)?),
            sync_status: sync_status.parse().map_err(Error::Database)?,
            local_timestamp: row.get(7)?,
            device_id: row.get(8)?,
        })
    }
}

impl HistoryRepository for LibSqlHistoryRepository<'_> {
    async fn insert(&self, record: &NewLocalRecord) -> Result<i64> {
        let inserted = self
            .conn
            .execute(
                "INSERT INTO history_entries (
                    timestamp, machine_id, from_construct, to_construct, editor,
                    sync_status, local_timestamp, device_id
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    Value::Text(record.timestamp.clone()),
                    machine_to_value(record.machine_id.as_ref()),
                    text_to_value(record.from.as_deref()),
                    text_to_value(record.to.as_deref()),
                    text_to_value(record.editor.as_deref()),
                    Value::Text(record.sync_status.as_str().to_string()),
                    Value::Integer(record.local_timestamp),
                    Value::Text(record.device_id.clone()),
                ],
            )
            .await?;

        if inserted == 0 {
            return Err(Error::WriteRejected("history record was not inserted".to_string()));
        }
        Ok(self.conn.last_insert_rowid())
    }

    async fn list_all(&self) -> Result<Vec<LocalHistoryRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, timestamp, machine_id, from_construct, to_construct, editor,
                        sync_status, local_timestamp, device_id
                 FROM history_entries
                 ORDER BY timestamp DESC, id ASC",
                (),
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }

    async fn count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM history_entries", ())
            .await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|error| Error::Database(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{IncomingEntry, MachineRef, RecordSyncStatus};
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn record(machine: MachineRef, timestamp: &str, local_timestamp: i64) -> NewLocalRecord {
        let entry = IncomingEntry {
            machine: Some(machine),
            date: Some(timestamp.to_string()),
            editor: Some("alice".to_string()),
            from: Some("C1".to_string()),
            to: None,
            ..IncomingEntry::default()
        };
        NewLocalRecord::from_incoming(&entry, "device_test", local_timestamp, "unused")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_assigns_increasing_ids() {
        let db = setup().await;
        let repo = LibSqlHistoryRepository::new(db.connection());

        let first = repo
            .insert(&record(MachineRef::Number(1), "2024-01-01T00:00:00Z", 1))
            .await
            .unwrap();
        let second = repo
            .insert(&record(MachineRef::Number(2), "2024-01-02T00:00:00Z", 2))
            .await
            .unwrap();

        assert!(second > first);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_all_roundtrips_fields() {
        let db = setup().await;
        let repo = LibSqlHistoryRepository::new(db.connection());

        repo.insert(&record(MachineRef::Text("M1".into()), "2024-01-01T00:00:00Z", 5))
            .await
            .unwrap();

        let records = repo.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        let stored = &records[0];
        assert_eq!(stored.machine_id, Some(MachineRef::Text("M1".into())));
        assert_eq!(stored.from.as_deref(), Some("C1"));
        assert_eq!(stored.to, None);
        assert_eq!(stored.editor.as_deref(), Some("alice"));
        assert_eq!(stored.sync_status, RecordSyncStatus::Local);
        assert_eq!(stored.local_timestamp, 5);
        assert_eq!(stored.device_id, "device_test");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ids_are_not_reused_after_delete() {
        let db = setup().await;
        let repo = LibSqlHistoryRepository::new(db.connection());

        let first = repo
            .insert(&record(MachineRef::Number(1), "2024-01-01T00:00:00Z", 1))
            .await
            .unwrap();
        db.connection()
            .execute("DELETE FROM history_entries", ())
            .await
            .unwrap();
        let second = repo
            .insert(&record(MachineRef::Number(1), "2024-01-01T00:00:00Z", 2))
            .await
            .unwrap();

        assert!(second > first);
    }
}
