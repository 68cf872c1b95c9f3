//! Canonical history list repository

use libsql::{Connection, Row, Value};

use crate::error::{Error, Result};
use crate::models::HistoryEntry;

use super::values::{machine_to_value, text_to_value, value_to_machine, value_to_text};

/// libSQL-backed canonical history list, kept in append order
pub struct LibSqlHistoryLogRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlHistoryLogRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Every entry in append order
    pub async fn list(&self) -> Result<Vec<HistoryEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT machine, from_construct, to_construct, editor, date, user, action
                 FROM history_log
                 ORDER BY position ASC",
                (),
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            if let Some(entry) = Self::parse_entry(&row)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Append one entry at the end of the list
    pub async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO history_log (machine, from_construct, to_construct, editor, date, user, action)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    machine_to_value(Some(&entry.machine)),
                    text_to_value(entry.from.as_deref()),
                    text_to_value(entry.to.as_deref()),
                    Value::Text(entry.editor.clone()),
                    Value::Text(entry.date.clone()),
                    text_to_value(entry.user.as_deref()),
                    text_to_value(entry.action.as_deref()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Number of entries in the list
    pub async fn count(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM history_log", ())
            .await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        usize::try_from(count).map_err(|error| Error::Database(error.to_string()))
    }

    fn parse_entry(row: &Row) -> Result<Option<HistoryEntry>> {
        let Some(machine) = value_to_machine(row.get_value(0)?) else {
            return Ok(None);
        };
        Ok(Some(HistoryEntry {
            machine,
            from: value_to_text(row.get_value(1)?),
            to: value_to_text(row.get_value(2)?),
            editor: row.get(3)?,
            date: row.get(4)?,
            user: value_to_text(row.get_value(5)?),
            action: value_to_text(row.get_value(6)?),
        }))
    }
}
