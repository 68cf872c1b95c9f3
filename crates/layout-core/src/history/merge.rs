//! Additive merge of foreign history into the canonical list.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::Result;
use crate::models::{HistoryEntry, HistoryKey};

use super::log::HistoryLog;

/// Append every entry whose (`machine`, `date`) key is not yet in `log`.
///
/// Keys appended earlier in the same call count as present, so duplicates
/// within `imported` collapse to their first occurrence. Returns the number
/// of entries appended.
pub async fn merge_into<L: HistoryLog>(log: &L, imported: &[HistoryEntry]) -> Result<usize> {
    let mut known: HashSet<HistoryKey> = log
        .entries()
        .await?
        .iter()
        .map(HistoryEntry::natural_key)
        .collect();

    let mut added = 0;
    for entry in imported {
        if known.insert(entry.natural_key()) {
            log.append(entry.clone()).await?;
            added += 1;
        }
    }

    tracing::info!(
        "Merged {} of {} imported history entries",
        added,
        imported.len()
    );
    Ok(added)
}

/// Merge a raw JSON value. Anything other than an array merges nothing;
/// array elements without a machine or a date are skipped.
pub async fn merge_value<L: HistoryLog>(log: &L, value: &Value) -> Result<usize> {
    let Some(items) = value.as_array() else {
        return Ok(0);
    };
    merge_into(log, &entries_from_values(items)).await
}

pub(crate) fn entries_from_values(items: &[Value]) -> Vec<HistoryEntry> {
    items
        .iter()
        .filter_map(|item| {
            let entry = HistoryEntry::from_json(item);
            if entry.is_none() {
                tracing::warn!("Skipping history entry without machine or date: {}", item);
            }
            entry
        })
        .collect()
}
