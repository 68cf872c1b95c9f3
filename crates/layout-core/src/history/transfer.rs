//! Export of the canonical list to a JSON file and import of such files into
//! the local history store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{LAST_IMPORT_AT_KEY, LAST_IMPORT_SOURCE_KEY};
use crate::device::DeviceIdentity;
use crate::error::{Error, Result};
use crate::models::{HistoryEntry, IncomingEntry};
use crate::util::{iso_now, iso_timestamp};

use super::log::HistoryLog;
use super::merge::entries_from_values;
use super::store::LocalHistoryStore;

const EXPORT_FILE_PREFIX: &str = "layout_history_";

/// Envelope written by an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub exported_at: String,
    pub device_id: String,
    pub device_name: String,
    pub total_entries: usize,
    pub history: Vec<HistoryEntry>,
}

pub fn export_document(
    entries: Vec<HistoryEntry>,
    identity: &DeviceIdentity,
    now: DateTime<Utc>,
) -> ExportDocument {
    ExportDocument {
        exported_at: iso_timestamp(now),
        device_id: identity.id.clone(),
        device_name: identity.name.clone(),
        total_entries: entries.len(),
        history: entries,
    }
}

/// `layout_history_2024-01-01T12-34-56_device_a.json`
pub fn export_file_name(now: DateTime<Utc>, identity: &DeviceIdentity) -> String {
    let stamp = iso_timestamp(now).replace([':', '.'], "-");
    let stamp = stamp
        .get(..stamp.len().saturating_sub(5))
        .unwrap_or_default();
    format!("{EXPORT_FILE_PREFIX}{stamp}_{}.json", identity.short_id())
}

/// Write a snapshot of `log` as a JSON file in `dir`.
pub async fn export_to_dir<L: HistoryLog>(
    log: &L,
    identity: &DeviceIdentity,
    dir: &Path,
) -> Result<PathBuf> {
    let now = Utc::now();
    let document = export_document(log.entries().await?, identity, now);

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(now, identity));
    std::fs::write(&path, serde_json::to_string_pretty(&document)?)?;

    tracing::info!(
        "Exported {} history entries to {}",
        document.total_entries,
        path.display()
    );
    Ok(path)
}

fn history_items(text: &str) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_str(text)
        .map_err(|error| Error::InvalidFormat(format!("not valid JSON: {error}")))?;

    match document.get("history") {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(Error::InvalidFormat(
            "'history' must be an array".to_string(),
        )),
        None => Err(Error::InvalidFormat(
            "missing 'history' array".to_string(),
        )),
    }
}

/// Parse an import document into store-bound entries.
pub fn parse_import_document(text: &str) -> Result<Vec<IncomingEntry>> {
    Ok(history_items(text)?
        .iter()
        .map(IncomingEntry::from_json)
        .collect())
}

/// Parse an import document into canonical entries, dropping items that have
/// no machine or date.
pub fn parse_history_entries(text: &str) -> Result<Vec<HistoryEntry>> {
    Ok(entries_from_values(&history_items(text)?))
}

/// Save every entry to `store`. Returns the number processed, which includes
/// entries whose save reported failure.
pub async fn import_entries(store: &LocalHistoryStore, entries: &[IncomingEntry]) -> usize {
    let mut failed = 0_usize;
    for entry in entries {
        if !store.save(entry).await {
            failed += 1;
        }
    }
    if failed > 0 {
        tracing::warn!("{} of {} imported entries were not stored", failed, entries.len());
    }
    entries.len()
}

/// Read an export file and save its entries into the local history store.
pub async fn import_from_path(store: &LocalHistoryStore, path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path)?;
    let entries = parse_import_document(&text)?;
    let processed = import_entries(store, &entries).await;

    store.set_metadata(LAST_IMPORT_AT_KEY, &iso_now()).await;
    store
        .set_metadata(LAST_IMPORT_SOURCE_KEY, &path.display().to_string())
        .await;

    tracing::info!("Imported {} history entries from {}", processed, path.display());
    Ok(processed)
}
