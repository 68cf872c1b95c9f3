use std::path::PathBuf;
use std::sync::Arc;

use layout_core::config::{default_config_path, AppConfig};
use layout_core::models::{machine_block, UNKNOWN_BLOCK};
use layout_core::prefs::{default_preferences_path, FilePreferences};
use layout_core::remote::{RemoteBackend, SupabaseBackend};
use layout_core::{HistoryEntry, LocalHistoryRecord, MachineRef, Session, SyncStatusSnapshot};

use crate::error::CliError;

const MISSING: &str = "-";

/// Paths and configuration resolved from flags, environment and config file
pub struct RuntimeContext {
    pub config: AppConfig,
    pub db_path: PathBuf,
    pub preferences_path: PathBuf,
}

impl RuntimeContext {
    /// Flags win over environment, environment over the config file.
    pub fn resolve(
        db_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
        preferences_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let config_path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let mut config = AppConfig::load_from_path(&config_path)?;
        config.apply_env();

        let db_path = match db_path {
            Some(path) => path,
            None => config.resolved_db_path()?,
        };
        let preferences_path = match preferences_path {
            Some(path) => path,
            None => default_preferences_path()?,
        };

        Ok(Self {
            config,
            db_path,
            preferences_path,
        })
    }

    pub fn remote(&self) -> Result<Option<Arc<dyn RemoteBackend>>, CliError> {
        let Some(settings) = self.config.remote_settings()? else {
            return Ok(None);
        };
        let backend: Arc<dyn RemoteBackend> = Arc::new(SupabaseBackend::new(&settings)?);
        Ok(Some(backend))
    }

    pub async fn open_session(&self) -> Result<Session, CliError> {
        let prefs = Arc::new(FilePreferences::load(&self.preferences_path)?);
        let session = Session::open(prefs, &self.db_path, self.remote()?).await?;
        if !session.store().is_available() {
            eprintln!(
                "Warning: local history store unavailable at {}; changes are kept for this run only",
                self.db_path.display()
            );
        }
        Ok(session)
    }
}

pub fn block_label(machine: &MachineRef) -> char {
    machine.as_number().map_or(UNKNOWN_BLOCK, machine_block)
}

/// Last `limit` entries of the canonical list, newest first
pub fn recent_entries(mut entries: Vec<HistoryEntry>, limit: usize) -> Vec<HistoryEntry> {
    entries.reverse();
    entries.truncate(limit);
    entries
}

pub fn format_history_lines(entries: &[HistoryEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  machine {} [{}]  {} -> {}  by {}",
                entry.date,
                entry.machine,
                block_label(&entry.machine),
                entry.from.as_deref().unwrap_or(MISSING),
                entry.to.as_deref().unwrap_or(MISSING),
                if entry.editor.is_empty() {
                    MISSING
                } else {
                    entry.editor.as_str()
                }
            )
        })
        .collect()
}

pub fn format_record_lines(records: &[LocalHistoryRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let machine = record
                .machine_id
                .as_ref()
                .map_or_else(|| MISSING.to_string(), ToString::to_string);
            format!(
                "#{} {}  machine {}  {} -> {}  by {}  ({}, {})",
                record.id,
                record.timestamp,
                machine,
                record.from.as_deref().unwrap_or(MISSING),
                record.to.as_deref().unwrap_or(MISSING),
                record.editor.as_deref().unwrap_or(MISSING),
                record.sync_status,
                record.device_id
            )
        })
        .collect()
}

pub fn format_status_lines(status: &SyncStatusSnapshot) -> Vec<String> {
    vec![
        format!("Device:          {} ({})", status.device_name, status.device_id),
        format!("History entries: {}", status.local_entries),
        format!("Store records:   {}", status.store_entries),
        format!(
            "Cloud:           {}",
            if status.cloud_available {
                "available"
            } else {
                "not configured"
            }
        ),
        format!("Last cloud sync: {}", status.last_cloud_sync),
        format!("Checked at:      {}", status.timestamp),
    ]
}
