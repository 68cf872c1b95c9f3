//! Application configuration.
//!
//! Read from `<config_dir>/layout/config.json`, then overridden by
//! environment variables. Remote credentials are public anon keys; operator
//! passwords live in the `credentials` table.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::CredentialTable;
use crate::db::DATABASE_FILE_NAME;
use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const SUPABASE_URL_ENV: &str = "LAYOUT_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "LAYOUT_SUPABASE_ANON_KEY";
pub const DB_PATH_ENV: &str = "LAYOUT_DB_PATH";

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR_NAME: &str = "layout";
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub watch_interval_secs: Option<u64>,
    #[serde(default)]
    pub credentials: CredentialTable,
}

/// Connection settings for the hosted backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub anon_key: String,
}

pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("Failed to resolve config directory".to_string()))
}

pub fn default_db_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(DATABASE_FILE_NAME))
        .ok_or_else(|| Error::Config("Failed to resolve data directory".to_string()))
}

impl AppConfig {
    /// Load from `path`; a missing file yields the default configuration.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!(
                "Failed to parse config at {}: {}",
                path.display(),
                error
            ))
        })?;
        config.normalize();
        Ok(config)
    }

    /// Apply `LAYOUT_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = normalize_text_option(lookup(SUPABASE_URL_ENV)) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = normalize_text_option(lookup(SUPABASE_ANON_KEY_ENV)) {
            self.supabase_anon_key = Some(key);
        }
        if let Some(path) = normalize_text_option(lookup(DB_PATH_ENV)) {
            self.db_path = Some(PathBuf::from(path));
        }
    }

    /// Configured database path, or the default under the data directory.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(
            self.watch_interval_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_WATCH_INTERVAL_SECS),
        )
    }

    /// Remote settings when both URL and key are present.
    ///
    /// Only one of the two being set is a configuration error.
    pub fn remote_settings(&self) -> Result<Option<RemoteSettings>> {
        let url = normalize_text_option(self.supabase_url.clone());
        let anon_key = normalize_text_option(self.supabase_anon_key.clone());

        match (url, anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => {
                if !is_http_url(&url) {
                    return Err(Error::Config(
                        "supabase_url must include http:// or https://".to_string(),
                    ));
                }
                Ok(Some(RemoteSettings {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key,
                }))
            }
            _ => Err(Error::Config(
                "supabase_url and supabase_anon_key must be set together".to_string(),
            )),
        }
    }

    fn normalize(&mut self) {
        self.supabase_url = normalize_text_option(self.supabase_url.take());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key.take());
    }
}
