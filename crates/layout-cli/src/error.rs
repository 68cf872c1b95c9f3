use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] layout_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Device name cannot be empty")]
    EmptyDeviceName,
    #[error(
        "No operator accounts are configured. Add a `credentials` table to the config file."
    )]
    NoCredentials,
    #[error(
        "Remote backend is not configured. Set LAYOUT_SUPABASE_URL and LAYOUT_SUPABASE_ANON_KEY or add supabase_url/supabase_anon_key to the config file."
    )]
    RemoteNotConfigured,
}
