//! Error types for layout-core

use thiserror::Error;

/// Result type alias using layout-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in layout-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Embedded database or remote backend is not available in this environment
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Malformed import document
    #[error("Invalid history format: {0}")]
    InvalidFormat(String),

    /// A single store write was rejected
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    /// Credential mismatch at sign-in. The message never says which part was wrong.
    #[error("Email or password is incorrect")]
    AuthRejected,

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote backend API error
    #[error("Remote backend error: {0}")]
    Remote(String),

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
