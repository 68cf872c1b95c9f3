//! Embedded database layer

mod connection;
mod history_log_repository;
mod history_repository;
mod metadata_repository;
mod migrations;
mod values;

pub use connection::{Database, DATABASE_FILE_NAME};
pub use history_log_repository::LibSqlHistoryLogRepository;
pub use history_repository::{HistoryRepository, LibSqlHistoryRepository};
pub use metadata_repository::{
    LibSqlMetadataRepository, MetadataRepository, LAST_IMPORT_AT_KEY, LAST_IMPORT_SOURCE_KEY,
};
pub use migrations::CURRENT_VERSION as SCHEMA_VERSION;
