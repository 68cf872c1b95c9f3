//! Sync metadata repository implementation

use crate::error::Result;
use libsql::Connection;

/// Keys written by the import flow
pub const LAST_IMPORT_AT_KEY: &str = "last_import_at";
pub const LAST_IMPORT_SOURCE_KEY: &str = "last_import_source";

/// Trait for sync metadata key-value storage (async)
#[allow(async_fn_in_trait)]
pub trait MetadataRepository {
    /// Read a metadata value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a metadata value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// libSQL implementation of `MetadataRepository`
pub struct LibSqlMetadataRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMetadataRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl MetadataRepository for LibSqlMetadataRepository<'_> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM sync_metadata WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO sync_metadata (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_key_is_none() {
        let db = setup().await;
        let repo = LibSqlMetadataRepository::new(db.connection());

        assert_eq!(repo.get(LAST_IMPORT_AT_KEY).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_overwrites_value() {
        let db = setup().await;
        let repo = LibSqlMetadataRepository::new(db.connection());

        repo.set(LAST_IMPORT_SOURCE_KEY, "a.json").await.unwrap();
        repo.set(LAST_IMPORT_SOURCE_KEY, "b.json").await.unwrap();

        assert_eq!(
            repo.get(LAST_IMPORT_SOURCE_KEY).await.unwrap().as_deref(),
            Some("b.json")
        );
    }
}
