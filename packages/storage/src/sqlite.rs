// ABOUTME: SQLite-backed plain key-value store
// ABOUTME: One row per key with separate integer and text columns

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::store::KeyValueStore;
use crate::{StorageError, StorageResult};

/// Connection settings for [`SqliteStore`]
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    pub path: PathBuf,
    pub enable_wal: bool,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl SqliteStoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enable_wal: true,
            max_connections: 5,
            busy_timeout_seconds: 30,
        }
    }
}

/// SQLite implementation of [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file described by `config`
    pub async fn connect(config: &SqliteStoreConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let journal_mode = if config.enable_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(journal_mode)
            .busy_timeout(Duration::from_secs(config.busy_timeout_seconds))
            .foreign_keys(true);

        debug!("Opening settings database at: {}", config.path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.busy_timeout_seconds))
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database. Single connection so every query sees the
    /// same database.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the settings table if missing
    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY NOT NULL,
                int_value INTEGER,
                text_value TEXT,
                updated_at TEXT NOT NULL DEFAULT (datetime('now', 'utc'))
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Underlying pool, shared with the encrypted store
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_row(&self, key: &str) -> StorageResult<Option<(Option<i64>, Option<String>)>> {
        let row = sqlx::query_as::<_, (Option<i64>, Option<String>)>(
            "SELECT int_value, text_value FROM settings WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_int(&self, key: &str) -> StorageResult<Option<i64>> {
        debug!("Reading integer setting: {}", key);

        match self.fetch_row(key).await? {
            None => Ok(None),
            Some((Some(value), _)) => Ok(Some(value)),
            Some((None, _)) => Err(StorageError::InvalidInput(format!(
                "Key '{}' does not hold an integer value",
                key
            ))),
        }
    }

    async fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        debug!("Reading string setting: {}", key);

        match self.fetch_row(key).await? {
            None => Ok(None),
            Some((_, Some(value))) => Ok(Some(value)),
            Some((_, None)) => Err(StorageError::InvalidInput(format!(
                "Key '{}' does not hold a string value",
                key
            ))),
        }
    }

    async fn set_int(&self, key: &str, value: i64) -> StorageResult<bool> {
        debug!("Writing integer setting: {}", key);

        let result = sqlx::query(
            r#"
            INSERT INTO settings (key, int_value, text_value)
            VALUES (?, ?, NULL)
            ON CONFLICT(key) DO UPDATE SET
                int_value = excluded.int_value,
                text_value = NULL,
                updated_at = datetime('now', 'utc')
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_string(&self, key: &str, value: &str) -> StorageResult<bool> {
        debug!("Writing string setting: {}", key);

        let result = sqlx::query(
            r#"
            INSERT INTO settings (key, int_value, text_value)
            VALUES (?, NULL, ?)
            ON CONFLICT(key) DO UPDATE SET
                int_value = NULL,
                text_value = excluded.text_value,
                updated_at = datetime('now', 'utc')
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let store = SqliteStore::in_memory().await.unwrap();

        assert_eq!(store.get_int("domain_id").await.unwrap(), None);
        assert!(store.set_int("domain_id", 7).await.unwrap());
        assert_eq!(store.get_int("domain_id").await.unwrap(), Some(7));

        assert!(store.set_string("topic_prefix", "door").await.unwrap());
        assert_eq!(
            store.get_string("topic_prefix").await.unwrap().as_deref(),
            Some("door")
        );
    }

    #[tokio::test]
    async fn test_overwrite_changes_type() {
        let store = SqliteStore::in_memory().await.unwrap();

        store.set_int("key", 1).await.unwrap();
        store.set_string("key", "text").await.unwrap();

        assert!(store.get_int("key").await.is_err());
        assert_eq!(store.get_string("key").await.unwrap().as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn test_empty_string_is_stored() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.set_string("endpoint_url", "").await.unwrap();
        assert_eq!(store.get_string("endpoint_url").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let temp_dir = TempDir::new().unwrap();
        let config = SqliteStoreConfig::new(temp_dir.path().join("nested").join("settings.db"));

        {
            let store = SqliteStore::connect(&config).await.unwrap();
            store.set_int("theme_mode", 2).await.unwrap();
            store.pool().close().await;
        }

        let store = SqliteStore::connect(&config).await.unwrap();
        assert_eq!(store.get_int("theme_mode").await.unwrap(), Some(2));
    }
}
