// ABOUTME: Primitive key-value storage for Latchkey settings
// ABOUTME: Plain and encrypted store contracts, handles, and in-memory/SQLite backends

pub mod handle;
pub mod memory;
pub mod sqlite;
pub mod store;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Encryption error: {0}")]
    Encryption(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// Re-export main types
pub use handle::StoreHandle;
pub use memory::{MemorySecureStore, MemoryStore};
pub use sqlite::{SqliteStore, SqliteStoreConfig};
pub use store::{EncryptedKeyValueStore, KeyValueStore};
