// ABOUTME: Async contracts for primitive key-value backends
// ABOUTME: Plain store signals absence with None, encrypted store with an empty string

use async_trait::async_trait;

use crate::StorageResult;

/// Plain key-value backend.
///
/// Absence is a genuine `None`, distinguishable from any stored value.
/// Setters return whether the value was durably written.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_int(&self, key: &str) -> StorageResult<Option<i64>>;

    async fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set_int(&self, key: &str, value: i64) -> StorageResult<bool>;

    async fn set_string(&self, key: &str, value: &str) -> StorageResult<bool>;
}

/// Encrypted key-value backend.
///
/// Cannot represent absence: `get_string` returns `""` when nothing is stored
/// for `key`. Callers that need "missing" semantics must treat the empty string
/// as absent themselves.
#[async_trait]
pub trait EncryptedKeyValueStore: Send + Sync {
    async fn get_string(&self, key: &str) -> StorageResult<String>;

    async fn set_string(&self, key: &str, value: &str) -> StorageResult<bool>;
}
