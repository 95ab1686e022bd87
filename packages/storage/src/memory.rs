// ABOUTME: In-memory store backends
// ABOUTME: Used for tests and for running without a database file

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{EncryptedKeyValueStore, KeyValueStore};
use crate::{StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq)]
enum Primitive {
    Int(i64),
    Text(String),
}

impl Primitive {
    fn type_name(&self) -> &'static str {
        match self {
            Primitive::Int(_) => "integer",
            Primitive::Text(_) => "string",
        }
    }
}

/// Plain in-memory store.
///
/// Reading a key with the wrong primitive type is an error, not an absence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Primitive>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn mismatch(key: &str, expected: &str, found: &Primitive) -> StorageError {
        StorageError::InvalidInput(format!(
            "Key '{}' holds a {} value, expected {}",
            key,
            found.type_name(),
            expected
        ))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_int(&self, key: &str) -> StorageResult<Option<i64>> {
        match self.entries.read().await.get(key) {
            None => Ok(None),
            Some(Primitive::Int(value)) => Ok(Some(*value)),
            Some(other) => Err(Self::mismatch(key, "integer", other)),
        }
    }

    async fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        match self.entries.read().await.get(key) {
            None => Ok(None),
            Some(Primitive::Text(value)) => Ok(Some(value.clone())),
            Some(other) => Err(Self::mismatch(key, "string", other)),
        }
    }

    async fn set_int(&self, key: &str, value: i64) -> StorageResult<bool> {
        debug!("memory set_int {}", key);
        self.entries
            .write()
            .await
            .insert(key.to_string(), Primitive::Int(value));
        Ok(true)
    }

    async fn set_string(&self, key: &str, value: &str) -> StorageResult<bool> {
        debug!("memory set_string {}", key);
        self.entries
            .write()
            .await
            .insert(key.to_string(), Primitive::Text(value.to_string()));
        Ok(true)
    }
}

/// In-memory store with the encrypted backend's contract: missing keys read
/// back as `""`. Holds plaintext; only the absence semantics are modelled.
#[derive(Debug, Default)]
pub struct MemorySecureStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

#[async_trait]
impl EncryptedKeyValueStore for MemorySecureStore {
    async fn get_string(&self, key: &str) -> StorageResult<String> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_string(&self, key: &str, value: &str) -> StorageResult<bool> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get_int("missing").await.unwrap(), None);
        assert_eq!(store.get_string("missing").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        assert!(store.set_int("count", 42).await.unwrap());
        assert!(store.set_string("name", "front-door").await.unwrap());

        assert_eq!(store.get_int("count").await.unwrap(), Some(42));
        assert_eq!(
            store.get_string("name").await.unwrap().as_deref(),
            Some("front-door")
        );
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_error() {
        let store = MemoryStore::new();
        store.set_string("count", "not a number").await.unwrap();

        let result = store.get_int("count").await;
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_secure_store_missing_is_empty_string() {
        let store = MemorySecureStore::new();
        assert_eq!(store.get_string("secret").await.unwrap(), "");
        assert!(!store.contains("secret").await);

        store.set_string("secret", "hunter2").await.unwrap();
        assert_eq!(store.get_string("secret").await.unwrap(), "hunter2");
    }
}
