// ABOUTME: Secret handling for Latchkey settings
// ABOUTME: Provides value encryption and the encrypted SQLite settings store

pub mod encryption;
pub mod secure_store;

// Re-export main types for convenience
pub use encryption::{EncryptionError, EncryptionMode, SecretCipher};
pub use secure_store::{EncryptedSqliteStore, KeySource};
