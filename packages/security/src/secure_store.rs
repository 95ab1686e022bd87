// ABOUTME: Encrypted key-value store on SQLite
// ABOUTME: Secret settings live in their own table, encrypted with SecretCipher

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::encryption::{EncryptionError, EncryptionMode, SecretCipher};
use latchkey_storage::{EncryptedKeyValueStore, StorageError, StorageResult};

const META_SALT: &str = "salt";
const META_VERIFIER: &str = "verifier";
const META_MODE: &str = "mode";

/// How to obtain the cipher when opening the store
#[derive(Clone)]
pub enum KeySource {
    Machine,
    Password(String),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Machine => f.write_str("Machine"),
            KeySource::Password(_) => f.write_str("Password(..)"),
        }
    }
}

fn encryption_err(context: &str, err: EncryptionError) -> StorageError {
    StorageError::Encryption(format!("{}: {}", context, err))
}

/// SQLite implementation of [`EncryptedKeyValueStore`].
///
/// A missing key reads back as `""`, and `""` is written as `""`.
pub struct EncryptedSqliteStore {
    pool: SqlitePool,
    cipher: SecretCipher,
}

impl EncryptedSqliteStore {
    /// Open the store on `pool`, deriving the cipher from `source`.
    ///
    /// Password mode creates a salt and password verifier on first use and
    /// rejects a different password afterwards.
    pub async fn open(pool: SqlitePool, source: KeySource) -> StorageResult<Self> {
        Self::ensure_schema(&pool).await?;

        let cipher = match source {
            KeySource::Machine => SecretCipher::with_machine_key().map_err(|e| {
                tracing::error!("Failed to initialize secret encryption: {}", e);
                tracing::error!("This is likely due to:");
                tracing::error!("  - Unable to get machine ID");
                tracing::error!("  - Unable to get hostname");
                encryption_err("Failed to derive machine key", e)
            })?,
            KeySource::Password(password) => Self::password_cipher(&pool, &password).await?,
        };

        Self::with_cipher(pool, cipher).await
    }

    /// Open the store with an already constructed cipher
    pub async fn with_cipher(pool: SqlitePool, cipher: SecretCipher) -> StorageResult<Self> {
        Self::ensure_schema(&pool).await?;

        let mode = cipher.mode();
        match get_meta(&pool, META_MODE).await? {
            Some(previous) if previous != mode.as_str() => {
                warn!(
                    "Secret settings were written in {} mode but are now opened in {} mode; existing secrets will not decrypt",
                    previous, mode
                );
                set_meta(&pool, META_MODE, mode.as_str()).await?;
            }
            Some(_) => {}
            None => set_meta(&pool, META_MODE, mode.as_str()).await?,
        }

        Ok(Self { pool, cipher })
    }

    pub fn mode(&self) -> EncryptionMode {
        self.cipher.mode()
    }

    async fn ensure_schema(pool: &SqlitePool) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS secure_settings (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now', 'utc'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS secure_meta (
                name TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn password_cipher(pool: &SqlitePool, password: &str) -> StorageResult<SecretCipher> {
        let salt = match get_meta(pool, META_SALT).await? {
            Some(encoded) => hex::decode(&encoded).map_err(|_| {
                StorageError::Encryption("Stored salt is not valid hex".to_string())
            })?,
            None => {
                debug!("Creating salt for password-based secret encryption");
                let salt = SecretCipher::generate_salt()
                    .map_err(|e| encryption_err("Failed to generate salt", e))?;
                set_meta(pool, META_SALT, &hex::encode(&salt)).await?;
                salt
            }
        };

        match get_meta(pool, META_VERIFIER).await? {
            Some(encoded) => {
                let verifier = hex::decode(&encoded).map_err(|_| {
                    StorageError::Encryption("Stored password verifier is not valid hex".to_string())
                })?;
                let matches = SecretCipher::verify_password(password, &salt, &verifier)
                    .map_err(|e| encryption_err("Failed to verify password", e))?;
                if !matches {
                    return Err(encryption_err(
                        "Password rejected",
                        EncryptionError::InvalidPassword,
                    ));
                }
            }
            None => {
                let verifier = SecretCipher::password_verifier(password, &salt)
                    .map_err(|e| encryption_err("Failed to hash password", e))?;
                set_meta(pool, META_VERIFIER, &hex::encode(verifier)).await?;
            }
        }

        SecretCipher::with_password(password, &salt)
            .map_err(|e| encryption_err("Failed to derive password key", e))
    }
}

async fn get_meta(pool: &SqlitePool, name: &str) -> StorageResult<Option<String>> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM secure_meta WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

async fn set_meta(pool: &SqlitePool, name: &str, value: &str) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO secure_meta (name, value) VALUES (?, ?)
        ON CONFLICT(name) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(name)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait]
impl EncryptedKeyValueStore for EncryptedSqliteStore {
    async fn get_string(&self, key: &str) -> StorageResult<String> {
        debug!("Reading secret setting: {}", key);

        let stored =
            sqlx::query_scalar::<_, String>("SELECT value FROM secure_settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match stored {
            None => Ok(String::new()),
            Some(ciphertext) => self
                .cipher
                .decrypt(&ciphertext)
                .map_err(|e| encryption_err(&format!("Failed to decrypt '{}'", key), e)),
        }
    }

    async fn set_string(&self, key: &str, value: &str) -> StorageResult<bool> {
        debug!("Writing secret setting: {}", key);

        let ciphertext = self
            .cipher
            .encrypt(value)
            .map_err(|e| encryption_err(&format!("Failed to encrypt '{}'", key), e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO secure_settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now', 'utc')
            "#,
        )
        .bind(key)
        .bind(ciphertext)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
