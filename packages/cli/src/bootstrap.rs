// ABOUTME: Process startup for the CLI: logging, storage backends, and the settings registry
// ABOUTME: Opens SQLite-backed plain and encrypted stores and loads every setting

use std::sync::Arc;

use latchkey_config::constants::{DEFAULT_LOG_FILTER, LATCHKEY_LOG};
use latchkey_config::StoreConfig;
use latchkey_security::{EncryptedSqliteStore, KeySource};
use latchkey_settings::Settings;
use latchkey_storage::{
    EncryptedKeyValueStore, KeyValueStore, SqliteStore, SqliteStoreConfig, StoreHandle,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

/// Install the global tracing subscriber.
///
/// `LATCHKEY_LOG` wins over `RUST_LOG`; with neither set only warnings are shown.
/// Output goes to stderr so command output stays clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LATCHKEY_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A subscriber may already be set (tests); that's fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn key_source(config: &StoreConfig) -> KeySource {
    match &config.secret_password {
        Some(password) => KeySource::Password(password.clone()),
        None => KeySource::Machine,
    }
}

pub async fn open_plain(config: &StoreConfig) -> CliResult<SqliteStore> {
    let sqlite_config = SqliteStoreConfig {
        path: config.database_path.clone(),
        enable_wal: true,
        max_connections: config.max_connections,
        busy_timeout_seconds: config.busy_timeout_secs,
    };
    let store = SqliteStore::connect(&sqlite_config).await?;
    info!("Opened settings database at {}", config.database_path.display());
    Ok(store)
}

/// Open the encrypted store on the plain store's pool
pub async fn open_secure(
    plain: &SqliteStore,
    config: &StoreConfig,
) -> CliResult<EncryptedSqliteStore> {
    let store = EncryptedSqliteStore::open(plain.pool().clone(), key_source(config)).await?;
    info!("Opened secret settings ({} mode)", store.mode());
    Ok(store)
}

/// Define the registry against pending store handles, install whichever
/// backends open, then load every setting.
///
/// A backend that fails to open stays pending: its settings keep their
/// defaults and writes to them report failure. Startup itself never aborts.
pub async fn open_settings(config: &StoreConfig) -> Settings {
    let plain: StoreHandle<dyn KeyValueStore> = StoreHandle::pending("sqlite");
    let secure: StoreHandle<dyn EncryptedKeyValueStore> = StoreHandle::pending("encrypted-sqlite");
    let settings = Settings::new(plain.clone(), secure.clone());

    match open_plain(config).await {
        Ok(store) => {
            match open_secure(&store, config).await {
                Ok(secret_store) => {
                    let secret_store: Arc<dyn EncryptedKeyValueStore> = Arc::new(secret_store);
                    install(&secure, secret_store);
                }
                Err(e) => warn!(
                    "{} store unavailable, secrets keep their defaults: {}",
                    secure.name(),
                    e
                ),
            }
            let store: Arc<dyn KeyValueStore> = Arc::new(store);
            install(&plain, store);
        }
        Err(e) => warn!(
            "{} store unavailable, settings keep their defaults: {}",
            plain.name(),
            e
        ),
    }

    settings.load_all().await;
    settings
}

fn install<S: ?Sized>(handle: &StoreHandle<S>, store: Arc<S>) {
    if let Err(e) = handle.install(store) {
        warn!("Could not install {} store: {}", handle.name(), e);
    }
}
