// ABOUTME: Error types for the Latchkey CLI
// ABOUTME: Wraps configuration, storage and setting failures seen at startup and in commands

use latchkey_config::ConfigError;
use latchkey_settings::SettingError;
use latchkey_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Setting(#[from] SettingError),

    #[error("{0} was updated in memory but could not be saved")]
    NotPersisted(String),
}

pub type CliResult<T> = Result<T, CliError>;
