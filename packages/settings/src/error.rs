// ABOUTME: Error types for the settings layer
// ABOUTME: Conversion, parsing and registry errors

use latchkey_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ordinal {ordinal} is out of range for {type_name} ({len} variants)")]
    InvalidOrdinal {
        ordinal: i64,
        type_name: &'static str,
        len: usize,
    },

    #[error("Color value {0} does not fit in 32 unsigned bits")]
    ColorOutOfRange(i64),

    #[error("Invalid color: {0}. Expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),

    #[error("Invalid theme mode: {0}. Must be one of: system, light, dark")]
    InvalidThemeMode(String),

    #[error("Invalid integer value: {0}")]
    InvalidInteger(String),

    #[error("{key} must be a positive integer, got {value}")]
    NotPositive { key: &'static str, value: i64 },

    #[error("Unknown setting key: {0}")]
    UnknownKey(String),

    #[error("Change callback already registered for {0}")]
    CallbackAlreadyRegistered(String),

    #[error("Settings registry is already installed")]
    AlreadyInstalled,
}

pub type SettingResult<T> = Result<T, SettingError>;
