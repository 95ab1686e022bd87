// ABOUTME: Runtime configuration for Latchkey settings storage
// ABOUTME: Resolves database location, pool tuning, and secret mode from the environment

pub mod constants;

use std::env;
use std::fmt;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidNumber(&'static str, ParseIntError),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("Unable to determine home directory; set LATCHKEY_DATA_DIR")]
    NoHomeDirectory,
}

/// `$LATCHKEY_DATA_DIR`, else `~/.latchkey`
fn resolve_data_dir(lookup: &dyn Fn(&str) -> Option<String>) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = lookup(LATCHKEY_DATA_DIR).filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    // HOME first so tests can redirect it
    if let Some(home) = lookup("HOME").filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home).join(DATA_DIR_NAME));
    }

    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Storage configuration resolved at startup
#[derive(Clone)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
    /// Password for at-rest encryption of secret settings. `None` selects the
    /// machine-derived key.
    pub secret_password: Option<String>,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup(LATCHKEY_DB_PATH).filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => resolve_data_dir(&lookup)?.join(DATABASE_FILE_NAME),
        };

        let max_connections =
            parse_positive(&lookup, LATCHKEY_MAX_CONNECTIONS, DEFAULT_MAX_CONNECTIONS)?;
        let busy_timeout_secs =
            parse_positive(&lookup, LATCHKEY_BUSY_TIMEOUT_SECS, DEFAULT_BUSY_TIMEOUT_SECS)?;

        let secret_password = lookup(LATCHKEY_SECRET_PASSWORD).filter(|p| !p.is_empty());

        let config = Self {
            database_path,
            max_connections,
            busy_timeout_secs,
            secret_password,
        };
        debug!("Resolved store config: {:?}", config);

        Ok(config)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_path", &self.database_path)
            .field("max_connections", &self.max_connections)
            .field("busy_timeout_secs", &self.busy_timeout_secs)
            .field("password_mode", &self.secret_password.is_some())
            .finish()
    }
}

/// Parse `name` as a positive integer of the target width; values that do not
/// fit are rejected rather than truncated
fn parse_positive<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = ParseIntError> + Default + PartialEq,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };

    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidNumber(name, e))?;

    if value == T::default() {
        return Err(ConfigError::NotPositive(name));
    }

    Ok(value)
}
