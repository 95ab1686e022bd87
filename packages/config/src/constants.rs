// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Latchkey

// Storage Location
pub const LATCHKEY_DATA_DIR: &str = "LATCHKEY_DATA_DIR";
pub const LATCHKEY_DB_PATH: &str = "LATCHKEY_DB_PATH";

// Database Pool
pub const LATCHKEY_MAX_CONNECTIONS: &str = "LATCHKEY_MAX_CONNECTIONS";
pub const LATCHKEY_BUSY_TIMEOUT_SECS: &str = "LATCHKEY_BUSY_TIMEOUT_SECS";

// Secret Encryption
pub const LATCHKEY_SECRET_PASSWORD: &str = "LATCHKEY_SECRET_PASSWORD";

// Logging
pub const LATCHKEY_LOG: &str = "LATCHKEY_LOG";

/// Name of the data directory under the user's home
pub const DATA_DIR_NAME: &str = ".latchkey";

/// File name of the settings database inside the data directory
pub const DATABASE_FILE_NAME: &str = "settings.db";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "warn";
