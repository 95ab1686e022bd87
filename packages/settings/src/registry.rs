// ABOUTME: The application's fixed set of persisted settings
// ABOUTME: Bulk loading, by-key access for outer surfaces, and the process-wide instance

use std::sync::{Arc, OnceLock};

use latchkey_storage::{EncryptedKeyValueStore, KeyValueStore, StoreHandle};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{SettingError, SettingResult};
use crate::kinds::{ColorSetting, EnumSetting, IntSetting, SecretSetting, StringSetting};
use crate::types::{Color, ThemeMode};

pub const THEME_MODE: &str = "theme_mode";
pub const ACCENT_PRIMARY: &str = "accent_primary";
pub const ACCENT_SECONDARY: &str = "accent_secondary";
pub const CREDENTIAL_USERNAME: &str = "credential_username";
pub const CREDENTIAL_PASSWORD: &str = "credential_password";
pub const ENDPOINT_URL: &str = "endpoint_url";
pub const TOPIC_PREFIX: &str = "topic_prefix";
pub const DOMAIN_ID: &str = "domain_id";

/// Every registry key, in load order
pub const KEYS: &[&str] = &[
    THEME_MODE,
    ACCENT_PRIMARY,
    ACCENT_SECONDARY,
    CREDENTIAL_USERNAME,
    CREDENTIAL_PASSWORD,
    ENDPOINT_URL,
    TOPIC_PREFIX,
    DOMAIN_ID,
];

pub const DEFAULT_ACCENT_PRIMARY: Color = Color::from_argb(0xFF3F_51B5);
pub const DEFAULT_ACCENT_SECONDARY: Color = Color::from_argb(0xFFFF_4081);
pub const DEFAULT_TOPIC_PREFIX: &str = "latchkey";
pub const DEFAULT_DOMAIN_ID: i64 = 1;

const MASK: &str = "********";

/// The application's persisted configuration surface
#[derive(Debug)]
pub struct Settings {
    pub theme_mode: EnumSetting<ThemeMode>,
    pub accent_primary: ColorSetting,
    pub accent_secondary: ColorSetting,
    pub credential_username: SecretSetting,
    pub credential_password: SecretSetting,
    pub endpoint_url: StringSetting,
    pub topic_prefix: StringSetting,
    pub domain_id: IntSetting,
}

impl Settings {
    /// Define every setting at its default, bound to the given backends.
    /// Nothing is read until [`Settings::load_all`].
    pub fn new(
        plain: StoreHandle<dyn KeyValueStore>,
        secure: StoreHandle<dyn EncryptedKeyValueStore>,
    ) -> Self {
        Self {
            theme_mode: EnumSetting::new(THEME_MODE, ThemeMode::System, plain.clone()),
            accent_primary: ColorSetting::new(ACCENT_PRIMARY, DEFAULT_ACCENT_PRIMARY, plain.clone()),
            accent_secondary: ColorSetting::new(
                ACCENT_SECONDARY,
                DEFAULT_ACCENT_SECONDARY,
                plain.clone(),
            ),
            credential_username: SecretSetting::new(
                CREDENTIAL_USERNAME,
                String::new(),
                secure.clone(),
            ),
            credential_password: SecretSetting::new(CREDENTIAL_PASSWORD, String::new(), secure),
            endpoint_url: StringSetting::new(ENDPOINT_URL, String::new(), plain.clone()),
            topic_prefix: StringSetting::new(
                TOPIC_PREFIX,
                DEFAULT_TOPIC_PREFIX.to_string(),
                plain.clone(),
            ),
            domain_id: IntSetting::new(DOMAIN_ID, DEFAULT_DOMAIN_ID, plain),
        }
    }

    /// Convenience constructor for stores that are already open
    pub fn with_stores(
        plain: Arc<dyn KeyValueStore>,
        secure: Arc<dyn EncryptedKeyValueStore>,
    ) -> Self {
        Self::new(
            StoreHandle::ready("plain", plain),
            StoreHandle::ready("encrypted", secure),
        )
    }

    /// Load every setting in turn. Each one falls back on its own, so a bad
    /// entry never stops the rest from loading.
    pub async fn load_all(&self) {
        debug!("Loading {} settings", KEYS.len());

        self.theme_mode.load().await;
        self.accent_primary.load().await;
        self.accent_secondary.load().await;
        self.credential_username.load().await;
        self.credential_password.load().await;
        self.endpoint_url.load().await;
        self.topic_prefix.load().await;
        self.domain_id.load().await;

        info!("Settings loaded");
    }

    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    /// Printable current value for `key`; secrets are masked
    pub fn display(&self, key: &str) -> SettingResult<String> {
        let value = match key {
            THEME_MODE => self.theme_mode.value().to_string(),
            ACCENT_PRIMARY => self.accent_primary.value().to_string(),
            ACCENT_SECONDARY => self.accent_secondary.value().to_string(),
            CREDENTIAL_USERNAME => mask(&self.credential_username.value()),
            CREDENTIAL_PASSWORD => mask(&self.credential_password.value()),
            ENDPOINT_URL => self.endpoint_url.value(),
            TOPIC_PREFIX => self.topic_prefix.value(),
            DOMAIN_ID => self.domain_id.value().to_string(),
            _ => return Err(SettingError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Parse `raw` for the setting named `key` and mutate it.
    ///
    /// Parse failures are errors; the returned flag is the persist result.
    pub async fn set_from_str(&self, key: &str, raw: &str) -> SettingResult<bool> {
        let persisted = match key {
            THEME_MODE => self.theme_mode.set(raw.parse()?).await,
            ACCENT_PRIMARY => self.accent_primary.set(raw.parse()?).await,
            ACCENT_SECONDARY => self.accent_secondary.set(raw.parse()?).await,
            CREDENTIAL_USERNAME => self.credential_username.set(raw.to_string()).await,
            CREDENTIAL_PASSWORD => self.credential_password.set(raw.to_string()).await,
            ENDPOINT_URL => self.endpoint_url.set(raw.trim().to_string()).await,
            TOPIC_PREFIX => self.topic_prefix.set(raw.trim().to_string()).await,
            DOMAIN_ID => {
                let id = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| SettingError::InvalidInteger(raw.to_string()))?;
                if id <= 0 {
                    return Err(SettingError::NotPositive {
                        key: DOMAIN_ID,
                        value: id,
                    });
                }
                self.domain_id.set(id).await
            }
            _ => return Err(SettingError::UnknownKey(key.to_string())),
        };
        Ok(persisted)
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            theme_mode: self.theme_mode.value(),
            accent_primary: self.accent_primary.value().to_string(),
            accent_secondary: self.accent_secondary.value().to_string(),
            has_credential_username: !self.credential_username.value().is_empty(),
            has_credential_password: !self.credential_password.value().is_empty(),
            endpoint_url: self.endpoint_url.value(),
            topic_prefix: self.topic_prefix.value(),
            domain_id: self.domain_id.value(),
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        MASK.to_string()
    }
}

/// Serializable view of the registry with secrets reduced to presence flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsSnapshot {
    pub theme_mode: ThemeMode,
    pub accent_primary: String,
    pub accent_secondary: String,
    pub has_credential_username: bool,
    pub has_credential_password: bool,
    pub endpoint_url: String,
    pub topic_prefix: String,
    pub domain_id: i64,
}

static GLOBAL: OnceLock<Settings> = OnceLock::new();

/// Install the process-wide registry. It lives until the process exits.
pub fn install(settings: Settings) -> SettingResult<&'static Settings> {
    GLOBAL
        .set(settings)
        .map_err(|_| SettingError::AlreadyInstalled)?;
    GLOBAL.get().ok_or(SettingError::AlreadyInstalled)
}

/// The process-wide registry, if installed
pub fn global() -> Option<&'static Settings> {
    GLOBAL.get()
}
