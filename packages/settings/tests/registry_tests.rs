// ABOUTME: Integration tests for the settings registry
// ABOUTME: Bulk loading, failure isolation, by-key access, and snapshots

use std::sync::Arc;

use async_trait::async_trait;
use latchkey_settings::registry::{self, KEYS};
use latchkey_settings::{Color, SettingError, Settings, SettingsSnapshot, ThemeMode};
use latchkey_storage::{
    EncryptedKeyValueStore, KeyValueStore, MemorySecureStore, MemoryStore, StorageError,
    StorageResult, StoreHandle,
};
use mockall::mock;
use pretty_assertions::assert_eq;

mock! {
    PlainStore {}

    #[async_trait]
    impl KeyValueStore for PlainStore {
        async fn get_int(&self, key: &str) -> StorageResult<Option<i64>>;
        async fn get_string(&self, key: &str) -> StorageResult<Option<String>>;
        async fn set_int(&self, key: &str, value: i64) -> StorageResult<bool>;
        async fn set_string(&self, key: &str, value: &str) -> StorageResult<bool>;
    }
}

fn memory_registry() -> (Arc<MemoryStore>, Arc<MemorySecureStore>, Settings) {
    let plain = Arc::new(MemoryStore::new());
    let secure = Arc::new(MemorySecureStore::new());
    let settings = Settings::with_stores(plain.clone(), secure.clone());
    (plain, secure, settings)
}

fn default_snapshot() -> SettingsSnapshot {
    SettingsSnapshot {
        theme_mode: ThemeMode::System,
        accent_primary: "#FF3F51B5".to_string(),
        accent_secondary: "#FFFF4081".to_string(),
        has_credential_username: false,
        has_credential_password: false,
        endpoint_url: String::new(),
        topic_prefix: "latchkey".to_string(),
        domain_id: 1,
    }
}

#[tokio::test]
async fn test_load_all_from_empty_backends_keeps_defaults() {
    let (plain, _, settings) = memory_registry();

    settings.load_all().await;

    assert_eq!(settings.snapshot(), default_snapshot());
    assert!(plain.is_empty().await);
}

#[tokio::test]
async fn test_load_all_refines_every_setting() {
    let (plain, secure, settings) = memory_registry();
    plain.set_int("theme_mode", 2).await.unwrap();
    plain.set_int("accent_primary", 0xFF00_0000).await.unwrap();
    plain.set_int("accent_secondary", 0x8000_FF00).await.unwrap();
    plain.set_string("endpoint_url", "mqtts://broker.local:8883").await.unwrap();
    plain.set_string("topic_prefix", "home/front-door").await.unwrap();
    plain.set_int("domain_id", 42).await.unwrap();
    secure.set_string("credential_username", "admin").await.unwrap();
    secure.set_string("credential_password", "hunter2").await.unwrap();

    settings.load_all().await;

    assert_eq!(settings.theme_mode.value(), ThemeMode::Dark);
    assert_eq!(settings.accent_primary.value(), Color::from_argb(0xFF00_0000));
    assert_eq!(settings.accent_secondary.value(), Color::from_argb(0x8000_FF00));
    assert_eq!(settings.endpoint_url.value(), "mqtts://broker.local:8883");
    assert_eq!(settings.topic_prefix.value(), "home/front-door");
    assert_eq!(settings.domain_id.value(), 42);
    assert_eq!(settings.credential_username.value(), "admin");
    assert_eq!(settings.credential_password.value(), "hunter2");
}

#[tokio::test]
async fn test_one_failing_read_does_not_block_the_rest() {
    let mut mock = MockPlainStore::new();
    mock.expect_get_int().returning(|key| match key {
        "domain_id" => Err(StorageError::Unavailable("disk went away".to_string())),
        "theme_mode" => Ok(Some(1)),
        "accent_primary" => Ok(Some(0xFF11_2233)),
        _ => Ok(None),
    });
    mock.expect_get_string().returning(|key| match key {
        "topic_prefix" => Ok(Some("garage".to_string())),
        _ => Ok(None),
    });
    mock.expect_set_int().never();
    mock.expect_set_string().never();

    let plain: Arc<dyn KeyValueStore> = Arc::new(mock);
    let secure = Arc::new(MemorySecureStore::new());
    secure.set_string("credential_username", "admin").await.unwrap();

    let settings = Settings::with_stores(plain, secure);
    settings.load_all().await;

    assert_eq!(settings.domain_id.value(), registry::DEFAULT_DOMAIN_ID);
    assert_eq!(settings.theme_mode.value(), ThemeMode::Light);
    assert_eq!(settings.accent_primary.value(), Color::from_argb(0xFF11_2233));
    assert_eq!(settings.accent_secondary.value(), registry::DEFAULT_ACCENT_SECONDARY);
    assert_eq!(settings.topic_prefix.value(), "garage");
    assert_eq!(settings.credential_username.value(), "admin");
}

#[tokio::test]
async fn test_corrupt_entries_fall_back_individually() {
    let (plain, secure, settings) = memory_registry();
    plain.set_int("theme_mode", 17).await.unwrap();
    plain.set_int("accent_primary", -3).await.unwrap();
    plain.set_string("domain_id", "not a number").await.unwrap();
    plain.set_string("topic_prefix", "kept").await.unwrap();
    secure.set_string("credential_password", "").await.unwrap();

    settings.load_all().await;

    let mut expected = default_snapshot();
    expected.topic_prefix = "kept".to_string();
    assert_eq!(settings.snapshot(), expected);
}

#[tokio::test]
async fn test_secure_backend_not_ready_only_affects_secrets() {
    let plain = Arc::new(MemoryStore::new());
    plain.set_int("domain_id", 3).await.unwrap();

    let plain_store: Arc<dyn KeyValueStore> = plain.clone();
    let secure: StoreHandle<dyn EncryptedKeyValueStore> = StoreHandle::pending("encrypted");
    let settings = Settings::new(StoreHandle::ready("plain", plain_store), secure.clone());

    settings.load_all().await;
    assert_eq!(settings.domain_id.value(), 3);
    assert_eq!(settings.credential_password.value(), "");
    assert!(!settings.credential_password.set("pw".to_string()).await);

    let store = Arc::new(MemorySecureStore::new());
    store.set_string("credential_password", "stored").await.unwrap();
    secure.install(store).unwrap();

    settings.credential_password.load().await;
    assert_eq!(settings.credential_password.value(), "stored");
}

#[tokio::test]
async fn test_set_from_str_parses_and_persists() {
    let (plain, secure, settings) = memory_registry();

    assert!(settings.set_from_str("theme_mode", "dark").await.unwrap());
    assert!(settings.set_from_str("accent_primary", "#00FF00").await.unwrap());
    assert!(settings.set_from_str("domain_id", " 12 ").await.unwrap());
    assert!(settings.set_from_str("topic_prefix", "porch").await.unwrap());
    assert!(settings.set_from_str("credential_password", "s3cret").await.unwrap());

    assert_eq!(plain.get_int("theme_mode").await.unwrap(), Some(2));
    assert_eq!(plain.get_int("accent_primary").await.unwrap(), Some(0xFF00_FF00));
    assert_eq!(plain.get_int("domain_id").await.unwrap(), Some(12));
    assert_eq!(plain.get_string("topic_prefix").await.unwrap().as_deref(), Some("porch"));
    assert_eq!(secure.get_string("credential_password").await.unwrap(), "s3cret");
}

#[tokio::test]
async fn test_set_from_str_rejects_bad_input() {
    let (plain, _, settings) = memory_registry();

    assert!(matches!(
        settings.set_from_str("theme_mode", "sepia").await,
        Err(SettingError::InvalidThemeMode(_))
    ));
    assert!(matches!(
        settings.set_from_str("accent_primary", "green").await,
        Err(SettingError::InvalidColor(_))
    ));
    assert!(matches!(
        settings.set_from_str("domain_id", "4.5").await,
        Err(SettingError::InvalidInteger(_))
    ));
    assert!(matches!(
        settings.set_from_str("domain_id", "0").await,
        Err(SettingError::NotPositive { value: 0, .. })
    ));
    assert!(matches!(
        settings.set_from_str("domain_id", "-5").await,
        Err(SettingError::NotPositive { value: -5, .. })
    ));
    assert!(matches!(
        settings.set_from_str("volume", "11").await,
        Err(SettingError::UnknownKey(_))
    ));

    assert!(plain.is_empty().await);
    assert_eq!(settings.snapshot(), default_snapshot());
}

#[tokio::test]
async fn test_display_masks_secrets() {
    let (_, _, settings) = memory_registry();
    settings.credential_password.set("hunter2".to_string()).await;

    assert_eq!(settings.display("credential_password").unwrap(), "********");
    assert_eq!(settings.display("credential_username").unwrap(), "");
    assert_eq!(settings.display("accent_secondary").unwrap(), "#FFFF4081");
    assert_eq!(settings.display("theme_mode").unwrap(), "system");
    assert!(settings.display("volume").is_err());

    for key in KEYS {
        assert!(settings.display(key).is_ok(), "no display for {}", key);
    }
}

#[tokio::test]
async fn test_snapshot_serializes_without_secrets() {
    let (_, _, settings) = memory_registry();
    settings.credential_password.set("hunter2".to_string()).await;

    let json = serde_json::to_value(settings.snapshot()).unwrap();

    assert_eq!(json["theme_mode"], "system");
    assert_eq!(json["has_credential_password"], true);
    assert!(!json.to_string().contains("hunter2"));
}

#[tokio::test]
async fn test_global_registry_installs_once() {
    let (_, _, first) = memory_registry();
    let installed = registry::install(first).unwrap();
    assert!(std::ptr::eq(installed, registry::global().unwrap()));

    let (_, _, second) = memory_registry();
    assert!(matches!(
        registry::install(second),
        Err(SettingError::AlreadyInstalled)
    ));
}
