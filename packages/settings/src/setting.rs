// ABOUTME: Generic persisted setting: read, validate, convert, cache, write back
// ABOUTME: Concrete variants plug in through the SettingKind trait

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{OnceLock, PoisonError, RwLock};

use async_trait::async_trait;
use latchkey_storage::{StorageError, StorageResult, StoreHandle};
use tracing::{debug, error, warn};

use crate::error::{SettingError, SettingResult};

/// Per-type behaviour of a setting.
///
/// `access` and `convert` must be inverses on every primitive `valid`
/// accepts, and `convert` must succeed for all of them.
#[async_trait]
pub trait SettingKind: Send + Sync + 'static {
    /// Type consumers work with
    type Domain: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
    /// Primitive the backend persists
    type Stored: Clone + fmt::Debug + Send + Sync + 'static;
    /// Backend this kind reads from and writes to
    type Store: ?Sized + Send + Sync + 'static;

    fn access(&self, value: &Self::Domain) -> Self::Stored;

    fn convert(&self, stored: Self::Stored) -> SettingResult<Self::Domain>;

    fn valid(&self, stored: &Self::Stored) -> bool;

    /// Whether the value must be kept out of logs and listings
    fn is_sensitive(&self) -> bool {
        false
    }

    /// Read `key`, mapping the backend's "missing" signal to `None`
    async fn read_primitive(
        &self,
        store: &Self::Store,
        key: &str,
    ) -> StorageResult<Option<Self::Stored>>;

    async fn write_primitive(
        &self,
        store: &Self::Store,
        key: &str,
        value: Self::Stored,
    ) -> StorageResult<bool>;
}

type ChangeCallback<D> = Box<dyn Fn(&D) + Send + Sync>;

/// A single persisted setting.
///
/// The in-memory value is always either the construction default or a value
/// converted from a stored primitive that passed validation.
pub struct Setting<K: SettingKind> {
    key: String,
    kind: K,
    store: StoreHandle<K::Store>,
    value: RwLock<K::Domain>,
    on_change: OnceLock<ChangeCallback<K::Domain>>,
}

impl<K: SettingKind + Default> Setting<K> {
    pub fn new(key: impl Into<String>, default: K::Domain, store: StoreHandle<K::Store>) -> Self {
        Self::with_kind(K::default(), key, default, store)
    }
}

impl<K: SettingKind> Setting<K> {
    pub fn with_kind(
        kind: K,
        key: impl Into<String>,
        default: K::Domain,
        store: StoreHandle<K::Store>,
    ) -> Self {
        Self {
            key: key.into(),
            kind,
            store,
            value: RwLock::new(default),
            on_change: OnceLock::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current in-memory value
    pub fn value(&self) -> K::Domain {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register the change callback. Only one callback can be registered.
    pub fn on_change<F>(&self, callback: F) -> SettingResult<()>
    where
        F: Fn(&K::Domain) + Send + Sync + 'static,
    {
        self.on_change
            .set(Box::new(callback))
            .map_err(|_| SettingError::CallbackAlreadyRegistered(self.key.clone()))
    }

    /// Refresh the in-memory value from the backend.
    ///
    /// Never fails: on any error the current value is kept and returned.
    pub async fn load(&self) -> K::Domain {
        match self.try_load().await {
            Ok(value) => value,
            Err(SettingError::Storage(StorageError::Unavailable(reason))) => {
                warn!("Keeping current value for {}: {}", self.key, reason);
                self.value()
            }
            Err(SettingError::Storage(e)) => {
                warn!("Failed to read setting {}, keeping current value: {}", self.key, e);
                self.value()
            }
            Err(e) => {
                // Validation passed, so this is a defect in the kind itself
                error!("Failed to convert setting {}, keeping current value: {}", self.key, e);
                self.value()
            }
        }
    }

    async fn try_load(&self) -> SettingResult<K::Domain> {
        let store = self.store.acquire()?;
        let fallback = self.kind.access(&self.value());

        let stored = match self.kind.read_primitive(&*store, &self.key).await? {
            Some(stored) if self.kind.valid(&stored) => stored,
            Some(rejected) => {
                if self.kind.is_sensitive() {
                    warn!("Discarding invalid stored value for {}", self.key);
                } else {
                    warn!(
                        "Discarding invalid stored value for {}: {:?}",
                        self.key, rejected
                    );
                }
                fallback
            }
            None => {
                debug!("No stored value for {}, using current value", self.key);
                fallback
            }
        };

        let value = self.kind.convert(stored)?;
        self.set_value(value.clone());

        Ok(value)
    }

    /// Replace the value and persist it.
    ///
    /// `None` is a no-op returning `false`. Otherwise the in-memory value is
    /// updated and the change callback fires before the write is attempted,
    /// so a failed write (returned as `false`) leaves memory ahead of the
    /// backend.
    pub async fn mutate(&self, new_value: Option<K::Domain>) -> bool {
        let Some(value) = new_value else {
            return false;
        };

        self.set_value(value.clone());
        self.notify(&value);

        let store = match self.store.acquire() {
            Ok(store) => store,
            Err(e) => {
                warn!("Cannot persist {}: {}", self.key, e);
                return false;
            }
        };

        let stored = self.kind.access(&value);
        match self.kind.write_primitive(&*store, &self.key, stored).await {
            Ok(true) => {
                debug!("Persisted setting {}", self.key);
                true
            }
            Ok(false) => {
                warn!("Backend did not persist setting {}", self.key);
                false
            }
            Err(e) => {
                error!("Failed to persist setting {}: {}", self.key, e);
                false
            }
        }
    }

    /// Shorthand for `mutate(Some(value))`
    pub async fn set(&self, value: K::Domain) -> bool {
        self.mutate(Some(value)).await
    }

    fn set_value(&self, value: K::Domain) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    fn notify(&self, value: &K::Domain) {
        let Some(callback) = self.on_change.get() else {
            return;
        };

        if panic::catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
            error!("Change callback for {} panicked; persisting anyway", self.key);
        }
    }
}

impl<K: SettingKind> fmt::Debug for Setting<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Setting");
        debug.field("key", &self.key);
        if self.kind.is_sensitive() {
            debug.field("value", &"<redacted>");
        } else {
            debug.field("value", &self.value());
        }
        debug
            .field("store", &self.store)
            .field("has_on_change", &self.on_change.get().is_some())
            .finish()
    }
}
