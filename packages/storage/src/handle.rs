// ABOUTME: Injectable backend handle that may not be ready yet
// ABOUTME: Settings acquire their store through this slot at call time

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::{StorageError, StorageResult};

/// Shared, install-once slot for a store.
///
/// Clones share the same slot, so a handle given to many settings at
/// definition time becomes usable for all of them once the store is installed.
pub struct StoreHandle<S: ?Sized> {
    name: &'static str,
    slot: Arc<OnceLock<Arc<S>>>,
}

impl<S: ?Sized> StoreHandle<S> {
    /// Create an empty handle. `acquire` fails until `install` is called.
    pub fn pending(name: &'static str) -> Self {
        Self {
            name,
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// Create a handle that is immediately usable.
    pub fn ready(name: &'static str, store: Arc<S>) -> Self {
        let handle = Self::pending(name);
        // Fresh slot, cannot already be set
        let _ = handle.slot.set(store);
        handle
    }

    /// Install the backing store. Only the first install takes effect.
    pub fn install(&self, store: Arc<S>) -> StorageResult<()> {
        self.slot.set(store).map_err(|_| {
            StorageError::InvalidInput(format!("{} store is already installed", self.name))
        })
    }

    pub fn acquire(&self) -> StorageResult<Arc<S>> {
        self.slot
            .get()
            .cloned()
            .ok_or_else(|| StorageError::Unavailable(format!("{} store is not initialized", self.name)))
    }

    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<S: ?Sized> Clone for StoreHandle<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<S: ?Sized> fmt::Debug for StoreHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("name", &self.name)
            .field("ready", &self.is_ready())
            .finish()
    }
}
