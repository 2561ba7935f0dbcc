//! Local-storage backend — shared origin key-value store with no domain
//! attributes and no backend-enforced expiry. Logical expiry of identity
//! records is the session store's job.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{BackendKind, StorageBackend};

/// Shared page-level key-value store modeling origin local storage.
/// Clones share state, like the cookie jar. Can be marked unavailable to
/// model a browser that blocks storage access.
#[derive(Clone, Default)]
pub struct LocalStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
    blocked: Arc<AtomicBool>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the browser denying storage access for this page.
    pub fn block(&self) {
        self.blocked.store(true, Ordering::SeqCst);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if self.is_blocked() {
            return None;
        }
        let map = self.inner.lock().expect("local store lock poisoned");
        map.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) -> bool {
        if self.is_blocked() {
            return false;
        }
        let mut map = self.inner.lock().expect("local store lock poisoned");
        map.insert(key.to_string(), value.to_string());
        true
    }

    pub fn delete(&self, key: &str) {
        if self.is_blocked() {
            return;
        }
        let mut map = self.inner.lock().expect("local store lock poisoned");
        map.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Local-storage variant of [`StorageBackend`]. The ttl argument is ignored;
/// the backend keeps values until removed, and callers compare stored
/// timestamps to enforce lifetime.
pub struct LocalStorage {
    store: LocalStore,
}

impl LocalStorage {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }
}

impl StorageBackend for LocalStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    fn write(&self, key: &str, value: &str, _ttl_secs: i64) -> bool {
        let accepted = self.store.set(key, value);
        if !accepted {
            tracing::debug!(key = %key, "local storage write refused, access blocked");
        }
        accepted
    }

    fn remove(&self, key: &str) {
        self.store.delete(key);
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }
}
