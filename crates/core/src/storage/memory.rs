//! In-memory backend — scoped to one tracker instance, never survives a
//! reload. Used when durable storage is unavailable or anonymization
//! forbids persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{BackendKind, StorageBackend};

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("memory store lock poisoned");
        entries.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str, _ttl_secs: i64) -> bool {
        let mut entries = self.entries.lock().expect("memory store lock poisoned");
        entries.insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().expect("memory store lock poisoned");
        entries.remove(key);
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let storage = MemoryStorage::new();
        assert!(storage.write("_bc_1id", "value", 60));
        assert_eq!(storage.read("_bc_1id").as_deref(), Some("value"));
    }

    #[test]
    fn remove_deletes_value() {
        let storage = MemoryStorage::new();
        storage.write("_bc_1id", "value", 60);
        storage.remove("_bc_1id");
        assert_eq!(storage.read("_bc_1id"), None);
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = MemoryStorage::new();
        let b = MemoryStorage::new();
        a.write("_bc_1id", "value", 60);
        assert_eq!(b.read("_bc_1id"), None);
    }

    #[test]
    fn kind_is_memory() {
        assert_eq!(MemoryStorage::new().kind(), BackendKind::Memory);
    }
}
