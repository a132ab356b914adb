//! In-memory slot store for tests and ephemeral sessions.

use dashmap::DashMap;

use super::{StorageResult, StorageSlot};

/// Thread-safe in-memory slot store.
#[derive(Default)]
pub struct MemorySlotStore {
    slots: DashMap<String, String>,
}

impl MemorySlotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl StorageSlot for MemorySlotStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.get(key).map(|entry| entry.value().clone()))
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_key_is_none() {
        let store = MemorySlotStore::new();
        assert!(store.read("absent").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let store = MemorySlotStore::new();
        store.write("k", "value").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_write_replaces_previous_value() {
        let store = MemorySlotStore::new();
        store.write("k", "old").unwrap();
        store.write("k", "new").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = MemorySlotStore::new();
        store.write("k", "value").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }
}
