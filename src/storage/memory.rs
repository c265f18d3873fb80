use crate::storage::{KeyValueStore, StoreError, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory store with the lifetime of the owning process.
///
/// Models tab-scoped browser storage: contents vanish when the value is
/// dropped. An optional entry capacity models a storage quota.
pub struct MemoryStore {
    entries: DashMap<String, String>,
    capacity: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            capacity: None,
        }
    }

    /// A store that refuses inserts of new keys beyond `capacity` entries.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(capacity) = self.capacity {
            // Overwrites of existing keys are always allowed
            if !self.entries.contains_key(key) && self.entries.len() >= capacity {
                return Err(StoreError::QuotaExceeded);
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}
