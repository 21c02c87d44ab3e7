//! In-memory storage backend.
//!
//! Thread-safe implementation of [`StorageProvider`] over a `HashMap` guarded by
//! tokio's `RwLock`. Intended for tests, development and embedding where
//! persistence is not required.
//!
//! * PUT/GET/DELETE: O(log n) within a resource type
//! * LIST/COUNT: O(n) and O(1)

use crate::storage::{StorageError, StorageKey, StorageProvider};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory storage.
///
/// Structure: `resource_type` → `resource_id` → `data`. Ids are kept in a
/// `BTreeMap` so listing is ordered without a sort.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, BTreeMap<String, Value>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get storage statistics for debugging and monitoring.
    pub async fn stats(&self) -> InMemoryStorageStats {
        let data_guard = self.data.read().await;
        InMemoryStorageStats {
            resource_type_count: data_guard.values().filter(|ids| !ids.is_empty()).count(),
            total_resources: data_guard.values().map(BTreeMap::len).sum(),
        }
    }
}

/// Writes need both halves of the key.
fn writable(key: &StorageKey) -> Result<(), StorageError> {
    if key.resource_type().is_empty() || key.resource_id().is_empty() {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

impl StorageProvider for InMemoryStorage {
    type Error = StorageError;

    async fn put(&self, key: StorageKey, data: Value) -> Result<Value, Self::Error> {
        writable(&key)?;
        let mut data_guard = self.data.write().await;
        data_guard
            .entry(key.resource_type().to_string())
            .or_default()
            .insert(key.resource_id().to_string(), data.clone());
        Ok(data)
    }

    async fn insert(&self, key: StorageKey, data: Value) -> Result<bool, Self::Error> {
        writable(&key)?;
        let mut data_guard = self.data.write().await;
        let type_data = data_guard.entry(key.resource_type().to_string()).or_default();
        if type_data.contains_key(key.resource_id()) {
            return Ok(false);
        }
        type_data.insert(key.resource_id().to_string(), data);
        Ok(true)
    }

    async fn replace(
        &self,
        key: StorageKey,
        data: Value,
        expected: &Value,
    ) -> Result<bool, Self::Error> {
        writable(&key)?;
        let mut data_guard = self.data.write().await;
        let current = data_guard
            .get_mut(key.resource_type())
            .and_then(|type_data| type_data.get_mut(key.resource_id()));
        match current {
            Some(current) if current == expected => {
                *current = data;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, key: StorageKey) -> Result<Option<Value>, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard
            .get(key.resource_type())
            .and_then(|type_data| type_data.get(key.resource_id()))
            .cloned())
    }

    async fn delete(&self, key: StorageKey) -> Result<bool, Self::Error> {
        let mut data_guard = self.data.write().await;
        Ok(data_guard
            .get_mut(key.resource_type())
            .and_then(|type_data| type_data.remove(key.resource_id()))
            .is_some())
    }

    async fn delete_if(&self, key: StorageKey, expected: &Value) -> Result<bool, Self::Error> {
        writable(&key)?;
        let mut data_guard = self.data.write().await;
        let Some(type_data) = data_guard.get_mut(key.resource_type()) else {
            return Ok(false);
        };
        if type_data.get(key.resource_id()) != Some(expected) {
            return Ok(false);
        }
        type_data.remove(key.resource_id());
        Ok(true)
    }

    async fn list(&self, resource_type: &str) -> Result<Vec<(StorageKey, Value)>, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard
            .get(resource_type)
            .map(|type_data| {
                type_data
                    .iter()
                    .map(|(id, data)| (StorageKey::new(resource_type, id), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn exists(&self, key: StorageKey) -> Result<bool, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard
            .get(key.resource_type())
            .is_some_and(|type_data| type_data.contains_key(key.resource_id())))
    }

    async fn count(&self, resource_type: &str) -> Result<usize, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard.get(resource_type).map_or(0, BTreeMap::len))
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        self.data.write().await.clear();
        Ok(())
    }
}

/// Statistics about the current state of in-memory storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStorageStats {
    /// Number of resource types holding at least one record
    pub resource_type_count: usize,
    /// Total number of records
    pub total_resources: usize,
}
