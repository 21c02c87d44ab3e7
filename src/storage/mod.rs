//! Storage abstraction layer for SCIM resources.
//!
//! The `StorageProvider` trait defines protocol-agnostic operations on JSON
//! records keyed by resource type and id. SCIM concerns such as metadata,
//! versions and validation stay in the provider layer.
//!
//! At the storage level create and update are the same operation: `put` stores
//! data at a key. The one exception is [`StorageProvider::replace`], a
//! compare-and-swap used by providers for optimistic concurrency.
//!
//! ```rust
//! use scim_engine::storage::{InMemoryStorage, StorageKey, StorageProvider};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryStorage::new();
//! let key = StorageKey::new("User", "123");
//!
//! storage.put(key.clone(), json!({"id": "123", "userName": "bjensen"})).await?;
//! assert!(storage.get(key.clone()).await?.is_some());
//! assert!(storage.delete(key).await?);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::StorageError;
pub use in_memory::{InMemoryStorage, InMemoryStorageStats};

use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Identifies a stored record: `resource_type` → `resource_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    resource_type: String,
    resource_id: String,
}

impl StorageKey {
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.resource_id)
    }
}

/// Core trait for storage backends.
///
/// - `put` replaces any existing record and returns what was stored.
/// - `delete` returns whether the record existed.
/// - `insert`, `replace` and `delete_if` are atomic checks-and-writes.
/// - Writes reject keys with an empty resource type or id.
/// - `list` returns records ordered by id so pagination is stable.
pub trait StorageProvider: Send + Sync {
    /// The error type returned by storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store data at the key and return the stored data.
    fn put(
        &self,
        key: StorageKey,
        data: Value,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send;

    /// Store data only if no record exists at the key.
    ///
    /// Returns `false` when the key was already taken.
    fn insert(
        &self,
        key: StorageKey,
        data: Value,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Replace the record only if it still equals `expected`.
    ///
    /// Returns `false` when the record is missing or has changed.
    fn replace(
        &self,
        key: StorageKey,
        data: Value,
        expected: &Value,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Retrieve data by key.
    fn get(
        &self,
        key: StorageKey,
    ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// Delete data by key.
    fn delete(&self, key: StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Delete the record only if it still equals `expected`.
    ///
    /// Returns `false` when the record is missing or has changed.
    fn delete_if(
        &self,
        key: StorageKey,
        expected: &Value,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// All records of a resource type, ordered by id.
    fn list(
        &self,
        resource_type: &str,
    ) -> impl Future<Output = Result<Vec<(StorageKey, Value)>, Self::Error>> + Send;

    /// Check if a record exists.
    fn exists(&self, key: StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Number of records of a resource type.
    fn count(&self, resource_type: &str)
    -> impl Future<Output = Result<usize, Self::Error>> + Send;

    /// Remove every record.
    fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
