//! Storage-specific error types for pure data operations.
//!
//! These errors describe persistence failures only. SCIM semantics are mapped on
//! top of them by the provider layer.

use super::StorageKey;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A write addressed a key without a resource type or id.
    #[error("invalid storage key '{key}': resource type and id must be non-empty")]
    InvalidKey { key: String },
}

impl StorageError {
    pub fn invalid_key(key: &StorageKey) -> Self {
        Self::InvalidKey {
            key: key.to_string(),
        }
    }
}
