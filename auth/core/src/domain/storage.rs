// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Key-Value Store Trait - Anti-Corruption Layer for the backend storage engine
//!
//! The auth backend persists three kinds of entries: attempt records
//! (`auth_attempt/<instance id>`), roles (`role/<name>`) and the inventory
//! connection settings (`config`). This trait is the whole contract the core
//! needs from the engine: per-key get/put/delete, prefix listing and a
//! compare-and-swap used to make read-modify-write sequences race free.
//!
//! Implementations live in `crate::infrastructure::storage`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Concurrent modification of {key} not resolved after {attempts} attempts")]
    Conflict { key: String, attempts: usize },
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Durable, consistent-per-key storage engine.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Unconditionally write `value` under `key`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List keys under `prefix`, returned with the prefix stripped.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Atomically replace the value under `key` if it currently equals
    /// `current` (`None` = absent). `new = None` deletes the key.
    ///
    /// Returns `Ok(false)` when the stored value did not match.
    async fn compare_and_swap(
        &self,
        key: &str,
        current: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<bool, StorageError>;
}

/// Read and decode a JSON entry.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON entry.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, bytes).await
}
