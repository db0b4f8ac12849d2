// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sled-backed key-value store
//!
//! Embedded, crash-safe storage for single-node deployments. sled provides a
//! native per-key `compare_and_swap`, which is what keeps the attempt ledger
//! free of lost updates across concurrent logins.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::storage::{KeyValueStore, StorageError};

pub struct SledKeyValueStore {
    db: sled::Db,
}

impl SledKeyValueStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Wrap an already opened database (e.g. a temporary one in tests).
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Flush dirty pages to disk.
    pub async fn flush(&self) -> Result<(), StorageError> {
        self.db.flush_async().await?;
        Ok(())
    }
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl KeyValueStore for SledKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.db.insert(key.as_bytes(), value)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in self.db.scan_prefix(prefix.as_bytes()).keys() {
            let key = entry?;
            let key = String::from_utf8(key[prefix.len()..].to_vec())
                .map_err(|e| StorageError::InvalidKey(e.to_string()))?;
            keys.push(key);
        }
        Ok(keys)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        current: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<bool, StorageError> {
        let swapped = self.db.compare_and_swap(key.as_bytes(), current, new)?;
        Ok(swapped.is_ok())
    }
}
