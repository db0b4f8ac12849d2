// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::storage::{KeyValueStore, StorageError};

/// Process-local store for development and tests.
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let guard = self.entries.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut guard = self.entries.write().await;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.write().await;
        guard.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let guard = self.entries.read().await;
        Ok(guard
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k[prefix.len()..].to_string())
            .collect())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        current: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<bool, StorageError> {
        // Held across compare and write so the pair is atomic.
        let mut guard = self.entries.write().await;
        if guard.get(key).map(Vec::as_slice) != current {
            return Ok(false);
        }
        match new {
            Some(value) => {
                guard.insert(key.to_string(), value);
            }
            None => {
                guard.remove(key);
            }
        }
        Ok(true)
    }
}
