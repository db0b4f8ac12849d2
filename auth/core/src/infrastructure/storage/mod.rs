// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage engine implementations of [`crate::domain::storage::KeyValueStore`].

pub mod memory;
pub mod sled;

use std::sync::Arc;

use crate::domain::node_config::StorageConfig;
use crate::domain::storage::{KeyValueStore, StorageError};

pub use self::memory::InMemoryKeyValueStore;
pub use self::sled::SledKeyValueStore;

/// Open the storage engine selected in the node configuration.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match config {
        StorageConfig::InMemory => {
            tracing::warn!("Using in-memory storage; attempt records and roles are lost on exit");
            Ok(Arc::new(InMemoryKeyValueStore::new()))
        }
        StorageConfig::Sled { path } => {
            tracing::info!("Opening sled storage at {:?}", path);
            Ok(Arc::new(SledKeyValueStore::open(path)?))
        }
    }
}
