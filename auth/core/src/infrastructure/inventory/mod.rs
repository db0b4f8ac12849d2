// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Inventory adapters and the shared client cache.

pub mod client_cache;
pub mod file;
pub mod memory;

pub use client_cache::InventoryClientCache;
pub use file::{FileInventoryConnector, SnapshotFile};
pub use memory::{InMemoryInventory, StaticConnector};

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::config::InventoryConfig;
use crate::domain::inventory::{InstanceInventory, InventoryConnector, InventoryError};
use crate::domain::node_config::InventorySourceConfig;

/// Connector used when the node has no inventory source. Every connect
/// fails with `NotConfigured`, so logins are refused while role and config
/// administration keep working.
pub struct NoInventorySource;

#[async_trait]
impl InventoryConnector for NoInventorySource {
    async fn connect(
        &self,
        _config: &InventoryConfig,
    ) -> Result<Arc<dyn InstanceInventory>, InventoryError> {
        Err(InventoryError::NotConfigured)
    }
}

/// Pick the connector described by the node configuration.
pub fn connector_for(source: &InventorySourceConfig) -> Arc<dyn InventoryConnector> {
    match &source.snapshot_file {
        Some(path) => {
            tracing::info!("Using inventory snapshot file {:?}", path);
            Arc::new(FileInventoryConnector::new(path.clone()))
        }
        None => {
            tracing::warn!("No inventory source configured; logins will be refused");
            Arc::new(NoInventorySource)
        }
    }
}
