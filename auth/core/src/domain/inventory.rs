// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::config::InventoryConfig;
use crate::domain::instance::InstanceSnapshot;
use crate::domain::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("instance not found: {0}")]
    NotFound(String),

    #[error("inventory transport error: {0}")]
    Transport(String),

    #[error("inventory connection is not configured")]
    NotConfigured,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Authoritative source of instance snapshots.
#[async_trait]
pub trait InstanceInventory: Send + Sync {
    async fn fetch_instance(&self, id: &str) -> Result<InstanceSnapshot, InventoryError>;
}

/// Builds an inventory client from the persisted connection settings.
///
/// Called lazily by the client cache the first time a login needs the
/// inventory after startup or after the settings changed.
#[async_trait]
pub trait InventoryConnector: Send + Sync {
    async fn connect(&self, config: &InventoryConfig) -> Result<Arc<dyn InstanceInventory>, InventoryError>;
}
