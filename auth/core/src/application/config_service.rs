// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Config Service
//!
//! Reads and writes the inventory connection settings at the `config` key.
//! A write drops the cached inventory client so the next login reconnects
//! with the new settings.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::domain::config::{InventoryConfig, InventoryConfigUpdate, CONFIG_KEY};
use crate::domain::storage::{get_json, put_json, KeyValueStore, StorageError};
use crate::infrastructure::inventory::InventoryClientCache;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct ConfigService {
    store: Arc<dyn KeyValueStore>,
    clients: Arc<InventoryClientCache>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn KeyValueStore>, clients: Arc<InventoryClientCache>) -> Self {
        Self { store, clients }
    }

    /// Merge `update` into the stored settings (or empty settings when none
    /// exist yet) and persist the result.
    pub async fn write_config(
        &self,
        update: InventoryConfigUpdate,
    ) -> Result<InventoryConfig, ConfigError> {
        let mut config = self.load().await?.unwrap_or_default();
        config.apply(update);
        put_json(self.store.as_ref(), CONFIG_KEY, &config).await?;

        self.clients.invalidate().await;
        info!(auth_url = %config.auth_url, "Inventory configuration written");
        Ok(config.redacted())
    }

    /// Stored settings with secrets masked, or `None` if never written.
    pub async fn read_config(&self) -> Result<Option<InventoryConfig>, ConfigError> {
        Ok(self.load().await?.map(|c| c.redacted()))
    }

    /// Stored settings including secrets. Only for building clients.
    pub async fn load(&self) -> Result<Option<InventoryConfig>, ConfigError> {
        Ok(get_json(self.store.as_ref(), CONFIG_KEY).await?)
    }
}
