// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Inventory Client Cache
//!
//! Holds the single inventory client shared by every login. The client is
//! built lazily from the `config` entry the first time it is needed and is
//! dropped whenever that entry changes, so the next login reconnects with the
//! new settings.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::config::{InventoryConfig, CONFIG_KEY};
use crate::domain::inventory::{InstanceInventory, InventoryConnector, InventoryError};
use crate::domain::storage::{get_json, KeyValueStore};

pub struct InventoryClientCache {
    store: Arc<dyn KeyValueStore>,
    connector: Arc<dyn InventoryConnector>,
    client: RwLock<Option<Arc<dyn InstanceInventory>>>,
}

impl InventoryClientCache {
    pub fn new(store: Arc<dyn KeyValueStore>, connector: Arc<dyn InventoryConnector>) -> Self {
        Self {
            store,
            connector,
            client: RwLock::new(None),
        }
    }

    /// The cached client, connecting first if there is none.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` when no `config` entry has been written yet
    /// - whatever the connector reports while connecting
    pub async fn client(&self) -> Result<Arc<dyn InstanceInventory>, InventoryError> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(client.clone());
        }

        let mut guard = self.client.write().await;
        // Another login may have connected while we waited for the write lock.
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let config: InventoryConfig = get_json(self.store.as_ref(), CONFIG_KEY)
            .await?
            .ok_or(InventoryError::NotConfigured)?;
        let client = self.connector.connect(&config).await?;
        info!(auth_url = %config.auth_url, "Inventory client connected");

        *guard = Some(client.clone());
        Ok(client)
    }

    /// Drop the cached client. The next call to [`Self::client`] reconnects.
    pub async fn invalidate(&self) {
        if self.client.write().await.take().is_some() {
            info!("Inventory client dropped");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }
}
