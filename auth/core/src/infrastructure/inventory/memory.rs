// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::config::InventoryConfig;
use crate::domain::instance::InstanceSnapshot;
use crate::domain::inventory::{InstanceInventory, InventoryConnector, InventoryError};

/// Inventory held in process memory. Used by tests and by the file adapter
/// once a snapshot file has been loaded.
#[derive(Default)]
pub struct InMemoryInventory {
    instances: RwLock<HashMap<String, InstanceSnapshot>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: impl IntoIterator<Item = InstanceSnapshot>) -> Self {
        let instances = snapshots.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self {
            instances: RwLock::new(instances),
        }
    }

    /// Insert or replace the snapshot for `snapshot.id`.
    pub fn upsert(&self, snapshot: InstanceSnapshot) {
        self.instances.write().insert(snapshot.id.clone(), snapshot);
    }

    pub fn remove(&self, id: &str) -> Option<InstanceSnapshot> {
        self.instances.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}

#[async_trait]
impl InstanceInventory for InMemoryInventory {
    async fn fetch_instance(&self, id: &str) -> Result<InstanceSnapshot, InventoryError> {
        self.instances
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))
    }
}

/// Connector that always hands out the same inventory, whatever the
/// connection settings say. Counts how often it was asked to connect.
pub struct StaticConnector {
    inventory: Arc<dyn InstanceInventory>,
    connections: AtomicUsize,
}

impl StaticConnector {
    pub fn new(inventory: Arc<dyn InstanceInventory>) -> Self {
        Self {
            inventory,
            connections: AtomicUsize::new(0),
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryConnector for StaticConnector {
    async fn connect(
        &self,
        _config: &InventoryConfig,
    ) -> Result<Arc<dyn InstanceInventory>, InventoryError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        Ok(self.inventory.clone())
    }
}
