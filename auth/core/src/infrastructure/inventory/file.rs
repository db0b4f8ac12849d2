// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! File-backed inventory
//!
//! Reads instance snapshots from a YAML (or JSON) document:
//!
//! ```yaml
//! instances:
//!   - id: ef079b0c-e610-4dfb-b1aa-b49f07ac48e5
//!     name: web-1
//!     status: ACTIVE
//!     tenant_id: fcad67a6189847c4aecfa3c81a05783b
//!     user_id: 9349aff8be7545ac9d2f1d00999a23cd
//!     created: 2026-01-01T00:00:00Z
//!     accessIPv4: 192.168.1.1
//!     metadata:
//!       vault-role: web
//!     addresses:
//!       private:
//!         - version: 4
//!           addr: 192.168.1.1
//! ```
//!
//! The file is read on every connect, so writing the `config` entry (which
//! drops the cached client) also picks up edits to the file. When the
//! connection settings carry a project scope, only instances of that
//! project are visible.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::domain::config::InventoryConfig;
use crate::domain::instance::InstanceSnapshot;
use crate::domain::inventory::{InstanceInventory, InventoryConnector, InventoryError};
use crate::infrastructure::inventory::memory::InMemoryInventory;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub instances: Vec<InstanceSnapshot>,
}

impl SnapshotFile {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| InventoryError::Transport(format!("failed to read {}: {}", path.display(), e)))?;
        // YAML is a superset of JSON, one parser covers both.
        serde_yaml::from_str(&content)
            .map_err(|e| InventoryError::Transport(format!("failed to parse {}: {}", path.display(), e)))
    }
}

pub struct FileInventoryConnector {
    path: PathBuf,
}

impl FileInventoryConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InventoryConnector for FileInventoryConnector {
    async fn connect(
        &self,
        config: &InventoryConfig,
    ) -> Result<Arc<dyn InstanceInventory>, InventoryError> {
        let file = SnapshotFile::load(&self.path).await?;
        let (project_id, _) = config.scope();

        let visible = file
            .instances
            .into_iter()
            .filter(|i| project_id.is_empty() || i.tenant_id == project_id);
        let inventory = InMemoryInventory::from_snapshots(visible);
        debug!(path = %self.path.display(), instances = inventory.len(), "Loaded inventory snapshot file");

        Ok(Arc::new(inventory))
    }
}
