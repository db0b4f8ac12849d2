// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Auth Backend
//!
//! Composition root for the auth engine. Owns the storage engine, the clock,
//! the inventory client cache and every service built on top of them, and
//! exposes the host lifecycle hooks:
//!
//! | Hook | Effect |
//! |------|--------|
//! | [`AuthBackend::periodic`] | sweep expired attempt records |
//! | [`AuthBackend::invalidate`] | drop the inventory client when `config` changed |
//! | [`AuthBackend::close`] | drop the inventory client |

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use crate::application::attempt_ledger::AttemptLedger;
use crate::application::attestor::Attestor;
use crate::application::config_service::ConfigService;
use crate::application::login::{AuthGrant, LoginError, LoginRequest, LoginUseCase, RenewRequest, StandardLoginUseCase};
use crate::application::role_service::RoleService;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::config::CONFIG_KEY;
use crate::domain::inventory::InventoryConnector;
use crate::domain::node_config::AuthNodeConfig;
use crate::domain::role::LeaseLimits;
use crate::domain::storage::{KeyValueStore, StorageError};
use crate::infrastructure::inventory::{connector_for, InventoryClientCache};
use crate::infrastructure::storage::open_store;

pub struct AuthBackend {
    clock: Arc<dyn Clock>,
    ledger: Arc<AttemptLedger>,
    roles: Arc<RoleService>,
    config: Arc<ConfigService>,
    clients: Arc<InventoryClientCache>,
    login: Arc<dyn LoginUseCase>,
}

impl AuthBackend {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        connector: Arc<dyn InventoryConnector>,
        clock: Arc<dyn Clock>,
        limits: LeaseLimits,
    ) -> Self {
        let ledger = Arc::new(AttemptLedger::new(store.clone()));
        let attestor = Arc::new(Attestor::new(ledger.clone(), clock.clone()));
        let clients = Arc::new(InventoryClientCache::new(store.clone(), connector));
        let roles = Arc::new(RoleService::new(store.clone(), limits));
        let config = Arc::new(ConfigService::new(store, clients.clone()));
        let login = Arc::new(StandardLoginUseCase::new(
            roles.clone(),
            config.clone(),
            clients.clone(),
            attestor,
        ));

        Self {
            clock,
            ledger,
            roles,
            config,
            clients,
            login,
        }
    }

    /// Build a backend from the node manifest: opens the configured storage
    /// engine and inventory source and uses the system clock.
    pub fn from_node_config(node: &AuthNodeConfig) -> anyhow::Result<Self> {
        let store = open_store(&node.spec.storage).context("Failed to open auth storage")?;
        let limits = node.spec.leases.limits().context("Invalid lease limits")?;
        let connector = connector_for(&node.spec.inventory);

        info!(
            default_ttl_secs = limits.default_ttl.num_seconds(),
            max_ttl_secs = limits.max_ttl.num_seconds(),
            "Auth backend initialised"
        );
        Ok(Self::new(store, connector, Arc::new(SystemClock), limits))
    }

    pub fn roles(&self) -> &RoleService {
        &self.roles
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    pub fn ledger(&self) -> &AttemptLedger {
        &self.ledger
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthGrant, LoginError> {
        self.login.login(request).await
    }

    pub async fn renew(&self, request: RenewRequest) -> Result<AuthGrant, LoginError> {
        self.login.renew(request).await
    }

    /// Periodic maintenance: remove attempt records whose window has closed.
    pub async fn periodic(&self) -> Result<usize, StorageError> {
        let removed = self.ledger.sweep_expired(self.clock.now()).await?;
        metrics::counter!("aegis_auth_attempts_swept_total").increment(removed as u64);
        Ok(removed)
    }

    /// Storage key `key` was changed outside this process.
    pub async fn invalidate(&self, key: &str) {
        if key == CONFIG_KEY {
            self.clients.invalidate().await;
        }
    }

    pub async fn close(&self) {
        self.clients.invalidate().await;
    }
}
