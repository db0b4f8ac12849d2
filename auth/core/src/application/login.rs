// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Login / Renew Use Case
//!
//! Application service turning an unauthenticated login request into an
//! [`AuthGrant`], and re-checking a previously issued grant on renewal.
//!
//! # Login Flow
//!
//! 1. Require `instance_id` and `role`
//! 2. Load the role (`role/<name>`)
//! 3. Get the inventory client from the cache (connects on first use)
//! 4. Fetch the instance snapshot
//! 5. Collect claimed addresses: the remote address plus every
//!    comma-separated value of the configured `request_address_headers`
//! 6. [`Attestor::attest`]
//! 7. Issue the grant with TTLs capped at the system ceilings
//!
//! Denials (unknown instance, any attestation check) reach the caller only as
//! [`LoginError::Denied`]; the specific reason goes to the log and the
//! `aegis_auth_attestation_denied_total` counter.
//!
//! # Renew Flow
//!
//! The grant's alias (instance id) and `role` metadata identify what to
//! re-check. The role must still exist with equivalent policies, and the
//! instance must still carry the role metadata and own a claimed address.
//! The window and attempt budget are not consulted again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::attestor::Attestor;
use crate::application::config_service::{ConfigError, ConfigService};
use crate::application::role_service::{RoleService, RoleServiceError};
use crate::domain::attestation::AttestationError;
use crate::domain::instance::InstanceSnapshot;
use crate::domain::inventory::InventoryError;
use crate::domain::role::{equivalent_policies, LeaseTerms, Role};
use crate::domain::storage::StorageError;
use crate::infrastructure::inventory::InventoryClientCache;

/// Grant metadata key holding the role name.
pub const ROLE_METADATA_KEY: &str = "role";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub instance_id: Option<String>,
    pub role: Option<String>,
    /// Source address of the connection.
    pub remote_addr: String,
    /// Request headers; names are matched case-insensitively.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewRequest {
    pub auth: AuthGrant,
    pub remote_addr: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Credential parameters issued on a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    /// Instance id; the identity the credential is bound to.
    pub alias: String,
    pub display_name: String,
    pub policies: Vec<String>,
    pub metadata: HashMap<String, String>,
    #[serde(flatten)]
    pub lease: LeaseTerms,
    pub renewable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("{0} required")]
    MissingField(&'static str),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Deliberately uninformative; the reason is only logged.
    #[error("login denied")]
    Denied,

    #[error("instance ID associated with token is invalid")]
    InvalidAlias,

    #[error("role name associated with token is invalid")]
    InvalidRoleMetadata,

    #[error("role '{0}' no longer exists")]
    RoleNoLongerExists(String),

    #[error("policies on role '{0}' have changed, cannot renew")]
    PoliciesChanged(String),

    #[error("inventory client error: {0}")]
    Inventory(InventoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<RoleServiceError> for LoginError {
    fn from(err: RoleServiceError) -> Self {
        match err {
            RoleServiceError::MissingName => LoginError::MissingField("role"),
            RoleServiceError::InvalidRole(e) => LoginError::InvalidRole(e.to_string()),
            RoleServiceError::Storage(e) => LoginError::Storage(e),
        }
    }
}

impl From<ConfigError> for LoginError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Storage(e) => LoginError::Storage(e),
        }
    }
}

impl LoginError {
    /// Stable short label for the login outcome counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MissingField(_) | Self::InvalidAlias | Self::InvalidRoleMetadata => "bad_request",
            Self::InvalidRole(_) | Self::RoleNoLongerExists(_) | Self::PoliciesChanged(_) => "invalid_role",
            Self::Denied => "denied",
            Self::Inventory(_) => "inventory_error",
            Self::Storage(_) => "storage_error",
        }
    }
}

#[async_trait]
pub trait LoginUseCase: Send + Sync {
    /// Authenticate an instance for a role.
    ///
    /// # Errors
    ///
    /// - `MissingField`: `instance_id` or `role` absent
    /// - `InvalidRole`: no such role
    /// - `Denied`: unknown instance or a failed attestation check
    /// - `Inventory` / `Storage`: collaborator failures, safe to retry
    async fn login(&self, request: LoginRequest) -> Result<AuthGrant, LoginError>;

    /// Re-check a previously issued grant and refresh its lease terms.
    async fn renew(&self, request: RenewRequest) -> Result<AuthGrant, LoginError>;
}

pub struct StandardLoginUseCase {
    roles: Arc<RoleService>,
    config: Arc<ConfigService>,
    clients: Arc<InventoryClientCache>,
    attestor: Arc<Attestor>,
}

impl StandardLoginUseCase {
    pub fn new(
        roles: Arc<RoleService>,
        config: Arc<ConfigService>,
        clients: Arc<InventoryClientCache>,
        attestor: Arc<Attestor>,
    ) -> Self {
        Self {
            roles,
            config,
            clients,
            attestor,
        }
    }

    async fn fetch_instance(&self, instance_id: &str) -> Result<InstanceSnapshot, LoginError> {
        let client = self.clients.client().await.map_err(|e| {
            error!(error = %e, "Inventory client error");
            LoginError::Inventory(e)
        })?;

        match client.fetch_instance(instance_id).await {
            Ok(instance) => Ok(instance),
            Err(InventoryError::NotFound(_)) => {
                deny(instance_id, "instance_not_found");
                Err(LoginError::Denied)
            }
            Err(e) => {
                error!(instance_id, error = %e, "Failed to fetch instance");
                Err(LoginError::Inventory(e))
            }
        }
    }

    async fn claimed_addresses(
        &self,
        remote_addr: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Vec<String>, LoginError> {
        let configured = self
            .config
            .load()
            .await?
            .map(|c| c.request_address_headers)
            .unwrap_or_default();
        Ok(claimed_addresses(remote_addr, headers, &configured))
    }

    fn grant(&self, instance: &InstanceSnapshot, role: &Role) -> AuthGrant {
        AuthGrant {
            alias: instance.id.clone(),
            display_name: instance.name.clone(),
            policies: role.policies.clone(),
            metadata: HashMap::from([(ROLE_METADATA_KEY.to_string(), role.name.clone())]),
            lease: self.roles.limits().cap(role),
            renewable: true,
        }
    }

    async fn try_login(&self, request: LoginRequest) -> Result<AuthGrant, LoginError> {
        let instance_id = non_empty(request.instance_id).ok_or(LoginError::MissingField("instance_id"))?;
        let role_name = non_empty(request.role).ok_or(LoginError::MissingField("role"))?;

        info!(instance_id = %instance_id, role = %role_name, "Login attempt");

        let role = self
            .roles
            .read_role(&role_name)
            .await?
            .ok_or_else(|| LoginError::InvalidRole(format!("role '{role_name}' not found")))?;

        let instance = self.fetch_instance(&instance_id).await?;
        let claimed = self
            .claimed_addresses(&request.remote_addr, &request.headers)
            .await?;

        self.attestor
            .attest(&instance, &role, claimed.as_slice())
            .await
            .map_err(|e| attestation_failure(&instance_id, e))?;

        info!(instance_id = %instance_id, role = %role.name, "Login succeeded");
        Ok(self.grant(&instance, &role))
    }

    async fn try_renew(&self, request: RenewRequest) -> Result<AuthGrant, LoginError> {
        let mut auth = request.auth;
        if auth.alias.is_empty() {
            return Err(LoginError::InvalidAlias);
        }
        let role_name = auth
            .metadata
            .get(ROLE_METADATA_KEY)
            .filter(|r| !r.is_empty())
            .cloned()
            .ok_or(LoginError::InvalidRoleMetadata)?;

        let role = self
            .roles
            .read_role(&role_name)
            .await?
            .ok_or_else(|| LoginError::RoleNoLongerExists(role_name.clone()))?;
        if !equivalent_policies(&role.policies, &auth.policies) {
            return Err(LoginError::PoliciesChanged(role_name));
        }

        let instance = self.fetch_instance(&auth.alias).await?;
        let claimed = self
            .claimed_addresses(&request.remote_addr, &request.headers)
            .await?;

        self.attestor
            .attest_metadata(&instance, &role.metadata_key, &role.name)
            .and_then(|_| self.attestor.attest_addr(&instance, claimed.as_slice()))
            .map_err(|e| attestation_failure(&auth.alias, e))?;

        info!(instance_id = %auth.alias, role = %role.name, "Renewal succeeded");
        auth.lease = self.roles.limits().cap(&role);
        Ok(auth)
    }
}

#[async_trait]
impl LoginUseCase for StandardLoginUseCase {
    async fn login(&self, request: LoginRequest) -> Result<AuthGrant, LoginError> {
        let result = self.try_login(request).await;
        record_outcome(&result);
        result
    }

    async fn renew(&self, request: RenewRequest) -> Result<AuthGrant, LoginError> {
        self.try_renew(request).await
    }
}

/// The remote address followed by every comma-separated value of each
/// configured header present on the request. Empty values are dropped.
pub fn claimed_addresses(
    remote_addr: &str,
    headers: &HashMap<String, String>,
    configured_headers: &[String],
) -> Vec<String> {
    let mut claimed = Vec::new();
    if !remote_addr.trim().is_empty() {
        claimed.push(remote_addr.trim().to_string());
    }

    for wanted in configured_headers {
        let values = headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .flat_map(|(_, value)| value.split(','));
        for value in values {
            let value = value.trim();
            if !value.is_empty() {
                claimed.push(value.to_string());
            }
        }
    }
    claimed
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn deny(instance_id: &str, reason: &'static str) {
    warn!(instance_id, reason, "Attestation denied");
    metrics::counter!("aegis_auth_attestation_denied_total", "reason" => reason).increment(1);
}

fn attestation_failure(instance_id: &str, err: AttestationError) -> LoginError {
    match err {
        AttestationError::Storage(e) => {
            error!(instance_id, error = %e, "Attempt ledger unavailable");
            LoginError::Storage(e)
        }
        denial => {
            warn!(instance_id, error = %denial, "Attestation failed");
            deny(instance_id, denial.reason());
            LoginError::Denied
        }
    }
}

fn record_outcome(result: &Result<AuthGrant, LoginError>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.outcome(),
    };
    metrics::counter!("aegis_auth_login_total", "outcome" => outcome).increment(1);
}
