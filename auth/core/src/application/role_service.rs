// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Role Service
//!
//! Administrative CRUD over roles stored at `role/<name>`.
//!
//! Role names are case-insensitive: every operation lowercases the name
//! before touching storage. Writes are merges: fields absent from the
//! [`RoleUpdate`] keep their stored value, or the default for a new role.
//! A role is only persisted after it passes validation against the system
//! lease ceilings.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::domain::role::{LeaseLimits, Role, RoleUpdate, RoleValidationError};
use crate::domain::storage::{get_json, put_json, KeyValueStore, StorageError};

pub const ROLE_PREFIX: &str = "role/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleServiceError {
    #[error("role name is required")]
    MissingName,

    #[error("invalid role: {0}")]
    InvalidRole(#[from] RoleValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct RoleService {
    store: Arc<dyn KeyValueStore>,
    limits: LeaseLimits,
}

impl RoleService {
    pub fn new(store: Arc<dyn KeyValueStore>, limits: LeaseLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &LeaseLimits {
        &self.limits
    }

    /// Create or update a role, returning the validation warnings.
    pub async fn write_role(
        &self,
        name: &str,
        update: RoleUpdate,
    ) -> Result<Vec<String>, RoleServiceError> {
        let name = normalize_name(name)?;
        let key = role_key(&name);

        let mut role = get_json::<Role>(self.store.as_ref(), &key)
            .await?
            .unwrap_or_else(|| Role::new(name.clone()));
        role.name = name.clone();
        role.apply(update);

        let warnings = role.validate(&self.limits)?;
        put_json(self.store.as_ref(), &key, &role).await?;

        info!(role = %name, warnings = warnings.len(), "Role written");
        Ok(warnings)
    }

    pub async fn read_role(&self, name: &str) -> Result<Option<Role>, RoleServiceError> {
        let name = normalize_name(name)?;
        Ok(get_json(self.store.as_ref(), &role_key(&name)).await?)
    }

    pub async fn role_exists(&self, name: &str) -> Result<bool, RoleServiceError> {
        let name = normalize_name(name)?;
        Ok(self.store.get(&role_key(&name)).await?.is_some())
    }

    pub async fn delete_role(&self, name: &str) -> Result<(), RoleServiceError> {
        let name = normalize_name(name)?;
        self.store.delete(&role_key(&name)).await?;
        info!(role = %name, "Role deleted");
        Ok(())
    }

    /// Names of every stored role.
    pub async fn list_roles(&self) -> Result<Vec<String>, RoleServiceError> {
        Ok(self.store.list(ROLE_PREFIX).await?)
    }
}

fn normalize_name(name: &str) -> Result<String, RoleServiceError> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(RoleServiceError::MissingName);
    }
    Ok(name)
}

fn role_key(name: &str) -> String {
    format!("{ROLE_PREFIX}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::memory::InMemoryKeyValueStore;
    use chrono::Duration;

    fn service() -> RoleService {
        RoleService::new(
            Arc::new(InMemoryKeyValueStore::new()),
            LeaseLimits::new(Duration::hours(1), Duration::hours(24)),
        )
    }

    #[tokio::test]
    async fn test_write_creates_role_with_defaults() {
        let svc = service();
        let warnings = svc.write_role("Web", RoleUpdate::default()).await.unwrap();
        assert!(warnings.is_empty());

        let role = svc.read_role("web").await.unwrap().unwrap();
        assert_eq!(role.name, "web");
        assert_eq!(role.metadata_key, "vault-role");
        assert_eq!(role.auth_period, Duration::seconds(120));
        assert_eq!(role.auth_limit, 1);
        assert!(svc.role_exists("WEB").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_merges_into_existing_role() {
        let svc = service();
        svc.write_role(
            "web",
            RoleUpdate {
                policies: Some(vec!["Dev, ops".to_string(), "dev".to_string()]),
                auth_limit: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        svc.write_role(
            "web",
            RoleUpdate {
                tenant_id: Some("t-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let role = svc.read_role("web").await.unwrap().unwrap();
        assert_eq!(role.policies, vec!["dev", "ops"]);
        assert_eq!(role.auth_limit, 3);
        assert_eq!(role.tenant_id, "t-1");
    }

    #[tokio::test]
    async fn test_invalid_role_is_not_persisted() {
        let svc = service();
        let err = svc
            .write_role(
                "web",
                RoleUpdate {
                    auth_limit: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, RoleServiceError::InvalidRole(RoleValidationError::NegativeAuthLimit));
        assert!(!svc.role_exists("web").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_returns_ttl_warnings() {
        let svc = service();
        let warnings = svc
            .write_role(
                "web",
                RoleUpdate {
                    ttl: Some(Duration::hours(2)),
                    max_ttl: Some(Duration::hours(48)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(svc.role_exists("web").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let svc = service();
        assert!(svc.list_roles().await.unwrap().is_empty());
        svc.write_role("web", RoleUpdate::default()).await.unwrap();
        svc.write_role("db", RoleUpdate::default()).await.unwrap();
        assert_eq!(svc.list_roles().await.unwrap(), vec!["db", "web"]);

        svc.delete_role("WEB").await.unwrap();
        assert_eq!(svc.list_roles().await.unwrap(), vec!["db"]);
        assert!(svc.read_role("web").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let svc = service();
        assert_eq!(
            svc.write_role("  ", RoleUpdate::default()).await.unwrap_err(),
            RoleServiceError::MissingName
        );
    }
}
