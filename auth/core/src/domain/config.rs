// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Inventory Connection Settings
//!
//! Persisted under the `config` storage key. Holds the identity-service
//! credentials used to reach the instance inventory, and the request headers
//! from which additional claimed source addresses are read when the backend
//! sits behind a reverse proxy.
//!
//! Writing the settings invalidates the cached inventory client
//! (see [`crate::infrastructure::inventory::client_cache`]).

use serde::{Deserialize, Serialize};

pub const CONFIG_KEY: &str = "config";

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub auth_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_name: String,
    #[serde(default)]
    pub user_domain_id: String,
    #[serde(default)]
    pub user_domain_name: String,
    #[serde(default)]
    pub project_domain_id: String,
    #[serde(default)]
    pub project_domain_name: String,
    #[serde(default)]
    pub domain_id: String,
    #[serde(default)]
    pub domain_name: String,
    /// Headers whose comma-separated values are added to the claimed
    /// addresses of a login (e.g. `X-Forwarded-For`).
    #[serde(default)]
    pub request_address_headers: Vec<String>,
}

impl InventoryConfig {
    /// Copy safe to show to an operator: secrets are masked.
    pub fn redacted(&self) -> Self {
        let mask = |s: &str| if s.is_empty() { String::new() } else { REDACTED.to_string() };
        Self {
            token: mask(&self.token),
            password: mask(&self.password),
            ..self.clone()
        }
    }

    /// Project scope used when authenticating. The legacy tenant fields take
    /// precedence over the project fields when set.
    pub fn scope(&self) -> (&str, &str) {
        let id = if self.tenant_id.is_empty() { &self.project_id } else { &self.tenant_id };
        let name = if self.tenant_name.is_empty() { &self.project_name } else { &self.tenant_name };
        (id, name)
    }

    pub fn apply(&mut self, update: InventoryConfigUpdate) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = update.$field { self.$field = v; })*
            };
        }
        merge!(
            auth_url,
            token,
            user_id,
            username,
            password,
            project_id,
            project_name,
            tenant_id,
            tenant_name,
            user_domain_id,
            user_domain_name,
            project_domain_id,
            project_domain_name,
            domain_id,
            domain_name,
            request_address_headers,
        );
    }
}

/// Partial settings write; only present fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfigUpdate {
    pub auth_url: Option<String>,
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
    pub user_domain_id: Option<String>,
    pub user_domain_name: Option<String>,
    pub project_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
    pub request_address_headers: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_masks_secrets_only() {
        let config = InventoryConfig {
            auth_url: "https://keystone.example:5000/v3".to_string(),
            password: "hunter2".to_string(),
            ..Default::default()
        };
        let shown = config.redacted();
        assert_eq!(shown.password, REDACTED);
        assert_eq!(shown.token, "");
        assert_eq!(shown.auth_url, config.auth_url);
    }

    #[test]
    fn test_tenant_fields_override_project_scope() {
        let mut config = InventoryConfig {
            project_id: "p-id".to_string(),
            project_name: "p-name".to_string(),
            ..Default::default()
        };
        assert_eq!(config.scope(), ("p-id", "p-name"));
        config.tenant_id = "t-id".to_string();
        assert_eq!(config.scope(), ("t-id", "p-name"));
    }

    #[test]
    fn test_apply_merges_present_fields() {
        let mut config = InventoryConfig {
            username: "admin".to_string(),
            ..Default::default()
        };
        config.apply(InventoryConfigUpdate {
            auth_url: Some("https://keystone".to_string()),
            request_address_headers: Some(vec!["X-Forwarded-For".to_string()]),
            ..Default::default()
        });
        assert_eq!(config.username, "admin");
        assert_eq!(config.auth_url, "https://keystone");
        assert_eq!(config.request_address_headers, vec!["X-Forwarded-For".to_string()]);
    }
}
