// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the AEGIS auth CLI

pub mod config;
pub mod inventory_config;
pub mod login;
pub mod role;
pub mod sweep;

pub use self::config::ConfigCommand;
pub use self::inventory_config::InventoryConfigCommand;
pub use self::login::LoginCommand;
pub use self::role::RoleCommand;
pub use self::sweep::SweepCommand;

use anyhow::{Context, Result};
use std::path::PathBuf;

use aegis_auth_core::application::AuthBackend;
use aegis_auth_core::domain::node_config::AuthNodeConfig;

/// Load and validate the node configuration.
pub fn load_node_config(config_override: Option<PathBuf>) -> Result<AuthNodeConfig> {
    let config = AuthNodeConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

/// Build the auth backend described by the node configuration.
pub fn open_backend(config_override: Option<PathBuf>) -> Result<(AuthNodeConfig, AuthBackend)> {
    let config = load_node_config(config_override)?;
    let backend = AuthBackend::from_node_config(&config)?;
    Ok((config, backend))
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_auth_core::domain::role::RoleUpdate;

    #[tokio::test]
    async fn test_open_backend_uses_configured_sled_path() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("auth-db");
        let config_path = dir.path().join("aegis-auth.yaml");
        std::fs::write(
            &config_path,
            format!(
                "apiVersion: 100monkeys.ai/v1\nkind: AuthNodeConfig\nmetadata:\n  name: test\nspec:\n  storage:\n    backend: sled\n    path: {}\n",
                db_path.display()
            ),
        )
        .unwrap();

        let (config, backend) = open_backend(Some(config_path)).unwrap();
        assert_eq!(config.metadata.name, "test");

        backend.roles().write_role("Web", RoleUpdate::default()).await.unwrap();
        assert_eq!(backend.roles().list_roles().await.unwrap(), vec!["web"]);
        assert!(db_path.exists());
    }

    #[test]
    fn test_open_backend_rejects_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_backend(Some(dir.path().join("missing.yaml"))).is_err());
    }
}
