// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Auth Node Configuration Types
//
// Defines the configuration schema for hosts running the instance auth backend:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Storage engine selection (in-memory or sled)
// - System lease ceilings used by role validation and grant capping
// - Attempt sweeper schedule
// - Snapshot source for the file-backed inventory adapter

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::role::LeaseLimits;

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "AuthNodeConfig";

/// Top-level Kubernetes-style auth node configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthNodeConfig {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "AuthNodeConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: AuthNodeConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Configuration content under spec:
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthNodeConfigSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub leases: LeaseConfig,

    #[serde(default)]
    pub sweeper: SweeperConfig,

    #[serde(default)]
    pub inventory: InventorySourceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum StorageConfig {
    /// Process-local storage, lost on exit. Development only.
    InMemory,
    /// Embedded sled database at `path`.
    Sled { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseConfig {
    /// Mount/system default token TTL
    #[serde(with = "humantime_serde", default = "default_lease_ttl")]
    pub default_ttl: Duration,

    /// Mount/system maximum token TTL
    #[serde(with = "humantime_serde", default = "default_lease_ttl")]
    pub max_ttl: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How often expired attempt records are swept
    #[serde(with = "humantime_serde", default = "default_sweep_interval")]
    pub interval: Duration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySourceConfig {
    /// YAML or JSON file holding instance snapshots, read by the file inventory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_lease_ttl() -> Duration {
    // 32 days, the usual mount default
    Duration::from_secs(768 * 3600)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sled {
            path: PathBuf::from("./aegis-auth-data"),
        }
    }
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_lease_ttl(),
            max_ttl: default_lease_ttl(),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: default_sweep_interval(),
        }
    }
}

impl Default for AuthNodeConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "aegis-auth".to_string(),
                labels: None,
            },
            spec: AuthNodeConfigSpec::default(),
        }
    }
}

impl LeaseConfig {
    pub fn limits(&self) -> anyhow::Result<LeaseLimits> {
        Ok(LeaseLimits::new(
            chrono::Duration::from_std(self.default_ttl)?,
            chrono::Duration::from_std(self.max_ttl)?,
        ))
    }
}

impl AuthNodeConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AEGIS_AUTH_CONFIG_PATH environment variable
    /// 2. ./aegis-auth.yaml (working directory)
    /// 3. /etc/aegis/auth.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AEGIS_AUTH_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./aegis-auth.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        let system_config = PathBuf::from("/etc/aegis/auth.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut Duration); 2] = [
            ("AEGIS_AUTH_DEFAULT_LEASE_TTL", &mut self.spec.leases.default_ttl),
            ("AEGIS_AUTH_MAX_LEASE_TTL", &mut self.spec.leases.max_ttl),
        ];
        for (var, target) in overrides {
            if let Ok(val) = std::env::var(var) {
                match humantime_serde::re::humantime::parse_duration(&val) {
                    Ok(parsed) => {
                        tracing::info!("Environment override: {}={}", var, val);
                        *target = parsed;
                    }
                    Err(e) => {
                        tracing::warn!("Invalid value for {}: '{}' ({}). Ignoring.", var, val, e);
                    }
                }
            }
        }

        if let Ok(val) = std::env::var("AEGIS_AUTH_SLED_PATH") {
            tracing::info!("Environment override: AEGIS_AUTH_SLED_PATH={}", val);
            self.spec.storage = StorageConfig::Sled { path: PathBuf::from(val) };
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if let StorageConfig::Sled { path } = &self.spec.storage {
            if path.as_os_str().is_empty() {
                anyhow::bail!("spec.storage.path cannot be empty for the sled backend");
            }
        }

        let leases = &self.spec.leases;
        if leases.default_ttl > leases.max_ttl {
            anyhow::bail!(
                "spec.leases.default_ttl ({}s) cannot exceed spec.leases.max_ttl ({}s)",
                leases.default_ttl.as_secs(),
                leases.max_ttl.as_secs()
            );
        }

        if self.spec.sweeper.interval.is_zero() {
            anyhow::bail!("spec.sweeper.interval must be greater than zero");
        }

        Ok(())
    }
}
