// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use aegis_auth_core::domain::node_config::{AuthNodeConfig, StorageConfig};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./aegis-auth.yaml)
        #[arg(short, long, default_value = "./aegis-auth.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

const MINIMAL_TEMPLATE: &str = r#"apiVersion: 100monkeys.ai/v1
kind: AuthNodeConfig
metadata:
  name: aegis-auth
spec:
  storage:
    backend: sled
    path: ./aegis-auth-data
"#;

const EXAMPLES_TEMPLATE: &str = r#"apiVersion: 100monkeys.ai/v1
kind: AuthNodeConfig
metadata:
  name: aegis-auth
  labels:
    environment: dev
spec:
  # Where roles, attempt records and inventory settings are kept.
  # `in-memory` loses everything on exit.
  storage:
    backend: sled
    path: ./aegis-auth-data

  # System lease ceilings applied to every grant.
  # Env overrides: AEGIS_AUTH_DEFAULT_LEASE_TTL, AEGIS_AUTH_MAX_LEASE_TTL
  leases:
    default_ttl: 768h
    max_ttl: 768h

  # Removal of attempt records whose login window has closed.
  sweeper:
    enabled: true
    interval: 1m

  # Instance snapshots served to logins (YAML or JSON, `instances:` list).
  inventory:
    snapshot_file: ./instances.yaml
"#;

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = AuthNodeConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. AEGIS_AUTH_CONFIG_PATH: {}",
            std::env::var("AEGIS_AUTH_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./aegis-auth.yaml");
        println!("  4. /etc/aegis/auth.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Node:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Storage:".bold());
    match &config.spec.storage {
        StorageConfig::InMemory => println!("  Backend: in-memory"),
        StorageConfig::Sled { path } => {
            println!("  Backend: sled");
            println!("  Path: {}", path.display());
        }
    }
    println!();

    println!("{}", "Leases:".bold());
    println!("  Default TTL: {}s", config.spec.leases.default_ttl.as_secs());
    println!("  Max TTL: {}s", config.spec.leases.max_ttl.as_secs());
    println!();

    println!("{}", "Sweeper:".bold());
    println!("  Enabled: {}", config.spec.sweeper.enabled);
    println!("  Interval: {}s", config.spec.sweeper.interval.as_secs());
    println!();

    println!("{}", "Inventory:".bold());
    match &config.spec.inventory.snapshot_file {
        Some(path) => println!("  Snapshot file: {}", path.display()),
        None => println!("  Snapshot file: {}", "(none, logins disabled)".dimmed()),
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = AuthNodeConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse_and_validate() {
        for template in [MINIMAL_TEMPLATE, EXAMPLES_TEMPLATE] {
            let config = AuthNodeConfig::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_examples_template_values() {
        let config = AuthNodeConfig::from_yaml_str(EXAMPLES_TEMPLATE).unwrap();
        assert_eq!(config.spec.sweeper.interval.as_secs(), 60);
        assert_eq!(config.spec.leases.max_ttl.as_secs(), 768 * 3600);
        assert!(config.spec.inventory.snapshot_file.is_some());
    }
}
