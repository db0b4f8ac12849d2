// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Role administration commands
//!
//! Commands: write, read, list, delete, validate

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use aegis_auth_core::domain::role::{Role, RoleUpdate};

use super::{load_node_config, open_backend, print_json};

#[derive(Subcommand)]
pub enum RoleCommand {
    /// Create or update a role; omitted fields keep their current value
    Write {
        /// Role name (case-insensitive)
        #[arg(value_name = "NAME")]
        name: String,

        #[command(flatten)]
        fields: RoleFields,
    },

    /// Show a role
    Read {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List role names
    List,

    /// Delete a role
    Delete {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Check a role definition file against the lease limits without storing it
    Validate {
        /// YAML or JSON role definition
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Role fields. Durations are whole seconds.
#[derive(Args, Debug, Default)]
pub struct RoleFields {
    /// Comma-separated policy names
    #[arg(long, value_delimiter = ',')]
    pub policies: Option<Vec<String>>,

    /// Token TTL in seconds
    #[arg(long, allow_hyphen_values = true)]
    pub ttl: Option<i64>,

    /// Token maximum TTL in seconds
    #[arg(long, allow_hyphen_values = true)]
    pub max_ttl: Option<i64>,

    /// Periodic token renewal period in seconds
    #[arg(long, allow_hyphen_values = true)]
    pub period: Option<i64>,

    /// Instance metadata key that must name this role
    #[arg(long)]
    pub metadata_key: Option<String>,

    /// Tenant the instance must belong to
    #[arg(long)]
    pub tenant_id: Option<String>,

    /// User the instance must be owned by
    #[arg(long)]
    pub user_id: Option<String>,

    /// Login window after instance creation, in seconds
    #[arg(long, allow_hyphen_values = true)]
    pub auth_period: Option<i64>,

    /// Login attempts allowed per window
    #[arg(long, allow_hyphen_values = true)]
    pub auth_limit: Option<i64>,
}

impl TryFrom<RoleFields> for RoleUpdate {
    type Error = anyhow::Error;

    fn try_from(f: RoleFields) -> Result<Self> {
        Ok(RoleUpdate {
            policies: f.policies,
            ttl: seconds("ttl", f.ttl)?,
            max_ttl: seconds("max_ttl", f.max_ttl)?,
            period: seconds("period", f.period)?,
            metadata_key: f.metadata_key,
            tenant_id: f.tenant_id,
            user_id: f.user_id,
            auth_period: seconds("auth_period", f.auth_period)?,
            auth_limit: f.auth_limit,
        })
    }
}

fn seconds(field: &str, value: Option<i64>) -> Result<Option<Duration>> {
    value
        .map(|secs| {
            Duration::try_seconds(secs)
                .with_context(|| format!("{} of {} seconds is out of range", field, secs))
        })
        .transpose()
}

pub async fn handle_command(command: RoleCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        RoleCommand::Write { name, fields } => write(name, fields, config_override).await,
        RoleCommand::Read { name } => read(name, config_override).await,
        RoleCommand::List => list(config_override).await,
        RoleCommand::Delete { name } => delete(name, config_override).await,
        RoleCommand::Validate { file } => validate(file, config_override),
    }
}

async fn write(name: String, fields: RoleFields, config_override: Option<PathBuf>) -> Result<()> {
    let update = RoleUpdate::try_from(fields)?;
    let (_, backend) = open_backend(config_override)?;
    let warnings = backend.roles().write_role(&name, update).await?;
    for warning in &warnings {
        println!("{} {}", "warning:".yellow(), warning);
    }
    println!("{}", format!("✓ Role '{}' written", name.to_lowercase()).green());
    Ok(())
}

async fn read(name: String, config_override: Option<PathBuf>) -> Result<()> {
    let (_, backend) = open_backend(config_override)?;
    match backend.roles().read_role(&name).await? {
        Some(role) => print_json(&role),
        None => anyhow::bail!("role '{}' not found", name),
    }
}

async fn list(config_override: Option<PathBuf>) -> Result<()> {
    let (_, backend) = open_backend(config_override)?;
    let names = backend.roles().list_roles().await?;
    if names.is_empty() {
        println!("{}", "(no roles)".dimmed());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

async fn delete(name: String, config_override: Option<PathBuf>) -> Result<()> {
    let (_, backend) = open_backend(config_override)?;
    backend.roles().delete_role(&name).await?;
    println!("{}", format!("✓ Role '{}' deleted", name.to_lowercase()).green());
    Ok(())
}

fn validate(file: PathBuf, config_override: Option<PathBuf>) -> Result<()> {
    let node = load_node_config(config_override)?;
    let limits = node.spec.leases.limits()?;

    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read role definition {:?}", file))?;
    let role: Role = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse role definition {:?}", file))?;

    let warnings = role
        .validate(&limits)
        .with_context(|| format!("Role '{}' is invalid", role.name))?;
    for warning in &warnings {
        println!("{} {}", "warning:".yellow(), warning);
    }
    println!("{}", format!("✓ Role '{}' is valid", role.name).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_convert_seconds() {
        let update = RoleUpdate::try_from(RoleFields {
            ttl: Some(60),
            auth_period: Some(-1),
            auth_limit: Some(2),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.ttl, Some(Duration::seconds(60)));
        assert_eq!(update.auth_period, Some(Duration::seconds(-1)));
        assert_eq!(update.auth_limit, Some(2));
        assert_eq!(update.max_ttl, None);
    }

    #[test]
    fn test_out_of_range_seconds_are_an_error() {
        let err = RoleUpdate::try_from(RoleFields {
            ttl: Some(i64::MAX),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("ttl of 9223372036854775807 seconds is out of range"));

        assert!(RoleUpdate::try_from(RoleFields {
            auth_period: Some(i64::MIN),
            ..Default::default()
        })
        .is_err());
    }
}
