// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Inventory connection settings commands
//!
//! Commands: write, read

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use aegis_auth_core::domain::config::InventoryConfigUpdate;

use super::{open_backend, print_json};

#[derive(Subcommand)]
pub enum InventoryConfigCommand {
    /// Merge the given settings into the stored ones
    Write {
        #[command(flatten)]
        fields: InventoryConfigFields,
    },

    /// Show the stored settings (token and password are masked)
    Read,
}

#[derive(Args, Debug, Default)]
pub struct InventoryConfigFields {
    /// Identity endpoint of the inventory
    #[arg(long)]
    pub auth_url: Option<String>,
    #[arg(long)]
    pub token: Option<String>,
    #[arg(long)]
    pub user_id: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long, env = "AEGIS_AUTH_INVENTORY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long)]
    pub project_id: Option<String>,
    #[arg(long)]
    pub project_name: Option<String>,
    /// Overrides --project-id when connecting
    #[arg(long)]
    pub tenant_id: Option<String>,
    /// Overrides --project-name when connecting
    #[arg(long)]
    pub tenant_name: Option<String>,
    #[arg(long)]
    pub user_domain_id: Option<String>,
    #[arg(long)]
    pub user_domain_name: Option<String>,
    #[arg(long)]
    pub project_domain_id: Option<String>,
    #[arg(long)]
    pub project_domain_name: Option<String>,
    #[arg(long)]
    pub domain_id: Option<String>,
    #[arg(long)]
    pub domain_name: Option<String>,
    /// Request header carrying forwarded client addresses (repeatable)
    #[arg(long = "request-address-header", value_name = "HEADER")]
    pub request_address_headers: Option<Vec<String>>,
}

impl From<InventoryConfigFields> for InventoryConfigUpdate {
    fn from(f: InventoryConfigFields) -> Self {
        InventoryConfigUpdate {
            auth_url: f.auth_url,
            token: f.token,
            user_id: f.user_id,
            username: f.username,
            password: f.password,
            project_id: f.project_id,
            project_name: f.project_name,
            tenant_id: f.tenant_id,
            tenant_name: f.tenant_name,
            user_domain_id: f.user_domain_id,
            user_domain_name: f.user_domain_name,
            project_domain_id: f.project_domain_id,
            project_domain_name: f.project_domain_name,
            domain_id: f.domain_id,
            domain_name: f.domain_name,
            request_address_headers: f.request_address_headers,
        }
    }
}

pub async fn handle_command(
    command: InventoryConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    let (_, backend) = open_backend(config_override)?;
    match command {
        InventoryConfigCommand::Write { fields } => {
            let stored = backend.config().write_config(fields.into()).await?;
            print_json(&stored)?;
            println!("{}", "✓ Inventory configuration written".green());
        }
        InventoryConfigCommand::Read => match backend.config().read_config().await? {
            Some(config) => print_json(&config)?,
            None => println!("{}", "(inventory connection not configured)".dimmed()),
        },
    }
    Ok(())
}
