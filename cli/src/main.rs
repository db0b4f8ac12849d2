// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Auth Host CLI
//!
//! The `aegis-auth` binary hosts the instance auth engine against the
//! storage engine named in the node configuration.
//!
//! ## Commands
//!
//! - `aegis-auth role write|read|list|delete|validate` - Role administration
//! - `aegis-auth inventory-config write|read` - Inventory connection settings
//! - `aegis-auth login` - Authenticate an instance and print the grant
//! - `aegis-auth sweep [--watch]` - Remove expired attempt records
//! - `aegis-auth config show|validate|generate` - Node configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use aegis_auth::commands::{self, ConfigCommand, InventoryConfigCommand, LoginCommand, RoleCommand, SweepCommand};

/// AEGIS Auth Host - Instance attestation and login
#[derive(Parser)]
#[command(name = "aegis-auth")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AEGIS_AUTH_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AEGIS_AUTH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Role administration
    #[command(name = "role")]
    Role {
        #[command(subcommand)]
        command: RoleCommand,
    },

    /// Inventory connection settings
    #[command(name = "inventory-config")]
    InventoryConfig {
        #[command(subcommand)]
        command: InventoryConfigCommand,
    },

    /// Authenticate an instance
    #[command(name = "login")]
    Login {
        #[command(flatten)]
        command: LoginCommand,
    },

    /// Remove expired attempt records
    #[command(name = "sweep")]
    Sweep {
        #[command(flatten)]
        command: SweepCommand,
    },

    /// Node configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Role { command }) => commands::role::handle_command(command, cli.config).await,
        Some(Commands::InventoryConfig { command }) => {
            commands::inventory_config::handle_command(command, cli.config).await
        }
        Some(Commands::Login { command }) => commands::login::execute(command, cli.config).await,
        Some(Commands::Sweep { command }) => commands::sweep::execute(command, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
