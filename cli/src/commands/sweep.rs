// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sweep command
//!
//! One-shot removal of expired attempt records, or with `--watch` a
//! foreground sweeper on the configured interval until Ctrl-C.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::sweeper::AttemptSweeper;

use super::open_backend;

#[derive(Args, Debug)]
pub struct SweepCommand {
    /// Keep sweeping on the configured interval until interrupted
    #[arg(long)]
    pub watch: bool,
}

pub async fn execute(command: SweepCommand, config_override: Option<PathBuf>) -> Result<()> {
    let (config, backend) = open_backend(config_override)?;
    let backend = Arc::new(backend);

    if !command.watch {
        let removed = backend.periodic().await.context("Sweep failed")?;
        println!(
            "{}",
            format!("✓ {} expired auth attempts removed", removed).green()
        );
        return Ok(());
    }

    let sweeper = Arc::new(AttemptSweeper::new(backend.clone(), &config.spec.sweeper));
    let token = sweeper.shutdown_token();
    let mut handle = sweeper.start();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted, shutting down");
            token.cancel();
            (&mut handle).await.context("Sweeper task panicked")?;
        }
        joined = &mut handle => {
            // Only returns on its own when the sweeper is disabled.
            joined.context("Sweeper task panicked")?;
        }
    }

    backend.close().await;
    Ok(())
}
