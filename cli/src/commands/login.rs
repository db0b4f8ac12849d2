// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Login command
//!
//! Runs one login against the configured storage and inventory and prints
//! the issued grant. Mostly useful to check a role and an instance snapshot
//! before wiring the engine into a host.

use anyhow::{Context, Result};
use clap::Args;
use std::collections::HashMap;
use std::path::PathBuf;

use aegis_auth_core::application::LoginRequest;

use super::{open_backend, print_json};

#[derive(Args, Debug)]
pub struct LoginCommand {
    /// Instance ID
    #[arg(long)]
    pub instance_id: String,

    /// Role name
    #[arg(long)]
    pub role: String,

    /// Source address the request arrived from
    #[arg(long, value_name = "ADDR")]
    pub remote_addr: String,

    /// Request header as NAME=VALUE (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.trim().is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.trim().to_string(), value.to_string()))
}

pub async fn execute(command: LoginCommand, config_override: Option<PathBuf>) -> Result<()> {
    let (_, backend) = open_backend(config_override)?;

    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in command.headers {
        headers
            .entry(name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value.clone());
    }

    let grant = backend
        .login(LoginRequest {
            instance_id: Some(command.instance_id),
            role: Some(command.role),
            remote_addr: command.remote_addr,
            headers,
        })
        .await
        .context("Login failed")?;

    print_json(&grant)
}
