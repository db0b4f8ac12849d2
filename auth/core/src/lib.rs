// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AEGIS Auth Core
//!
//! Instance attestation engine for the AEGIS auth backend: compute instances
//! prove their identity against an authoritative inventory and receive a
//! credential grant, subject to a per-instance login window and attempt
//! budget.
//!
//! # Architecture
//!
//! - **domain:** pure types and collaborator contracts
//! - **application:** attempt ledger, attestor, role/config services, login
//! - **infrastructure:** storage engines and inventory adapters

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
