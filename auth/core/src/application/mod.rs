// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Layer
//!
//! Services orchestrating the domain: the attempt ledger and attestor that
//! implement the login checks, role and config administration, the
//! login/renew use case and the [`backend::AuthBackend`] composition root.

pub mod attempt_ledger;
pub mod attestor;
pub mod backend;
pub mod config_service;
pub mod login;
pub mod role_service;

pub use attempt_ledger::AttemptLedger;
pub use attestor::Attestor;
pub use backend::AuthBackend;
pub use config_service::{ConfigError, ConfigService};
pub use login::{AuthGrant, LoginError, LoginRequest, LoginUseCase, RenewRequest, StandardLoginUseCase};
pub use role_service::{RoleService, RoleServiceError};
