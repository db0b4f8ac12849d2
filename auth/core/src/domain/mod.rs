// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Auth Domain Layer
//!
//! Pure domain types and collaborator contracts. No I/O.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`instance`] | `InstanceSnapshot`, `InstanceAddress` |
//! | [`role`] | `Role`, `RoleUpdate`, `LeaseLimits`, `RoleValidationError` |
//! | [`auth_attempt`] | `AuthAttempt` |
//! | [`attestation`] | `AttestationError` |
//! | [`storage`] | `KeyValueStore`, `StorageError` |
//! | [`inventory`] | `InstanceInventory`, `InventoryConnector`, `InventoryError` |
//! | [`config`] | `InventoryConfig`, `InventoryConfigUpdate` |
//! | [`node_config`] | `AuthNodeConfig` host manifest |
//! | [`clock`] | `Clock`, `SystemClock`, `FixedClock` |

pub mod attestation;
pub mod auth_attempt;
pub mod clock;
pub mod config;
pub mod instance;
pub mod inventory;
pub mod node_config;
pub mod role;
pub mod storage;

pub use attestation::AttestationError;
pub use auth_attempt::AuthAttempt;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{InventoryConfig, InventoryConfigUpdate};
pub use instance::{InstanceAddress, InstanceSnapshot, ACTIVE_STATUS};
pub use inventory::{InstanceInventory, InventoryConnector, InventoryError};
pub use role::{LeaseLimits, LeaseTerms, Role, RoleUpdate, RoleValidationError};
pub use storage::{KeyValueStore, StorageError};
