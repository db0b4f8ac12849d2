// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Infrastructure Layer
//!
//! Concrete adapters for the domain contracts.
//!
//! | Module | Adapters |
//! |--------|----------|
//! | [`storage`] | `InMemoryKeyValueStore`, `SledKeyValueStore` |
//! | [`inventory`] | `InventoryClientCache`, `FileInventoryConnector`, `InMemoryInventory` |

pub mod inventory;
pub mod storage;
