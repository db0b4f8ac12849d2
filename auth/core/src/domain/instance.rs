// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Instance Snapshot (Inventory Anti-Corruption Layer)
//!
//! Point-in-time read of a compute instance's authoritative attributes, as
//! returned by the inventory provider. A snapshot is fetched fresh for every
//! login and renewal and is never mutated by the attestation engine.
//!
//! The shape mirrors what a compute inventory exposes for a server: identity,
//! lifecycle status, ownership, creation time, the two access addresses and
//! the per-network interface addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Lifecycle status an instance must report to be eligible for login.
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// One address attached to an instance network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceAddress {
    /// IP version reported by the inventory (4 or 6).
    pub version: u8,
    #[serde(rename = "addr")]
    pub address: String,
}

impl InstanceAddress {
    pub fn v4(address: impl Into<String>) -> Self {
        Self { version: 4, address: address.into() }
    }

    pub fn v6(address: impl Into<String>) -> Self {
        Self { version: 6, address: address.into() }
    }
}

/// Authoritative view of a single instance.
///
/// # Invariants
///
/// - `id` is stable for the lifetime of the instance and keys the attempt ledger.
/// - Empty `access_ipv4` / `access_ipv6` mean "not assigned" and never match a
///   claimed address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub id: String,
    pub name: String,
    pub status: String,
    pub tenant_id: String,
    pub user_id: String,
    pub created: DateTime<Utc>,
    #[serde(default, rename = "accessIPv4")]
    pub access_ipv4: String,
    #[serde(default, rename = "accessIPv6")]
    pub access_ipv6: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Network label -> interface addresses, in inventory order.
    #[serde(default)]
    pub addresses: HashMap<String, Vec<InstanceAddress>>,
}

impl InstanceSnapshot {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }

    /// Every non-empty address known for this instance: both access
    /// addresses followed by all interface addresses, any label, any version.
    pub fn known_addresses(&self) -> impl Iterator<Item = &str> {
        [self.access_ipv4.as_str(), self.access_ipv6.as_str()]
            .into_iter()
            .chain(
                self.addresses
                    .values()
                    .flat_map(|addrs| addrs.iter().map(|a| a.address.as_str())),
            )
            .filter(|a| !a.is_empty())
    }

    /// Whether `claimed` names any address this instance owns.
    pub fn owns_address(&self, claimed: &str) -> bool {
        let claimed = claimed.trim();
        if claimed.is_empty() {
            return false;
        }
        self.known_addresses().any(|known| addresses_equal(known, claimed))
    }
}

/// Compare two textual addresses, canonicalising through [`IpAddr`] when both
/// parse so that `::1` and `0:0:0:0:0:0:0:1` are the same address.
fn addresses_equal(a: &str, b: &str) -> bool {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> InstanceSnapshot {
        InstanceSnapshot {
            id: "ef079b0c-e610-4dfb-b1aa-b49f07ac48e5".to_string(),
            name: "test".to_string(),
            status: ACTIVE_STATUS.to_string(),
            tenant_id: "fcad67a6189847c4aecfa3c81a05783b".to_string(),
            user_id: "9349aff8be7545ac9d2f1d00999a23cd".to_string(),
            created: Utc::now(),
            access_ipv4: String::new(),
            access_ipv6: String::new(),
            metadata: HashMap::new(),
            addresses: HashMap::new(),
        }
    }

    #[test]
    fn test_empty_access_addresses_never_match() {
        let instance = snapshot();
        assert!(!instance.owns_address(""));
        assert!(!instance.owns_address("  "));
        assert_eq!(instance.known_addresses().count(), 0);
    }

    #[test]
    fn test_ipv6_addresses_compare_canonically() {
        let mut instance = snapshot();
        instance
            .addresses
            .insert("private".to_string(), vec![InstanceAddress::v6("fd00::1")]);
        assert!(instance.owns_address("fd00:0:0:0:0:0:0:1"));
        assert!(!instance.owns_address("fd00::2"));
    }

    #[test]
    fn test_snapshot_decodes_inventory_json() {
        let json = r#"{
            "id": "i-1",
            "name": "web",
            "status": "ACTIVE",
            "tenant_id": "t",
            "user_id": "u",
            "created": "2026-01-01T00:00:00Z",
            "accessIPv4": "10.0.0.5",
            "metadata": {"vault-role": "web"},
            "addresses": {"private": [{"version": 4, "addr": "192.168.0.7"}]}
        }"#;
        let instance: InstanceSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(instance.access_ipv6, "");
        assert!(instance.owns_address("10.0.0.5"));
        assert!(instance.owns_address("192.168.0.7"));
    }
}
