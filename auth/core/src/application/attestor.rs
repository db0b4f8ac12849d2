// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Attestor
//!
//! Verifies an [`InstanceSnapshot`] against a [`Role`] and the source
//! addresses the caller claims to be connecting from.
//!
//! ## Check Order
//!
//! ```text
//! attest(snapshot, role, claimed)
//!   1. auth period   created + auth_period >= now         DeadlineExceeded
//!   2. auth limit    ledger.record_attempt + check_limit   AttemptLimitExceeded
//!   3. address       any claimed == any instance address   AddressMismatch
//!   4. status        status == "ACTIVE"                    InstanceNotActive
//!   5. metadata      metadata[metadata_key] == role name   MetadataKeyMissing / MetadataMismatch
//!   6. tenant        role tenant empty or equal            TenantMismatch
//!   7. user          role user empty or equal              UserMismatch
//! ```
//!
//! The first failing check decides the result. The attempt in step 2 is
//! recorded even when step 1 has already failed, so late attempts still
//! consume the instance's budget; the deadline error is the one reported.
//!
//! Each check is public so the renewal path can re-run only the metadata
//! and address checks.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::application::attempt_ledger::AttemptLedger;
use crate::domain::attestation::AttestationError;
use crate::domain::clock::Clock;
use crate::domain::instance::InstanceSnapshot;
use crate::domain::role::{auth_deadline, Role};

pub struct Attestor {
    ledger: Arc<AttemptLedger>,
    clock: Arc<dyn Clock>,
}

impl Attestor {
    pub fn new(ledger: Arc<AttemptLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    /// Run every check in order; the first failure is returned.
    pub async fn attest<S: AsRef<str>>(
        &self,
        instance: &InstanceSnapshot,
        role: &Role,
        claimed_addresses: &[S],
    ) -> Result<(), AttestationError> {
        let deadline = role.auth_deadline(instance.created);
        let period_check = self.verify_auth_period(instance, role.auth_period);

        let attempts = self.ledger.record_attempt(&instance.id, deadline).await;
        period_check?;
        AttemptLedger::check_limit(attempts?, role.auth_limit)?;

        self.attest_addr(instance, claimed_addresses)?;
        self.attest_status(instance)?;
        self.attest_metadata(instance, &role.metadata_key, &role.name)?;
        self.attest_tenant_id(instance, &role.tenant_id)?;
        self.attest_user_id(instance, &role.user_id)?;

        Ok(())
    }

    /// Deadline for this instance's login window. Fails once the window
    /// (anchored to instance creation) has closed.
    pub fn verify_auth_period(
        &self,
        instance: &InstanceSnapshot,
        period: Duration,
    ) -> Result<DateTime<Utc>, AttestationError> {
        let deadline = auth_deadline(instance.created, period);
        if self.clock.now() > deadline {
            return Err(AttestationError::DeadlineExceeded { deadline });
        }
        Ok(deadline)
    }

    /// Record this attempt and enforce the role's attempt budget.
    pub async fn verify_auth_limit(
        &self,
        instance: &InstanceSnapshot,
        limit: i64,
        deadline: DateTime<Utc>,
    ) -> Result<u64, AttestationError> {
        let attempts = self.ledger.record_attempt(&instance.id, deadline).await?;
        AttemptLedger::check_limit(attempts, limit)?;
        Ok(attempts)
    }

    /// Succeeds if any claimed address belongs to the instance.
    pub fn attest_addr<S: AsRef<str>>(
        &self,
        instance: &InstanceSnapshot,
        claimed_addresses: &[S],
    ) -> Result<(), AttestationError> {
        if claimed_addresses
            .iter()
            .any(|claimed| instance.owns_address(claimed.as_ref()))
        {
            return Ok(());
        }
        Err(AttestationError::AddressMismatch)
    }

    pub fn attest_status(&self, instance: &InstanceSnapshot) -> Result<(), AttestationError> {
        if !instance.is_active() {
            return Err(AttestationError::InstanceNotActive {
                status: instance.status.clone(),
            });
        }
        Ok(())
    }

    pub fn attest_metadata(
        &self,
        instance: &InstanceSnapshot,
        metadata_key: &str,
        role_name: &str,
    ) -> Result<(), AttestationError> {
        match instance.metadata.get(metadata_key) {
            None => Err(AttestationError::MetadataKeyMissing {
                key: metadata_key.to_string(),
            }),
            Some(value) if value != role_name => Err(AttestationError::MetadataMismatch),
            Some(_) => Ok(()),
        }
    }

    /// An empty `tenant_id` means the role is not tenant-bound.
    pub fn attest_tenant_id(
        &self,
        instance: &InstanceSnapshot,
        tenant_id: &str,
    ) -> Result<(), AttestationError> {
        if tenant_id.is_empty() || instance.tenant_id == tenant_id {
            return Ok(());
        }
        Err(AttestationError::TenantMismatch)
    }

    /// An empty `user_id` means the role is not user-bound.
    pub fn attest_user_id(
        &self,
        instance: &InstanceSnapshot,
        user_id: &str,
    ) -> Result<(), AttestationError> {
        if user_id.is_empty() || instance.user_id == user_id {
            return Ok(());
        }
        Err(AttestationError::UserMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::instance::{InstanceAddress, ACTIVE_STATUS};
    use crate::infrastructure::storage::memory::InMemoryKeyValueStore;
    use std::collections::HashMap;

    fn attestor(now: DateTime<Utc>) -> Attestor {
        let ledger = Arc::new(AttemptLedger::new(Arc::new(InMemoryKeyValueStore::new())));
        Attestor::new(ledger, Arc::new(FixedClock::new(now)))
    }

    fn instance(now: DateTime<Utc>) -> InstanceSnapshot {
        InstanceSnapshot {
            id: "ef079b0c-e610-4dfb-b1aa-b49f07ac48e5".to_string(),
            name: "test".to_string(),
            status: ACTIVE_STATUS.to_string(),
            tenant_id: "fcad67a6189847c4aecfa3c81a05783b".to_string(),
            user_id: "9349aff8be7545ac9d2f1d00999a23cd".to_string(),
            created: now,
            access_ipv4: String::new(),
            access_ipv6: String::new(),
            metadata: HashMap::new(),
            addresses: HashMap::new(),
        }
    }

    #[test]
    fn test_attest_metadata() {
        let now = Utc::now();
        let at = attestor(now);
        let cases = [
            ("vault-role", "test", Ok(())),
            (
                "invalid",
                "test",
                Err(AttestationError::MetadataKeyMissing { key: "vault-role".to_string() }),
            ),
            ("vault-role", "invalid", Err(AttestationError::MetadataMismatch)),
        ];

        for (key, value, expected) in cases {
            let mut inst = instance(now);
            inst.metadata.insert(key.to_string(), value.to_string());
            assert_eq!(at.attest_metadata(&inst, "vault-role", "test"), expected, "{key}={value}");
        }
    }

    #[test]
    fn test_attest_status() {
        let now = Utc::now();
        let at = attestor(now);
        let mut inst = instance(now);
        assert!(at.attest_status(&inst).is_ok());

        inst.status = "STOPPED".to_string();
        assert_eq!(
            at.attest_status(&inst),
            Err(AttestationError::InstanceNotActive { status: "STOPPED".to_string() })
        );
    }

    #[test]
    fn test_attest_addr() {
        // (access ipv4, interface addresses, claimed addresses, accepted)
        let cases: &[(&str, &[&str], &[&str], bool)] = &[
            ("192.168.1.1", &["192.168.1.1"], &["192.168.1.1"], true),
            ("192.168.1.1", &[], &["192.168.1.1"], true),
            ("", &["192.168.1.1"], &["192.168.1.1"], true),
            ("", &["192.168.1.1", "192.168.1.2"], &["192.168.1.1"], true),
            ("192.168.1.2", &["192.168.1.2"], &["192.168.1.1"], false),
            ("192.168.1.2", &[], &["192.168.1.1"], false),
            ("", &["192.168.1.2"], &["192.168.1.1"], false),
            ("", &["192.168.1.2", "192.168.1.3"], &["192.168.1.1"], false),
            // behind a proxy: the instance address is only among the forwarded ones
            ("192.168.1.1", &["192.168.1.1"], &["192.168.2.1", "192.168.1.1"], true),
            ("192.168.1.1", &[], &["192.168.2.1", "192.168.1.1"], true),
            ("", &["192.168.1.1"], &["192.168.2.1", "192.168.1.1"], true),
            ("", &["192.168.1.1", "192.168.1.2"], &["192.168.2.1", "192.168.1.1"], true),
            ("192.168.1.2", &["192.168.1.2"], &["192.168.2.1", "192.168.1.1"], false),
            ("", &[], &[""], false),
        ];

        let now = Utc::now();
        let at = attestor(now);
        for (access, interfaces, claimed, accepted) in cases {
            let mut inst = instance(now);
            inst.access_ipv4 = access.to_string();
            inst.addresses.insert(
                "private".to_string(),
                interfaces.iter().map(|a| InstanceAddress::v4(*a)).collect(),
            );
            let result = at.attest_addr(&inst, *claimed);
            assert_eq!(result.is_ok(), *accepted, "{access} {interfaces:?} {claimed:?}");
        }
    }

    #[test]
    fn test_attest_addr_matches_ipv6_access_and_interfaces() {
        let now = Utc::now();
        let at = attestor(now);
        let mut inst = instance(now);
        inst.access_ipv6 = "2001:db8::10".to_string();
        inst.addresses
            .insert("public".to_string(), vec![InstanceAddress::v6("2001:db8::20")]);

        assert!(at.attest_addr(&inst, &["2001:db8::10"]).is_ok());
        assert!(at.attest_addr(&inst, &["10.0.0.1", "2001:db8::20"]).is_ok());
        assert!(at.attest_addr(&inst, &["2001:db8::30"]).is_err());
    }

    #[test]
    fn test_tenant_and_user_bindings() {
        let now = Utc::now();
        let at = attestor(now);
        let inst = instance(now);

        assert!(at.attest_tenant_id(&inst, "").is_ok());
        assert!(at.attest_tenant_id(&inst, "fcad67a6189847c4aecfa3c81a05783b").is_ok());
        assert_eq!(at.attest_tenant_id(&inst, "invalid"), Err(AttestationError::TenantMismatch));

        assert!(at.attest_user_id(&inst, "").is_ok());
        assert!(at.attest_user_id(&inst, "9349aff8be7545ac9d2f1d00999a23cd").is_ok());
        assert_eq!(at.attest_user_id(&inst, "invalid"), Err(AttestationError::UserMismatch));
    }

    #[test]
    fn test_verify_auth_period() {
        let now = Utc::now();
        let at = attestor(now);
        let mut inst = instance(now);

        let deadline = at.verify_auth_period(&inst, Duration::seconds(120)).unwrap();
        assert_eq!(deadline, now + Duration::seconds(120));

        // Exactly at the deadline is still inside the window.
        inst.created = now - Duration::seconds(120);
        assert!(at.verify_auth_period(&inst, Duration::seconds(120)).is_ok());

        inst.created = now - Duration::seconds(130);
        assert!(matches!(
            at.verify_auth_period(&inst, Duration::seconds(120)),
            Err(AttestationError::DeadlineExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_auth_period_does_not_overflow() {
        let now = Utc::now();
        let at = attestor(now);
        let mut inst = instance(now);
        inst.access_ipv4 = "192.168.1.1".to_string();
        inst.metadata.insert("vault-role".to_string(), "test".to_string());

        // Stored before the ceiling existed, so never validated.
        let mut role = Role::new("test");
        role.auth_period = Duration::seconds(9_000_000_000_000_000);

        assert!(at.attest(&inst, &role, &["192.168.1.1"]).await.is_ok());
        let record = at.ledger.get(&inst.id).await.unwrap().unwrap();
        assert_eq!(record.deadline, now + Duration::days(365));
    }

    #[tokio::test]
    async fn test_verify_auth_limit() {
        let now = Utc::now();
        let at = attestor(now);
        let inst = instance(now);
        let deadline = now + Duration::seconds(120);

        assert_eq!(at.verify_auth_limit(&inst, 2, deadline).await.unwrap(), 1);
        assert_eq!(at.verify_auth_limit(&inst, 2, deadline).await.unwrap(), 2);
        assert!(matches!(
            at.verify_auth_limit(&inst, 2, deadline).await,
            Err(AttestationError::AttemptLimitExceeded { attempts: 3, limit: 2 })
        ));
    }
}
