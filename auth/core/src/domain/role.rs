// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Role Aggregate
//!
//! A `Role` binds instances to token policies and token settings. It also
//! carries the attestation parameters the login path enforces: which metadata
//! key must name the role, the optional tenant/user bindings, and the
//! authentication window (`auth_period`) and attempt budget (`auth_limit`).
//!
//! ## Validation
//!
//! [`Role::validate`] runs at role-write time, never at login. It separates
//! **hard errors** (the write is rejected) from **warnings** (the write
//! proceeds and the value is capped by [`LeaseLimits::cap`] when a grant is
//! issued).
//!
//! Durations are signed [`chrono::Duration`]s so that negative administrator
//! input can be represented and rejected instead of being silently clamped.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_METADATA_KEY: &str = "vault-role";
pub const DEFAULT_AUTH_PERIOD_SECS: i64 = 120;
pub const DEFAULT_AUTH_LIMIT: i64 = 1;
/// Longest login window a role may declare (one year).
pub const MAX_AUTH_PERIOD_SECS: i64 = 365 * 24 * 60 * 60;

/// Named bundle of policies, token TTLs and attestation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(with = "duration_seconds", default = "Duration::zero")]
    pub ttl: Duration,
    #[serde(with = "duration_seconds", default = "Duration::zero")]
    pub max_ttl: Duration,
    #[serde(with = "duration_seconds", default = "Duration::zero")]
    pub period: Duration,
    #[serde(default = "default_metadata_key")]
    pub metadata_key: String,
    /// Empty means the role is not bound to a tenant.
    #[serde(default)]
    pub tenant_id: String,
    /// Empty means the role is not bound to a user.
    #[serde(default)]
    pub user_id: String,
    #[serde(with = "duration_seconds", default = "default_auth_period")]
    pub auth_period: Duration,
    #[serde(default = "default_auth_limit")]
    pub auth_limit: i64,
}

impl Role {
    /// A role with every field at its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policies: Vec::new(),
            ttl: Duration::zero(),
            max_ttl: Duration::zero(),
            period: Duration::zero(),
            metadata_key: default_metadata_key(),
            tenant_id: String::new(),
            user_id: String::new(),
            auth_period: default_auth_period(),
            auth_limit: DEFAULT_AUTH_LIMIT,
        }
    }

    /// Validate the role against the system lease ceilings.
    ///
    /// Returns the soft warnings on success.
    ///
    /// # Errors
    ///
    /// Any [`RoleValidationError`]; the role must not be persisted.
    pub fn validate(&self, limits: &LeaseLimits) -> Result<Vec<String>, RoleValidationError> {
        let mut warnings = Vec::new();

        if self.metadata_key.is_empty() {
            return Err(RoleValidationError::EmptyMetadataKey);
        }
        if self.auth_period < Duration::zero() {
            return Err(RoleValidationError::NegativeAuthPeriod);
        }
        if self.auth_period > Duration::seconds(MAX_AUTH_PERIOD_SECS) {
            return Err(RoleValidationError::AuthPeriodTooLong {
                period_secs: self.auth_period.num_seconds(),
                max_secs: MAX_AUTH_PERIOD_SECS,
            });
        }
        if self.auth_limit < 0 {
            return Err(RoleValidationError::NegativeAuthLimit);
        }

        if self.ttl > limits.default_ttl {
            warnings.push(format!(
                "Given ttl of {} seconds greater than current mount/system default of {} seconds; ttl will be capped at login time",
                self.ttl.num_seconds(),
                limits.default_ttl.num_seconds()
            ));
        }
        if self.max_ttl > limits.max_ttl {
            warnings.push(format!(
                "Given max_ttl of {} seconds greater than current mount/system default of {} seconds; max_ttl will be capped at login time",
                self.max_ttl.num_seconds(),
                limits.max_ttl.num_seconds()
            ));
        }

        if self.max_ttl < Duration::zero() {
            return Err(RoleValidationError::NegativeMaxTtl);
        }
        if !self.max_ttl.is_zero() && self.max_ttl < self.ttl {
            return Err(RoleValidationError::TtlExceedsMaxTtl);
        }
        if self.period > limits.max_ttl {
            return Err(RoleValidationError::PeriodExceedsMaxLeaseTtl {
                period_secs: self.period.num_seconds(),
                max_secs: limits.max_ttl.num_seconds(),
            });
        }

        Ok(warnings)
    }

    /// End of the login window for an instance created at `created`.
    ///
    /// The period is clamped to [`MAX_AUTH_PERIOD_SECS`] so records written
    /// before that ceiling existed still yield a representable deadline.
    pub fn auth_deadline(&self, created: DateTime<Utc>) -> DateTime<Utc> {
        auth_deadline(created, self.auth_period)
    }

    /// Merge the fields present in `update` into this role.
    pub fn apply(&mut self, update: RoleUpdate) {
        if let Some(policies) = update.policies {
            self.policies = sanitize_policies(&policies);
        }
        if let Some(ttl) = update.ttl {
            self.ttl = ttl;
        }
        if let Some(max_ttl) = update.max_ttl {
            self.max_ttl = max_ttl;
        }
        if let Some(period) = update.period {
            self.period = period;
        }
        if let Some(metadata_key) = update.metadata_key {
            self.metadata_key = metadata_key;
        }
        if let Some(tenant_id) = update.tenant_id {
            self.tenant_id = tenant_id;
        }
        if let Some(user_id) = update.user_id {
            self.user_id = user_id;
        }
        if let Some(auth_period) = update.auth_period {
            self.auth_period = auth_period;
        }
        if let Some(auth_limit) = update.auth_limit {
            self.auth_limit = auth_limit;
        }
    }
}

/// Administrative write request. `None` means "not supplied; keep the
/// stored value (or the default for a new role)".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUpdate {
    #[serde(default)]
    pub policies: Option<Vec<String>>,
    #[serde(default, with = "optional_duration_seconds")]
    pub ttl: Option<Duration>,
    #[serde(default, with = "optional_duration_seconds")]
    pub max_ttl: Option<Duration>,
    #[serde(default, with = "optional_duration_seconds")]
    pub period: Option<Duration>,
    #[serde(default)]
    pub metadata_key: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, with = "optional_duration_seconds")]
    pub auth_period: Option<Duration>,
    #[serde(default)]
    pub auth_limit: Option<i64>,
}

/// Hard role validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleValidationError {
    #[error("metadata_key cannot be empty")]
    EmptyMetadataKey,

    #[error("auth_period cannot be negative")]
    NegativeAuthPeriod,

    #[error("auth_period of '{period_secs}s' is greater than the maximum of '{max_secs}s'")]
    AuthPeriodTooLong { period_secs: i64, max_secs: i64 },

    #[error("auth_limit cannot be negative")]
    NegativeAuthLimit,

    #[error("max_ttl cannot be negative")]
    NegativeMaxTtl,

    #[error("ttl should be shorter than max_ttl")]
    TtlExceedsMaxTtl,

    #[error("'period' of '{period_secs}s' is greater than the backend's maximum lease TTL of '{max_secs}s'")]
    PeriodExceedsMaxLeaseTtl { period_secs: i64, max_secs: i64 },
}

/// System-wide lease ceilings (the mount/system default and maximum TTL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseLimits {
    pub default_ttl: Duration,
    pub max_ttl: Duration,
}

/// TTL parameters attached to an issued credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseTerms {
    #[serde(with = "duration_seconds")]
    pub ttl: Duration,
    #[serde(with = "duration_seconds")]
    pub max_ttl: Duration,
    #[serde(with = "duration_seconds")]
    pub period: Duration,
}

impl LeaseLimits {
    pub fn new(default_ttl: Duration, max_ttl: Duration) -> Self {
        Self { default_ttl, max_ttl }
    }

    /// Resolve the role's TTL fields against the ceilings.
    ///
    /// Zero (or negative) role values fall back to the system values; values
    /// above the ceiling are capped. `ttl` never exceeds the effective `max_ttl`.
    pub fn cap(&self, role: &Role) -> LeaseTerms {
        let max_ttl = if role.max_ttl > Duration::zero() {
            role.max_ttl.min(self.max_ttl)
        } else {
            self.max_ttl
        };
        let ttl = if role.ttl > Duration::zero() {
            role.ttl
        } else {
            self.default_ttl
        };
        LeaseTerms {
            ttl: ttl.min(max_ttl),
            max_ttl,
            period: role.period,
        }
    }
}

/// Validate `role` against explicit ceilings.
pub fn validate_role(
    role: &Role,
    default_ttl: Duration,
    max_ttl: Duration,
) -> Result<Vec<String>, RoleValidationError> {
    role.validate(&LeaseLimits::new(default_ttl, max_ttl))
}

/// `created + period` with the period clamped to [`MAX_AUTH_PERIOD_SECS`].
/// Saturates at the latest representable instant instead of overflowing.
pub fn auth_deadline(created: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    let period = period.min(Duration::seconds(MAX_AUTH_PERIOD_SECS));
    created
        .checked_add_signed(period)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Normalise a policy list: trimmed, lowercased, deduplicated, sorted, with
/// empty names dropped. A list containing `root` collapses to `["root"]`.
pub fn sanitize_policies(policies: &[String]) -> Vec<String> {
    let mut out: Vec<String> = policies
        .iter()
        .flat_map(|p| p.split(','))
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    if out.iter().any(|p| p == "root") {
        return vec!["root".to_string()];
    }
    out.sort();
    out.dedup();
    out
}

/// Whether two policy sets grant the same access. `default` is implicit on
/// every token and is ignored.
pub fn equivalent_policies(a: &[String], b: &[String]) -> bool {
    let strip = |ps: &[String]| -> Vec<String> {
        sanitize_policies(ps)
            .into_iter()
            .filter(|p| p != "default")
            .collect()
    };
    strip(a) == strip(b)
}

fn default_metadata_key() -> String {
    DEFAULT_METADATA_KEY.to_string()
}

fn default_auth_period() -> Duration {
    Duration::seconds(DEFAULT_AUTH_PERIOD_SECS)
}

fn default_auth_limit() -> i64 {
    DEFAULT_AUTH_LIMIT
}

/// Serde adapter storing a signed duration as whole seconds.
pub mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(d)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("duration of {secs} seconds is out of range")))
    }
}

pub mod optional_duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.num_seconds()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        match Option::<i64>::deserialize(d)? {
            Some(secs) => Duration::try_seconds(secs)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("duration of {secs} seconds is out of range"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LeaseLimits {
        LeaseLimits::new(Duration::seconds(3600), Duration::seconds(7200))
    }

    fn role() -> Role {
        let mut role = Role::new("test");
        role.ttl = Duration::seconds(60);
        role.max_ttl = Duration::seconds(120);
        role.period = Duration::seconds(120);
        role
    }

    #[test]
    fn test_defaults() {
        let role = Role::new("web");
        assert_eq!(role.metadata_key, "vault-role");
        assert_eq!(role.auth_period, Duration::seconds(120));
        assert_eq!(role.auth_limit, 1);
        assert!(role.tenant_id.is_empty());
    }

    #[test]
    fn test_valid_role_has_no_warnings() {
        assert_eq!(role().validate(&limits()).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_hard_errors() {
        let cases: Vec<(Box<dyn Fn(&mut Role)>, RoleValidationError)> = vec![
            (Box::new(|r: &mut Role| r.metadata_key.clear()), RoleValidationError::EmptyMetadataKey),
            (Box::new(|r: &mut Role| r.auth_period = Duration::seconds(-1)), RoleValidationError::NegativeAuthPeriod),
            (
                Box::new(|r: &mut Role| r.auth_period = Duration::seconds(MAX_AUTH_PERIOD_SECS + 1)),
                RoleValidationError::AuthPeriodTooLong {
                    period_secs: MAX_AUTH_PERIOD_SECS + 1,
                    max_secs: MAX_AUTH_PERIOD_SECS,
                },
            ),
            (Box::new(|r: &mut Role| r.auth_limit = -1), RoleValidationError::NegativeAuthLimit),
            (Box::new(|r: &mut Role| r.max_ttl = Duration::seconds(-1)), RoleValidationError::NegativeMaxTtl),
            (Box::new(|r: &mut Role| r.ttl = Duration::seconds(121)), RoleValidationError::TtlExceedsMaxTtl),
            (
                Box::new(|r: &mut Role| r.period = Duration::seconds(7201)),
                RoleValidationError::PeriodExceedsMaxLeaseTtl { period_secs: 7201, max_secs: 7200 },
            ),
        ];

        for (mutate, expected) in cases {
            let mut r = role();
            mutate(&mut r);
            assert_eq!(r.validate(&limits()).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_huge_auth_period_is_rejected_and_deadline_saturates() {
        let update: RoleUpdate = serde_json::from_str(r#"{"auth_period": 9000000000000000}"#).unwrap();
        let mut r = role();
        r.apply(update);
        assert!(matches!(
            r.validate(&limits()),
            Err(RoleValidationError::AuthPeriodTooLong { .. })
        ));

        let created = chrono::Utc::now();
        assert_eq!(
            r.auth_deadline(created),
            created + Duration::seconds(MAX_AUTH_PERIOD_SECS)
        );
        assert_eq!(
            auth_deadline(DateTime::<Utc>::MAX_UTC, Duration::seconds(1)),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn test_validate_role_with_explicit_ceilings() {
        let r = role();
        assert!(validate_role(&r, Duration::seconds(3600), Duration::seconds(7200)).is_ok());
        assert_eq!(
            validate_role(&r, Duration::seconds(30), Duration::seconds(60)).unwrap_err(),
            RoleValidationError::PeriodExceedsMaxLeaseTtl { period_secs: 120, max_secs: 60 }
        );
    }

    #[test]
    fn test_zero_max_ttl_allows_any_ttl() {
        let mut r = role();
        r.max_ttl = Duration::zero();
        r.ttl = Duration::seconds(100_000);
        let warnings = r.validate(&limits()).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Given ttl of 100000 seconds"));
    }

    #[test]
    fn test_generous_values_are_warnings() {
        let mut r = role();
        r.ttl = Duration::seconds(5000);
        r.max_ttl = Duration::seconds(9000);
        let warnings = r.validate(&limits()).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].contains("max_ttl will be capped at login time"));
    }

    #[test]
    fn test_cap_applies_ceilings() {
        let mut r = role();
        r.ttl = Duration::seconds(5000);
        r.max_ttl = Duration::seconds(9000);
        let terms = limits().cap(&r);
        assert_eq!(terms.max_ttl, Duration::seconds(7200));
        assert_eq!(terms.ttl, Duration::seconds(5000));

        let terms = limits().cap(&Role::new("defaults"));
        assert_eq!(terms.ttl, Duration::seconds(3600));
        assert_eq!(terms.max_ttl, Duration::seconds(7200));
    }

    #[test]
    fn test_apply_only_touches_present_fields() {
        let mut r = role();
        r.apply(RoleUpdate {
            auth_limit: Some(3),
            policies: Some(vec!["Dev, ops".to_string(), "dev".to_string()]),
            ..Default::default()
        });
        assert_eq!(r.auth_limit, 3);
        assert_eq!(r.policies, vec!["dev".to_string(), "ops".to_string()]);
        assert_eq!(r.ttl, Duration::seconds(60));
    }

    #[test]
    fn test_policy_helpers() {
        assert_eq!(
            sanitize_policies(&["admin".to_string(), "ROOT".to_string()]),
            vec!["root".to_string()]
        );
        assert!(equivalent_policies(
            &["b".to_string(), "a".to_string()],
            &["a".to_string(), "default".to_string(), "b".to_string()],
        ));
        assert!(!equivalent_policies(&["a".to_string()], &["b".to_string()]));
    }

    #[test]
    fn test_role_json_roundtrip() {
        let mut r = role();
        r.tenant_id = "fcad67a6189847c4aecfa3c81a05783b".to_string();
        r.policies = vec!["test".to_string()];
        let json = serde_json::to_vec(&r).unwrap();
        let parsed: Role = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn test_role_missing_fields_take_defaults() {
        let parsed: Role = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert_eq!(parsed, Role::new("bare"));
    }
}
