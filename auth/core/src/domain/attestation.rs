// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Attestation Errors
//!
//! Every reason the attestor can refuse an instance. All variants except
//! [`AttestationError::Storage`] are *denials*: recoverable, reported to the
//! unauthenticated caller only as a generic "login denied", and logged with
//! their specific reason. Storage failures are collaborator errors and are
//! surfaced as-is so the caller can decide whether to retry.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestationError {
    #[error("authentication deadline exceeded (deadline {deadline})")]
    DeadlineExceeded { deadline: DateTime<Utc> },

    #[error("too many authentication failures ({attempts} attempts, limit {limit})")]
    AttemptLimitExceeded { attempts: u64, limit: i64 },

    #[error("address mismatched")]
    AddressMismatch,

    #[error("instance is not active (status {status})")]
    InstanceNotActive { status: String },

    #[error("metadata key '{key}' not found")]
    MetadataKeyMissing { key: String },

    #[error("metadata role name mismatched")]
    MetadataMismatch,

    #[error("tenant ID mismatched")]
    TenantMismatch,

    #[error("user ID mismatched")]
    UserMismatch,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AttestationError {
    /// Whether this is a login denial rather than a collaborator failure.
    pub fn is_denial(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }

    /// Stable short label, used for metrics and structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::AttemptLimitExceeded { .. } => "attempt_limit_exceeded",
            Self::AddressMismatch => "address_mismatch",
            Self::InstanceNotActive { .. } => "instance_not_active",
            Self::MetadataKeyMissing { .. } => "metadata_key_missing",
            Self::MetadataMismatch => "metadata_mismatch",
            Self::TenantMismatch => "tenant_mismatch",
            Self::UserMismatch => "user_mismatch",
            Self::Storage(_) => "storage",
        }
    }
}
