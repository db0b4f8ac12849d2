// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Authentication Attempt Record
//!
//! One `AuthAttempt` exists per instance that has tried to log in. The record
//! is anchored to the instance's first attempt: its `deadline` is fixed at
//! creation and only `count` moves afterwards. Records are owned by
//! [`crate::application::attempt_ledger::AttemptLedger`] and garbage-collected
//! once the deadline has passed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage prefix for attempt records. Keys are `auth_attempt/<instance id>`.
pub const AUTH_ATTEMPT_PREFIX: &str = "auth_attempt/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAttempt {
    /// Instance identifier this record counts attempts for.
    pub name: String,
    pub deadline: DateTime<Utc>,
    pub count: u64,
}

impl AuthAttempt {
    pub fn new(name: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            deadline,
            count: 0,
        }
    }

    /// Expired strictly after the deadline; a record whose deadline equals
    /// `now` is still live.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now
    }

    pub fn storage_key(instance_id: &str) -> String {
        format!("{AUTH_ATTEMPT_PREFIX}{instance_id}")
    }
}
