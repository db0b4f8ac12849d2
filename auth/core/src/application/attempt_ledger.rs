// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Attempt Ledger
//!
//! Owns the per-instance [`AuthAttempt`] records that bound how many times an
//! instance may try to log in within its authentication window.
//!
//! ## Concurrency
//!
//! Logins for the same instance can race. Every mutation is a
//! read → compute → [`KeyValueStore::compare_and_swap`] cycle against the
//! exact bytes that were read, retried on conflict, so two concurrent
//! attempts can never both write `N + 1`. The sweep deletes with the same
//! primitive: a record touched or recreated after it was evaluated no longer
//! matches and survives.
//!
//! Storage failures are surfaced to the caller unchanged; only CAS conflicts
//! are retried here.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::attestation::AttestationError;
use crate::domain::auth_attempt::{AuthAttempt, AUTH_ATTEMPT_PREFIX};
use crate::domain::storage::{get_json, KeyValueStore, StorageError};

/// Upper bound on compare-and-swap retries for a single attempt.
const MAX_CAS_RETRIES: usize = 64;

pub struct AttemptLedger {
    store: Arc<dyn KeyValueStore>,
}

impl AttemptLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Count one authentication attempt for `instance_id` and return the new
    /// total.
    ///
    /// `deadline` only seeds a record that does not exist yet; an existing
    /// record keeps the deadline of the instance's first attempt.
    pub async fn record_attempt(
        &self,
        instance_id: &str,
        deadline: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        if instance_id.is_empty() {
            return Err(StorageError::InvalidKey(instance_id.to_string()));
        }
        let key = AuthAttempt::storage_key(instance_id);

        for retry in 0..MAX_CAS_RETRIES {
            let current = self.store.get(&key).await?;
            let mut attempt = match &current {
                Some(bytes) => serde_json::from_slice::<AuthAttempt>(bytes)?,
                None => AuthAttempt::new(instance_id, deadline),
            };
            attempt.count += 1;

            let next = serde_json::to_vec(&attempt)?;
            if self
                .store
                .compare_and_swap(&key, current.as_deref(), Some(next))
                .await?
            {
                return Ok(attempt.count);
            }
            debug!(instance_id, retry, "attempt record changed concurrently, retrying");
        }

        warn!(instance_id, "giving up on contended attempt record");
        Err(StorageError::Conflict {
            key,
            attempts: MAX_CAS_RETRIES,
        })
    }

    /// Reject once `attempts` exceeds `limit`. `attempts` already includes
    /// the current try, so `limit = 1` admits exactly one attempt.
    pub fn check_limit(attempts: u64, limit: i64) -> Result<(), AttestationError> {
        let exceeded = match u64::try_from(limit) {
            Ok(limit) => attempts > limit,
            Err(_) => true,
        };
        if exceeded {
            return Err(AttestationError::AttemptLimitExceeded { attempts, limit });
        }
        Ok(())
    }

    /// Current record for `instance_id`, if any.
    pub async fn get(&self, instance_id: &str) -> Result<Option<AuthAttempt>, StorageError> {
        get_json(self.store.as_ref(), &AuthAttempt::storage_key(instance_id)).await
    }

    /// Delete every record whose deadline is strictly before `now`, along
    /// with any record that no longer decodes.
    ///
    /// Returns the number of records removed by this sweep.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let names = self.store.list(AUTH_ATTEMPT_PREFIX).await?;
        let mut removed = 0;

        for name in names {
            let key = AuthAttempt::storage_key(&name);
            let Some(bytes) = self.store.get(&key).await? else {
                // Deleted between list and get.
                continue;
            };

            match serde_json::from_slice::<AuthAttempt>(&bytes) {
                Ok(attempt) if !attempt.is_expired(now) => continue,
                Ok(_) => {}
                // Unreadable records can never expire; purge them.
                Err(e) => warn!(key = %key, error = %e, "removing undecodable attempt record"),
            }

            if self.store.compare_and_swap(&key, Some(&bytes), None).await? {
                removed += 1;
            } else {
                debug!(key = %key, "attempt record changed during sweep, keeping it");
            }
        }

        info!(removed, "expired auth attempts swept");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::memory::InMemoryKeyValueStore;
    use chrono::Duration;

    fn ledger() -> (AttemptLedger, Arc<InMemoryKeyValueStore>) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        (AttemptLedger::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_record_attempt_creates_then_increments() {
        let (ledger, _) = ledger();
        let first_deadline = Utc::now() + Duration::seconds(120);

        assert_eq!(ledger.record_attempt("i-1", first_deadline).await.unwrap(), 1);
        // A later deadline must not move the window.
        let later = first_deadline + Duration::seconds(600);
        assert_eq!(ledger.record_attempt("i-1", later).await.unwrap(), 2);

        let record = ledger.get("i-1").await.unwrap().unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(record.deadline, first_deadline);
    }

    #[tokio::test]
    async fn test_record_attempt_rejects_empty_id() {
        let (ledger, _) = ledger();
        let err = ledger.record_attempt("", Utc::now()).await.unwrap_err();
        assert_eq!(err, StorageError::InvalidKey(String::new()));
    }

    #[test]
    fn test_check_limit_boundaries() {
        assert!(AttemptLedger::check_limit(1, 1).is_ok());
        assert!(AttemptLedger::check_limit(2, 2).is_ok());
        assert_eq!(
            AttemptLedger::check_limit(3, 2).unwrap_err(),
            AttestationError::AttemptLimitExceeded { attempts: 3, limit: 2 }
        );
        assert!(AttemptLedger::check_limit(1, 0).is_err());
        assert!(AttemptLedger::check_limit(0, -1).is_err());
    }

    #[tokio::test]
    async fn test_sweep_removes_strictly_expired() {
        let (ledger, _) = ledger();
        let now = Utc::now();
        ledger.record_attempt("past", now - Duration::seconds(1)).await.unwrap();
        ledger.record_attempt("present", now).await.unwrap();
        ledger.record_attempt("future", now + Duration::seconds(1)).await.unwrap();

        assert_eq!(ledger.sweep_expired(now).await.unwrap(), 1);
        assert!(ledger.get("past").await.unwrap().is_none());
        assert!(ledger.get("present").await.unwrap().is_some());
        assert!(ledger.get("future").await.unwrap().is_some());

        assert_eq!(ledger.sweep_expired(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_undecodable_records() {
        let (ledger, store) = ledger();
        store.put("auth_attempt/garbage", b"not json".to_vec()).await.unwrap();
        ledger.record_attempt("old", Utc::now() - Duration::hours(1)).await.unwrap();
        ledger.record_attempt("live", Utc::now() + Duration::hours(1)).await.unwrap();

        assert_eq!(ledger.sweep_expired(Utc::now()).await.unwrap(), 2);
        assert!(store.get("auth_attempt/garbage").await.unwrap().is_none());
        assert!(ledger.get("live").await.unwrap().is_some());
    }

    /// Store that lands a concurrent login between the sweep's read and its
    /// conditional delete.
    struct InterleavedLoginStore {
        inner: InMemoryKeyValueStore,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for InterleavedLoginStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.inner.delete(key).await
        }

        async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
            self.inner.list(prefix).await
        }

        async fn compare_and_swap(
            &self,
            key: &str,
            current: Option<&[u8]>,
            new: Option<Vec<u8>>,
        ) -> Result<bool, StorageError> {
            if new.is_none() {
                if let Some(bytes) = self.inner.get(key).await? {
                    let mut attempt: AuthAttempt = serde_json::from_slice(&bytes)?;
                    attempt.count += 1;
                    self.inner.put(key, serde_json::to_vec(&attempt)?).await?;
                }
            }
            self.inner.compare_and_swap(key, current, new).await
        }
    }

    #[tokio::test]
    async fn test_sweep_keeps_record_changed_after_evaluation() {
        let store = Arc::new(InterleavedLoginStore {
            inner: InMemoryKeyValueStore::new(),
        });
        let ledger = AttemptLedger::new(store.clone());
        let now = Utc::now();
        ledger.record_attempt("i-3", now - Duration::seconds(5)).await.unwrap();

        assert_eq!(ledger.sweep_expired(now).await.unwrap(), 0);
        let record = ledger.get("i-3").await.unwrap().unwrap();
        assert_eq!(record.count, 2);
    }

    #[tokio::test]
    async fn test_recreated_record_gets_fresh_window() {
        let (ledger, _) = ledger();
        let now = Utc::now();
        ledger.record_attempt("i-2", now - Duration::seconds(5)).await.unwrap();
        ledger.sweep_expired(now).await.unwrap();

        let fresh = now + Duration::seconds(120);
        assert_eq!(ledger.record_attempt("i-2", fresh).await.unwrap(), 1);
        assert_eq!(ledger.get("i-2").await.unwrap().unwrap().deadline, fresh);
    }
}
