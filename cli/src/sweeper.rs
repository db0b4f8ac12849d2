// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Attempt Sweeper - Background task removing expired attempt records
//!
//! Host-side scheduler driving [`AuthBackend::periodic`] on a fixed interval
//! until its shutdown token is cancelled. A failed cycle is logged and the
//! next tick retries.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use aegis_auth_core::application::AuthBackend;
use aegis_auth_core::domain::node_config::SweeperConfig;

pub struct AttemptSweeper {
    backend: Arc<AuthBackend>,
    interval: Duration,
    enabled: bool,
    shutdown_token: CancellationToken,
}

impl AttemptSweeper {
    pub fn new(backend: Arc<AuthBackend>, config: &SweeperConfig) -> Self {
        Self {
            backend,
            interval: config.interval,
            enabled: config.enabled,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Sweep on every tick until cancelled. The first tick fires immediately.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Attempt sweeper is disabled");
            return;
        }

        info!(interval = ?self.interval, "Starting attempt sweeper");

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    debug!("Running attempt sweep");
                    if let Err(e) = self.backend.periodic().await {
                        warn!("Attempt sweep failed: {}", e);
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping attempt sweeper");
                    break;
                }
            }
        }

        info!("Attempt sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_auth_core::domain::{FixedClock, LeaseLimits};
    use aegis_auth_core::infrastructure::inventory::NoInventorySource;
    use aegis_auth_core::infrastructure::storage::InMemoryKeyValueStore;
    use chrono::Utc;

    fn backend() -> Arc<AuthBackend> {
        Arc::new(AuthBackend::new(
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::new(NoInventorySource),
            Arc::new(FixedClock::new(Utc::now())),
            LeaseLimits::new(chrono::Duration::hours(1), chrono::Duration::hours(1)),
        ))
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops_on_cancel() {
        let backend = backend();
        backend
            .ledger()
            .record_attempt("i-1", Utc::now() - chrono::Duration::minutes(5))
            .await
            .unwrap();

        let sweeper = Arc::new(AttemptSweeper::new(
            backend.clone(),
            &SweeperConfig {
                enabled: true,
                interval: Duration::from_millis(10),
            },
        ));
        let token = sweeper.shutdown_token();
        let handle = sweeper.start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        handle.await.unwrap();

        assert!(backend.ledger().get("i-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disabled_sweeper_returns_immediately() {
        let sweeper = AttemptSweeper::new(
            backend(),
            &SweeperConfig {
                enabled: false,
                interval: Duration::from_secs(60),
            },
        );
        sweeper.run().await;
    }
}
