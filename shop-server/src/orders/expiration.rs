//! Expiration scheduler
//!
//! Cancels stale unpaid orders. Runs an immediate sweep at startup and
//! then periodically; each candidate is re-checked under its own order
//! lock right before cancelling, so an overlapping run, a late payment
//! capture, or the user's own cancel turns the item into a no-op.

use crate::orders::state_machine::OrderStateMachine;
use crate::utils::AppResult;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::db::repository;
use sqlx::SqlitePool;

pub struct ExpirationScheduler {
    pool: SqlitePool,
    state_machine: Arc<OrderStateMachine>,
    /// Unpaid orders older than this are cancelled
    threshold: chrono::Duration,
    /// Pause between sweeps
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpirationScheduler {
    pub fn new(
        pool: SqlitePool,
        state_machine: Arc<OrderStateMachine>,
        threshold_hours: i64,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            state_machine,
            threshold: chrono::Duration::hours(threshold_hours),
            interval,
            shutdown,
        }
    }

    /// Main loop: startup sweep, then periodic sweeps until shutdown
    pub async fn run(self) {
        tracing::info!("Expiration scheduler started");

        if let Err(e) = self.sweep().await {
            tracing::error!("Expiration startup sweep failed: {}", e);
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiration scheduler received shutdown signal");
                    break;
                }
            }
            if let Err(e) = self.sweep().await {
                tracing::error!("Expiration sweep failed: {}", e);
            }
        }

        tracing::info!("Expiration scheduler stopped");
    }

    /// One sweep over every expired candidate.
    ///
    /// Per-order failures are logged and the sweep keeps going; only a
    /// failure to list candidates aborts it.
    pub async fn sweep(&self) -> AppResult<usize> {
        let cutoff = shared::util::now_millis() - self.threshold.num_milliseconds();
        let candidates = repository::order::expired_candidates(&self.pool, cutoff).await?;
        if candidates.is_empty() {
            return Ok(0);
        }
        tracing::info!("Expiration sweep found {} candidate(s)", candidates.len());

        let mut cancelled = 0;
        for order in candidates {
            match self
                .state_machine
                .cancel_if_unpaid(order.id, "Expired: payment not received in time")
                .await
            {
                Ok(true) => {
                    tracing::info!(
                        order_id = order.id,
                        order_number = %order.order_number,
                        "Expired order cancelled"
                    );
                    cancelled += 1;
                }
                Ok(false) => {
                    // Paid or moved on since the candidate query ran
                    tracing::debug!(order_id = order.id, "Expiration skipped, state changed");
                }
                Err(e) => {
                    tracing::error!(order_id = order.id, "Failed to expire order: {}", e);
                }
            }
        }
        Ok(cancelled)
    }
}
