//! Preorder fulfillment job
//!
//! When a preordered book's availability date arrives, the book is
//! converted back to regular stock and every order waiting on it is
//! processed oldest-first: the order's preorder flag drops once all of
//! its preorder lines have arrived, a still-pending order advances to
//! processing, and the customer gets a "preorder available"
//! notification. One order failing never stops the rest.

use crate::db::repository::{self, RepoError};
use crate::orders::locks::OrderLocks;
use crate::orders::state_machine::OrderStateMachine;
use crate::ports::{NotificationEvent, NotificationPort};
use crate::utils::AppResult;
use shared::models::OrderStatus;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct PreorderFulfillment {
    pool: SqlitePool,
    state_machine: Arc<OrderStateMachine>,
    locks: Arc<OrderLocks>,
    notifier: Arc<dyn NotificationPort>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl PreorderFulfillment {
    pub fn new(
        pool: SqlitePool,
        state_machine: Arc<OrderStateMachine>,
        locks: Arc<OrderLocks>,
        notifier: Arc<dyn NotificationPort>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            state_machine,
            locks,
            notifier,
            interval,
            shutdown,
        }
    }

    /// Main loop: startup sweep, then periodic sweeps until shutdown
    pub async fn run(self) {
        tracing::info!("Preorder fulfillment started");

        if let Err(e) = self.sweep().await {
            tracing::error!("Preorder startup sweep failed: {}", e);
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Preorder fulfillment received shutdown signal");
                    break;
                }
            }
            if let Err(e) = self.sweep().await {
                tracing::error!("Preorder sweep failed: {}", e);
            }
        }

        tracing::info!("Preorder fulfillment stopped");
    }

    /// One sweep over every book whose availability date has arrived
    pub async fn sweep(&self) -> AppResult<usize> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let arrived = repository::book::arrived_preorders(&self.pool, &today).await?;
        if arrived.is_empty() {
            return Ok(0);
        }

        let mut fulfilled = 0;
        for book in arrived {
            match self.fulfill_book(book.id, &today).await {
                Ok(count) => {
                    tracing::info!(
                        book_id = book.id,
                        title = %book.title,
                        orders = count,
                        "Preorder book released"
                    );
                    fulfilled += count;
                }
                Err(e) => {
                    tracing::error!(book_id = book.id, "Preorder release failed: {}", e);
                }
            }
        }
        Ok(fulfilled)
    }

    /// Release one arrived book and process its waiting orders,
    /// oldest first
    async fn fulfill_book(&self, book_id: i64, today: &str) -> AppResult<usize> {
        // Collect the waiting orders before converting the book, the
        // preorder flag is gone afterwards
        let waiting = repository::order::preorder_orders_for_book(&self.pool, book_id).await?;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        repository::book::convert_to_regular(&mut *tx, book_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        let mut processed = 0;
        for order in waiting {
            match self.fulfill_order(order.id, today).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(e) => {
                    // Keep going, the remaining orders must still be served
                    tracing::error!(order_id = order.id, "Preorder order update failed: {}", e);
                }
            }
        }
        Ok(processed)
    }

    /// Under the order's lock: drop the preorder flag once every
    /// preorder line has arrived, advance a still-pending order, and
    /// notify the customer
    async fn fulfill_order(&self, order_id: i64, today: &str) -> AppResult<bool> {
        let _guard = self.locks.acquire(order_id).await;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let order = repository::order::get(&mut *tx, order_id).await?;
        if !order.is_preorder || order.status.is_terminal() {
            return Ok(false);
        }

        let items = repository::order::items_tx(&mut *tx, order_id).await?;
        for item in items.iter().filter(|i| i.is_preorder) {
            let book = repository::book::get(&mut *tx, item.book_id).await?;
            if book.is_preorder {
                // Another line of this order is still awaiting release
                return Ok(false);
            }
        }

        repository::order::clear_preorder_flag(&mut *tx, order_id, today).await?;
        tx.commit().await.map_err(RepoError::from)?;

        if order.status == OrderStatus::Pending {
            self.state_machine
                .transition_locked(
                    order_id,
                    OrderStatus::Processing,
                    None,
                    Some("Preorder available"),
                )
                .await?;
        }

        self.notifier
            .notify(order_id, NotificationEvent::PreorderAvailable)
            .await;
        Ok(true)
    }
}
