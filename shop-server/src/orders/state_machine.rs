//! Order status state machine
//!
//! The single gate for every status change after checkout. Nothing
//! else writes `orders.status`; schedulers, payment capture, refunds
//! and the admin surface all route through here so the legality check,
//! the history trail, and the cancellation side effects can never be
//! bypassed.

use crate::db::repository::{self, RepoError};
use crate::orders::locks::OrderLocks;
use crate::ports::{NotificationEvent, NotificationPort};
use crate::utils::AppResult;
use shared::models::{Order, OrderPaymentStatus, OrderStatus, PaymentStatus};
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct OrderStateMachine {
    pool: SqlitePool,
    locks: Arc<OrderLocks>,
    notifier: Arc<dyn NotificationPort>,
}

impl std::fmt::Debug for OrderStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStateMachine").finish_non_exhaustive()
    }
}

impl OrderStateMachine {
    pub fn new(
        pool: SqlitePool,
        locks: Arc<OrderLocks>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            pool,
            locks,
            notifier,
        }
    }

    /// Legal status edges.
    ///
    /// Happy path is monotonic: pending, processing, shipped,
    /// delivered. Cancellation only from pending or processing.
    /// Refunded is reachable from any live state. Same-status is
    /// permitted for annotation-only history entries.
    pub fn is_legal(from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::*;
        if from == to {
            return true;
        }
        match (from, to) {
            (Pending, Processing) => true,
            (Processing, Shipped) => true,
            (Shipped, Delivered) => true,
            (Pending | Processing, Cancelled) => true,
            (Pending | Processing | Shipped | Delivered, Refunded) => true,
            _ => false,
        }
    }

    /// Apply a status transition under the order's lock.
    ///
    /// Illegal edges fail without touching status or history. A legal
    /// transition stamps the status timestamp on first entry, appends
    /// exactly one history row (plus a payment-side row when a
    /// cancellation flips an unpaid payment), and commits atomically.
    pub async fn transition(
        &self,
        order_id: i64,
        new_status: OrderStatus,
        actor: Option<i64>,
        note: Option<&str>,
    ) -> AppResult<Order> {
        let _guard = self.locks.acquire(order_id).await;
        self.transition_locked(order_id, new_status, actor, note)
            .await
    }

    /// Transition body for callers already holding the order's lock
    pub(crate) async fn transition_locked(
        &self,
        order_id: i64,
        new_status: OrderStatus,
        actor: Option<i64>,
        note: Option<&str>,
    ) -> AppResult<Order> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let order = repository::order::get(&mut *tx, order_id).await?;

        if !Self::is_legal(order.status, new_status) {
            return Err(AppError::new(ErrorCode::InvalidStatusTransition)
                .with_detail("from", order.status.as_str())
                .with_detail("to", new_status.as_str()));
        }

        if order.status != new_status {
            repository::order::set_status(&mut *tx, order_id, new_status).await?;
        }
        repository::order::insert_history(
            &mut *tx,
            order_id,
            order.status.as_str(),
            new_status.as_str(),
            actor,
            note,
        )
        .await?;

        if new_status == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled {
            self.cancellation_side_effects(&mut *tx, &order, actor).await?;
        }

        let updated = repository::order::get(&mut *tx, order_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        if order.status != new_status
            && let Some(event) = NotificationEvent::for_status(new_status)
        {
            self.notifier.notify(order_id, event).await;
        }
        Ok(updated)
    }

    /// Cancel an order only if it is still unpaid and pending.
    ///
    /// The expiration sweep's entry point: re-checks state under the
    /// lock and treats an already paid, cancelled, or otherwise moved
    /// order as a no-op instead of an error.
    pub async fn cancel_if_unpaid(&self, order_id: i64, note: &str) -> AppResult<bool> {
        let _guard = self.locks.acquire(order_id).await;
        {
            let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
            let order = repository::order::get(&mut *tx, order_id).await?;
            if order.status != OrderStatus::Pending
                || order.payment_status != OrderPaymentStatus::Pending
            {
                return Ok(false);
            }
        }
        self.transition_locked(order_id, OrderStatus::Cancelled, None, Some(note))
            .await?;
        Ok(true)
    }

    /// Flip an order's payment status with its own audit row.
    ///
    /// Payment-side history rows use `payment_` prefixed statuses so
    /// the trail distinguishes what happened to the money from why the
    /// order moved.
    pub async fn update_payment_status(
        &self,
        order_id: i64,
        new_status: OrderPaymentStatus,
        actor: Option<i64>,
        note: Option<&str>,
    ) -> AppResult<Order> {
        let _guard = self.locks.acquire(order_id).await;
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let order = repository::order::get(&mut *tx, order_id).await?;
        if order.payment_status != new_status {
            repository::order::set_payment_status(&mut *tx, order_id, new_status).await?;
        }
        repository::order::insert_history(
            &mut *tx,
            order_id,
            &format!("payment_{}", order.payment_status.as_str()),
            &format!("payment_{}", new_status.as_str()),
            actor,
            note,
        )
        .await?;
        let updated = repository::order::get(&mut *tx, order_id).await?;
        tx.commit().await.map_err(RepoError::from)?;
        Ok(updated)
    }

    /// Inside the cancelling transaction: flip an unpaid payment to
    /// failed with its own history row, cancel the payment row, and
    /// release the stock or preorder holds taken at checkout.
    async fn cancellation_side_effects(
        &self,
        conn: &mut sqlx::SqliteConnection,
        order: &Order,
        actor: Option<i64>,
    ) -> AppResult<()> {
        if order.payment_status == OrderPaymentStatus::Pending {
            repository::order::set_payment_status(conn, order.id, OrderPaymentStatus::Failed)
                .await?;
            repository::order::insert_history(
                conn,
                order.id,
                "payment_pending",
                "payment_failed",
                actor,
                Some("Cancelled before payment"),
            )
            .await?;
            if let Some(payment) = repository::payment::find_by_order_tx(conn, order.id).await?
                && payment.status == PaymentStatus::Pending
            {
                repository::payment::set_status(conn, payment.id, PaymentStatus::Cancelled).await?;
            }
        }

        let items = repository::order::items_tx(conn, order.id).await?;
        for item in &items {
            repository::book::release_hold(conn, item.book_id, item.quantity, item.is_preorder)
                .await?;
        }
        Ok(())
    }
}
