//! Payment gateway

use crate::db::repository::{self, RepoError};
use crate::orders::{OrderLocks, OrderStateMachine};
use crate::ports::{NotificationEvent, NotificationPort, PaymentProvider, ProviderRefund};
use crate::utils::AppResult;
use serde::Serialize;
use shared::models::{Order, OrderPaymentStatus, OrderStatus, Payment, PaymentStatus};
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;
use std::sync::Arc;

/// What the storefront needs to send the customer to the provider
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub payment_id: i64,
    pub session_id: String,
    pub approval_url: Option<String>,
}

pub struct PaymentGateway {
    pool: SqlitePool,
    provider: Arc<dyn PaymentProvider>,
    state_machine: Arc<OrderStateMachine>,
    locks: Arc<OrderLocks>,
    notifier: Arc<dyn NotificationPort>,
    currency: String,
}

impl std::fmt::Debug for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGateway")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl PaymentGateway {
    pub fn new(
        pool: SqlitePool,
        provider: Arc<dyn PaymentProvider>,
        state_machine: Arc<OrderStateMachine>,
        locks: Arc<OrderLocks>,
        notifier: Arc<dyn NotificationPort>,
        currency: String,
    ) -> Self {
        Self {
            pool,
            provider,
            state_machine,
            locks,
            notifier,
            currency,
        }
    }

    /// Open a provider payment intent for the order's total and store
    /// the provider session on the payment row
    pub async fn create_provider_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> AppResult<PaymentIntent> {
        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        if order.payment_status != OrderPaymentStatus::Pending {
            return Err(AppError::new(ErrorCode::OrderAlreadyPaid));
        }
        let payment = repository::payment::find_by_order(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;

        let intent = self
            .provider
            .create_intent(&order.order_number, order.total_cents, &self.currency)
            .await?;
        repository::payment::set_session(&self.pool, payment.id, &intent.session_id).await?;

        tracing::info!(
            order_id = order_id,
            session_id = %intent.session_id,
            "Provider payment intent created"
        );
        Ok(PaymentIntent {
            payment_id: payment.id,
            session_id: intent.session_id,
            approval_url: intent.approval_url,
        })
    }

    /// Capture an approved provider session. Idempotent: an already
    /// completed payment returns success without calling the provider
    /// or touching the order again, so webhook redeliveries and double
    /// clicks collapse into one capture.
    pub async fn capture(&self, session_id: &str) -> AppResult<Order> {
        let payment = repository::payment::find_by_session(&self.pool, session_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;

        let _guard = self.locks.acquire(payment.order_id).await;

        // Re-read under the lock; a concurrent capture may have won
        let payment = repository::payment::find_by_session(&self.pool, session_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
        if payment.status == PaymentStatus::Completed {
            return repository::order::find_by_id(&self.pool, payment.order_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound));
        }

        let capture = self.provider.capture(session_id).await?;
        if !capture.completed {
            let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
            repository::payment::set_status(&mut *tx, payment.id, PaymentStatus::Failed).await?;
            tx.commit().await.map_err(RepoError::from)?;
            return Err(AppError::with_message(
                ErrorCode::PaymentFailed,
                "Provider declined the capture",
            ));
        }
        let transaction_id = capture.transaction_id.ok_or_else(|| {
            AppError::with_message(ErrorCode::PaymentFailed, "Provider returned no transaction id")
        })?;

        self.settle(&payment, &transaction_id).await?;

        // Advance a still-pending order; a cancelled order stays put
        let order = repository::order::find_by_id(&self.pool, payment.order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        let order = if order.status == OrderStatus::Pending {
            self.state_machine
                .transition_locked(
                    order.id,
                    OrderStatus::Processing,
                    None,
                    Some("Payment captured"),
                )
                .await?
        } else {
            order
        };

        self.notifier
            .notify(order.id, NotificationEvent::PaymentConfirmed)
            .await;
        Ok(order)
    }

    /// Atomically mark the payment completed and the order paid,
    /// credit the buyer's loyalty counters, and clear any leftover cart
    async fn settle(&self, payment: &Payment, transaction_id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let completed =
            repository::payment::mark_completed(&mut *tx, payment.id, transaction_id).await?;
        if !completed {
            // First writer already settled this payment
            return Ok(());
        }

        let order = repository::order::get(&mut *tx, payment.order_id).await?;
        repository::order::set_payment_status(&mut *tx, order.id, OrderPaymentStatus::Paid)
            .await?;
        repository::order::insert_history(
            &mut *tx,
            order.id,
            &format!("payment_{}", order.payment_status.as_str()),
            "payment_paid",
            None,
            Some("Payment captured"),
        )
        .await?;
        repository::loyalty::credit_purchase(&mut *tx, order.user_id, order.total_cents).await?;

        // The cart was cleared at checkout already; clearing again here
        // covers a second checkout racing this capture.
        if let Some(cart) = repository::cart::find_by_user_tx(&mut *tx, order.user_id).await? {
            repository::cart::clear(&mut *tx, cart.id).await?;
        }

        tx.commit().await.map_err(RepoError::from)?;
        tracing::info!(
            order_id = order.id,
            transaction_id = transaction_id,
            "Payment settled"
        );
        Ok(())
    }

    /// Provider-side refund call for the refund service
    pub async fn refund_provider_payment(
        &self,
        order_id: i64,
        amount_cents: i64,
    ) -> AppResult<ProviderRefund> {
        let payment = repository::payment::find_by_order(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
        if payment.status != PaymentStatus::Completed {
            return Err(AppError::new(ErrorCode::OrderNotPaid));
        }
        let transaction_id = payment.provider_transaction_id.as_deref().ok_or_else(|| {
            AppError::with_message(ErrorCode::OrderNotPaid, "Payment has no provider transaction")
        })?;
        let refund = self
            .provider
            .refund(transaction_id, amount_cents, &self.currency)
            .await?;
        Ok(refund)
    }

    pub async fn payment_for_order(&self, user_id: i64, order_id: i64) -> AppResult<Payment> {
        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        repository::payment::find_by_order(&self.pool, order.id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))
    }
}
