//! Refund service

use crate::db::repository::{self, RepoError};
use crate::orders::OrderLocks;
use crate::payments::PaymentGateway;
use crate::utils::AppResult;
use shared::models::{OrderPaymentStatus, Refund, RefundStatus};
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct RefundService {
    pool: SqlitePool,
    gateway: Arc<PaymentGateway>,
    locks: Arc<OrderLocks>,
}

impl std::fmt::Debug for RefundService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefundService").finish_non_exhaustive()
    }
}

impl RefundService {
    pub fn new(pool: SqlitePool, gateway: Arc<PaymentGateway>, locks: Arc<OrderLocks>) -> Self {
        Self { pool, gateway, locks }
    }

    /// Open a refund request against a paid order
    pub async fn request(
        &self,
        order_id: i64,
        amount_cents: i64,
        reason: &str,
        requested_by: i64,
    ) -> AppResult<Refund> {
        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        if order.payment_status != OrderPaymentStatus::Paid {
            return Err(AppError::new(ErrorCode::OrderNotPaid));
        }
        if amount_cents <= 0 || amount_cents > order.total_cents {
            return Err(AppError::new(ErrorCode::RefundInvalidAmount)
                .with_detail("amount_cents", amount_cents)
                .with_detail("order_total_cents", order.total_cents));
        }
        if reason.trim().is_empty() {
            return Err(AppError::validation("Refund reason is required"));
        }

        let refund =
            repository::refund::insert(&self.pool, order_id, amount_cents, reason, requested_by)
                .await?;
        tracing::info!(
            refund_id = refund.id,
            order_id = order_id,
            amount_cents = amount_cents,
            "Refund requested"
        );
        Ok(refund)
    }

    /// Approve a pending refund
    pub async fn approve(&self, refund_id: i64, actor: i64) -> AppResult<Refund> {
        self.move_from_pending(refund_id, RefundStatus::Approved, actor)
            .await
    }

    /// Reject a pending refund
    pub async fn reject(&self, refund_id: i64, actor: i64) -> AppResult<Refund> {
        self.move_from_pending(refund_id, RefundStatus::Rejected, actor)
            .await
    }

    async fn move_from_pending(
        &self,
        refund_id: i64,
        to: RefundStatus,
        actor: i64,
    ) -> AppResult<Refund> {
        let refund = self.get(refund_id).await?;
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let moved = repository::refund::move_status(
            &mut *tx,
            refund.id,
            &[RefundStatus::Pending],
            to,
            Some(actor),
            None,
        )
        .await?;
        if !moved {
            return Err(AppError::new(ErrorCode::RefundInvalidState)
                .with_detail("status", refund.status.as_str()));
        }
        tx.commit().await.map_err(RepoError::from)?;
        self.get(refund_id).await
    }

    /// Execute the refund against the provider.
    ///
    /// Legal from pending or approved. Serialized through the order's
    /// lock so the provider is called at most once per refund: a
    /// concurrent processor waits here, re-reads the refund as
    /// processed, and fails the status check without a provider call.
    /// A provider failure leaves the refund where it was, retryable.
    /// Success stores the provider's refund id and moves the refund to
    /// processed. The parent order is not flipped to refunded here.
    pub async fn process(&self, refund_id: i64, actor: i64) -> AppResult<Refund> {
        let refund = self.get(refund_id).await?;
        let _guard = self.locks.acquire(refund.order_id).await;

        // Re-read under the lock; a concurrent processor may have won
        let refund = self.get(refund_id).await?;
        if !matches!(refund.status, RefundStatus::Pending | RefundStatus::Approved) {
            return Err(AppError::new(ErrorCode::RefundInvalidState)
                .with_detail("status", refund.status.as_str()));
        }

        let provider_refund = self
            .gateway
            .refund_provider_payment(refund.order_id, refund.amount_cents)
            .await?;
        if !provider_refund.completed {
            return Err(AppError::with_message(
                ErrorCode::ProviderRejected,
                "Provider declined the refund",
            ));
        }
        let provider_refund_id = provider_refund
            .refund_id
            .ok_or_else(|| AppError::external("Provider returned no refund id"))?;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let moved = repository::refund::move_status(
            &mut *tx,
            refund.id,
            &[RefundStatus::Pending, RefundStatus::Approved],
            RefundStatus::Processed,
            Some(actor),
            Some(&provider_refund_id),
        )
        .await?;
        if !moved {
            return Err(AppError::new(ErrorCode::RefundInvalidState));
        }
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            refund_id = refund.id,
            order_id = refund.order_id,
            provider_refund_id = %provider_refund_id,
            "Refund processed"
        );
        self.get(refund_id).await
    }

    pub async fn get(&self, refund_id: i64) -> AppResult<Refund> {
        repository::refund::find_by_id(&self.pool, refund_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RefundNotFound))
    }

    pub async fn list(&self, status: Option<RefundStatus>) -> AppResult<Vec<Refund>> {
        Ok(repository::refund::list(&self.pool, status).await?)
    }

    pub async fn list_for_order(&self, order_id: i64) -> AppResult<Vec<Refund>> {
        Ok(repository::refund::list_for_order(&self.pool, order_id).await?)
    }
}
