//! Identity Port
//!
//! The engine only needs confirmed-order aggregates from identity land;
//! user profile storage is an external concern.

use crate::db::repository;
use crate::utils::AppResult;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;

/// Aggregates over a user's confirmed orders, the single source of
/// truth for loyalty tier eligibility
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfirmedOrderStats {
    pub count: i64,
    pub total_spent_cents: i64,
}

#[async_trait]
pub trait IdentityPort: Send + Sync {
    async fn confirmed_order_stats(&self, user_id: i64) -> AppResult<ConfirmedOrderStats>;
}

/// Identity port computing stats from the local orders table
pub struct LocalIdentity {
    pool: SqlitePool,
}

impl LocalIdentity {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityPort for LocalIdentity {
    async fn confirmed_order_stats(&self, user_id: i64) -> AppResult<ConfirmedOrderStats> {
        let (count, total_spent_cents) =
            repository::order::confirmed_stats(&self.pool, user_id).await?;
        Ok(ConfirmedOrderStats {
            count,
            total_spent_cents,
        })
    }
}
