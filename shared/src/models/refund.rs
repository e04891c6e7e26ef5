//! Refund model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Refund lifecycle status
///
/// `pending -> approved | rejected`; processing is legal from `pending`
/// or `approved`; `completed` is reserved for provider-confirmed
/// settlement reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
    Completed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processed => "processed",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refund request against an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Refund {
    pub id: i64,
    pub order_id: i64,
    pub amount_cents: i64,
    pub reason: String,
    pub status: RefundStatus,
    pub requested_by: i64,
    pub processed_by: Option<i64>,
    /// Provider refund id, the idempotency key for the provider call
    pub provider_refund_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
