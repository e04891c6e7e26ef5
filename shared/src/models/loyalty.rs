//! Loyalty program models

use super::promo::DiscountType;
use serde::{Deserialize, Serialize};

/// Loyalty tier
///
/// A tier matches a user when their confirmed-order history satisfies
/// both thresholds. Tier selection picks the highest `min_purchases`
/// among matches, ties broken by highest `min_amount_cents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LoyaltyProgram {
    pub id: i64,
    pub name: String,
    pub min_purchases: i64,
    pub min_amount_cents: i64,
    /// `free_shipping` is not meaningful for loyalty tiers
    pub discount_type: DiscountType,
    /// Basis points for percentage, cents for fixed
    pub value: i64,
    pub max_discount_amount_cents: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create loyalty tier payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyProgramCreate {
    pub name: String,
    pub min_purchases: i64,
    pub min_amount_cents: i64,
    pub discount_type: DiscountType,
    pub value: i64,
    pub max_discount_amount_cents: Option<i64>,
    pub is_active: bool,
}

/// Denormalized per-user purchase totals
///
/// Refreshed when a payment is captured. Tier eligibility is always
/// computed from confirmed-order aggregation, never from this row, so
/// drift after cancellations cannot affect pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserLoyaltyStatus {
    pub user_id: i64,
    pub purchases_count: i64,
    pub total_spent_cents: i64,
    pub updated_at: i64,
}
