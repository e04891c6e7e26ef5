//! Promo code models

use serde::{Deserialize, Serialize};

/// Discount kind for promo codes and loyalty tiers
///
/// `value` semantics depend on the kind: basis points for `percentage`
/// (1000 = 10%), cents for `fixed`, ignored for `free_shipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
    FreeShipping,
}

/// Promo code entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PromoCode {
    pub id: i64,
    pub code: String,
    pub discount_type: DiscountType,
    /// Basis points for percentage, cents for fixed
    pub value: i64,
    pub min_cart_amount_cents: i64,
    pub max_discount_amount_cents: Option<i64>,
    /// Global use cap; NULL means unlimited
    pub max_uses: Option<i64>,
    pub max_uses_per_user: i64,
    /// Validity window, unix millis
    pub valid_from: i64,
    pub valid_until: i64,
    pub is_active: bool,
    pub use_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create promo code payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCodeCreate {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: i64,
    pub min_cart_amount_cents: i64,
    pub max_discount_amount_cents: Option<i64>,
    pub max_uses: Option<i64>,
    pub max_uses_per_user: i64,
    pub valid_from: i64,
    pub valid_until: i64,
    pub is_active: bool,
}

/// One row per (promo_code, order): enforces one promo per order and
/// feeds the per-user/global use caps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PromoCodeUse {
    pub id: i64,
    pub promo_code_id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub created_at: i64,
}
