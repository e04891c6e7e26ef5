//! Cart models

use serde::{Deserialize, Serialize};

/// Cart entity
///
/// Owned by exactly one of `user_id` (authenticated) or `session_key`
/// (anonymous). An applied promo code is remembered on the cart until
/// checkout or removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: i64,
    pub user_id: Option<i64>,
    pub session_key: Option<String>,
    pub promo_code_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Cart line: one row per (cart, book)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub cart_id: i64,
    pub book_id: i64,
    pub quantity: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Add/update cart line payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineInput {
    pub book_id: i64,
    pub quantity: i64,
}

/// One priced line of a cart snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub book_id: i64,
    pub title: String,
    pub quantity: i64,
    /// Sale-aware unit price frozen at pricing time, in cents
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub is_preorder: bool,
    pub preorder_available_date: Option<String>,
}

/// Priced cart snapshot (derived, never persisted)
///
/// All amounts are non-negative cents;
/// `grand_total = subtotal - total_discount + shipping + tax`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedCart {
    pub cart_id: i64,
    pub lines: Vec<PricedLine>,
    pub subtotal_cents: i64,
    pub loyalty_discount_cents: i64,
    pub promo_discount_cents: i64,
    pub total_discount_cents: i64,
    pub shipping_cost_cents: i64,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
    /// Promo code applied during pricing, if any
    pub promo_code: Option<String>,
}
