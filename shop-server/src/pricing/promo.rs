//! Promo code eligibility and discount computation
//!
//! Rejections carry a distinct error code per reason so the storefront
//! can tell the customer exactly why a code did not apply.

use crate::db::repository;
use crate::utils::AppResult;
use shared::models::{DiscountType, PromoCode};
use shared::money;
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;

/// Check every eligibility rule for `promo` against the given cart.
///
/// `user_id` is `None` for anonymous carts; the per-user cap can only
/// be checked once the caller is authenticated, the global cap always.
pub async fn validate(
    pool: &SqlitePool,
    promo: &PromoCode,
    user_id: Option<i64>,
    subtotal_cents: i64,
    now_millis: i64,
) -> AppResult<()> {
    if !promo.is_active {
        return Err(AppError::new(ErrorCode::PromoCodeInvalid)
            .with_detail("code", promo.code.clone()));
    }
    if now_millis < promo.valid_from || now_millis > promo.valid_until {
        return Err(AppError::new(ErrorCode::PromoCodeExpired)
            .with_detail("code", promo.code.clone()));
    }
    if subtotal_cents < promo.min_cart_amount_cents {
        return Err(AppError::new(ErrorCode::PromoCodeMinCartNotMet)
            .with_detail("min_cart_amount_cents", promo.min_cart_amount_cents));
    }
    if let Some(max_uses) = promo.max_uses
        && promo.use_count >= max_uses
    {
        return Err(AppError::new(ErrorCode::PromoCodeExhausted)
            .with_detail("code", promo.code.clone()));
    }
    if let Some(user_id) = user_id {
        let prior = repository::promo::uses_for_user(pool, promo.id, user_id).await?;
        if prior >= promo.max_uses_per_user {
            return Err(AppError::new(ErrorCode::PromoCodeUserLimitReached)
                .with_detail("max_uses_per_user", promo.max_uses_per_user));
        }
    }
    Ok(())
}

/// Monetary discount this promo grants on `subtotal_cents`.
///
/// Percentage and fixed discounts are computed against the original
/// subtotal, never against an already discounted amount. Free-shipping
/// promos contribute zero here and zero the shipping line instead.
pub fn discount_cents(promo: &PromoCode, subtotal_cents: i64) -> i64 {
    let raw = match promo.discount_type {
        DiscountType::Percentage => {
            // value is basis points: 1000 = 10%
            money::percent_of(subtotal_cents, rust_decimal::Decimal::new(promo.value, 2))
        }
        DiscountType::Fixed => promo.value,
        DiscountType::FreeShipping => 0,
    };
    let capped = match promo.max_discount_amount_cents {
        Some(cap) => raw.min(cap),
        None => raw,
    };
    capped.clamp(0, subtotal_cents)
}

pub fn grants_free_shipping(promo: &PromoCode) -> bool {
    promo.discount_type == DiscountType::FreeShipping
}
