//! Loyalty tier selection and discount computation

use crate::ports::ConfirmedOrderStats;
use rust_decimal::Decimal;
use shared::models::{DiscountType, LoyaltyProgram};
use shared::money;

/// Pick the best tier the user qualifies for.
///
/// Expects `programs` ordered by `min_purchases DESC, min_amount_cents
/// DESC` (the repository's ordering); the first match is the best one.
pub fn best_tier<'a>(
    programs: &'a [LoyaltyProgram],
    stats: &ConfirmedOrderStats,
) -> Option<&'a LoyaltyProgram> {
    programs.iter().find(|p| {
        stats.count >= p.min_purchases && stats.total_spent_cents >= p.min_amount_cents
    })
}

/// Monetary discount the tier grants on `subtotal_cents`, computed
/// against the original subtotal and capped by the tier's own ceiling.
pub fn tier_discount_cents(tier: &LoyaltyProgram, subtotal_cents: i64) -> i64 {
    let raw = match tier.discount_type {
        DiscountType::Percentage => money::percent_of(subtotal_cents, Decimal::new(tier.value, 2)),
        DiscountType::Fixed => tier.value,
        DiscountType::FreeShipping => 0,
    };
    let capped = match tier.max_discount_amount_cents {
        Some(cap) => raw.min(cap),
        None => raw,
    };
    capped.clamp(0, subtotal_cents)
}
