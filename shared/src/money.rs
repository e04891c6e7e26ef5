//! Money helpers
//!
//! Amounts are stored and transported as `i64` minor units (cents).
//! Arithmetic that can produce fractions (percentages, tax) goes through
//! [`rust_decimal::Decimal`] and is rounded back to cents with banker's
//! rounding (round half to even).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary amount in minor units (cents)
pub type Cents = i64;

/// Convert cents into a two-decimal [`Decimal`] amount
pub fn to_decimal(cents: Cents) -> Decimal {
    Decimal::new(cents, 2)
}

/// Round a decimal amount to cents using round-half-even
pub fn to_cents(amount: Decimal) -> Cents {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    // After rounding to 2 dp the scaled value is integral
    (rounded * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Compute `rate` percent of a cent amount, rounded to cents
pub fn percent_of(cents: Cents, rate: Decimal) -> Cents {
    to_cents(to_decimal(cents) * rate / Decimal::ONE_HUNDRED)
}
