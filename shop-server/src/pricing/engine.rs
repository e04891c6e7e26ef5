//! Pricing engine

use crate::core::config::ShopSettings;
use crate::db::repository;
use crate::ports::{CatalogPort, ConfirmedOrderStats, IdentityPort};
use crate::pricing::{loyalty, promo};
use crate::utils::AppResult;
use shared::models::{Cart, CartLine, PricedCart, PricedLine};
use shared::money;
use shared::util::now_millis;
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Prices a cart snapshot: subtotal, stacked discounts, shipping, tax.
///
/// Loyalty and promo discounts are both computed against the original
/// subtotal and added, never chained on each other. All reads, no
/// writes; re-validation and reservation happen at checkout.
pub struct PricingEngine {
    pool: SqlitePool,
    catalog: Arc<dyn CatalogPort>,
    identity: Arc<dyn IdentityPort>,
    settings: ShopSettings,
}

impl std::fmt::Debug for PricingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PricingEngine {
    pub fn new(
        pool: SqlitePool,
        catalog: Arc<dyn CatalogPort>,
        identity: Arc<dyn IdentityPort>,
        settings: ShopSettings,
    ) -> Self {
        Self {
            pool,
            catalog,
            identity,
            settings,
        }
    }

    pub fn settings(&self) -> &ShopSettings {
        &self.settings
    }

    /// Price the given cart lines for their owner.
    ///
    /// `user_id` is the authenticated owner when there is one; loyalty
    /// discounts and per-user promo caps need it, anonymous carts skip
    /// both.
    pub async fn price_cart(
        &self,
        cart: &Cart,
        lines: &[CartLine],
        user_id: Option<i64>,
    ) -> AppResult<PricedCart> {
        if lines.is_empty() {
            return Err(ErrorCode::CartEmpty.into());
        }

        let mut priced_lines = Vec::with_capacity(lines.len());
        let mut subtotal_cents: i64 = 0;
        for line in lines {
            let book = self
                .catalog
                .pricing_and_stock(line.book_id)
                .await?
                .filter(|b| b.is_available)
                .ok_or_else(|| {
                    AppError::new(ErrorCode::BookUnavailable).with_detail("book_id", line.book_id)
                })?;
            // Quantities are capped at cart entry, but lines written
            // through other paths still must not wrap the subtotal
            let line_total = book
                .unit_price_cents
                .checked_mul(line.quantity)
                .ok_or_else(|| AppError::validation("Cart line total is too large"))?;
            subtotal_cents = subtotal_cents
                .checked_add(line_total)
                .ok_or_else(|| AppError::validation("Cart total is too large"))?;
            priced_lines.push(PricedLine {
                book_id: book.book_id,
                title: book.title,
                quantity: line.quantity,
                unit_price_cents: book.unit_price_cents,
                line_total_cents: line_total,
                is_preorder: book.is_preorder,
                preorder_available_date: book.preorder_available_date,
            });
        }

        let loyalty_discount_cents = match user_id {
            Some(user_id) => self.loyalty_discount(user_id, subtotal_cents).await?,
            None => 0,
        };

        let mut promo_discount_cents = 0;
        let mut promo_free_shipping = false;
        let mut promo_code = None;
        if let Some(promo_id) = cart.promo_code_id {
            let code = repository::promo::find_by_id(&self.pool, promo_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::PromoCodeInvalid))?;
            promo::validate(&self.pool, &code, user_id, subtotal_cents, now_millis()).await?;
            promo_discount_cents = promo::discount_cents(&code, subtotal_cents);
            promo_free_shipping = promo::grants_free_shipping(&code);
            promo_code = Some(code.code);
        }

        // Additive stacking, clamped so the base never goes negative
        let total_discount_cents =
            (loyalty_discount_cents + promo_discount_cents).min(subtotal_cents);
        let discounted_cents = subtotal_cents - total_discount_cents;

        let shipping_cost_cents = if promo_free_shipping
            || discounted_cents >= self.settings.free_shipping_threshold_cents
        {
            0
        } else {
            self.settings.standard_shipping_cost_cents
        };

        let tax_cents = money::percent_of(discounted_cents, self.settings.tax_rate_percent);
        let grand_total_cents = discounted_cents + shipping_cost_cents + tax_cents;

        Ok(PricedCart {
            cart_id: cart.id,
            lines: priced_lines,
            subtotal_cents,
            loyalty_discount_cents,
            promo_discount_cents,
            total_discount_cents,
            shipping_cost_cents,
            tax_cents,
            grand_total_cents,
            promo_code,
        })
    }

    /// Best-tier loyalty discount for the user's confirmed-order
    /// history. Tier eligibility always aggregates live from orders,
    /// never from the denormalized per-user totals.
    async fn loyalty_discount(&self, user_id: i64, subtotal_cents: i64) -> AppResult<i64> {
        let stats: ConfirmedOrderStats = self.identity.confirmed_order_stats(user_id).await?;
        let programs = repository::loyalty::active_programs(&self.pool).await?;
        Ok(loyalty::best_tier(&programs, &stats)
            .map(|tier| loyalty::tier_discount_cents(tier, subtotal_cents))
            .unwrap_or(0))
    }
}
