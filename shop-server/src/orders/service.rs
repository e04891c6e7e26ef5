//! Order service: checkout

use crate::cart::{CartOwner, CartService};
use crate::db::repository::{self, RepoError};
use crate::ports::{NotificationEvent, NotificationPort};
use crate::pricing::PricingEngine;
use crate::utils::AppResult;
use serde::Deserialize;
use shared::models::{Order, PricedCart, ShippingInfo};
use shared::{AppError, ErrorCode};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

/// Checkout payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, max = 200))]
    pub shipping_name: String,
    #[validate(length(min = 1, max = 500))]
    pub shipping_address: String,
    #[validate(length(min = 1, max = 100))]
    pub shipping_city: String,
    #[validate(length(min = 1, max = 20))]
    pub shipping_postal_code: String,
    #[validate(length(min = 2, max = 100))]
    pub shipping_country: String,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
}

impl CheckoutRequest {
    fn shipping(&self) -> ShippingInfo {
        ShippingInfo {
            name: self.shipping_name.clone(),
            address: self.shipping_address.clone(),
            city: self.shipping_city.clone(),
            postal_code: self.shipping_postal_code.clone(),
            country: self.shipping_country.clone(),
        }
    }
}

/// Converts a priced cart into an immutable order.
///
/// The whole reservation runs in one transaction: every line either
/// reserves stock or preorder capacity, or the order does not exist at
/// all and the cart is left untouched for a retry.
pub struct OrderService {
    pool: SqlitePool,
    pricing: Arc<PricingEngine>,
    carts: Arc<CartService>,
    notifier: Arc<dyn NotificationPort>,
    currency: String,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl OrderService {
    pub fn new(
        pool: SqlitePool,
        pricing: Arc<PricingEngine>,
        carts: Arc<CartService>,
        notifier: Arc<dyn NotificationPort>,
        currency: String,
    ) -> Self {
        Self {
            pool,
            pricing,
            carts,
            notifier,
            currency,
        }
    }

    /// Price the user's current cart without creating anything
    pub async fn preview(&self, user_id: i64) -> AppResult<PricedCart> {
        let owner = CartOwner::User(user_id);
        let cart = self.carts.get_or_create(&owner).await?;
        let lines = repository::cart::lines(&self.pool, cart.id).await?;
        self.pricing.price_cart(&cart, &lines, Some(user_id)).await
    }

    /// Checkout: price the cart, then atomically reserve every line,
    /// freeze the order, open its payment, record the promo use, and
    /// clear the cart. Any unsatisfiable line rolls the whole thing
    /// back.
    pub async fn checkout(&self, user_id: i64, request: &CheckoutRequest) -> AppResult<Order> {
        request
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let owner = CartOwner::User(user_id);
        let cart = self.carts.get_or_create(&owner).await?;
        let lines = repository::cart::lines(&self.pool, cart.id).await?;
        let priced = self.pricing.price_cart(&cart, &lines, Some(user_id)).await?;

        let shipping = request.shipping();
        let order_number = shared::util::order_number();

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        // Re-validate availability line by line; pricing ran outside
        // the transaction and stock may have moved since.
        let mut is_preorder = false;
        let mut ready_date: Option<String> = None;
        for line in &priced.lines {
            let reserved = if line.is_preorder {
                repository::book::reserve_preorder(&mut *tx, line.book_id, line.quantity).await?
            } else {
                repository::book::reserve_stock(&mut *tx, line.book_id, line.quantity).await?
            };
            if !reserved {
                let code = if line.is_preorder {
                    ErrorCode::PreorderCapacityExceeded
                } else {
                    ErrorCode::StockInsufficient
                };
                return Err(AppError::new(code)
                    .with_detail("book_id", line.book_id)
                    .with_detail("title", line.title.clone()));
            }
            if line.is_preorder {
                is_preorder = true;
                // Effective ready-date is the latest across preorder lines
                if line.preorder_available_date > ready_date {
                    ready_date = line.preorder_available_date.clone();
                }
            }
        }

        let order_id = repository::order::insert(
            &mut *tx,
            repository::order::NewOrder {
                order_number: &order_number,
                user_id,
                shipping_name: &shipping.name,
                shipping_address: &shipping.address,
                shipping_city: &shipping.city,
                shipping_postal_code: &shipping.postal_code,
                shipping_country: &shipping.country,
                subtotal_cents: priced.subtotal_cents,
                discount_cents: priced.total_discount_cents,
                shipping_cost_cents: priced.shipping_cost_cents,
                tax_cents: priced.tax_cents,
                total_cents: priced.grand_total_cents,
                is_preorder,
                preorder_ready_date: ready_date.as_deref(),
            },
        )
        .await?;

        for line in &priced.lines {
            repository::order::insert_item(
                &mut *tx,
                order_id,
                line.book_id,
                &line.title,
                line.quantity,
                line.unit_price_cents,
                line.line_total_cents,
                line.is_preorder,
            )
            .await?;
        }

        repository::payment::insert(
            &mut *tx,
            order_id,
            &request.payment_method,
            &self.currency,
            priced.grand_total_cents,
        )
        .await?;

        if let Some(promo_id) = cart.promo_code_id {
            let recorded =
                repository::promo::record_use(&mut *tx, promo_id, order_id, user_id).await?;
            if !recorded {
                // Global cap was consumed between pricing and now
                return Err(AppError::new(ErrorCode::PromoCodeExhausted));
            }
        }

        repository::cart::clear(&mut *tx, cart.id).await?;

        tx.commit().await.map_err(RepoError::from)?;

        let event = if is_preorder {
            NotificationEvent::PreorderConfirmed
        } else {
            NotificationEvent::OrderConfirmed
        };
        self.notifier.notify(order_id, event).await;

        repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))
    }

    pub async fn get_for_user(&self, user_id: i64, order_id: i64) -> AppResult<Order> {
        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        Ok(order)
    }

    pub async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Order>> {
        Ok(repository::order::list_for_user(&self.pool, user_id).await?)
    }
}
