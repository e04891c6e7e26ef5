//! Shared test fixtures
//!
//! Every test assembles a full `ServerState` over an in-memory SQLite
//! database, with the mock payment provider and a capturing notifier
//! wired in through the port seams.

#![allow(dead_code)]

use std::sync::Arc;

use shared::models::{
    Book, BookCreate, DiscountType, LoyaltyProgram, LoyaltyProgramCreate, Order, PromoCode,
    PromoCodeCreate,
};
use shared::util::now_millis;
use shop_server::cart::CartOwner;
use shop_server::core::{Config, ServerState};
use shop_server::db::{DbService, repository};
use shop_server::orders::CheckoutRequest;
use shop_server::ports::{CapturingNotifier, LocalCatalog, LocalIdentity, MockProvider};

pub struct TestApp {
    pub state: ServerState,
    pub provider: Arc<MockProvider>,
    pub notifier: Arc<CapturingNotifier>,
}

impl TestApp {
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.state.db.pool
    }
}

/// Full state over an in-memory database with mock ports
pub async fn test_app() -> TestApp {
    let db = DbService::new_in_memory().await.unwrap();
    let provider = Arc::new(MockProvider::new());
    let notifier = Arc::new(CapturingNotifier::new());

    let state = ServerState::with_ports(
        Config::with_overrides(":memory:", 0),
        db.clone(),
        Arc::new(LocalCatalog::new(db.pool.clone())),
        Arc::new(LocalIdentity::new(db.pool.clone())),
        notifier.clone(),
        provider.clone(),
    );

    TestApp {
        state,
        provider,
        notifier,
    }
}

pub async fn seed_book(app: &TestApp, title: &str, price_cents: i64, stock: i64) -> Book {
    repository::book::create(
        app.pool(),
        BookCreate {
            title: title.into(),
            price_cents,
            discount_price_cents: None,
            stock_quantity: stock,
            is_available: true,
            is_preorder: false,
            preorder_available_date: None,
            preorder_capacity: 0,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_sale_book(
    app: &TestApp,
    title: &str,
    price_cents: i64,
    sale_cents: i64,
    stock: i64,
) -> Book {
    repository::book::create(
        app.pool(),
        BookCreate {
            title: title.into(),
            price_cents,
            discount_price_cents: Some(sale_cents),
            stock_quantity: stock,
            is_available: true,
            is_preorder: false,
            preorder_available_date: None,
            preorder_capacity: 0,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_preorder_book(
    app: &TestApp,
    title: &str,
    price_cents: i64,
    capacity: i64,
    available_date: &str,
) -> Book {
    repository::book::create(
        app.pool(),
        BookCreate {
            title: title.into(),
            price_cents,
            discount_price_cents: None,
            stock_quantity: 0,
            is_available: true,
            is_preorder: true,
            preorder_available_date: Some(available_date.into()),
            preorder_capacity: capacity,
        },
    )
    .await
    .unwrap()
}

/// Promo code valid for a day around now
pub async fn seed_promo(
    app: &TestApp,
    code: &str,
    discount_type: DiscountType,
    value: i64,
    min_cart_cents: i64,
    max_discount_cents: Option<i64>,
) -> PromoCode {
    let now = now_millis();
    repository::promo::create(
        app.pool(),
        PromoCodeCreate {
            code: code.into(),
            discount_type,
            value,
            min_cart_amount_cents: min_cart_cents,
            max_discount_amount_cents: max_discount_cents,
            max_uses: None,
            max_uses_per_user: 1,
            valid_from: now - 86_400_000,
            valid_until: now + 86_400_000,
            is_active: true,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_loyalty_tier(
    app: &TestApp,
    name: &str,
    min_purchases: i64,
    min_amount_cents: i64,
    discount_type: DiscountType,
    value: i64,
) -> LoyaltyProgram {
    repository::loyalty::create(
        app.pool(),
        LoyaltyProgramCreate {
            name: name.into(),
            min_purchases,
            min_amount_cents,
            discount_type,
            value,
            max_discount_amount_cents: None,
            is_active: true,
        },
    )
    .await
    .unwrap()
}

pub fn checkout_request() -> CheckoutRequest {
    serde_json::from_value(serde_json::json!({
        "shipping_name": "Ada Lovelace",
        "shipping_address": "12 Analytical Lane",
        "shipping_city": "London",
        "shipping_postal_code": "N1 9GU",
        "shipping_country": "GB",
        "payment_method": "card",
    }))
    .unwrap()
}

/// Fill the user's cart and check out
pub async fn place_order(app: &TestApp, user_id: i64, items: &[(i64, i64)]) -> Order {
    let owner = CartOwner::User(user_id);
    for (book_id, quantity) in items {
        app.state
            .carts
            .add_line(&owner, *book_id, *quantity)
            .await
            .unwrap();
    }
    app.state
        .orders
        .checkout(user_id, &checkout_request())
        .await
        .unwrap()
}

/// Create the provider intent and capture it
pub async fn pay_order(app: &TestApp, user_id: i64, order_id: i64) -> Order {
    let intent = app
        .state
        .gateway
        .create_provider_order(user_id, order_id)
        .await
        .unwrap();
    app.state.gateway.capture(&intent.session_id).await.unwrap()
}

/// Rewind an order's creation time (expiration tests)
pub async fn backdate_order(app: &TestApp, order_id: i64, by_millis: i64) {
    sqlx::query("UPDATE orders SET created_at = created_at - ? WHERE id = ?")
        .bind(by_millis)
        .bind(order_id)
        .execute(app.pool())
        .await
        .unwrap();
}

pub async fn book_by_id(app: &TestApp, id: i64) -> Book {
    repository::book::find_by_id(app.pool(), id)
        .await
        .unwrap()
        .unwrap()
}
