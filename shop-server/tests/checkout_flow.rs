//! Checkout: pricing snapshot frozen into an order, reservations
//! all-or-nothing, cart cleared on success.

mod common;

use common::*;
use shared::models::{DiscountType, OrderPaymentStatus, OrderStatus, PaymentStatus};
use shop_server::cart::CartOwner;
use shop_server::db::repository;
use shop_server::ports::NotificationEvent;
use shop_server::ErrorCode;

#[tokio::test]
async fn checkout_freezes_prices_and_reserves_stock() {
    let app = test_app().await;
    let novel = seed_book(&app, "Novel", 2500, 10).await;
    let atlas = seed_book(&app, "Atlas", 3000, 5).await;

    let order = place_order(&app, 7, &[(novel.id, 2), (atlas.id, 1)]).await;

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, OrderPaymentStatus::Pending);
    assert_eq!(order.subtotal_cents, 8000);
    assert_eq!(order.shipping_cost_cents, 0);
    assert_eq!(order.tax_cents, 440);
    assert_eq!(order.total_cents, 8440);
    assert!(!order.is_preorder);
    assert!(order.order_number.starts_with("ORD-"));

    let items = repository::order::items(app.pool(), order.id).await.unwrap();
    assert_eq!(items.len(), 2);
    let novel_item = items.iter().find(|i| i.book_id == novel.id).unwrap();
    assert_eq!(novel_item.quantity, 2);
    assert_eq!(novel_item.unit_price_cents, 2500);
    assert_eq!(novel_item.title, "Novel");

    // Stock reserved up front
    assert_eq!(book_by_id(&app, novel.id).await.stock_quantity, 8);
    assert_eq!(book_by_id(&app, atlas.id).await.stock_quantity, 4);

    // Payment row opened for the grand total
    let payment = repository::payment::find_by_order(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.amount_cents, 8440);
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.currency, "EUR");

    // Cart emptied
    let view = app.state.carts.view(&CartOwner::User(7)).await.unwrap();
    assert!(view.lines.is_empty());

    assert_eq!(
        app.notifier.events_for(order.id),
        vec![NotificationEvent::OrderConfirmed]
    );
}

#[tokio::test]
async fn insufficient_stock_rolls_back_everything() {
    let app = test_app().await;
    let plenty = seed_book(&app, "Plenty", 2000, 10).await;
    let scarce = seed_book(&app, "Scarce", 2000, 3).await;

    let owner = CartOwner::User(7);
    app.state.carts.add_line(&owner, plenty.id, 2).await.unwrap();
    app.state.carts.add_line(&owner, scarce.id, 2).await.unwrap();

    // Someone else takes the last copies between pricing and checkout
    sqlx::query("UPDATE book SET stock_quantity = 1 WHERE id = ?")
        .bind(scarce.id)
        .execute(app.pool())
        .await
        .unwrap();

    let err = app
        .state
        .orders
        .checkout(7, &checkout_request())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StockInsufficient);

    // Nothing moved: no order, both stocks intact, cart untouched
    assert!(app.state.orders.list_for_user(7).await.unwrap().is_empty());
    assert_eq!(book_by_id(&app, plenty.id).await.stock_quantity, 10);
    assert_eq!(book_by_id(&app, scarce.id).await.stock_quantity, 1);
    let view = app.state.carts.view(&owner).await.unwrap();
    assert_eq!(view.lines.len(), 2);
    assert!(app.notifier.events().is_empty());
}

#[tokio::test]
async fn checkout_records_promo_use_and_detaches_it() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 10_000, 10).await;
    let promo = seed_promo(&app, "TEN", DiscountType::Percentage, 1000, 0, None).await;

    let owner = CartOwner::User(7);
    app.state.carts.add_line(&owner, book.id, 1).await.unwrap();
    app.state.carts.apply_promo(&owner, "TEN").await.unwrap();

    let order = app
        .state
        .orders
        .checkout(7, &checkout_request())
        .await
        .unwrap();
    assert_eq!(order.discount_cents, 1000);

    let uses = repository::promo::uses_for_order(app.pool(), order.id)
        .await
        .unwrap();
    assert_eq!(uses.len(), 1);
    assert_eq!(uses[0].promo_code_id, promo.id);
    assert_eq!(uses[0].user_id, 7);

    // Promo does not linger on the emptied cart
    let view = app.state.carts.view(&owner).await.unwrap();
    assert!(view.cart.promo_code_id.is_none());

    // One use per user: a second cart with the same code is refused
    app.state.carts.add_line(&owner, book.id, 1).await.unwrap();
    app.state.carts.apply_promo(&owner, "TEN").await.unwrap();
    let err = app
        .state
        .orders
        .checkout(7, &checkout_request())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PromoCodeUserLimitReached);
}

#[tokio::test]
async fn preorder_checkout_reserves_capacity() {
    let app = test_app().await;
    let upcoming = seed_preorder_book(&app, "Upcoming", 4000, 5, "2026-12-01").await;
    let later = seed_preorder_book(&app, "Later", 3000, 5, "2027-02-01").await;
    let stocked = seed_book(&app, "Stocked", 2000, 10).await;

    let order = place_order(&app, 7, &[(upcoming.id, 2), (later.id, 1), (stocked.id, 1)]).await;

    assert!(order.is_preorder);
    // Effective ready date is the latest across preorder lines
    assert_eq!(order.preorder_ready_date.as_deref(), Some("2027-02-01"));

    assert_eq!(book_by_id(&app, upcoming.id).await.preorder_count, 2);
    assert_eq!(book_by_id(&app, later.id).await.preorder_count, 1);
    assert_eq!(book_by_id(&app, stocked.id).await.stock_quantity, 9);

    assert_eq!(
        app.notifier.events_for(order.id),
        vec![NotificationEvent::PreorderConfirmed]
    );
}

#[tokio::test]
async fn preorder_capacity_is_a_hard_limit() {
    let app = test_app().await;
    let book = seed_preorder_book(&app, "Limited", 4000, 2, "2026-12-01").await;

    let owner = CartOwner::User(7);
    app.state.carts.add_line(&owner, book.id, 3).await.unwrap();

    let err = app
        .state
        .orders
        .checkout(7, &checkout_request())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PreorderCapacityExceeded);
    assert_eq!(book_by_id(&app, book.id).await.preorder_count, 0);
}

#[tokio::test]
async fn checkout_validates_shipping_fields() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 2000, 5).await;
    let owner = CartOwner::User(7);
    app.state.carts.add_line(&owner, book.id, 1).await.unwrap();

    let mut request = checkout_request();
    request.shipping_name = String::new();
    let err = app.state.orders.checkout(7, &request).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 2000, 5).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;

    assert_eq!(
        app.state.orders.get_for_user(7, order.id).await.unwrap().id,
        order.id
    );
    let err = app.state.orders.get_for_user(8, order.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
}
