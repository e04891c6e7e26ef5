//! Order status transitions, cancellation side effects, and the
//! unpaid-order expiration sweep.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use shared::models::{OrderPaymentStatus, OrderStatus, PaymentStatus};
use shop_server::db::repository;
use shop_server::orders::ExpirationScheduler;
use shop_server::ports::NotificationEvent;
use shop_server::ErrorCode;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn paid_order_walks_the_full_lifecycle() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 6000, 5).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;
    pay_order(&app, 7, order.id).await;

    let sm = &app.state.state_machine;
    let shipped = sm
        .transition(order.id, OrderStatus::Shipped, Some(99), Some("Carrier picked up"))
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(shipped.shipped_at.is_some());

    let delivered = sm
        .transition(order.id, OrderStatus::Delivered, Some(99), None)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.delivered_at.is_some());

    let history = repository::order::history(app.pool(), order.id).await.unwrap();
    let statuses: Vec<_> = history
        .iter()
        .map(|h| (h.old_status.as_str(), h.new_status.as_str()))
        .collect();
    assert!(statuses.contains(&("pending", "processing")));
    assert!(statuses.contains(&("processing", "shipped")));
    assert!(statuses.contains(&("shipped", "delivered")));

    let events = app.notifier.events_for(order.id);
    assert!(events.contains(&NotificationEvent::Shipped));
    assert!(events.contains(&NotificationEvent::Delivered));
}

#[tokio::test]
async fn illegal_transition_changes_nothing() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 6000, 5).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;

    let before = repository::order::history(app.pool(), order.id).await.unwrap();

    // Pending orders cannot ship before payment
    let err = app
        .state
        .state_machine
        .transition(order.id, OrderStatus::Shipped, Some(99), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStatusTransition);

    let after = repository::order::find_by_id(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status, OrderStatus::Pending);
    let history = repository::order::history(app.pool(), order.id).await.unwrap();
    assert_eq!(history.len(), before.len());
}

#[tokio::test]
async fn same_status_transition_annotates_without_notifying() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 6000, 5).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;
    pay_order(&app, 7, order.id).await;

    let events_before = app.notifier.events_for(order.id).len();
    app.state
        .state_machine
        .transition(order.id, OrderStatus::Processing, Some(99), Some("Repacked"))
        .await
        .unwrap();

    let history = repository::order::history(app.pool(), order.id).await.unwrap();
    let note_row = history
        .iter()
        .find(|h| h.note.as_deref() == Some("Repacked"))
        .unwrap();
    assert_eq!(note_row.old_status, "processing");
    assert_eq!(note_row.new_status, "processing");
    assert_eq!(app.notifier.events_for(order.id).len(), events_before);
}

#[tokio::test]
async fn cancelling_an_unpaid_order_releases_everything() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 6000, 5).await;
    let order = place_order(&app, 7, &[(book.id, 2)]).await;
    assert_eq!(book_by_id(&app, book.id).await.stock_quantity, 3);

    let before = repository::order::history(app.pool(), order.id).await.unwrap();

    let cancelled = app
        .state
        .state_machine
        .transition(order.id, OrderStatus::Cancelled, Some(7), Some("Changed my mind"))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.payment_status, OrderPaymentStatus::Failed);
    assert!(cancelled.cancelled_at.is_some());

    // Stock back on the shelf
    assert_eq!(book_by_id(&app, book.id).await.stock_quantity, 5);

    // The open payment is closed out
    let payment = repository::payment::find_by_order(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Cancelled);

    // Exactly two rows: the order move and the payment move
    let history = repository::order::history(app.pool(), order.id).await.unwrap();
    assert_eq!(history.len(), before.len() + 2);
    assert!(
        history
            .iter()
            .any(|h| h.old_status == "pending" && h.new_status == "cancelled")
    );
    assert!(
        history
            .iter()
            .any(|h| h.old_status == "payment_pending" && h.new_status == "payment_failed")
    );

    assert!(app.notifier.events_for(order.id).contains(&NotificationEvent::Cancelled));
}

#[tokio::test]
async fn cancelling_a_paid_order_keeps_the_payment_settled() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 6000, 5).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;
    pay_order(&app, 7, order.id).await;

    let cancelled = app
        .state
        .state_machine
        .transition(order.id, OrderStatus::Cancelled, Some(99), Some("Out of print"))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    // Settled money is the refund flow's business, not cancellation's
    assert_eq!(cancelled.payment_status, OrderPaymentStatus::Paid);
    let payment = repository::payment::find_by_order(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(book_by_id(&app, book.id).await.stock_quantity, 5);
}

#[tokio::test]
async fn delivered_order_cannot_be_cancelled() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 6000, 5).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;
    pay_order(&app, 7, order.id).await;
    let sm = &app.state.state_machine;
    sm.transition(order.id, OrderStatus::Shipped, None, None).await.unwrap();
    sm.transition(order.id, OrderStatus::Delivered, None, None).await.unwrap();

    let err = sm
        .transition(order.id, OrderStatus::Cancelled, Some(7), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
}

fn expiration(app: &TestApp, threshold_hours: i64) -> ExpirationScheduler {
    ExpirationScheduler::new(
        app.pool().clone(),
        Arc::clone(&app.state.state_machine),
        threshold_hours,
        Duration::from_secs(3600),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn sweep_cancels_stale_unpaid_orders_only() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 6000, 20).await;

    let stale = place_order(&app, 1, &[(book.id, 1)]).await;
    let fresh = place_order(&app, 2, &[(book.id, 1)]).await;
    let paid = place_order(&app, 3, &[(book.id, 1)]).await;
    pay_order(&app, 3, paid.id).await;

    let day = 25 * 3600 * 1000;
    backdate_order(&app, stale.id, day).await;
    backdate_order(&app, paid.id, day).await;

    let cancelled = expiration(&app, 24).sweep().await.unwrap();
    assert_eq!(cancelled, 1);

    let stale = repository::order::find_by_id(app.pool(), stale.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stale.status, OrderStatus::Cancelled);
    let history = repository::order::history(app.pool(), stale.id).await.unwrap();
    assert!(
        history
            .iter()
            .any(|h| h.note.as_deref() == Some("Expired: payment not received in time"))
    );

    let fresh = repository::order::find_by_id(app.pool(), fresh.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fresh.status, OrderStatus::Pending);

    let paid = repository::order::find_by_id(app.pool(), paid.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.status, OrderStatus::Processing);

    // The reservations of the expired order are back
    assert_eq!(book_by_id(&app, book.id).await.stock_quantity, 18);

    // A second sweep finds nothing left to do
    assert_eq!(expiration(&app, 24).sweep().await.unwrap(), 0);
}
