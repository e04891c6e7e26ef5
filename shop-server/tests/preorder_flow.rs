//! Preorder release sweep: arrived books convert to regular stock and
//! their waiting orders move forward.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use shared::models::OrderStatus;
use shop_server::db::repository;
use shop_server::orders::PreorderFulfillment;
use shop_server::ports::NotificationEvent;
use tokio_util::sync::CancellationToken;

fn fulfillment(app: &TestApp) -> PreorderFulfillment {
    PreorderFulfillment::new(
        app.pool().clone(),
        Arc::clone(&app.state.state_machine),
        Arc::clone(&app.state.locks),
        app.state.notifier.clone(),
        Duration::from_secs(3600),
        CancellationToken::new(),
    )
}

fn days_ago(days: i64) -> String {
    (chrono::Utc::now() - chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn days_ahead(days: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

#[tokio::test]
async fn arrived_book_releases_waiting_orders() {
    let app = test_app().await;
    let book = seed_preorder_book(&app, "Arrived", 4000, 10, &days_ago(1)).await;
    let order = place_order(&app, 7, &[(book.id, 2)]).await;
    assert!(order.is_preorder);

    let released = fulfillment(&app).sweep().await.unwrap();
    assert_eq!(released, 1);

    let book = book_by_id(&app, book.id).await;
    assert!(!book.is_preorder);
    assert_eq!(book.preorder_count, 0);

    let order = repository::order::find_by_id(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!order.is_preorder);
    assert_eq!(order.status, OrderStatus::Processing);

    let history = repository::order::history(app.pool(), order.id).await.unwrap();
    assert!(
        history
            .iter()
            .any(|h| h.note.as_deref() == Some("Preorder available"))
    );
    assert!(
        app.notifier
            .events_for(order.id)
            .contains(&NotificationEvent::PreorderAvailable)
    );
}

#[tokio::test]
async fn paid_preorder_order_keeps_its_status_on_release() {
    let app = test_app().await;
    let book = seed_preorder_book(&app, "Arrived", 4000, 10, &days_ago(1)).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;
    let paid = pay_order(&app, 7, order.id).await;
    assert_eq!(paid.status, OrderStatus::Processing);

    let history_before = repository::order::history(app.pool(), order.id)
        .await
        .unwrap()
        .len();

    assert_eq!(fulfillment(&app).sweep().await.unwrap(), 1);

    let order = repository::order::find_by_id(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!order.is_preorder);
    assert_eq!(order.status, OrderStatus::Processing);
    // No extra status row, only the flag cleared
    let history = repository::order::history(app.pool(), order.id).await.unwrap();
    assert_eq!(history.len(), history_before);
    assert!(
        app.notifier
            .events_for(order.id)
            .contains(&NotificationEvent::PreorderAvailable)
    );
}

#[tokio::test]
async fn order_waits_until_all_its_preorder_lines_arrive() {
    let app = test_app().await;
    let arrived = seed_preorder_book(&app, "Arrived", 4000, 10, &days_ago(1)).await;
    let pending_book = seed_preorder_book(&app, "Still Coming", 3000, 10, &days_ahead(30)).await;
    let order = place_order(&app, 7, &[(arrived.id, 1), (pending_book.id, 1)]).await;

    assert_eq!(fulfillment(&app).sweep().await.unwrap(), 0);

    let order_row = repository::order::find_by_id(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert!(order_row.is_preorder);
    assert_eq!(order_row.status, OrderStatus::Pending);
    assert!(!app
        .notifier
        .events_for(order.id)
        .contains(&NotificationEvent::PreorderAvailable));

    // The second book arrives
    sqlx::query("UPDATE book SET preorder_available_date = ? WHERE id = ?")
        .bind(days_ago(1))
        .bind(pending_book.id)
        .execute(app.pool())
        .await
        .unwrap();

    assert_eq!(fulfillment(&app).sweep().await.unwrap(), 1);
    let order_row = repository::order::find_by_id(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!order_row.is_preorder);
    assert_eq!(order_row.status, OrderStatus::Processing);
}

#[tokio::test]
async fn cancelled_preorder_order_is_left_alone() {
    let app = test_app().await;
    let book = seed_preorder_book(&app, "Arrived", 4000, 10, &days_ago(1)).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;
    app.state
        .state_machine
        .transition(order.id, OrderStatus::Cancelled, Some(7), None)
        .await
        .unwrap();

    assert_eq!(fulfillment(&app).sweep().await.unwrap(), 0);

    let order = repository::order::find_by_id(app.pool(), order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert!(!app
        .notifier
        .events_for(order.id)
        .contains(&NotificationEvent::PreorderAvailable));
}

#[tokio::test]
async fn sweep_without_arrivals_is_a_no_op() {
    let app = test_app().await;
    seed_preorder_book(&app, "Still Coming", 4000, 10, &days_ahead(30)).await;
    assert_eq!(fulfillment(&app).sweep().await.unwrap(), 0);
}
