//! Refund lifecycle: request, approve/reject, provider-side process.

mod common;

use std::sync::atomic::Ordering;

use common::*;
use shared::models::RefundStatus;
use shop_server::ErrorCode;

async fn paid_order(app: &TestApp) -> i64 {
    let book = seed_book(app, "Book", 6000, 5).await;
    let order = place_order(app, 7, &[(book.id, 1)]).await;
    pay_order(app, 7, order.id).await;
    order.id
}

#[tokio::test]
async fn refund_requires_a_paid_order() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 6000, 5).await;
    let order = place_order(&app, 7, &[(book.id, 1)]).await;

    let err = app
        .state
        .refunds
        .request(order.id, 1000, "Damaged cover", 7)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotPaid);
}

#[tokio::test]
async fn refund_amount_is_bounded_by_the_order_total() {
    let app = test_app().await;
    let order_id = paid_order(&app).await;

    let err = app
        .state
        .refunds
        .request(order_id, 0, "Damaged cover", 7)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RefundInvalidAmount);

    let err = app
        .state
        .refunds
        .request(order_id, 1_000_000, "Damaged cover", 7)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RefundInvalidAmount);

    let err = app
        .state
        .refunds
        .request(order_id, 1000, "   ", 7)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn approve_then_process_stores_the_provider_refund_id() {
    let app = test_app().await;
    let order_id = paid_order(&app).await;

    let refund = app
        .state
        .refunds
        .request(order_id, 2000, "Damaged cover", 7)
        .await
        .unwrap();
    assert_eq!(refund.status, RefundStatus::Pending);

    let approved = app.state.refunds.approve(refund.id, 99).await.unwrap();
    assert_eq!(approved.status, RefundStatus::Approved);
    assert_eq!(approved.processed_by, Some(99));

    let processed = app.state.refunds.process(refund.id, 99).await.unwrap();
    assert_eq!(processed.status, RefundStatus::Processed);
    assert!(
        processed
            .provider_refund_id
            .as_deref()
            .unwrap()
            .starts_with("MOCK-REFUND-")
    );
}

#[tokio::test]
async fn process_straight_from_pending_is_allowed() {
    let app = test_app().await;
    let order_id = paid_order(&app).await;
    let refund = app
        .state
        .refunds
        .request(order_id, 2000, "Damaged cover", 7)
        .await
        .unwrap();

    let processed = app.state.refunds.process(refund.id, 99).await.unwrap();
    assert_eq!(processed.status, RefundStatus::Processed);
}

#[tokio::test]
async fn concurrent_processing_calls_the_provider_once() {
    let app = test_app().await;
    let order_id = paid_order(&app).await;
    let refund = app
        .state
        .refunds
        .request(order_id, 2000, "Damaged cover", 7)
        .await
        .unwrap();
    app.state.refunds.approve(refund.id, 99).await.unwrap();
    app.provider.refund_calls.store(0, Ordering::SeqCst);

    let (first, second) = tokio::join!(
        app.state.refunds.process(refund.id, 99),
        app.state.refunds.process(refund.id, 98),
    );

    // Exactly one processor wins; the loser never reaches the provider
    let (winner, loser) = if first.is_ok() {
        (first, second)
    } else {
        (second, first)
    };
    assert_eq!(winner.unwrap().status, RefundStatus::Processed);
    assert_eq!(loser.unwrap_err().code, ErrorCode::RefundInvalidState);
    assert_eq!(app.provider.refund_calls.load(Ordering::SeqCst), 1);

    let stored = app.state.refunds.get(refund.id).await.unwrap();
    assert_eq!(stored.status, RefundStatus::Processed);
    assert!(stored.provider_refund_id.is_some());
}

#[tokio::test]
async fn rejected_refund_cannot_be_processed() {
    let app = test_app().await;
    let order_id = paid_order(&app).await;
    let refund = app
        .state
        .refunds
        .request(order_id, 2000, "Damaged cover", 7)
        .await
        .unwrap();

    app.state.refunds.reject(refund.id, 99).await.unwrap();

    let err = app.state.refunds.process(refund.id, 99).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RefundInvalidState);

    // And it cannot be re-approved either
    let err = app.state.refunds.approve(refund.id, 99).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RefundInvalidState);
}

#[tokio::test]
async fn provider_outage_leaves_the_refund_retryable() {
    let app = test_app().await;
    let order_id = paid_order(&app).await;
    let refund = app
        .state
        .refunds
        .request(order_id, 2000, "Damaged cover", 7)
        .await
        .unwrap();
    app.state.refunds.approve(refund.id, 99).await.unwrap();

    app.provider.unavailable.store(true, Ordering::SeqCst);
    let err = app.state.refunds.process(refund.id, 99).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ProviderUnavailable);

    // No state change recorded; the retry succeeds once the provider is back
    let refund = app.state.refunds.get(refund.id).await.unwrap();
    assert_eq!(refund.status, RefundStatus::Approved);
    assert!(refund.provider_refund_id.is_none());

    app.provider.unavailable.store(false, Ordering::SeqCst);
    let processed = app.state.refunds.process(refund.id, 99).await.unwrap();
    assert_eq!(processed.status, RefundStatus::Processed);
}

#[tokio::test]
async fn refund_lists_filter_by_status() {
    let app = test_app().await;
    let order_id = paid_order(&app).await;
    let first = app
        .state
        .refunds
        .request(order_id, 1000, "Damaged cover", 7)
        .await
        .unwrap();
    let second = app
        .state
        .refunds
        .request(order_id, 500, "Late delivery", 7)
        .await
        .unwrap();
    app.state.refunds.approve(second.id, 99).await.unwrap();

    let pending = app
        .state
        .refunds
        .list(Some(RefundStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, first.id);

    let all = app.state.refunds.list(None).await.unwrap();
    assert_eq!(all.len(), 2);

    let for_order = app.state.refunds.list_for_order(order_id).await.unwrap();
    assert_eq!(for_order.len(), 2);
}
