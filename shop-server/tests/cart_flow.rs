//! Cart operations for user and anonymous session owners.

mod common;

use common::*;
use shared::models::DiscountType;
use shop_server::cart::CartOwner;
use shop_server::db::repository;
use shop_server::ErrorCode;

#[tokio::test]
async fn lines_consolidate_by_book() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 2000, 10).await;

    let owner = CartOwner::User(1);
    app.state.carts.add_line(&owner, book.id, 1).await.unwrap();
    let view = app.state.carts.add_line(&owner, book.id, 2).await.unwrap();

    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 3);
}

#[tokio::test]
async fn set_quantity_replaces_and_zero_removes() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 2000, 10).await;
    let owner = CartOwner::User(1);
    app.state.carts.add_line(&owner, book.id, 3).await.unwrap();

    let view = app.state.carts.set_quantity(&owner, book.id, 5).await.unwrap();
    assert_eq!(view.lines[0].quantity, 5);

    let view = app.state.carts.set_quantity(&owner, book.id, 0).await.unwrap();
    assert!(view.lines.is_empty());
}

#[tokio::test]
async fn missing_lines_and_bad_quantities_are_rejected() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 2000, 10).await;
    let owner = CartOwner::User(1);

    let err = app.state.carts.add_line(&owner, book.id, 0).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let err = app.state.carts.remove_line(&owner, book.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CartLineNotFound);

    let err = app
        .state
        .carts
        .set_quantity(&owner, book.id, 2)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CartLineNotFound);

    let err = app.state.carts.add_line(&owner, 9999, 1).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BookUnavailable);

    // Oversized quantities are rejected before they can distort totals
    let err = app
        .state
        .carts
        .add_line(&owner, book.id, i64::MAX / 2)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    app.state.carts.add_line(&owner, book.id, 1).await.unwrap();
    let err = app
        .state
        .carts
        .set_quantity(&owner, book.id, 1_000_000)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn session_cart_merges_into_the_user_cart_on_login() {
    let app = test_app().await;
    let shared_book = seed_book(&app, "Shared", 2000, 10).await;
    let session_only = seed_book(&app, "Session Only", 3000, 10).await;
    seed_promo(&app, "TEN", DiscountType::Percentage, 1000, 0, None).await;

    let session = CartOwner::Session("sess-42".into());
    app.state.carts.add_line(&session, shared_book.id, 2).await.unwrap();
    app.state.carts.add_line(&session, session_only.id, 1).await.unwrap();
    app.state.carts.apply_promo(&session, "TEN").await.unwrap();

    let user = CartOwner::User(1);
    app.state.carts.add_line(&user, shared_book.id, 1).await.unwrap();

    let merged = app.state.carts.merge_on_login("sess-42", 1).await.unwrap();
    assert_eq!(merged.user_id, Some(1));
    // Promo carried over because the user cart had none
    assert!(merged.promo_code_id.is_some());

    let view = app.state.carts.view(&user).await.unwrap();
    assert_eq!(view.lines.len(), 2);
    let shared_line = view.lines.iter().find(|l| l.book_id == shared_book.id).unwrap();
    assert_eq!(shared_line.quantity, 3);

    // The session cart is gone
    assert!(
        repository::cart::find_by_session(app.pool(), "sess-42")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn merge_leaves_no_stray_session_lines() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 2000, 10).await;

    let session = CartOwner::Session("sess-9".into());
    app.state.carts.add_line(&session, book.id, 2).await.unwrap();
    app.state.carts.add_line(&CartOwner::User(5), book.id, 1).await.unwrap();

    let merged = app.state.carts.merge_on_login("sess-9", 5).await.unwrap();

    // Every line belongs to the surviving user cart; no rows are left
    // behind referencing the deleted session cart
    let stray: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart_line WHERE cart_id <> ?")
        .bind(merged.id)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(stray, 0);
}

#[tokio::test]
async fn merge_without_a_session_cart_returns_the_user_cart() {
    let app = test_app().await;
    let cart = app.state.carts.merge_on_login("never-seen", 1).await.unwrap();
    assert_eq!(cart.user_id, Some(1));
}

#[tokio::test]
async fn clear_drops_lines_and_promo() {
    let app = test_app().await;
    let book = seed_book(&app, "Book", 2000, 10).await;
    seed_promo(&app, "TEN", DiscountType::Percentage, 1000, 0, None).await;

    let owner = CartOwner::User(1);
    app.state.carts.add_line(&owner, book.id, 2).await.unwrap();
    app.state.carts.apply_promo(&owner, "TEN").await.unwrap();

    let view = app.state.carts.clear(&owner).await.unwrap();
    assert!(view.lines.is_empty());
    assert!(view.cart.promo_code_id.is_none());
}
