//! Cart API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::api::Caller;
use crate::cart::CartView;
use crate::core::ServerState;
use crate::db::repository;
use crate::utils::{AppError, AppResult};
use shared::models::{Cart, CartLineInput, PricedCart};

/// GET /api/cart
pub async fn view(State(state): State<ServerState>, caller: Caller) -> AppResult<Json<CartView>> {
    let owner = caller.owner()?;
    Ok(Json(state.carts.view(&owner).await?))
}

/// GET /api/cart/price
pub async fn price(
    State(state): State<ServerState>,
    caller: Caller,
) -> AppResult<Json<PricedCart>> {
    let owner = caller.owner()?;
    let cart = state.carts.get_or_create(&owner).await?;
    let lines = repository::cart::lines(&state.db.pool, cart.id).await?;
    let priced = state
        .pricing
        .price_cart(&cart, &lines, caller.user_id)
        .await?;
    Ok(Json(priced))
}

/// POST /api/cart/lines
pub async fn add_line(
    State(state): State<ServerState>,
    caller: Caller,
    Json(input): Json<CartLineInput>,
) -> AppResult<Json<CartView>> {
    let owner = caller.owner()?;
    Ok(Json(
        state
            .carts
            .add_line(&owner, input.book_id, input.quantity)
            .await?,
    ))
}

#[derive(Deserialize)]
pub struct QuantityBody {
    pub quantity: i64,
}

/// PUT /api/cart/lines/{book_id}
pub async fn set_quantity(
    State(state): State<ServerState>,
    caller: Caller,
    Path(book_id): Path<i64>,
    Json(body): Json<QuantityBody>,
) -> AppResult<Json<CartView>> {
    let owner = caller.owner()?;
    Ok(Json(
        state
            .carts
            .set_quantity(&owner, book_id, body.quantity)
            .await?,
    ))
}

/// DELETE /api/cart/lines/{book_id}
pub async fn remove_line(
    State(state): State<ServerState>,
    caller: Caller,
    Path(book_id): Path<i64>,
) -> AppResult<Json<CartView>> {
    let owner = caller.owner()?;
    Ok(Json(state.carts.remove_line(&owner, book_id).await?))
}

/// DELETE /api/cart
pub async fn clear(State(state): State<ServerState>, caller: Caller) -> AppResult<Json<CartView>> {
    let owner = caller.owner()?;
    Ok(Json(state.carts.clear(&owner).await?))
}

#[derive(Deserialize)]
pub struct PromoBody {
    pub code: String,
}

/// POST /api/cart/promo
pub async fn apply_promo(
    State(state): State<ServerState>,
    caller: Caller,
    Json(body): Json<PromoBody>,
) -> AppResult<Json<CartView>> {
    let owner = caller.owner()?;
    Ok(Json(state.carts.apply_promo(&owner, &body.code).await?))
}

/// DELETE /api/cart/promo
pub async fn remove_promo(
    State(state): State<ServerState>,
    caller: Caller,
) -> AppResult<Json<CartView>> {
    let owner = caller.owner()?;
    Ok(Json(state.carts.remove_promo(&owner).await?))
}

/// POST /api/cart/merge
///
/// Requires both identity headers: the session cart is folded into the
/// freshly authenticated user's cart.
pub async fn merge(State(state): State<ServerState>, caller: Caller) -> AppResult<Json<Cart>> {
    let user_id = caller.require_user()?;
    let session_key = caller
        .session_key
        .as_deref()
        .ok_or_else(|| AppError::invalid_request("Missing X-Session-Id header"))?;
    Ok(Json(state.carts.merge_on_login(session_key, user_id).await?))
}
