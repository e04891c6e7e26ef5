//! Payment API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::Caller;
use crate::core::ServerState;
use crate::payments::PaymentIntent;
use crate::utils::AppResult;
use shared::models::{Order, Payment};

/// POST /api/payments/orders/{order_id}/intent
pub async fn create_intent(
    State(state): State<ServerState>,
    caller: Caller,
    Path(order_id): Path<i64>,
) -> AppResult<Json<PaymentIntent>> {
    let user_id = caller.require_user()?;
    Ok(Json(
        state.gateway.create_provider_order(user_id, order_id).await?,
    ))
}

/// GET /api/payments/orders/{order_id}
pub async fn get_payment(
    State(state): State<ServerState>,
    caller: Caller,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Payment>> {
    let user_id = caller.require_user()?;
    Ok(Json(state.gateway.payment_for_order(user_id, order_id).await?))
}

/// POST /api/payments/capture/{session_id}
///
/// No identity required, the session id is the capability; providers
/// call this from their webhook without our user headers.
pub async fn capture(
    State(state): State<ServerState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.gateway.capture(&session_id).await?))
}
