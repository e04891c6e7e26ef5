//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::api::Caller;
use crate::core::ServerState;
use crate::db::repository;
use crate::orders::{CheckoutRequest, OrderStateMachine};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{
    Order, OrderItem, OrderPaymentStatus, OrderStatus, OrderStatusHistory, PricedCart, Refund,
};

/// Order plus its frozen items
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// GET /api/orders
pub async fn list(State(state): State<ServerState>, caller: Caller) -> AppResult<Json<Vec<Order>>> {
    let user_id = caller.require_user()?;
    Ok(Json(state.orders.list_for_user(user_id).await?))
}

/// GET /api/orders/preview
pub async fn preview(
    State(state): State<ServerState>,
    caller: Caller,
) -> AppResult<Json<PricedCart>> {
    let user_id = caller.require_user()?;
    Ok(Json(state.orders.preview(user_id).await?))
}

/// POST /api/orders/checkout
pub async fn checkout(
    State(state): State<ServerState>,
    caller: Caller,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<Order>> {
    let user_id = caller.require_user()?;
    Ok(Json(state.orders.checkout(user_id, &request).await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let user_id = caller.require_user()?;
    let order = state.orders.get_for_user(user_id, id).await?;
    let items = repository::order::items(&state.db.pool, order.id).await?;
    Ok(Json(OrderDetail { order, items }))
}

/// GET /api/orders/{id}/history
pub async fn history(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<OrderStatusHistory>>> {
    let user_id = caller.require_user()?;
    let order = state.orders.get_for_user(user_id, id).await?;
    Ok(Json(repository::order::history(&state.db.pool, order.id).await?))
}

#[derive(Deserialize)]
pub struct CancelBody {
    pub note: Option<String>,
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<CancelBody>,
) -> AppResult<Json<Order>> {
    let user_id = caller.require_user()?;
    let order = state.orders.get_for_user(user_id, id).await?;
    if !OrderStateMachine::is_legal(order.status, OrderStatus::Cancelled) {
        return Err(AppError::new(ErrorCode::OrderNotCancellable)
            .with_detail("status", order.status.as_str()));
    }
    // Paid orders go through the refund flow, not self-service cancel
    if order.payment_status == OrderPaymentStatus::Paid {
        return Err(AppError::new(ErrorCode::OrderNotCancellable)
            .with_detail("payment_status", order.payment_status.as_str()));
    }
    let note = body.note.as_deref().unwrap_or("Cancelled by customer");
    let order = state
        .state_machine
        .transition(order.id, OrderStatus::Cancelled, Some(user_id), Some(note))
        .await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct RefundRequestBody {
    pub amount_cents: i64,
    pub reason: String,
}

/// POST /api/orders/{id}/refunds
pub async fn request_refund(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<RefundRequestBody>,
) -> AppResult<Json<Refund>> {
    let user_id = caller.require_user()?;
    let order = state.orders.get_for_user(user_id, id).await?;
    let refund = state
        .refunds
        .request(order.id, body.amount_cents, &body.reason, user_id)
        .await?;
    Ok(Json(refund))
}

/// GET /api/orders/{id}/refunds
pub async fn list_refunds(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Refund>>> {
    let user_id = caller.require_user()?;
    let order = state.orders.get_for_user(user_id, id).await?;
    Ok(Json(state.refunds.list_for_order(order.id).await?))
}
