//! Admin API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::AdminCaller;
use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{Order, OrderPaymentStatus, OrderStatus, Refund, RefundStatus};

#[derive(Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
    pub note: Option<String>,
}

/// PUT /api/admin/orders/{id}/status
///
/// Same-status updates are allowed and produce an annotation-only
/// history row.
pub async fn update_order_status(
    State(state): State<ServerState>,
    admin: AdminCaller,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> AppResult<Json<Order>> {
    let order = state
        .state_machine
        .transition(id, body.status, Some(admin.admin_id), body.note.as_deref())
        .await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct PaymentStatusBody {
    pub payment_status: OrderPaymentStatus,
    pub note: Option<String>,
}

/// PUT /api/admin/orders/{id}/payment-status
pub async fn update_payment_status(
    State(state): State<ServerState>,
    admin: AdminCaller,
    Path(id): Path<i64>,
    Json(body): Json<PaymentStatusBody>,
) -> AppResult<Json<Order>> {
    let order = state
        .state_machine
        .update_payment_status(
            id,
            body.payment_status,
            Some(admin.admin_id),
            body.note.as_deref(),
        )
        .await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct CancelBody {
    pub note: Option<String>,
}

/// POST /api/admin/orders/{id}/cancel
pub async fn cancel_order(
    State(state): State<ServerState>,
    admin: AdminCaller,
    Path(id): Path<i64>,
    Json(body): Json<CancelBody>,
) -> AppResult<Json<Order>> {
    let note = body.note.as_deref().unwrap_or("Cancelled by operator");
    let order = state
        .state_machine
        .transition(id, OrderStatus::Cancelled, Some(admin.admin_id), Some(note))
        .await?;
    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct RefundFilter {
    pub status: Option<RefundStatus>,
}

/// GET /api/admin/refunds
pub async fn list_refunds(
    State(state): State<ServerState>,
    _admin: AdminCaller,
    Query(filter): Query<RefundFilter>,
) -> AppResult<Json<Vec<Refund>>> {
    Ok(Json(state.refunds.list(filter.status).await?))
}

/// POST /api/admin/refunds/{id}/approve
pub async fn approve_refund(
    State(state): State<ServerState>,
    admin: AdminCaller,
    Path(id): Path<i64>,
) -> AppResult<Json<Refund>> {
    Ok(Json(state.refunds.approve(id, admin.admin_id).await?))
}

/// POST /api/admin/refunds/{id}/reject
pub async fn reject_refund(
    State(state): State<ServerState>,
    admin: AdminCaller,
    Path(id): Path<i64>,
) -> AppResult<Json<Refund>> {
    Ok(Json(state.refunds.reject(id, admin.admin_id).await?))
}

/// POST /api/admin/refunds/{id}/process
pub async fn process_refund(
    State(state): State<ServerState>,
    admin: AdminCaller,
    Path(id): Path<i64>,
) -> AppResult<Json<Refund>> {
    Ok(Json(state.refunds.process(id, admin.admin_id).await?))
}
