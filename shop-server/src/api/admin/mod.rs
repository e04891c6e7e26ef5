//! Admin API module
//!
//! Thin operator wrappers over the state machine and the refund
//! service. The state machine rejects illegal transitions regardless
//! of caller privilege, the admin surface gets no bypass.
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/admin/orders/{id}/status | PUT | UpdateOrderStatus |
//! | /api/admin/orders/{id}/payment-status | PUT | UpdatePaymentStatus |
//! | /api/admin/orders/{id}/cancel | POST | CancelOrder |
//! | /api/admin/refunds | GET | List refunds, optionally by status |
//! | /api/admin/refunds/{id}/approve | POST | ApproveRefund |
//! | /api/admin/refunds/{id}/reject | POST | RejectRefund |
//! | /api/admin/refunds/{id}/process | POST | ProcessRefund |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", admin_routes())
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/orders/{id}/status", put(handler::update_order_status))
        .route(
            "/orders/{id}/payment-status",
            put(handler::update_payment_status),
        )
        .route("/orders/{id}/cancel", post(handler::cancel_order))
        .route("/refunds", get(handler::list_refunds))
        .route("/refunds/{id}/approve", post(handler::approve_refund))
        .route("/refunds/{id}/reject", post(handler::reject_refund))
        .route("/refunds/{id}/process", post(handler::process_refund))
}
