//! Order API module
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/orders | GET | Caller's orders, newest first |
//! | /api/orders/preview | GET | Price the cart without ordering |
//! | /api/orders/checkout | POST | Convert the cart into an order |
//! | /api/orders/{id} | GET | One order with its items |
//! | /api/orders/{id}/history | GET | Status audit trail |
//! | /api/orders/{id}/cancel | POST | Customer cancellation |
//! | /api/orders/{id}/refunds | GET/POST | Refund requests for the order |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/preview", get(handler::preview))
        .route("/checkout", post(handler::checkout))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/history", get(handler::history))
        .route("/{id}/cancel", post(handler::cancel))
        .route(
            "/{id}/refunds",
            get(handler::list_refunds).post(handler::request_refund),
        )
}
