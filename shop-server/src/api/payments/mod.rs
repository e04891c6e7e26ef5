//! Payment API module
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/payments/orders/{order_id}/intent | POST | Open a provider intent |
//! | /api/payments/orders/{order_id} | GET | Payment row for an order |
//! | /api/payments/capture/{session_id} | POST | Capture an approved session |
//!
//! Capture is also the webhook entry point; the provider redelivers it
//! at least once, which is why the handler is idempotent.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", payment_routes())
}

fn payment_routes() -> Router<ServerState> {
    Router::new()
        .route("/orders/{order_id}/intent", post(handler::create_intent))
        .route("/orders/{order_id}", get(handler::get_payment))
        .route("/capture/{session_id}", post(handler::capture))
}
