//! API route modules
//!
//! # Structure
//!
//! - [`health`] — liveness probe
//! - [`cart`] — cart lines, promo codes, login merge
//! - [`orders`] — pricing preview, checkout, order lifecycle, refund requests
//! - [`payments`] — provider intents and capture
//! - [`admin`] — operator surface over the state machine and refunds
//!
//! Identity is trusted from the gateway in front of this service:
//! `X-User-Id` carries the authenticated user, `X-Session-Id` the
//! anonymous cart session, `X-Admin-Id` the back-office operator.

pub mod admin;
pub mod cart;
pub mod health;
pub mod orders;
pub mod payments;

mod caller;

pub use caller::{AdminCaller, Caller};

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// All routes, no middleware or state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(admin::router())
}

/// Fully configured application router
pub fn create_router(state: ServerState) -> Router {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
