//! Cart API module
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/cart | GET | Current cart with lines |
//! | /api/cart | DELETE | Clear lines and promo |
//! | /api/cart/price | GET | Priced snapshot of the cart |
//! | /api/cart/lines | POST | Add quantity of a book |
//! | /api/cart/lines/{book_id} | PUT | Replace a line's quantity |
//! | /api/cart/lines/{book_id} | DELETE | Remove a line |
//! | /api/cart/promo | POST | Apply a promo code |
//! | /api/cart/promo | DELETE | Remove the promo code |
//! | /api/cart/merge | POST | Merge the session cart after login |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", cart_routes())
}

fn cart_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::view).delete(handler::clear))
        .route("/price", get(handler::price))
        .route("/lines", post(handler::add_line))
        .route(
            "/lines/{book_id}",
            put(handler::set_quantity).delete(handler::remove_line),
        )
        .route("/promo", post(handler::apply_promo).delete(handler::remove_promo))
        .route("/merge", post(handler::merge))
}
