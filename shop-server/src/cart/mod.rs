//! Cart Store
//!
//! Mutable pre-checkout line items, owned by an authenticated user or
//! an anonymous session (exactly one). Merged into the user cart on
//! login, destroyed by checkout or an explicit clear.

mod service;

pub use service::{CartOwner, CartService, CartView};
