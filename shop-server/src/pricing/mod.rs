//! Pricing Engine
//!
//! Turns a cart snapshot into a [`shared::models::PricedCart`]. Pure
//! reads only: the engine never mutates stock, promo counters, or any
//! other persisted state.

mod engine;
pub mod loyalty;
pub mod promo;

pub use engine::PricingEngine;
