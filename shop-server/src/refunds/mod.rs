//! Refund Service
//!
//! Refund requests move `pending -> approved/rejected -> processed`.
//! Processing calls the payment provider; the parent order is never
//! flipped to refunded automatically, partial refunds must not
//! terminate an order that is still fulfillable.

mod service;

pub use service::RefundService;
