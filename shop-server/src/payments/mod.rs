//! Payment Gateway adapter
//!
//! Bridges orders to the external payment provider: opens intents,
//! captures approved sessions idempotently, and issues provider-side
//! refunds for the refund service.

mod gateway;

pub use gateway::{PaymentGateway, PaymentIntent};
