//! Order Service, State Machine, and scheduled jobs
//!
//! Orders are created once by [`OrderService::checkout`] and mutated
//! only through [`OrderStateMachine`] transitions afterwards. The
//! expiration and preorder sweeps run as background tasks.

mod expiration;
mod locks;
mod preorder;
mod service;
mod state_machine;

pub use expiration::ExpirationScheduler;
pub use locks::OrderLocks;
pub use preorder::PreorderFulfillment;
pub use service::{CheckoutRequest, OrderService};
pub use state_machine::OrderStateMachine;
