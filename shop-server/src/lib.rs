//! Shop Server - order and pricing engine for an online bookstore
//!
//! # Module structure
//!
//! ```text
//! shop-server/src/
//! ├── core/          # Configuration, state, server, background tasks
//! ├── api/           # HTTP routes and handlers
//! ├── cart/          # Cart service
//! ├── pricing/       # Pricing engine, promo and loyalty rules
//! ├── orders/        # Checkout, state machine, schedulers
//! ├── payments/      # Payment gateway over the provider port
//! ├── refunds/       # Refund lifecycle
//! ├── ports/         # Catalog, identity, notification, provider seams
//! ├── db/            # SQLite pool and repositories
//! └── utils/         # Logging, result types
//! ```

pub mod api;
pub mod cart;
pub mod core;
pub mod db;
pub mod orders;
pub mod payments;
pub mod ports;
pub mod pricing;
pub mod refunds;
pub mod utils;

// Re-export public types
pub use cart::{CartOwner, CartService};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderService, OrderStateMachine};
pub use payments::PaymentGateway;
pub use pricing::PricingEngine;
pub use refunds::RefundService;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` (if present) and initialize the logger.
///
/// Called once at startup before configuration is read.
pub fn setup_environment() -> core::Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_dir = std::env::var("LOG_DIR").ok();

    init_logger_with_file(Some(&log_level), log_dir.as_deref());

    Ok(())
}
