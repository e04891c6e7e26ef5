//! Shared types for the bookshop order & pricing engine
//!
//! Common types used by the server and by integration tests: domain
//! models, the unified error-code system, money helpers, and utility
//! functions.

pub mod error;
pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
