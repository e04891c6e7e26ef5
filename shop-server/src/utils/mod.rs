//! Utility modules

pub mod logger;
pub mod result;

pub use result::AppResult;
pub use shared::error::{ApiResponse, AppError, ErrorCategory, ErrorCode};
