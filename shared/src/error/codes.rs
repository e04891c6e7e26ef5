//! Unified error codes for the order engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 3xxx: Cart and promotion errors
//! - 4xxx: Order errors
//! - 5xxx: Payment and refund errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient
/// serialization and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 6,
    /// Value out of range
    ValueOutOfRange = 7,

    // ==================== 3xxx: Cart / Promotion ====================
    /// Cart has no lines
    CartEmpty = 3001,
    /// Cart line not found
    CartLineNotFound = 3002,
    /// Book is unavailable for purchase
    BookUnavailable = 3003,
    /// Promo code does not exist
    PromoCodeInvalid = 3101,
    /// Promo code is inactive or outside its validity window
    PromoCodeExpired = 3102,
    /// Cart subtotal below the promo's minimum
    PromoCodeMinCartNotMet = 3103,
    /// Caller has exhausted their per-user uses of this promo
    PromoCodeUserLimitReached = 3104,
    /// Promo code has reached its global use limit
    PromoCodeExhausted = 3105,
    /// Promo code was already recorded against this order
    PromoCodeAlreadyUsed = 3106,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been paid
    OrderAlreadyPaid = 4002,
    /// Order cannot be cancelled from its current status
    OrderNotCancellable = 4003,
    /// Insufficient stock for a requested line
    StockInsufficient = 4101,
    /// Preorder capacity exceeded for a requested line
    PreorderCapacityExceeded = 4102,
    /// Illegal order status transition
    InvalidStatusTransition = 4201,

    // ==================== 5xxx: Payment / Refund ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Payment processing failed
    PaymentFailed = 5002,
    /// Order is not paid
    OrderNotPaid = 5003,
    /// Refund not found
    RefundNotFound = 5101,
    /// Refund amount invalid (non-positive or above order total)
    RefundInvalidAmount = 5102,
    /// Refund is not in a state that allows the operation
    RefundInvalidState = 5103,
    /// Payment provider unavailable (timeout, 5xx)
    ProviderUnavailable = 5301,
    /// Payment provider rejected the operation
    ProviderRejected = 5302,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the default human-readable message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::RequiredField => "Required field missing",
            Self::ValueOutOfRange => "Value out of range",

            Self::CartEmpty => "Cart is empty",
            Self::CartLineNotFound => "Cart line not found",
            Self::BookUnavailable => "Book is not available",
            Self::PromoCodeInvalid => "Invalid promo code",
            Self::PromoCodeExpired => "Promo code is expired or inactive",
            Self::PromoCodeMinCartNotMet => "Cart total is below the promo code minimum",
            Self::PromoCodeUserLimitReached => "You have already used this promo code",
            Self::PromoCodeExhausted => "Promo code has no uses left",
            Self::PromoCodeAlreadyUsed => "Promo code already applied to this order",

            Self::OrderNotFound => "Order not found",
            Self::OrderAlreadyPaid => "Order has already been paid",
            Self::OrderNotCancellable => "Order can no longer be cancelled",
            Self::StockInsufficient => "Insufficient stock",
            Self::PreorderCapacityExceeded => "Preorder capacity exceeded",
            Self::InvalidStatusTransition => "Illegal order status transition",

            Self::PaymentNotFound => "Payment not found",
            Self::PaymentFailed => "Payment failed",
            Self::OrderNotPaid => "Order is not paid",
            Self::RefundNotFound => "Refund not found",
            Self::RefundInvalidAmount => "Invalid refund amount",
            Self::RefundInvalidState => "Refund is not in a valid state for this operation",
            Self::ProviderUnavailable => "Payment provider unavailable",
            Self::ProviderRejected => "Payment provider rejected the operation",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
        }
    }

    /// Numeric value of this error code
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", *self as u16)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when deserializing an unknown u16 error code
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            6 => Self::RequiredField,
            7 => Self::ValueOutOfRange,

            3001 => Self::CartEmpty,
            3002 => Self::CartLineNotFound,
            3003 => Self::BookUnavailable,
            3101 => Self::PromoCodeInvalid,
            3102 => Self::PromoCodeExpired,
            3103 => Self::PromoCodeMinCartNotMet,
            3104 => Self::PromoCodeUserLimitReached,
            3105 => Self::PromoCodeExhausted,
            3106 => Self::PromoCodeAlreadyUsed,

            4001 => Self::OrderNotFound,
            4002 => Self::OrderAlreadyPaid,
            4003 => Self::OrderNotCancellable,
            4101 => Self::StockInsufficient,
            4102 => Self::PreorderCapacityExceeded,
            4201 => Self::InvalidStatusTransition,

            5001 => Self::PaymentNotFound,
            5002 => Self::PaymentFailed,
            5003 => Self::OrderNotPaid,
            5101 => Self::RefundNotFound,
            5102 => Self::RefundInvalidAmount,
            5103 => Self::RefundInvalidState,
            5301 => Self::ProviderUnavailable,
            5302 => Self::ProviderRejected,

            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::ConfigError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::CartEmpty,
            ErrorCode::PromoCodeExhausted,
            ErrorCode::InvalidStatusTransition,
            ErrorCode::ProviderUnavailable,
            ErrorCode::DatabaseError,
        ] {
            let value: u16 = code.into();
            assert_eq!(ErrorCode::try_from(value).unwrap(), code);
        }
    }

    #[test]
    fn test_unknown_value_rejected() {
        assert!(ErrorCode::try_from(1234).is_err());
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::OrderNotFound).unwrap();
        assert_eq!(json, "4001");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::OrderNotFound);
    }
}
