//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::CartLineNotFound
            | Self::PromoCodeInvalid
            | Self::OrderNotFound
            | Self::PaymentNotFound
            | Self::RefundNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (retryable after user action)
            Self::AlreadyExists
            | Self::PromoCodeUserLimitReached
            | Self::PromoCodeExhausted
            | Self::PromoCodeAlreadyUsed
            | Self::OrderAlreadyPaid
            | Self::OrderNotCancellable
            | Self::StockInsufficient
            | Self::PreorderCapacityExceeded
            | Self::InvalidStatusTransition
            | Self::RefundInvalidState => StatusCode::CONFLICT,

            // 502 Bad Gateway (provider declined / malformed provider response)
            Self::ProviderRejected => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient, client can retry)
            Self::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family() {
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::RefundNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_family() {
        assert_eq!(ErrorCode::StockInsufficient.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::InvalidStatusTransition.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_provider_errors_are_5xx() {
        assert!(ErrorCode::ProviderUnavailable.http_status().is_server_error());
        assert!(ErrorCode::ProviderRejected.http_status().is_server_error());
    }

    #[test]
    fn test_validation_defaults_to_400() {
        assert_eq!(ErrorCode::ValidationFailed.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::CartEmpty.http_status(), StatusCode::BAD_REQUEST);
    }
}
