//! Request identity extractors
//!
//! The storefront gateway authenticates upstream and forwards identity
//! as headers; this service only reads them.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shared::AppError;

use crate::cart::CartOwner;

/// Customer identity: an authenticated user id, an anonymous session
/// key, or both during the login transition
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Option<i64>,
    pub session_key: Option<String>,
}

impl Caller {
    /// Cart owner for this request; the authenticated user wins when
    /// both headers are present
    pub fn owner(&self) -> Result<CartOwner, AppError> {
        if let Some(user_id) = self.user_id {
            return Ok(CartOwner::User(user_id));
        }
        if let Some(key) = &self.session_key {
            return Ok(CartOwner::Session(key.clone()));
        }
        Err(AppError::invalid_request(
            "Missing X-User-Id or X-Session-Id header",
        ))
    }

    /// Operations that create orders or payments need a real user
    pub fn require_user(&self) -> Result<i64, AppError> {
        self.user_id
            .ok_or_else(|| AppError::invalid_request("Missing X-User-Id header"))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match parts.headers.get("x-user-id") {
            Some(value) => Some(
                value
                    .to_str()
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .ok_or_else(|| AppError::invalid_request("Invalid X-User-Id header"))?,
            ),
            None => None,
        };
        let session_key = parts
            .headers
            .get("x-session-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Ok(Caller {
            user_id,
            session_key,
        })
    }
}

/// Back-office operator identity
#[derive(Debug, Clone, Copy)]
pub struct AdminCaller {
    pub admin_id: i64,
}

impl<S: Send + Sync> FromRequestParts<S> for AdminCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin_id = parts
            .headers
            .get("x-admin-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| AppError::invalid_request("Missing or invalid X-Admin-Id header"))?;
        Ok(AdminCaller { admin_id })
    }
}
