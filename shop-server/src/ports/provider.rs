//! Payment Provider Port
//!
//! PayPal-style REST flow: client-credentials token, create order with
//! intent CAPTURE, capture by provider order id, refund by capture id.
//! The trait keeps the engine testable; [`MockProvider`] backs tests
//! and offline development.

use async_trait::async_trait;
use serde_json::{Value, json};
use shared::{AppError, ErrorCode};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;

/// Provider-side failure modes
///
/// `Unavailable` is transient (timeout, 5xx): the triggering operation
/// fails without mutating engine state and can be retried.
/// `Rejected` means the provider processed and declined the request.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Unavailable(err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(msg) => {
                AppError::with_message(ErrorCode::ProviderUnavailable, msg)
            }
            ProviderError::Rejected(msg) => {
                AppError::with_message(ErrorCode::ProviderRejected, msg)
            }
        }
    }
}

/// Opened payment intent
#[derive(Debug, Clone)]
pub struct ProviderIntent {
    pub session_id: String,
    /// Redirect URL the customer approves the payment at
    pub approval_url: Option<String>,
}

/// Capture outcome
#[derive(Debug, Clone)]
pub struct ProviderCapture {
    pub completed: bool,
    pub transaction_id: Option<String>,
}

/// Refund outcome
#[derive(Debug, Clone)]
pub struct ProviderRefund {
    pub completed: bool,
    pub refund_id: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_intent(
        &self,
        order_number: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<ProviderIntent, ProviderError>;

    async fn capture(&self, session_id: &str) -> Result<ProviderCapture, ProviderError>;

    async fn refund(
        &self,
        transaction_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<ProviderRefund, ProviderError>;
}

/// Format cents as the provider's decimal string ("8968" -> "89.68")
fn amount_string(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

// ============================================================================
// PayPal client
// ============================================================================

struct CachedToken {
    access_token: String,
    expires_at_millis: i64,
}

/// PayPal REST v2 client
pub struct PayPalProvider {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    secret: String,
    token: tokio::sync::Mutex<Option<CachedToken>>,
}

impl PayPalProvider {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            client_id: client_id.into(),
            secret: secret.into(),
            token: tokio::sync::Mutex::new(None),
        }
    }

    /// OAuth client-credentials token, cached until shortly before expiry
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        let now = shared::util::now_millis();
        if let Some(token) = cached.as_ref()
            && token.expires_at_millis > now
        {
            return Ok(token.access_token.clone());
        }

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }
        let body: Value = response.json().await?;
        let access_token = body["access_token"]
            .as_str()
            .ok_or_else(|| ProviderError::Rejected("token response missing access_token".into()))?
            .to_string();
        let expires_in = body["expires_in"].as_i64().unwrap_or(300);
        // Refresh one minute early
        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at_millis: now + (expires_in - 60).max(0) * 1000,
        });
        Ok(access_token)
    }

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, ProviderError> {
        let token = self.access_token().await?;
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        } else {
            request = request.body("{}");
        }
        let response = request.send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::Unavailable(format!("provider returned {status}")));
        }
        let body: Value = response.json().await?;
        if !status.is_success() {
            let reason = body["message"].as_str().unwrap_or("unknown error");
            return Err(ProviderError::Rejected(format!("{status}: {reason}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl PaymentProvider for PayPalProvider {
    async fn create_intent(
        &self,
        order_number: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<ProviderIntent, ProviderError> {
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": order_number,
                "amount": {
                    "currency_code": currency,
                    "value": amount_string(amount_cents),
                }
            }]
        });
        let response = self.post_json("/v2/checkout/orders", Some(body)).await?;
        let session_id = response["id"]
            .as_str()
            .ok_or_else(|| ProviderError::Rejected("create order response missing id".into()))?
            .to_string();
        let approval_url = response["links"]
            .as_array()
            .and_then(|links| {
                links
                    .iter()
                    .find(|l| l["rel"].as_str() == Some("approve"))
            })
            .and_then(|l| l["href"].as_str())
            .map(String::from);
        Ok(ProviderIntent {
            session_id,
            approval_url,
        })
    }

    async fn capture(&self, session_id: &str) -> Result<ProviderCapture, ProviderError> {
        let response = self
            .post_json(&format!("/v2/checkout/orders/{session_id}/capture"), None)
            .await?;
        let completed = response["status"].as_str() == Some("COMPLETED");
        let transaction_id = response["purchase_units"][0]["payments"]["captures"][0]["id"]
            .as_str()
            .map(String::from);
        Ok(ProviderCapture {
            completed,
            transaction_id,
        })
    }

    async fn refund(
        &self,
        transaction_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> Result<ProviderRefund, ProviderError> {
        let body = json!({
            "amount": {
                "currency_code": currency,
                "value": amount_string(amount_cents),
            }
        });
        let response = self
            .post_json(&format!("/v2/payments/captures/{transaction_id}/refund"), Some(body))
            .await?;
        let status = response["status"].as_str().unwrap_or("");
        let completed = status == "COMPLETED" || status == "PENDING";
        let refund_id = response["id"].as_str().map(String::from);
        Ok(ProviderRefund {
            completed,
            refund_id,
        })
    }
}

// ============================================================================
// In-memory provider (tests, offline development)
// ============================================================================

/// In-memory provider with toggleable failure modes
#[derive(Default)]
pub struct MockProvider {
    counter: AtomicUsize,
    /// When set, capture calls return a decline
    pub decline_captures: AtomicBool,
    /// When set, provider calls fail as transient outages
    pub unavailable: AtomicBool,
    /// Capture calls actually issued against the provider
    pub capture_calls: AtomicUsize,
    /// Refund calls actually issued against the provider
    pub refund_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_up(&self) -> Result<(), ProviderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("simulated outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_intent(
        &self,
        order_number: &str,
        _amount_cents: i64,
        _currency: &str,
    ) -> Result<ProviderIntent, ProviderError> {
        self.check_up()?;
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let session_id = format!("MOCK-SESSION-{order_number}-{n}");
        Ok(ProviderIntent {
            approval_url: Some(format!("https://provider.test/approve/{session_id}")),
            session_id,
        })
    }

    async fn capture(&self, session_id: &str) -> Result<ProviderCapture, ProviderError> {
        self.check_up()?;
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        if self.decline_captures.load(Ordering::SeqCst) {
            return Ok(ProviderCapture {
                completed: false,
                transaction_id: None,
            });
        }
        Ok(ProviderCapture {
            completed: true,
            transaction_id: Some(format!("MOCK-TXN-{session_id}")),
        })
    }

    async fn refund(
        &self,
        transaction_id: &str,
        _amount_cents: i64,
        _currency: &str,
    ) -> Result<ProviderRefund, ProviderError> {
        self.check_up()?;
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderRefund {
            completed: true,
            refund_id: Some(format!("MOCK-REFUND-{transaction_id}")),
        })
    }
}
