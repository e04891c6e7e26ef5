//! Notification Port
//!
//! Fire-and-forget: the engine only decides that and what type of
//! notification to trigger. Failures are logged by the impl and never
//! propagate into the calling transaction.

use async_trait::async_trait;
use serde::Serialize;
use shared::models::OrderStatus;
use std::sync::Mutex;

/// Notification event types the engine can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    OrderConfirmed,
    PaymentConfirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
    PreorderConfirmed,
    PreorderAvailable,
}

impl NotificationEvent {
    /// Event to emit when an order enters a status, if any
    pub fn for_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Pending => None,
            OrderStatus::Processing => Some(Self::Processing),
            OrderStatus::Shipped => Some(Self::Shipped),
            OrderStatus::Delivered => Some(Self::Delivered),
            OrderStatus::Cancelled => Some(Self::Cancelled),
            OrderStatus::Refunded => Some(Self::Refunded),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderConfirmed => "order_confirmed",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::PreorderConfirmed => "preorder_confirmed",
            Self::PreorderAvailable => "preorder_available",
        }
    }
}

#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify(&self, order_id: i64, event: NotificationEvent);
}

/// Production notifier: emits a structured log line per event for the
/// downstream notification service to pick up
pub struct LogNotifier;

#[async_trait]
impl NotificationPort for LogNotifier {
    async fn notify(&self, order_id: i64, event: NotificationEvent) {
        tracing::info!(
            target: "notification",
            order_id = order_id,
            event = event.as_str(),
            "Notification triggered"
        );
    }
}

/// Test notifier capturing every event it receives
#[derive(Default)]
pub struct CapturingNotifier {
    events: Mutex<Vec<(i64, NotificationEvent)>>,
}

impl CapturingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(i64, NotificationEvent)> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for(&self, order_id: i64) -> Vec<NotificationEvent> {
        self.events()
            .into_iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, e)| e)
            .collect()
    }
}

#[async_trait]
impl NotificationPort for CapturingNotifier {
    async fn notify(&self, order_id: i64, event: NotificationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push((order_id, event));
        }
    }
}
