//! External collaborator ports
//!
//! The engine talks to the outside world through four seams: catalog
//! pricing/stock, user identity, notifications, and the payment
//! provider. Production impls live next to each trait; tests swap in
//! the in-memory ones.

pub mod catalog;
pub mod identity;
pub mod notification;
pub mod provider;

pub use catalog::{BookAvailability, CatalogPort, LocalCatalog};
pub use identity::{ConfirmedOrderStats, IdentityPort, LocalIdentity};
pub use notification::{CapturingNotifier, LogNotifier, NotificationEvent, NotificationPort};
pub use provider::{
    MockProvider, PayPalProvider, PaymentProvider, ProviderCapture, ProviderError, ProviderIntent,
    ProviderRefund,
};
