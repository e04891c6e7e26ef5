use rust_decimal::Decimal;

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DATABASE_PATH | shop.db | SQLite database file |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | LOG_DIR | (unset) | Daily rolling log directory, stdout only when unset |
/// | ORDER_EXPIRATION_HOURS | 24 | Age after which unpaid orders are cancelled |
/// | EXPIRATION_SWEEP_SECS | 900 | Expiration sweep interval |
/// | PREORDER_SWEEP_SECS | 3600 | Preorder fulfillment sweep interval |
/// | FREE_SHIPPING_THRESHOLD_CENTS | 5000 | Discounted subtotal for free shipping |
/// | STANDARD_SHIPPING_COST_CENTS | 590 | Flat shipping fee |
/// | TAX_RATE_PERCENT | 5.5 | Tax rate applied after discounts |
/// | PAYMENT_PROVIDER | mock | `mock` or `paypal` |
/// | PAYPAL_BASE_URL | https://api-m.sandbox.paypal.com | Provider API base |
/// | PAYPAL_CLIENT_ID | (empty) | Provider OAuth client id |
/// | PAYPAL_SECRET | (empty) | Provider OAuth secret |
///
/// # Example
///
/// ```ignore
/// DATABASE_PATH=/data/shop.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Log directory; None logs to stdout only
    pub log_dir: Option<String>,

    /// Unpaid orders older than this are cancelled by the sweep
    pub order_expiration_hours: i64,
    /// Expiration sweep interval in seconds
    pub expiration_sweep_secs: u64,
    /// Preorder fulfillment sweep interval in seconds
    pub preorder_sweep_secs: u64,

    /// Pricing knobs read by the pricing engine
    pub shop: ShopSettings,
    /// Payment provider selection and credentials
    pub provider: ProviderConfig,
}

/// Pricing configuration, loaded once at startup and passed to the
/// pricing engine as an immutable snapshot
#[derive(Debug, Clone)]
pub struct ShopSettings {
    /// Discounted subtotal at or above which shipping is free, cents
    pub free_shipping_threshold_cents: i64,
    /// Flat shipping fee, cents
    pub standard_shipping_cost_cents: i64,
    /// Tax rate in percent, applied to the discounted subtotal
    pub tax_rate_percent: Decimal,
    /// ISO currency code sent to the payment provider
    pub currency: String,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            free_shipping_threshold_cents: 5000,
            standard_shipping_cost_cents: 590,
            tax_rate_percent: Decimal::new(55, 1),
            currency: "EUR".into(),
        }
    }
}

/// Payment provider wiring
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// `mock` or `paypal`
    pub kind: String,
    pub base_url: String,
    pub client_id: String,
    pub secret: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "shop.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_dir: std::env::var("LOG_DIR").ok(),

            order_expiration_hours: std::env::var("ORDER_EXPIRATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            expiration_sweep_secs: std::env::var("EXPIRATION_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
            preorder_sweep_secs: std::env::var("PREORDER_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),

            shop: ShopSettings {
                free_shipping_threshold_cents: std::env::var("FREE_SHIPPING_THRESHOLD_CENTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5000),
                standard_shipping_cost_cents: std::env::var("STANDARD_SHIPPING_COST_CENTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(590),
                tax_rate_percent: std::env::var("TAX_RATE_PERCENT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| Decimal::new(55, 1)),
                currency: std::env::var("CURRENCY").unwrap_or_else(|_| "EUR".into()),
            },
            provider: ProviderConfig {
                kind: std::env::var("PAYMENT_PROVIDER").unwrap_or_else(|_| "mock".into()),
                base_url: std::env::var("PAYPAL_BASE_URL")
                    .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".into()),
                client_id: std::env::var("PAYPAL_CLIENT_ID").unwrap_or_default(),
                secret: std::env::var("PAYPAL_SECRET").unwrap_or_default(),
            },
        }
    }

    /// Override the handful of fields tests care about
    pub fn with_overrides(database_path: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
