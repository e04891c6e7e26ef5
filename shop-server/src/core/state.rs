use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::cart::CartService;
use crate::core::config::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::DbService;
use crate::orders::{
    ExpirationScheduler, OrderLocks, OrderService, OrderStateMachine, PreorderFulfillment,
};
use crate::payments::PaymentGateway;
use crate::ports::{
    CatalogPort, IdentityPort, LocalCatalog, LocalIdentity, LogNotifier, MockProvider,
    NotificationPort, PayPalProvider, PaymentProvider,
};
use crate::pricing::PricingEngine;
use crate::refunds::RefundService;

/// Server state: shared handles to every service
///
/// Cloning is cheap, everything is behind an `Arc`. Handlers receive a
/// clone through the axum router; tests assemble one with mock ports
/// through [`ServerState::with_ports`].
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub locks: Arc<OrderLocks>,
    pub notifier: Arc<dyn NotificationPort>,
    pub carts: Arc<CartService>,
    pub pricing: Arc<PricingEngine>,
    pub orders: Arc<OrderService>,
    pub state_machine: Arc<OrderStateMachine>,
    pub gateway: Arc<PaymentGateway>,
    pub refunds: Arc<RefundService>,
    tasks: Arc<Mutex<Option<BackgroundTasks>>>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Full production initialization: open the database and wire every
    /// service with the local ports and the configured provider
    pub async fn initialize(config: &Config) -> crate::core::Result<Self> {
        let db = DbService::new(&config.database_path).await?;

        let provider: Arc<dyn PaymentProvider> = match config.provider.kind.as_str() {
            "paypal" => Arc::new(PayPalProvider::new(
                config.provider.base_url.clone(),
                config.provider.client_id.clone(),
                config.provider.secret.clone(),
            )),
            _ => Arc::new(MockProvider::new()),
        };

        Ok(Self::with_ports(
            config.clone(),
            db.clone(),
            Arc::new(LocalCatalog::new(db.pool.clone())),
            Arc::new(LocalIdentity::new(db.pool.clone())),
            Arc::new(LogNotifier),
            provider,
        ))
    }

    /// Assemble the state from explicit ports (tests swap in mocks)
    pub fn with_ports(
        config: Config,
        db: DbService,
        catalog: Arc<dyn CatalogPort>,
        identity: Arc<dyn IdentityPort>,
        notifier: Arc<dyn NotificationPort>,
        provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        let pool = db.pool.clone();
        let locks = Arc::new(OrderLocks::new());
        let currency = config.shop.currency.clone();

        let carts = Arc::new(CartService::new(pool.clone(), catalog.clone()));
        let pricing = Arc::new(PricingEngine::new(
            pool.clone(),
            catalog,
            identity,
            config.shop.clone(),
        ));
        let state_machine = Arc::new(OrderStateMachine::new(
            pool.clone(),
            locks.clone(),
            notifier.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            pool.clone(),
            pricing.clone(),
            carts.clone(),
            notifier.clone(),
            currency.clone(),
        ));
        let gateway = Arc::new(PaymentGateway::new(
            pool.clone(),
            provider,
            state_machine.clone(),
            locks.clone(),
            notifier.clone(),
            currency,
        ));
        let refunds = Arc::new(RefundService::new(pool, gateway.clone(), locks.clone()));

        Self {
            config,
            db,
            locks,
            notifier,
            carts,
            pricing,
            orders,
            state_machine,
            gateway,
            refunds,
            tasks: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduled sweeps
    pub async fn start_background_tasks(&self) {
        let mut tasks = BackgroundTasks::new();

        let expiration = ExpirationScheduler::new(
            self.db.pool.clone(),
            self.state_machine.clone(),
            self.config.order_expiration_hours,
            Duration::from_secs(self.config.expiration_sweep_secs),
            tasks.shutdown_token(),
        );
        tasks.spawn("expiration_sweep", TaskKind::Periodic, expiration.run());

        let preorder = PreorderFulfillment::new(
            self.db.pool.clone(),
            self.state_machine.clone(),
            self.locks.clone(),
            self.notifier.clone(),
            Duration::from_secs(self.config.preorder_sweep_secs),
            tasks.shutdown_token(),
        );
        tasks.spawn("preorder_fulfillment", TaskKind::Periodic, preorder.run());

        tracing::info!("Background tasks started: {} registered", tasks.len());
        *self.tasks.lock().await = Some(tasks);
    }

    /// Stop background tasks and close the pool
    pub async fn shutdown(&self) {
        if let Some(tasks) = self.tasks.lock().await.take() {
            tasks.shutdown().await;
        }
        self.db.pool.close().await;
        tracing::info!("Server state shut down");
    }
}
