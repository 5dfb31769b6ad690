//! Application state for keyhub-cloud

use keyhub_client::{
    HttpTransport, InMemoryMarketplace, InventoryPoller, MarketTransport, MetricsCollector,
    ReservationClient, ReservationManager, WebhookValidator,
};
use std::sync::Arc;

use crate::cache::{CacheAside, MemoryCacheStore};
use crate::catalog::CatalogService;
use crate::config::Config;
use crate::db::MemoryDatabase;
use crate::error::BoxError;
use crate::orders::OrderService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: CatalogService,
    pub orders: OrderService,
    /// Webhook digest check bound to `MARKET_WEBHOOK_SECRET`
    pub webhooks: WebhookValidator,
    /// Marketplace call and webhook counters
    pub metrics: Arc<MetricsCollector>,
    /// Backing store of the catalog cache, for periodic eviction
    pub cache_store: Arc<MemoryCacheStore>,
}

impl AppState {
    /// Build the state from configuration
    ///
    /// `MARKET_API_URL=memory://` selects the in-process marketplace.
    pub fn new(config: &Config) -> Result<Self, BoxError> {
        let transport: Arc<dyn MarketTransport> = if config.uses_memory_market() {
            tracing::warn!(
                provision_ms = config.memory_market_provision.as_millis() as u64,
                "Using the in-process marketplace"
            );
            Arc::new(InMemoryMarketplace::new(config.memory_market_provision))
        } else {
            Arc::new(HttpTransport::new(
                &config.market_api_url,
                config.market_api_key.clone(),
            )?)
        };
        Self::with_transport(config, transport)
    }

    /// Build the state around an explicit marketplace transport
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn MarketTransport>,
    ) -> Result<Self, BoxError> {
        let db = Arc::new(match &config.catalog_seed_path {
            Some(path) => MemoryDatabase::from_seed_file(path)?,
            None => MemoryDatabase::bundled()?,
        });
        tracing::info!(games = db.game_count(), "Catalog loaded");

        let metrics = Arc::new(MetricsCollector::new());
        let client = ReservationClient::new(transport, metrics.clone());
        let manager = Arc::new(ReservationManager::new(client.clone()));
        let poller = InventoryPoller::with_settings(client, config.poll);

        let cache_store = Arc::new(MemoryCacheStore::new());
        let cache = CacheAside::new(cache_store.clone());

        Ok(Self {
            config: Arc::new(config.clone()),
            catalog: CatalogService::new(db.clone(), cache),
            orders: OrderService::new(db, manager, poller),
            webhooks: WebhookValidator::new(config.market_webhook_secret.clone(), metrics.clone()),
            metrics,
            cache_store,
        })
    }
}
