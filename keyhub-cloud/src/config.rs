//! Storefront service configuration

use keyhub_client::PollSettings;
use std::time::Duration;

use crate::error::BoxError;

/// `MARKET_API_URL` value selecting the in-process marketplace
pub const MEMORY_MARKET_URL: &str = "memory://";

/// Storefront service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP port
    pub http_port: u16,
    /// Marketplace API root, or `memory://` for the in-process marketplace
    pub market_api_url: String,
    /// Marketplace API key
    pub market_api_key: String,
    /// Shared secret for webhook digests
    pub market_webhook_secret: String,
    /// Inventory poll budget and interval
    pub poll: PollSettings,
    /// Refresh period of the daily home lists
    pub cache_refresh_daily: Duration,
    /// Refresh period of the aggregate home lists
    pub cache_refresh_aggregate: Duration,
    /// JSON file with the catalog to load into the in-memory store
    pub catalog_seed_path: Option<String>,
    /// Key provisioning delay of the in-process marketplace
    pub memory_market_provision: Duration,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let market_api_url =
            std::env::var("MARKET_API_URL").unwrap_or_else(|_| MEMORY_MARKET_URL.into());

        if market_api_url == MEMORY_MARKET_URL && environment == "production" {
            return Err("MARKET_API_URL must point at the marketplace in production".into());
        }

        let poll = PollSettings {
            max_wait: Duration::from_millis(Self::parse_or("POLL_MAX_WAIT_MS", 300_000)),
            interval: Duration::from_millis(Self::parse_or("POLL_INTERVAL_MS", 5_000)),
        };
        if poll.interval.is_zero() {
            return Err("POLL_INTERVAL_MS must be greater than zero".into());
        }

        let cache_refresh_daily =
            Duration::from_secs(Self::parse_or("CACHE_REFRESH_DAILY_SECS", 3_600));
        let cache_refresh_aggregate =
            Duration::from_secs(Self::parse_or("CACHE_REFRESH_AGGREGATE_SECS", 86_400));
        if cache_refresh_daily.is_zero() || cache_refresh_aggregate.is_zero() {
            return Err("cache refresh periods must be greater than zero".into());
        }

        Ok(Self {
            http_port: Self::parse_or("HTTP_PORT", 8080),
            market_api_key: Self::require_secret("MARKET_API_KEY", &environment)?,
            market_webhook_secret: Self::require_secret("MARKET_WEBHOOK_SECRET", &environment)?,
            market_api_url,
            poll,
            cache_refresh_daily,
            cache_refresh_aggregate,
            catalog_seed_path: std::env::var("CATALOG_SEED_PATH")
                .ok()
                .filter(|s| !s.is_empty()),
            memory_market_provision: Duration::from_millis(Self::parse_or(
                "MEMORY_MARKET_PROVISION_MS",
                15_000,
            )),
            environment,
        })
    }

    /// Development defaults without reading the environment
    pub fn development() -> Self {
        Self {
            environment: "development".into(),
            http_port: 8080,
            market_api_url: MEMORY_MARKET_URL.into(),
            market_api_key: "dev-MARKET_API_KEY-not-for-production".into(),
            market_webhook_secret: "dev-MARKET_WEBHOOK_SECRET-not-for-production".into(),
            poll: PollSettings::default(),
            cache_refresh_daily: Duration::from_secs(3_600),
            cache_refresh_aggregate: Duration::from_secs(86_400),
            catalog_seed_path: None,
            memory_market_provision: Duration::from_millis(15_000),
        }
    }

    pub fn uses_memory_market(&self) -> bool {
        self.market_api_url == MEMORY_MARKET_URL
    }
}
