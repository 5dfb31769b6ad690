//! keyhub-client - marketplace integration
//!
//! Reservation workflow against the key-reseller marketplace: a typed client
//! with a hard per-call deadline, reservation lifecycle, inventory polling,
//! webhook digest verification and call metrics.

pub mod client;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod reservation;
pub mod transport;
pub mod webhook;

pub use client::{MARKET_CALL_DEADLINE, ReservationClient};
pub use error::{MarketError, MarketResult};
pub use metrics::{LatencyStats, MetricsCollector, MetricsSnapshot};
pub use poller::{InventoryPoller, PollSettings};
pub use reservation::ReservationManager;
pub use transport::{HttpTransport, InMemoryMarketplace, MarketRequest, MarketTransport};
pub use webhook::{WebhookPayload, WebhookValidator};
