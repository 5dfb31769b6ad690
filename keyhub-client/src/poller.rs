//! Inventory polling until keys are provisioned

use crate::client::ReservationClient;
use crate::{MarketError, MarketResult};
use shared::models::InventoryCheckResult;
use std::time::Duration;
use tokio::time::Instant;

/// Operation name carried by poll budget timeouts
pub const WAIT_OPERATION: &str = "wait_for_ready";

pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(300_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// Poll budget and fixed spacing between probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_wait: Duration,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Inventory poller
#[derive(Debug, Clone)]
pub struct InventoryPoller {
    client: ReservationClient,
    settings: PollSettings,
}

impl InventoryPoller {
    pub fn new(client: ReservationClient) -> Self {
        Self::with_settings(client, PollSettings::default())
    }

    pub fn with_settings(client: ReservationClient, settings: PollSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// One probe. A failed probe is an error, never "not ready".
    pub async fn check_inventory(&self, order_id: &str) -> MarketResult<InventoryCheckResult> {
        self.client.check_inventory(order_id).await
    }

    /// [`Self::wait_for_ready`] with the configured settings
    pub async fn wait_for_ready_default(&self, order_id: &str) -> MarketResult<InventoryCheckResult> {
        self.wait_for_ready(order_id, self.settings.max_wait, self.settings.interval)
            .await
    }

    /// Probe until the order's keys are ready or `max_wait` has elapsed.
    ///
    /// Probes are spaced by a fixed `interval`. Each probe is cut short if it
    /// would outlive the budget. Probe errors are returned immediately.
    /// Dropping the returned future stops polling, including any probe in
    /// flight.
    pub async fn wait_for_ready(
        &self,
        order_id: &str,
        max_wait: Duration,
        interval: Duration,
    ) -> MarketResult<InventoryCheckResult> {
        if interval.is_zero() {
            return Err(MarketError::Validation(
                "poll interval must be greater than zero".into(),
            ));
        }

        let start = Instant::now();
        let deadline = start + max_wait;
        let budget_exceeded = || MarketError::Timeout {
            operation: WAIT_OPERATION,
            target: order_id.to_string(),
            elapsed: start.elapsed(),
            budget: max_wait,
        };

        let mut probes: u32 = 0;
        loop {
            if Instant::now() >= deadline {
                tracing::warn!(
                    order_id,
                    probes,
                    budget_ms = max_wait.as_millis() as u64,
                    "Inventory not ready within poll budget"
                );
                return Err(budget_exceeded());
            }
            if probes > 0 {
                self.client.metrics().record_retry();
            }
            probes += 1;

            let result = tokio::time::timeout_at(deadline, self.client.check_inventory(order_id))
                .await
                .map_err(|_| budget_exceeded())??;

            if result.stock_ready {
                tracing::info!(
                    order_id,
                    probes,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Inventory ready"
                );
                return Ok(result);
            }

            tracing::debug!(order_id, probes, "Inventory not ready yet");
            tokio::time::sleep(interval).await;
        }
    }
}
