//! Order fulfillment
//!
//! Checkout reserves stock, records the order, confirms, and either hands
//! over keys right away or leaves a background wait to finish the order.
//! Background waits are tracked so shutdown can cancel and await them.

mod notifications;

pub use notifications::{WebhookAction, WebhookAck};

use chrono::Utc;
use keyhub_client::{InventoryPoller, MarketResult, ReservationManager};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{InventoryCheckResult, OrderRecord, OrderStatus, Reservation};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::db::OrderStore;
use crate::error::{ServiceError, ServiceResult};

/// Write attempts on a contended order record before giving up
const MAX_WRITE_ATTEMPTS: usize = 5;

/// Body of `POST /api/checkout`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Generated when absent
    #[serde(default)]
    pub order_id: Option<String>,
    /// Marketplace product id
    pub product_id: String,
    pub quantity: u32,
}

/// Result of a checkout
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Keys delivered
    Completed(OrderRecord),
    /// Confirmed; keys are being provisioned
    Processing(OrderRecord),
}

impl CheckoutOutcome {
    pub fn order(&self) -> &OrderRecord {
        match self {
            Self::Completed(order) | Self::Processing(order) => order,
        }
    }
}

/// Reservation joined from an order record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    pub order_id: String,
    pub order_status: OrderStatus,
    pub reservation: Reservation,
}

/// Order service
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    manager: Arc<ReservationManager>,
    poller: InventoryPoller,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        manager: Arc<ReservationManager>,
        poller: InventoryPoller,
    ) -> Self {
        Self {
            orders,
            manager,
            poller,
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn manager(&self) -> &ReservationManager {
        &self.manager
    }

    /// Number of background waits still running
    pub fn pending_waits(&self) -> usize {
        self.tracker.len()
    }

    pub async fn checkout(&self, request: CheckoutRequest) -> ServiceResult<CheckoutOutcome> {
        let order_id = request
            .order_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if self.orders.find(&order_id).await?.is_some() {
            return Err(AppError::new(ErrorCode::OrderAlreadyExists)
                .with_detail("orderId", order_id)
                .into());
        }

        let reservation = self
            .manager
            .create_reservation(&order_id, &request.product_id, request.quantity)
            .await?;
        let reservation_id = reservation.reservation_id.clone();
        self.orders.create(OrderRecord::new(reservation)).await?;

        let confirmed = match self.manager.confirm_reservation(&reservation_id).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                tracing::warn!(%order_id, %reservation_id, error = %e, "Reservation confirm failed");
                let reason = e.to_string();
                self.modify(&order_id, |record| {
                    if record.status.is_terminal() {
                        return false;
                    }
                    record.fail(reason.clone());
                    true
                })
                .await?;
                return Err(e.into());
            }
        };

        let mut keys = None;
        if confirmed.stock_ready {
            match self.poller.check_inventory(&order_id).await {
                Ok(inventory) if inventory.stock_ready => {
                    keys = Some(inventory.keys.unwrap_or_default());
                }
                Ok(_) => {
                    tracing::info!(%order_id, "Confirmed as ready but keys not yet listed, waiting");
                }
                Err(e) => {
                    tracing::warn!(%order_id, error = %e, "Key probe after confirm failed, waiting");
                }
            }
        }

        let written = self
            .modify(&order_id, |record| {
                if record.status.is_terminal() {
                    return false;
                }
                if let Some(reservation) = record.reservation.as_mut() {
                    reservation.status = confirmed.status;
                }
                match &keys {
                    Some(keys) => record.complete(keys.clone()),
                    None => record.transition(OrderStatus::Processing),
                }
                true
            })
            .await?;
        let record = match written {
            Some(record) => record,
            None => self.order(&order_id).await?,
        };

        if record.status == OrderStatus::Completed {
            tracing::info!(%order_id, "Order completed at checkout");
            return Ok(CheckoutOutcome::Completed(record));
        }
        if !record.status.is_terminal() {
            self.spawn_wait(order_id.clone());
        }
        tracing::info!(%order_id, status = record.status.as_str(), "Order processing, keys not ready yet");
        Ok(CheckoutOutcome::Processing(record))
    }

    fn spawn_wait(&self, order_id: String) {
        let this = self.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = this.shutdown.cancelled() => {
                    tracing::info!(%order_id, "Background wait cancelled");
                }
                result = this.poller.wait_for_ready_default(&order_id) => {
                    if let Err(e) = this.finish_wait(&order_id, result).await {
                        tracing::error!(%order_id, error = ?e, "Failed to record wait outcome");
                    }
                }
            }
        });
    }

    async fn finish_wait(
        &self,
        order_id: &str,
        result: MarketResult<InventoryCheckResult>,
    ) -> ServiceResult<()> {
        let written = self
            .modify(order_id, |record| {
                if record.status.is_terminal() {
                    return false;
                }
                match &result {
                    Ok(inventory) => record.complete(inventory.keys.clone().unwrap_or_default()),
                    Err(e) if e.is_timeout() => {
                        record.last_error = Some(e.to_string());
                        record.transition(OrderStatus::Delayed);
                    }
                    Err(e) => record.fail(e.to_string()),
                }
                true
            })
            .await?;

        match (written, &result) {
            (None, _) => tracing::debug!(order_id, "Order already settled or gone"),
            (Some(_), Ok(_)) => tracing::info!(order_id, "Order completed"),
            (Some(_), Err(e)) if e.is_timeout() => {
                tracing::warn!(order_id, "Keys not ready within poll budget, order delayed")
            }
            (Some(_), Err(e)) => {
                tracing::warn!(order_id, error = %e, "Order failed while waiting for keys")
            }
        }
        Ok(())
    }

    /// Apply `change` to the stored record and write it back
    ///
    /// `change` sees the current record and returns `false` to leave it as
    /// is. When another writer gets in between the read and the write, the
    /// record is read again and `change` re-applied to the fresh copy.
    /// Returns the written record, or `None` if nothing was written.
    async fn modify<F>(&self, order_id: &str, mut change: F) -> ServiceResult<Option<OrderRecord>>
    where
        F: FnMut(&mut OrderRecord) -> bool + Send,
    {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let Some(current) = self.orders.find(order_id).await? else {
                return Ok(None);
            };
            let mut record = current.clone();
            if !change(&mut record) {
                return Ok(None);
            }
            if self
                .orders
                .update_if_unchanged(&current, record.clone())
                .await?
            {
                return Ok(Some(record));
            }
            tracing::debug!(order_id, "Order record changed concurrently, retrying");
        }
        Err(ServiceError::Db(
            format!("order {order_id} kept changing during update").into(),
        ))
    }

    pub async fn order(&self, order_id: &str) -> ServiceResult<OrderRecord> {
        self.orders.find(order_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::OrderNotFound)
                .with_detail("orderId", order_id)
                .into()
        })
    }

    /// One live inventory probe. Keys found for an unsettled order are recorded.
    pub async fn inventory(&self, order_id: &str) -> ServiceResult<InventoryCheckResult> {
        self.order(order_id).await?;
        let inventory = self.manager.order_status(order_id).await?;

        if inventory.stock_ready {
            let completed = self
                .modify(order_id, |record| {
                    if record.status.is_terminal() {
                        return false;
                    }
                    record.complete(inventory.keys().to_vec());
                    true
                })
                .await?;
            if completed.is_some() {
                tracing::info!(order_id, "Order completed on inventory check");
            }
        }
        Ok(inventory)
    }

    /// Always fails: the marketplace offers no cancellation
    pub fn cancel_reservation(&self, reservation_id: &str) -> MarketResult<()> {
        self.manager.cancel_reservation(reservation_id)
    }

    /// Reservations known through order records, with current local state
    pub async fn reservations(&self) -> ServiceResult<Vec<ReservationView>> {
        let now = Utc::now();
        let records = self.orders.list_with_reservations().await?;
        Ok(records
            .into_iter()
            .filter_map(|record| {
                let stored = record.reservation?;
                let reservation = self
                    .manager
                    .last_known(&stored.reservation_id)
                    .unwrap_or_else(|| {
                        let status = stored.effective_status(now);
                        Reservation { status, ..stored }
                    });
                Some(ReservationView {
                    order_id: record.order_id,
                    order_status: record.status,
                    reservation,
                })
            })
            .collect())
    }

    /// Drop expired reservations from the manager's last-known state
    pub fn prune_expired(&self) -> usize {
        self.manager.prune_expired(Utc::now())
    }

    /// Cancel background waits and wait for them to finish
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::info!("Order background waits stopped");
    }
}
