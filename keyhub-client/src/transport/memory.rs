//! In-process marketplace simulation
//!
//! Serves the three endpoints the storefront uses, with keys becoming
//! available a fixed delay after confirmation. Used when `MARKET_API_URL` is
//! `memory://` and by tests.

use super::{MarketRequest, MarketTransport};
use crate::{MarketError, MarketResult};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use reqwest::Method;
use serde_json::Value;
use shared::models::{
    ConfirmResult, CreateReservationRequest, InventoryCheckResult, MIN_RESERVATION_WINDOW_MINUTES,
    Reservation, ReservationStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Keys provisioned for a confirmed order
struct Provisioning {
    confirmed_at: Instant,
    keys: Vec<String>,
}

/// Simulated marketplace
pub struct InMemoryMarketplace {
    reservations: DashMap<String, Reservation>,
    /// order_id -> provisioning state, present once confirmed
    provisioning: DashMap<String, Provisioning>,
    provision_delay: Duration,
    next_id: AtomicU64,
}

impl InMemoryMarketplace {
    /// Keys become ready `provision_delay` after confirmation
    pub fn new(provision_delay: Duration) -> Self {
        Self {
            reservations: DashMap::new(),
            provisioning: DashMap::new(),
            provision_delay,
            next_id: AtomicU64::new(1),
        }
    }

    /// Keys are ready as soon as a reservation is confirmed
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn reservation(&self, reservation_id: &str) -> Option<Reservation> {
        self.reservations.get(reservation_id).map(|r| r.clone())
    }

    fn create(&self, body: Option<Value>) -> MarketResult<Value> {
        let request: CreateReservationRequest =
            serde_json::from_value(body.unwrap_or(Value::Null))
                .map_err(|e| MarketError::api(Some(400), format!("invalid body: {e}")))?;
        if request.quantity == 0 {
            return Err(MarketError::api(Some(422), "quantity must be positive"));
        }
        if self
            .reservations
            .iter()
            .any(|r| r.order_id == request.order_id)
        {
            return Err(MarketError::api(
                Some(409),
                format!("order {} already has a reservation", request.order_id),
            ));
        }

        let id = format!("res_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let created_at = Utc::now();
        let reservation = Reservation {
            reservation_id: id.clone(),
            order_id: request.order_id,
            product_id: request.product_id,
            quantity: request.quantity,
            status: ReservationStatus::Pending,
            expires_at: created_at + chrono::Duration::minutes(MIN_RESERVATION_WINDOW_MINUTES),
            created_at,
        };
        let value = serde_json::to_value(&reservation)?;
        self.reservations.insert(id, reservation);
        Ok(value)
    }

    fn confirm(&self, reservation_id: &str) -> MarketResult<Value> {
        let mut reservation = self.reservations.get_mut(reservation_id).ok_or_else(|| {
            MarketError::api(Some(404), format!("reservation {reservation_id} not found"))
        })?;

        match reservation.effective_status(Utc::now()) {
            ReservationStatus::Pending => {
                reservation.status = ReservationStatus::Confirmed;
                let keys = (0..reservation.quantity).map(|_| generate_key()).collect();
                self.provisioning.insert(
                    reservation.order_id.clone(),
                    Provisioning {
                        confirmed_at: Instant::now(),
                        keys,
                    },
                );
            }
            ReservationStatus::Confirmed => {}
            ReservationStatus::Expired => {
                return Err(MarketError::api(
                    Some(410),
                    format!("reservation {reservation_id} has expired"),
                ));
            }
            ReservationStatus::Cancelled => {
                return Err(MarketError::api(
                    Some(409),
                    format!("reservation {reservation_id} is cancelled"),
                ));
            }
        }

        let result = ConfirmResult {
            reservation_id: reservation_id.to_string(),
            status: ReservationStatus::Confirmed,
            stock_ready: self.provision_delay.is_zero(),
        };
        Ok(serde_json::to_value(result)?)
    }

    fn inventory(&self, order_id: &str) -> MarketResult<Value> {
        if !self.reservations.iter().any(|r| r.order_id == order_id) {
            return Err(MarketError::api(
                Some(404),
                format!("order {order_id} not found"),
            ));
        }

        let result = match self.provisioning.get(order_id) {
            Some(p) if p.confirmed_at.elapsed() >= self.provision_delay => InventoryCheckResult {
                order_id: order_id.to_string(),
                stock_ready: true,
                keys: Some(p.keys.clone()),
            },
            _ => InventoryCheckResult {
                order_id: order_id.to_string(),
                stock_ready: false,
                keys: None,
            },
        };
        Ok(serde_json::to_value(result)?)
    }
}

#[async_trait]
impl MarketTransport for InMemoryMarketplace {
    async fn send(&self, request: MarketRequest) -> MarketResult<Value> {
        let segments: Vec<&str> = request.segments.iter().map(String::as_str).collect();
        let post = request.method == Method::POST;
        let get = request.method == Method::GET;
        match segments.as_slice() {
            ["reservations"] if post => self.create(request.body),
            ["reservations", id, "confirm"] if post => self.confirm(id),
            ["inventory", order_id] if get => self.inventory(order_id),
            _ => Err(MarketError::api(
                Some(404),
                format!("no route for {} {}", request.method, request.path()),
            )),
        }
    }
}

/// `XXXXX-XXXXX-XXXXX` style product key
fn generate_key() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    [&raw[0..5], &raw[5..10], &raw[10..15]].join("-")
}
