//! Reservation lifecycle on top of [`ReservationClient`]
//!
//! The marketplace is the source of truth. Locally only the last observed
//! state of each reservation is kept, so an obviously expired hold can be
//! refused without a round trip.

use crate::client::ReservationClient;
use crate::{MarketError, MarketResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use shared::models::{
    ConfirmResult, CreateReservationRequest, InventoryCheckResult, MIN_RESERVATION_WINDOW_MINUTES,
    Reservation, ReservationStatus,
};

/// Reservation manager
#[derive(Debug)]
pub struct ReservationManager {
    client: ReservationClient,
    /// reservation_id -> last state seen from the marketplace
    last_known: DashMap<String, Reservation>,
}

impl ReservationManager {
    pub fn new(client: ReservationClient) -> Self {
        Self {
            client,
            last_known: DashMap::new(),
        }
    }

    pub fn client(&self) -> &ReservationClient {
        &self.client
    }

    /// Hold `quantity` units of `product_id` for `order_id`.
    ///
    /// Not retried: a timed out create may or may not have taken effect
    /// upstream, and only the caller can decide what to do about it.
    pub async fn create_reservation(
        &self,
        order_id: &str,
        product_id: &str,
        quantity: u32,
    ) -> MarketResult<Reservation> {
        if order_id.trim().is_empty() {
            return Err(MarketError::Validation("order_id must not be empty".into()));
        }
        if product_id.trim().is_empty() {
            return Err(MarketError::Validation(
                "product_id must not be empty".into(),
            ));
        }
        if quantity == 0 {
            return Err(MarketError::InvalidQuantity { quantity });
        }

        let request = CreateReservationRequest {
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
        };
        let reservation = self.client.create_reservation(&request).await?;

        if !reservation.has_minimum_window() {
            tracing::warn!(
                order_id,
                reservation_id = %reservation.reservation_id,
                created_at = %reservation.created_at,
                expires_at = %reservation.expires_at,
                "Marketplace returned a reservation with a short validity window"
            );
            return Err(MarketError::api(
                None,
                format!(
                    "reservation {} expires less than {MIN_RESERVATION_WINDOW_MINUTES} minutes after creation",
                    reservation.reservation_id
                ),
            ));
        }

        tracing::info!(
            order_id,
            reservation_id = %reservation.reservation_id,
            expires_at = %reservation.expires_at,
            "Reservation created"
        );
        self.last_known
            .insert(reservation.reservation_id.clone(), reservation.clone());
        Ok(reservation)
    }

    /// Commit a reservation. `stock_ready == false` is a normal answer.
    pub async fn confirm_reservation(&self, reservation_id: &str) -> MarketResult<ConfirmResult> {
        // Copy out before awaiting; a DashMap guard must not live across the call.
        let known_expiry = self.last_known.get(reservation_id).and_then(|r| {
            (r.effective_status(Utc::now()) == ReservationStatus::Expired).then_some(r.expires_at)
        });
        if let Some(expired_at) = known_expiry {
            return Err(MarketError::ReservationExpired {
                reservation_id: reservation_id.to_string(),
                expired_at,
            });
        }

        let result = self.client.confirm_reservation(reservation_id).await?;
        if let Some(mut known) = self.last_known.get_mut(reservation_id) {
            known.status = result.status;
        }

        tracing::info!(
            reservation_id,
            stock_ready = result.stock_ready,
            "Reservation confirmed"
        );
        Ok(result)
    }

    /// The marketplace offers no cancellation. Always fails.
    pub fn cancel_reservation(&self, reservation_id: &str) -> MarketResult<()> {
        tracing::info!(reservation_id, "Reservation cancellation requested but unsupported");
        Err(MarketError::Unsupported {
            operation: "cancel_reservation",
        })
    }

    /// Last state seen for a reservation, with passive expiry applied
    pub fn last_known(&self, reservation_id: &str) -> Option<Reservation> {
        self.last_known.get(reservation_id).map(|r| {
            let mut reservation = r.clone();
            reservation.status = reservation.effective_status(Utc::now());
            reservation
        })
    }

    /// Current inventory state of an order, fetched from the marketplace
    pub async fn order_status(&self, order_id: &str) -> MarketResult<InventoryCheckResult> {
        self.client.check_inventory(order_id).await
    }

    /// Forget reservations whose window has passed. Returns how many were dropped.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.last_known.len();
        self.last_known
            .retain(|_, r| r.effective_status(now) != ReservationStatus::Expired);
        let pruned = before.saturating_sub(self.last_known.len());
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned expired reservations");
        }
        pruned
    }

    #[cfg(test)]
    fn remember(&self, reservation: Reservation) {
        self.last_known
            .insert(reservation.reservation_id.clone(), reservation);
    }
}
