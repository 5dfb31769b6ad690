//! Marketplace reservation and inventory models
//!
//! Wire format is camelCase JSON, matching the marketplace API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Minimum validity window the marketplace guarantees for a new reservation
pub const MIN_RESERVATION_WINDOW_MINUTES: i64 = 30;

/// Reservation lifecycle state
///
/// Only `Pending -> Confirmed` is ever driven by this system. `Expired` is
/// reached passively and `Cancelled` exists on the wire but no cancellation
/// path is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Expired,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Time-boxed hold on marketplace stock for one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Opaque id assigned by the marketplace
    pub reservation_id: String,
    /// Caller-assigned id, unique per checkout attempt
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// True when the marketplace honoured the 30 minute validity contract
    pub fn has_minimum_window(&self) -> bool {
        self.expires_at - self.created_at >= Duration::minutes(MIN_RESERVATION_WINDOW_MINUTES)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Status as observed at `now`: a pending hold past its window is expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReservationStatus {
        match self.status {
            ReservationStatus::Pending if self.is_expired_at(now) => ReservationStatus::Expired,
            status => status,
        }
    }
}

/// Body of `POST /reservations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
}

/// Response of `POST /reservations/{id}/confirm`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResult {
    pub reservation_id: String,
    pub status: ReservationStatus,
    /// `false` is a valid intermediate state: keys are still being provisioned
    pub stock_ready: bool,
}

/// Response of `GET /inventory/{orderId}`. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCheckResult {
    pub order_id: String,
    pub stock_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

impl InventoryCheckResult {
    /// Drop keys the marketplace sent alongside a not-ready answer.
    pub fn normalized(mut self) -> Self {
        if !self.stock_ready {
            self.keys = None;
        }
        self
    }

    pub fn keys(&self) -> &[String] {
        self.keys.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(window_minutes: i64) -> Reservation {
        let created_at = Utc::now();
        Reservation {
            reservation_id: "R1".into(),
            order_id: "O1".into(),
            product_id: "P1".into(),
            quantity: 1,
            status: ReservationStatus::Pending,
            expires_at: created_at + Duration::minutes(window_minutes),
            created_at,
        }
    }

    #[test]
    fn test_minimum_window() {
        assert!(reservation(30).has_minimum_window());
        assert!(reservation(45).has_minimum_window());
        assert!(!reservation(29).has_minimum_window());
    }

    #[test]
    fn test_effective_status_expires_pending_only() {
        let mut r = reservation(30);
        let later = r.expires_at + Duration::seconds(1);
        assert_eq!(r.effective_status(r.created_at), ReservationStatus::Pending);
        assert_eq!(r.effective_status(later), ReservationStatus::Expired);

        r.status = ReservationStatus::Confirmed;
        assert_eq!(r.effective_status(later), ReservationStatus::Confirmed);
    }

    #[test]
    fn test_reservation_wire_format() {
        let json = r#"{
            "reservationId": "R1",
            "orderId": "O1",
            "productId": "P1",
            "quantity": 2,
            "status": "pending",
            "expiresAt": "2026-01-01T10:30:00Z",
            "createdAt": "2026-01-01T10:00:00Z"
        }"#;
        let r: Reservation = serde_json::from_str(json).unwrap();
        assert_eq!(r.reservation_id, "R1");
        assert_eq!(r.quantity, 2);
        assert_eq!(r.status, ReservationStatus::Pending);
        assert!(r.has_minimum_window());
    }

    #[test]
    fn test_inventory_keys_only_when_ready() {
        let json = r#"{"orderId":"O1","stockReady":false,"keys":["LEAK"]}"#;
        let result: InventoryCheckResult = serde_json::from_str(json).unwrap();
        let result = result.normalized();
        assert!(result.keys.is_none());
        assert!(result.keys().is_empty());

        let json = r#"{"orderId":"O1","stockReady":true,"keys":["AAAA-BBBB"]}"#;
        let result: InventoryCheckResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.normalized().keys(), ["AAAA-BBBB".to_string()]);
    }

    #[test]
    fn test_missing_keys_field() {
        let result: InventoryCheckResult =
            serde_json::from_str(r#"{"orderId":"O1","stockReady":false}"#).unwrap();
        assert!(result.keys.is_none());
        let out = serde_json::to_string(&result).unwrap();
        assert!(!out.contains("keys"));
    }
}
