//! Storefront order records
//!
//! The storefront's own view of a checkout. Reservations cannot be enumerated
//! on the marketplace, so listing them means reading these records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reservation::Reservation;

/// Order fulfillment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Stock held on the marketplace, not yet confirmed
    Reserved,
    /// Confirmed, keys still being provisioned
    Processing,
    /// Keys delivered
    Completed,
    /// Poll budget ran out; keys may still arrive
    Delayed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub status: OrderStatus,
    /// Last known marketplace reservation for this order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation: Option<Reservation>,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    pub fn new(reservation: Reservation) -> Self {
        let now = Utc::now();
        Self {
            order_id: reservation.order_id.clone(),
            product_id: reservation.product_id.clone(),
            quantity: reservation.quantity,
            status: OrderStatus::Reserved,
            reservation: Some(reservation),
            keys: Vec::new(),
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status`, stamping `updated_at`
    pub fn transition(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self, keys: Vec<String>) {
        self.keys = keys;
        self.last_error = None;
        self.transition(OrderStatus::Completed);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.transition(OrderStatus::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reservation::ReservationStatus;

    fn record() -> OrderRecord {
        let now = Utc::now();
        OrderRecord::new(Reservation {
            reservation_id: "R1".into(),
            order_id: "O1".into(),
            product_id: "P1".into(),
            quantity: 1,
            status: ReservationStatus::Pending,
            expires_at: now + chrono::Duration::minutes(30),
            created_at: now,
        })
    }

    #[test]
    fn test_new_record_is_reserved() {
        let r = record();
        assert_eq!(r.order_id, "O1");
        assert_eq!(r.status, OrderStatus::Reserved);
        assert!(r.keys.is_empty());
    }

    #[test]
    fn test_complete_clears_error() {
        let mut r = record();
        r.last_error = Some("poll timed out".into());
        r.complete(vec!["KEY-1".into()]);
        assert_eq!(r.status, OrderStatus::Completed);
        assert!(r.status.is_terminal());
        assert!(r.last_error.is_none());
        assert_eq!(r.keys, vec!["KEY-1".to_string()]);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delayed).unwrap(),
            "\"delayed\""
        );
        assert!(!OrderStatus::Delayed.is_terminal());
    }
}
