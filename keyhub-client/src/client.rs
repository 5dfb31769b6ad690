//! Typed marketplace client with a hard per-call deadline

use crate::metrics::MetricsCollector;
use crate::transport::{MarketRequest, MarketTransport};
use crate::{MarketError, MarketResult};
use serde::de::DeserializeOwned;
use shared::models::{ConfirmResult, CreateReservationRequest, InventoryCheckResult, Reservation};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Every outbound marketplace call is abandoned after this long.
pub const MARKET_CALL_DEADLINE: Duration = Duration::from_secs(9);

/// Marketplace client
///
/// Each call is raced against [`MARKET_CALL_DEADLINE`]; when the deadline
/// wins the in-flight request is dropped and [`MarketError::Timeout`] is
/// returned. Every call, successful or not, is recorded in the shared
/// [`MetricsCollector`].
#[derive(Clone)]
pub struct ReservationClient {
    transport: Arc<dyn MarketTransport>,
    metrics: Arc<MetricsCollector>,
    deadline: Duration,
}

impl std::fmt::Debug for ReservationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationClient")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl ReservationClient {
    pub fn new(transport: Arc<dyn MarketTransport>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            transport,
            metrics,
            deadline: MARKET_CALL_DEADLINE,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// `POST /reservations`
    pub async fn create_reservation(
        &self,
        request: &CreateReservationRequest,
    ) -> MarketResult<Reservation> {
        let body = serde_json::to_value(request)?;
        self.call(
            "create_reservation",
            &request.order_id,
            MarketRequest::post(["reservations"], Some(body)),
        )
        .await
    }

    /// `POST /reservations/{id}/confirm`
    pub async fn confirm_reservation(&self, reservation_id: &str) -> MarketResult<ConfirmResult> {
        self.call(
            "confirm_reservation",
            reservation_id,
            MarketRequest::post(["reservations", reservation_id, "confirm"], None),
        )
        .await
    }

    /// `GET /inventory/{orderId}`. Keys are only returned once stock is ready.
    pub async fn check_inventory(&self, order_id: &str) -> MarketResult<InventoryCheckResult> {
        let result: InventoryCheckResult = self
            .call(
                "check_inventory",
                order_id,
                MarketRequest::get(["inventory", order_id]),
            )
            .await?;
        Ok(result.normalized())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        target: &str,
        request: MarketRequest,
    ) -> MarketResult<T> {
        let path = request.path();
        let method = request.method.clone();
        let start = Instant::now();

        let outcome = match tokio::time::timeout(self.deadline, self.transport.send(request)).await
        {
            Ok(Ok(value)) => serde_json::from_value::<T>(value).map_err(MarketError::from),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(MarketError::Timeout {
                operation,
                target: target.to_string(),
                elapsed: start.elapsed(),
                budget: self.deadline,
            }),
        };

        let elapsed = start.elapsed();
        self.metrics.record_request(elapsed, outcome.is_ok());

        match &outcome {
            Ok(_) => tracing::debug!(
                operation,
                target,
                %method,
                path = %path,
                elapsed_ms = elapsed.as_millis() as u64,
                "Marketplace call succeeded"
            ),
            Err(e) if e.is_timeout() => tracing::warn!(
                operation,
                target,
                %method,
                path = %path,
                budget_ms = self.deadline.as_millis() as u64,
                "Marketplace call timed out"
            ),
            Err(e) => tracing::warn!(
                operation,
                target,
                %method,
                path = %path,
                error = %e,
                "Marketplace call failed"
            ),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InMemoryMarketplace;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    /// Transport that never answers
    struct Hanging;

    #[async_trait]
    impl MarketTransport for Hanging {
        async fn send(&self, _request: MarketRequest) -> MarketResult<Value> {
            std::future::pending().await
        }
    }

    /// Transport that answers with a fixed body after a delay
    struct Delayed(Duration, Value);

    #[async_trait]
    impl MarketTransport for Delayed {
        async fn send(&self, _request: MarketRequest) -> MarketResult<Value> {
            tokio::time::sleep(self.0).await;
            Ok(self.1.clone())
        }
    }

    fn client(transport: impl MarketTransport + 'static) -> ReservationClient {
        ReservationClient::new(Arc::new(transport), Arc::new(MetricsCollector::new()))
    }

    fn create_request() -> CreateReservationRequest {
        CreateReservationRequest {
            order_id: "O1".into(),
            product_id: "P1".into(),
            quantity: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_call_times_out_at_deadline() {
        let client = client(Hanging);
        let start = Instant::now();

        let err = client.create_reservation(&create_request()).await.unwrap_err();

        match err {
            MarketError::Timeout {
                operation,
                target,
                budget,
                ..
            } => {
                assert_eq!(operation, "create_reservation");
                assert_eq!(target, "O1");
                assert_eq!(budget, MARKET_CALL_DEADLINE);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(start.elapsed() >= MARKET_CALL_DEADLINE);
        assert!(start.elapsed() < MARKET_CALL_DEADLINE + Duration::from_millis(10));

        let snap = client.metrics().snapshot();
        assert_eq!(snap.requests_error, 1);
        assert_eq!(snap.requests_total, 1);
    }

    fn assert_deadline_timeout(err: MarketError, expected_operation: &str, expected_target: &str) {
        match err {
            MarketError::Timeout {
                operation,
                target,
                elapsed,
                budget,
            } => {
                assert_eq!(operation, expected_operation);
                assert_eq!(target, expected_target);
                assert_eq!(budget, MARKET_CALL_DEADLINE);
                assert!(elapsed >= MARKET_CALL_DEADLINE);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_confirm_and_inventory_time_out() {
        let client = client(Hanging);

        let start = Instant::now();
        let err = client.confirm_reservation("R7").await.unwrap_err();
        assert_deadline_timeout(err, "confirm_reservation", "R7");
        assert!(start.elapsed() < MARKET_CALL_DEADLINE + Duration::from_millis(10));

        let start = Instant::now();
        let err = client.check_inventory("O7").await.unwrap_err();
        assert_deadline_timeout(err, "check_inventory", "O7");
        assert!(start.elapsed() < MARKET_CALL_DEADLINE + Duration::from_millis(10));

        let snap = client.metrics().snapshot();
        assert_eq!(snap.requests_error, 2);
        assert_eq!(snap.requests_success, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_but_in_time_call_succeeds() {
        let body = json!({"reservationId": "R1", "status": "confirmed", "stockReady": false});
        let client = client(Delayed(Duration::from_millis(8_999), body));

        let result = client.confirm_reservation("R1").await.unwrap();
        assert!(!result.stock_ready);
        assert_eq!(client.metrics().snapshot().requests_success, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_body_is_api_error() {
        let client = client(Delayed(Duration::ZERO, json!({"unexpected": true})));
        let err = client.confirm_reservation("R1").await.unwrap_err();
        assert!(matches!(err, MarketError::Api { status: None, .. }));
        assert_eq!(client.metrics().snapshot().requests_error, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inventory_keys_dropped_when_not_ready() {
        let body = json!({"orderId": "O1", "stockReady": false, "keys": ["EARLY"]});
        let client = client(Delayed(Duration::ZERO, body));
        let result = client.check_inventory("O1").await.unwrap();
        assert!(result.keys.is_none());
    }

    #[tokio::test]
    async fn test_against_in_memory_marketplace() {
        let client = client(InMemoryMarketplace::instant());
        let reservation = client.create_reservation(&create_request()).await.unwrap();
        let confirmed = client
            .confirm_reservation(&reservation.reservation_id)
            .await
            .unwrap();
        assert!(confirmed.stock_ready);

        let inventory = client.check_inventory("O1").await.unwrap();
        assert_eq!(inventory.keys().len(), 1);
        assert_eq!(client.metrics().snapshot().requests_success, 3);
    }
}
