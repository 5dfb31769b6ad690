//! HttpTransport against a fake marketplace served by axum on an ephemeral port

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use keyhub_client::{
    HttpTransport, InMemoryMarketplace, InventoryPoller, MarketError, MarketRequest,
    MarketResult, MarketTransport, MetricsCollector, ReservationClient, ReservationManager,
    transport::API_KEY_HEADER,
};
use serde_json::{Value, json};
use shared::models::ReservationStatus;
use std::sync::Arc;
use std::time::Duration;

const API_KEY: &str = "test-key";

#[derive(Clone)]
struct Fake {
    market: Arc<InMemoryMarketplace>,
}

fn reply(result: MarketResult<Value>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(MarketError::Api { status, message }) => {
            let status = status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "message": message }))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

async fn create(State(fake): State<Fake>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad api key"}))).into_response();
    }
    reply(
        fake.market
            .send(MarketRequest::post(["reservations"], Some(body)))
            .await,
    )
}

async fn confirm(State(fake): State<Fake>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    reply(
        fake.market
            .send(MarketRequest::post(["reservations", id.as_str(), "confirm"], None))
            .await,
    )
}

async fn inventory(
    State(fake): State<Fake>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    reply(
        fake.market
            .send(MarketRequest::get(["inventory", order_id.as_str()]))
            .await,
    )
}

async fn serve(provision_delay: Duration) -> String {
    let fake = Fake {
        market: Arc::new(InMemoryMarketplace::new(provision_delay)),
    };
    let app = Router::new()
        .route("/api/v1/reservations", post(create))
        .route("/api/v1/reservations/{id}/confirm", post(confirm))
        .route("/api/v1/inventory/{order_id}", get(inventory))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/v1/")
}

fn client(base_url: &str, api_key: &str) -> ReservationClient {
    let transport = HttpTransport::new(base_url, api_key).unwrap();
    ReservationClient::new(Arc::new(transport), Arc::new(MetricsCollector::new()))
}

#[tokio::test]
async fn test_reserve_confirm_and_poll_over_http() {
    let base_url = serve(Duration::from_millis(150)).await;
    let client = client(&base_url, API_KEY);
    let manager = ReservationManager::new(client.clone());
    let poller = InventoryPoller::new(client.clone());

    let reservation = manager.create_reservation("O1", "P1", 1).await.unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.order_id, "O1");

    let confirmed = manager
        .confirm_reservation(&reservation.reservation_id)
        .await
        .unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);
    assert!(!confirmed.stock_ready);

    let result = poller
        .wait_for_ready("O1", Duration::from_millis(2000), Duration::from_millis(50))
        .await
        .unwrap();
    assert!(result.stock_ready);
    assert_eq!(result.keys().len(), 1);

    let snap = client.metrics().snapshot();
    assert_eq!(snap.requests_total, snap.requests_success + snap.requests_error);
    assert_eq!(snap.requests_error, 0);
    assert!(snap.requests_retry >= 1);
}

#[tokio::test]
async fn test_upstream_errors_carry_status_and_message() {
    let base_url = serve(Duration::ZERO).await;

    let err = client(&base_url, "wrong-key")
        .check_inventory("O1")
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Api { status: Some(401), .. }));

    let manager = ReservationManager::new(client(&base_url, API_KEY));
    manager.create_reservation("O2", "P1", 1).await.unwrap();
    match manager.create_reservation("O2", "P1", 1).await.unwrap_err() {
        MarketError::Api { status, message } => {
            assert_eq!(status, Some(409));
            assert!(message.contains("O2"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_marketplace_is_api_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}/"), API_KEY)
        .check_inventory("O1")
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Api { status: None, .. }));
    assert!(err.is_retryable());
}
