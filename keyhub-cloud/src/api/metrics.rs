//! Marketplace integration counters
//!
//! GET /metrics

use axum::Json;
use axum::extract::State;
use keyhub_client::MetricsSnapshot;
use shared::error::ApiResponse;

use crate::state::AppState;

pub async fn snapshot(State(state): State<AppState>) -> Json<ApiResponse<MetricsSnapshot>> {
    Json(ApiResponse::success(state.metrics.snapshot()))
}
