//! Checkout
//!
//! POST /api/checkout: 200 with keys, or 202 while keys are provisioned

use axum::{Json, extract::State, http::StatusCode};
use shared::error::ApiResponse;
use shared::models::OrderRecord;

use crate::error::ServiceResult;
use crate::orders::{CheckoutOutcome, CheckoutRequest};
use crate::state::AppState;

pub async fn checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> ServiceResult<(StatusCode, Json<ApiResponse<OrderRecord>>)> {
    let outcome = state.orders.checkout(req).await?;
    Ok(match outcome {
        CheckoutOutcome::Completed(order) => (StatusCode::OK, Json(ApiResponse::success(order))),
        CheckoutOutcome::Processing(order) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success_with_message("processing", order)),
        ),
    })
}
