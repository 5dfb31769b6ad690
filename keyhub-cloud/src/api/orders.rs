//! Order tracking and reservation administration

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::ApiResponse;
use shared::models::{InventoryCheckResult, OrderRecord, OrderStatus};

use super::ApiResult;
use crate::error::ServiceResult;
use crate::orders::ReservationView;
use crate::state::AppState;

/// Message attached to orders whose keys did not arrive within the poll budget
pub const DELAYED_MESSAGE: &str = "Keys are still being provisioned, try again later";

/// GET /api/orders/{order_id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<OrderRecord> {
    let order = state.orders.order(&order_id).await?;
    let response = match order.status {
        OrderStatus::Delayed => ApiResponse::success_with_message(DELAYED_MESSAGE, order),
        OrderStatus::Processing | OrderStatus::Reserved => {
            ApiResponse::success_with_message("processing", order)
        }
        _ => ApiResponse::success(order),
    };
    Ok(Json(response))
}

/// GET /api/orders/{order_id}/inventory
pub async fn check_inventory(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<InventoryCheckResult> {
    let inventory = state.orders.inventory(&order_id).await?;
    Ok(Json(ApiResponse::success(inventory)))
}

/// DELETE /api/reservations/{id}
///
/// The marketplace has no cancellation; always answers 501.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<ApiResponse<()>>> {
    state.orders.cancel_reservation(&id)?;
    Ok(Json(ApiResponse::ok()))
}

/// GET /api/admin/reservations
pub async fn list_reservations(State(state): State<AppState>) -> ApiResult<Vec<ReservationView>> {
    let views = state.orders.reservations().await?;
    Ok(Json(ApiResponse::success(views)))
}
