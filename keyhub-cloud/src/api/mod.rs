//! API routes for keyhub-cloud

pub mod catalog;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod webhook;

use crate::error::ServiceError;
use crate::state::AppState;
use axum::Json;
use axum::Router;
use axum::routing::{delete, get, post};
use shared::error::ApiResponse;
use tower_http::trace::TraceLayer;

/// Handler result wrapped in the response envelope
pub(crate) type ApiResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Storefront reads (cache-aside)
    let storefront = Router::new()
        .route("/api/home", get(catalog::home))
        .route("/api/games/random", get(catalog::random_games))
        .route("/api/games/{slug}", get(catalog::game_detail))
        .route("/api/genres/{genre}", get(catalog::games_by_genre));

    // Checkout and order tracking
    let orders = Router::new()
        .route("/api/checkout", post(checkout::checkout))
        .route("/api/orders/{order_id}", get(orders::get_order))
        .route("/api/orders/{order_id}/inventory", get(orders::check_inventory))
        .route("/api/reservations/{id}", delete(orders::cancel_reservation));

    let admin = Router::new()
        .route("/api/admin/reservations", get(orders::list_reservations))
        .route("/api/admin/cache/invalidate", post(catalog::invalidate_cache));

    // Marketplace notifications (digest-verified, raw body)
    let webhook = Router::new().route("/webhooks/marketplace", post(webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::snapshot))
        .merge(storefront)
        .merge(orders)
        .merge(admin)
        .merge(webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
