//! Storefront catalog API
//!
//! Every read goes through the cache-aside layer.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Game, GameSummary, HomePage};

use super::ApiResult;
use crate::cache::CacheKey;
use crate::catalog::DEFAULT_RANDOM_COUNT;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    pub pattern: String,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResult {
    pub pattern: String,
    pub removed: usize,
}

/// GET /api/home
pub async fn home(State(state): State<AppState>) -> ApiResult<HomePage> {
    let page = state.catalog.home_page().await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/games/random?count=
pub async fn random_games(
    State(state): State<AppState>,
    Query(query): Query<RandomQuery>,
) -> ApiResult<Vec<GameSummary>> {
    let count = query.count.unwrap_or(DEFAULT_RANDOM_COUNT);
    let games = state.catalog.random_games(count).await?;
    Ok(Json(ApiResponse::success(games)))
}

/// GET /api/games/{slug}
pub async fn game_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Game> {
    let game = state.catalog.game_detail(&slug).await?;
    Ok(Json(ApiResponse::success(game)))
}

/// GET /api/genres/{genre}
pub async fn games_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> ApiResult<Vec<GameSummary>> {
    let games = state.catalog.games_by_genre(&genre).await?;
    Ok(Json(ApiResponse::success(games)))
}

/// POST /api/admin/cache/invalidate
///
/// Patterns must stay inside a reserved namespace (`home:`, `game:`, `catalog:`).
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> ApiResult<InvalidateResult> {
    if !CacheKey::is_reserved_pattern(&req.pattern) {
        return Err(AppError::new(ErrorCode::InvalidCachePattern)
            .with_detail("pattern", req.pattern)
            .into());
    }
    let removed = state.catalog.cache().invalidate(&req.pattern).await;
    tracing::info!(pattern = %req.pattern, removed, "Cache invalidated by admin");
    Ok(Json(ApiResponse::success(InvalidateResult {
        pattern: req.pattern,
        removed,
    })))
}
