//! Record store interfaces
//!
//! The storefront only needs "find by id/slug", aggregates and "create" over
//! catalog and order entities. Any durable store can sit behind these traits;
//! [`MemoryDatabase`] is the in-process implementation.

mod memory;

pub use memory::MemoryDatabase;

use async_trait::async_trait;
use shared::models::{Game, GameSummary, GenreCount, OrderRecord};
use thiserror::Error;

/// Record store error
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this id already exists
    #[error("record {0} already exists")]
    Conflict(String),

    #[error("record {0} not found")]
    NotFound(String),

    #[error("record store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid record data: {0}")]
    Data(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Catalog reads
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_game_by_slug(&self, slug: &str) -> StoreResult<Option<Game>>;

    /// Most units sold over completed orders
    async fn best_sellers(&self, limit: usize) -> StoreResult<Vec<GameSummary>>;

    /// Most recently released first
    async fn new_releases(&self, limit: usize) -> StoreResult<Vec<GameSummary>>;

    /// Number of games per genre, by genre name
    async fn genre_counts(&self) -> StoreResult<Vec<GenreCount>>;

    /// Games tagged with `genre` (case-insensitive), by name
    async fn games_by_genre(&self, genre: &str, limit: usize) -> StoreResult<Vec<GameSummary>>;

    /// Uniform random sample of at most `count` games
    async fn random_games(&self, count: usize) -> StoreResult<Vec<GameSummary>>;
}

/// Storefront order records
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::Conflict`] on a duplicate id.
    async fn create(&self, record: OrderRecord) -> StoreResult<()>;

    async fn find(&self, order_id: &str) -> StoreResult<Option<OrderRecord>>;

    /// Replace a record only if the stored copy still equals `expected`.
    ///
    /// Returns `false` when another writer changed it since it was read.
    /// Fails with [`StoreError::NotFound`] if absent.
    async fn update_if_unchanged(
        &self,
        expected: &OrderRecord,
        record: OrderRecord,
    ) -> StoreResult<bool>;

    /// Records that hold a reservation, oldest first
    async fn list_with_reservations(&self) -> StoreResult<Vec<OrderRecord>>;
}
