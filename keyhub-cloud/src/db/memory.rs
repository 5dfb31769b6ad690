//! In-process record store

use super::{CatalogStore, OrderStore, StoreError, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use shared::models::{Game, GameSummary, GenreCount, OrderRecord, OrderStatus};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Catalog shipped with the service for local development
const BUNDLED_CATALOG: &str = include_str!("../../seed/catalog.json");

/// Catalog and order records held in memory, keyed by slug and order id
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    games: DashMap<String, Game>,
    orders: DashMap<String, OrderRecord>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_games(games: impl IntoIterator<Item = Game>) -> Self {
        let db = Self::new();
        for game in games {
            db.games.insert(game.slug.clone(), game);
        }
        db
    }

    /// Load the catalog from a JSON array of games
    pub fn from_seed_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_seed_json(&raw)
    }

    /// The bundled development catalog
    pub fn bundled() -> StoreResult<Self> {
        Self::from_seed_json(BUNDLED_CATALOG)
    }

    fn from_seed_json(raw: &str) -> StoreResult<Self> {
        let games: Vec<Game> = serde_json::from_str(raw)?;
        Ok(Self::with_games(games))
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    fn summaries_by<K: Ord>(&self, limit: usize, key: impl Fn(&Game) -> K) -> Vec<GameSummary> {
        let mut games: Vec<Game> = self.games.iter().map(|g| g.value().clone()).collect();
        games.sort_by_key(|g| key(g));
        games.iter().take(limit).map(Game::summary).collect()
    }

    /// Units sold per marketplace product over completed orders
    fn units_sold(&self) -> HashMap<String, u64> {
        let mut sold = HashMap::new();
        for order in self.orders.iter() {
            if order.status == OrderStatus::Completed {
                *sold.entry(order.product_id.clone()).or_insert(0) += u64::from(order.quantity);
            }
        }
        sold
    }
}

#[async_trait]
impl CatalogStore for MemoryDatabase {
    async fn find_game_by_slug(&self, slug: &str) -> StoreResult<Option<Game>> {
        Ok(self.games.get(slug).map(|g| g.value().clone()))
    }

    async fn best_sellers(&self, limit: usize) -> StoreResult<Vec<GameSummary>> {
        let sold = self.units_sold();
        Ok(self.summaries_by(limit, |g| {
            let units = sold.get(&g.marketplace_product_id).copied().unwrap_or(0);
            (Reverse(units), Reverse(g.released_at), g.name.clone())
        }))
    }

    async fn new_releases(&self, limit: usize) -> StoreResult<Vec<GameSummary>> {
        Ok(self.summaries_by(limit, |g| (Reverse(g.released_at), g.name.clone())))
    }

    async fn genre_counts(&self) -> StoreResult<Vec<GenreCount>> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for game in self.games.iter() {
            for genre in &game.genres {
                *counts.entry(genre.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(genre, count)| GenreCount { genre, count })
            .collect())
    }

    async fn games_by_genre(&self, genre: &str, limit: usize) -> StoreResult<Vec<GameSummary>> {
        let mut games: Vec<Game> = self
            .games
            .iter()
            .filter(|g| g.genres.iter().any(|x| x.eq_ignore_ascii_case(genre)))
            .map(|g| g.value().clone())
            .collect();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(games.iter().take(limit).map(Game::summary).collect())
    }

    async fn random_games(&self, count: usize) -> StoreResult<Vec<GameSummary>> {
        let games: Vec<GameSummary> = self.games.iter().map(|g| g.summary()).collect();
        let mut rng = rand::thread_rng();
        Ok(games.choose_multiple(&mut rng, count).cloned().collect())
    }
}

#[async_trait]
impl OrderStore for MemoryDatabase {
    async fn create(&self, record: OrderRecord) -> StoreResult<()> {
        use dashmap::mapref::entry::Entry;

        match self.orders.entry(record.order_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(record.order_id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn find(&self, order_id: &str) -> StoreResult<Option<OrderRecord>> {
        Ok(self.orders.get(order_id).map(|r| r.value().clone()))
    }

    async fn update_if_unchanged(
        &self,
        expected: &OrderRecord,
        record: OrderRecord,
    ) -> StoreResult<bool> {
        match self.orders.get_mut(&record.order_id) {
            Some(mut existing) if *existing == *expected => {
                *existing = record;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(record.order_id)),
        }
    }

    async fn list_with_reservations(&self) -> StoreResult<Vec<OrderRecord>> {
        let mut records: Vec<OrderRecord> = self
            .orders
            .iter()
            .filter(|r| r.reservation.is_some())
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use shared::models::{Reservation, ReservationStatus};

    fn order(order_id: &str, product_id: &str, quantity: u32) -> OrderRecord {
        let now = Utc::now();
        OrderRecord::new(Reservation {
            reservation_id: format!("R-{order_id}"),
            order_id: order_id.into(),
            product_id: product_id.into(),
            quantity,
            status: ReservationStatus::Pending,
            expires_at: now + Duration::minutes(30),
            created_at: now,
        })
    }

    #[tokio::test]
    async fn test_bundled_catalog_loads() {
        let db = MemoryDatabase::bundled().unwrap();
        assert!(db.game_count() >= 5);
        let game = db.find_game_by_slug("iron-harbor").await.unwrap().unwrap();
        assert_eq!(game.marketplace_product_id, "mkt-iron-harbor");
        assert!(db.find_game_by_slug("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();
        assert!(matches!(
            MemoryDatabase::from_seed_file(&path),
            Err(StoreError::Data(_))
        ));
        assert!(matches!(
            MemoryDatabase::from_seed_file(dir.path().join("missing.json")),
            Err(StoreError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_best_sellers_count_completed_orders_only() {
        let db = MemoryDatabase::bundled().unwrap();

        let mut sold = order("O1", "mkt-lantern-keeper", 3);
        sold.complete(vec!["K1".into(), "K2".into(), "K3".into()]);
        db.create(sold).await.unwrap();
        db.create(order("O2", "mkt-tiny-farm-tales", 10)).await.unwrap();

        let best = db.best_sellers(3).await.unwrap();
        assert_eq!(best.len(), 3);
        assert_eq!(best[0].slug, "lantern-keeper");
        assert_ne!(best[1].slug, "tiny-farm-tales");
    }

    #[tokio::test]
    async fn test_new_releases_and_genres() {
        let db = MemoryDatabase::bundled().unwrap();
        let latest = db.new_releases(2).await.unwrap();
        assert_eq!(latest[0].slug, "empire-ledger");
        assert_eq!(latest[1].slug, "hollow-crown");

        let genres = db.genre_counts().await.unwrap();
        let rpg = genres.iter().find(|g| g.genre == "RPG").unwrap();
        assert_eq!(rpg.count, 2);
        assert!(genres.windows(2).all(|w| w[0].genre < w[1].genre));

        let strategy = db.games_by_genre("strategy", 10).await.unwrap();
        let slugs: Vec<_> = strategy.iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, ["empire-ledger", "iron-harbor"]);
    }

    #[tokio::test]
    async fn test_random_games_are_distinct_and_bounded() {
        let db = MemoryDatabase::bundled().unwrap();
        let sample = db.random_games(4).await.unwrap();
        assert_eq!(sample.len(), 4);
        let mut slugs: Vec<_> = sample.iter().map(|g| g.slug.clone()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 4);

        let all = db.random_games(1000).await.unwrap();
        assert_eq!(all.len(), db.game_count());
    }

    #[tokio::test]
    async fn test_order_create_update_list() {
        let db = MemoryDatabase::new();
        db.create(order("O1", "P1", 1)).await.unwrap();
        assert!(matches!(
            db.create(order("O1", "P1", 1)).await,
            Err(StoreError::Conflict(_))
        ));

        let read = db.find("O1").await.unwrap().unwrap();
        let mut record = read.clone();
        record.transition(OrderStatus::Processing);
        assert!(db.update_if_unchanged(&read, record).await.unwrap());
        assert_eq!(
            db.find("O1").await.unwrap().unwrap().status,
            OrderStatus::Processing
        );

        // A writer holding the old copy must not clobber the newer one.
        let mut stale = read.clone();
        stale.fail("late writer");
        assert!(!db.update_if_unchanged(&read, stale).await.unwrap());
        assert_eq!(
            db.find("O1").await.unwrap().unwrap().status,
            OrderStatus::Processing
        );

        let missing = order("O9", "P1", 1);
        assert!(matches!(
            db.update_if_unchanged(&missing, missing.clone()).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(db.list_with_reservations().await.unwrap().len(), 1);
    }
}
