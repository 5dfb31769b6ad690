//! Cached catalog read model

use shared::error::{AppError, ErrorCode};
use shared::models::{Game, GameSummary, GenreCount, HomePage};
use std::sync::Arc;

use crate::cache::{CacheAside, CacheKey, CacheTtl};
use crate::config::Config;
use crate::db::CatalogStore;
use crate::error::{ServiceError, ServiceResult};
use crate::tasks::RefreshJob;

/// Length of the home page lists
pub const HOME_LIST_LEN: usize = 12;
/// Length of a genre listing
pub const GENRE_LIST_LEN: usize = 48;
pub const DEFAULT_RANDOM_COUNT: usize = 8;
pub const MAX_RANDOM_COUNT: usize = 50;

/// Catalog reads through the cache
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    cache: CacheAside,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, cache: CacheAside) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &CacheAside {
        &self.cache
    }

    pub async fn home_page(&self) -> ServiceResult<HomePage> {
        let (best_sellers, new_releases, genres) =
            tokio::try_join!(self.best_sellers(), self.new_releases(), self.genres())?;
        Ok(HomePage {
            best_sellers,
            new_releases,
            genres,
        })
    }

    pub async fn best_sellers(&self) -> ServiceResult<Vec<GameSummary>> {
        self.cache
            .get_or_fetch(CacheKey::HOME_BEST_SELLERS, CacheTtl::DAILY, || async {
                Ok::<_, ServiceError>(self.store.best_sellers(HOME_LIST_LEN).await?)
            })
            .await
    }

    pub async fn new_releases(&self) -> ServiceResult<Vec<GameSummary>> {
        self.cache
            .get_or_fetch(CacheKey::HOME_NEW_RELEASES, CacheTtl::DAILY, || async {
                Ok::<_, ServiceError>(self.store.new_releases(HOME_LIST_LEN).await?)
            })
            .await
    }

    pub async fn genres(&self) -> ServiceResult<Vec<GenreCount>> {
        self.cache
            .get_or_fetch(CacheKey::HOME_GENRES, CacheTtl::AGGREGATE, || async {
                Ok::<_, ServiceError>(self.store.genre_counts().await?)
            })
            .await
    }

    /// Game detail page. Unknown slugs are an error and are not cached.
    pub async fn game_detail(&self, slug: &str) -> ServiceResult<Game> {
        self.cache
            .get_or_fetch(&CacheKey::game(slug), CacheTtl::DETAIL, || async {
                self.store.find_game_by_slug(slug).await?.ok_or_else(|| {
                    ServiceError::App(
                        AppError::new(ErrorCode::GameNotFound).with_detail("slug", slug),
                    )
                })
            })
            .await
    }

    pub async fn games_by_genre(&self, genre: &str) -> ServiceResult<Vec<GameSummary>> {
        self.cache
            .get_or_fetch(&CacheKey::genre(genre), CacheTtl::DAILY, || async {
                let games = self.store.games_by_genre(genre, GENRE_LIST_LEN).await?;
                if games.is_empty() {
                    return Err(ServiceError::App(
                        AppError::new(ErrorCode::GenreNotFound).with_detail("genre", genre),
                    ));
                }
                Ok(games)
            })
            .await
    }

    /// Random sample, cached per requested size for a minute
    pub async fn random_games(&self, count: usize) -> ServiceResult<Vec<GameSummary>> {
        if count == 0 || count > MAX_RANDOM_COUNT {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("count must be between 1 and {MAX_RANDOM_COUNT}"),
            )
            .with_detail("count", count)
            .into());
        }
        self.cache
            .get_or_fetch(&CacheKey::random(count), CacheTtl::SAMPLED, || async {
                Ok::<_, ServiceError>(self.store.random_games(count).await?)
            })
            .await
    }

    /// Home page refresh jobs
    pub fn refresh_jobs(&self, config: &Config) -> Vec<RefreshJob> {
        let daily = self.clone();
        let aggregate = self.clone();
        vec![
            RefreshJob::new(
                "home_daily",
                config.cache_refresh_daily,
                vec![
                    CacheKey::HOME_BEST_SELLERS.to_string(),
                    CacheKey::HOME_NEW_RELEASES.to_string(),
                ],
                move || {
                    let catalog = daily.clone();
                    async move {
                        catalog.best_sellers().await.map_err(boxed)?;
                        catalog.new_releases().await.map_err(boxed)?;
                        Ok(())
                    }
                },
            ),
            RefreshJob::new(
                "home_aggregate",
                config.cache_refresh_aggregate,
                vec![CacheKey::HOME_GENRES.to_string()],
                move || {
                    let catalog = aggregate.clone();
                    async move {
                        catalog.genres().await.map_err(boxed)?;
                        Ok(())
                    }
                },
            ),
        ]
    }
}

fn boxed(e: ServiceError) -> crate::error::BoxError {
    match e {
        ServiceError::Db(e) => e,
        ServiceError::App(e) => Box::new(e),
    }
}
