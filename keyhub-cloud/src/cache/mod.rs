//! Cache-aside layer for catalog reads
//!
//! The cache is an optimization only. Every store failure is logged and
//! swallowed: reads fall back to the record store and invalidation becomes a
//! no-op. Errors from the fetch function itself are returned unchanged and
//! never cached.

mod pattern;
mod store;

pub use pattern::{glob_match, is_literal};
pub use store::{CacheStore, MemoryCacheStore};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Cache store failure. Never leaves [`CacheAside`].
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("cache store error: {0}")]
    Backend(String),

    #[error("cache entry serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// TTL classes
pub struct CacheTtl;

impl CacheTtl {
    /// Rarely-changing aggregate lists
    pub const AGGREGATE: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    /// Daily-rotating lists
    pub const DAILY: Duration = Duration::from_secs(24 * 60 * 60);
    /// Per-entity detail pages
    pub const DETAIL: Duration = Duration::from_secs(60 * 60);
    /// Randomized or sampled result sets
    pub const SAMPLED: Duration = Duration::from_secs(60);
}

/// Cache key builders. All keys live under a reserved namespace.
pub struct CacheKey;

impl CacheKey {
    pub const NAMESPACES: [&'static str; 3] = ["home:", "game:", "catalog:"];

    pub const HOME_BEST_SELLERS: &'static str = "home:bestSellers";
    pub const HOME_NEW_RELEASES: &'static str = "home:newReleases";
    pub const HOME_GENRES: &'static str = "home:genres";

    pub fn game(slug: &str) -> String {
        format!("game:{slug}")
    }

    pub fn genre(genre: &str) -> String {
        format!("catalog:genre:{}", genre.to_lowercase())
    }

    pub fn random(count: usize) -> String {
        format!("catalog:random:{count}")
    }

    /// Whether a pattern is confined to one reserved namespace
    pub fn is_reserved_pattern(pattern: &str) -> bool {
        Self::NAMESPACES
            .iter()
            .any(|ns| pattern.starts_with(ns))
    }
}

/// Cache-aside front for a [`CacheStore`]
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Read `key`, or run `fetch` and store its result for `ttl`.
    ///
    /// On a hit `fetch` is not called. On a miss, an unavailable store, a
    /// failed read or an undecodable entry, `fetch` runs and its result is
    /// written back when the store answered the liveness probe.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let available = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache store unavailable, reading from source");
                false
            }
        };

        if available {
            match self.read::<T>(key).await {
                Ok(Some(value)) => {
                    tracing::trace!(key, "Cache hit");
                    return Ok(value);
                }
                Ok(None) => tracing::trace!(key, "Cache miss"),
                Err(e) => tracing::warn!(key, error = %e, "Cache read failed, reading from source"),
            }
        }

        let value = fetch().await?;

        if available && let Err(e) = self.write(key, &value, ttl).await {
            tracing::warn!(key, error = %e, "Cache write-back failed");
        }
        Ok(value)
    }

    /// Delete every key matching `pattern`. Returns how many were removed;
    /// 0 when the store is unavailable.
    pub async fn invalidate(&self, pattern: &str) -> usize {
        match self.try_invalidate(pattern).await {
            Ok(removed) => {
                tracing::debug!(pattern, removed, "Cache invalidated");
                removed
            }
            Err(e) => {
                tracing::warn!(pattern, error = %e, "Cache invalidation skipped");
                0
            }
        }
    }

    async fn try_invalidate(&self, pattern: &str) -> Result<usize, CacheError> {
        self.store.ping().await?;
        let keys = if is_literal(pattern) {
            vec![pattern.to_string()]
        } else {
            self.store.keys(pattern).await?
        };
        if keys.is_empty() {
            return Ok(0);
        }
        self.store.del(&keys).await
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set_ex(key, raw, ttl).await
    }
}
