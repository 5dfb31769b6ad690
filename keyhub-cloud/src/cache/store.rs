//! Cache store backends

use super::CacheError;
use super::pattern::glob_match;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Key/value store with `GET`, `SET EX`, `KEYS`, `DEL` and `PING` semantics.
///
/// Values are serialized JSON. Implement this to put the cache on Redis or
/// any other shared store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Liveness probe
    async fn ping(&self) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Keys matching a glob pattern
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Delete keys, returning how many existed
    async fn del(&self, keys: &[String]) -> Result<usize, CacheError>;
}

/// In-process store backed by `DashMap`.
///
/// Each entry keeps its expiry instant and is evicted lazily on access.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Remove `key` if its entry is still expired. A write that replaced the
    /// entry since it was seen expired survives.
    fn remove_if_expired(&self, key: &str) -> bool {
        self.entries
            .remove_if(key, |_, (_, expires_at)| *expires_at <= Instant::now())
            .is_some()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if *expires_at > Instant::now() {
                return Ok(Some(value.clone()));
            }
            // Expired: drop the read guard before removing
            drop(entry);
            self.remove_if_expired(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::Backend(format!("invalid expire time for {key}")));
        }
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.value().1 > now && glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn del(&self, keys: &[String]) -> Result<usize, CacheError> {
        Ok(keys
            .iter()
            .filter(|k| self.entries.remove(k.as_str()).is_some())
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryCacheStore::new();
        store
            .set_ex("game:a", "1".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("game:a").await.unwrap().as_deref(), Some("1"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(store.get("game:a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_removal_spares_rewritten_entry() {
        let store = MemoryCacheStore::new();
        store.set_ex("home:x", "old".into(), Duration::from_secs(1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        // A reader saw the expired entry; a writer lands before it removes.
        store.set_ex("home:x", "new".into(), Duration::from_secs(60)).await.unwrap();
        assert!(!store.remove_if_expired("home:x"));
        assert_eq!(store.get("home:x").await.unwrap().as_deref(), Some("new"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(store.remove_if_expired("home:x"));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_skips_expired_and_sorts() {
        let store = MemoryCacheStore::new();
        store.set_ex("home:b", "1".into(), Duration::from_secs(10)).await.unwrap();
        store.set_ex("home:a", "1".into(), Duration::from_secs(10)).await.unwrap();
        store.set_ex("home:old", "1".into(), Duration::from_secs(1)).await.unwrap();
        store.set_ex("game:a", "1".into(), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.keys("home:*").await.unwrap(), vec!["home:a", "home:b"]);
        assert_eq!(store.evict_expired(), 1);
    }

    #[tokio::test]
    async fn test_del_counts_existing() {
        let store = MemoryCacheStore::new();
        store.set_ex("a", "1".into(), Duration::from_secs(10)).await.unwrap();
        let removed = store.del(&["a".into(), "missing".into()]).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.set_ex("b", "1".into(), Duration::ZERO).await.is_err());
    }
}
