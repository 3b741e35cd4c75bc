//! Response cache.
//!
//! GET responses are kept as raw JSON, keyed by company scope, path and
//! rendered query, so a repeated read costs no round-trip. Mutations drop
//! every entry under the resource prefixes they touch; switching company or
//! logging out drops everything.
//!
//! Every invalidation bumps a generation counter. A response fetched across
//! a bump is not stored, so a read racing a mutation cannot re-cache the
//! pre-mutation body.

use moka::future::Cache;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::CacheConfig;

/// Cache key for a GET response.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Company the response was fetched for ("" when none)
    scope: String,
    path: String,
    query: String,
}

impl CacheKey {
    pub fn new(scope: Option<&str>, path: &str, query: &str) -> Self {
        Self {
            scope: scope.unwrap_or_default().to_string(),
            path: path.trim_start_matches('/').to_string(),
            query: query.to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// GET response cache using moka.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Option<Cache<CacheKey, Arc<Value>>>,
    generation: Arc<AtomicU64>,
}

impl ResponseCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self {
            cache: Some(cache),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A cache that stores nothing.
    pub fn disabled() -> Self {
        Self {
            cache: None,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.max_entries, config.ttl)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.cache.as_ref()?.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, value: Arc<Value>) {
        if let Some(cache) = &self.cache {
            cache.insert(key, value).await;
        }
    }

    /// Invalidations so far. Read it before fetching a response that will
    /// go through [`insert_if_unchanged`](Self::insert_if_unchanged).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Store `value` only if nothing was invalidated since `seen` was read.
    /// Returns whether the entry was kept.
    pub async fn insert_if_unchanged(&self, key: CacheKey, value: Arc<Value>, seen: u64) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };
        if self.generation() != seen {
            return false;
        }
        cache.insert(key.clone(), value).await;
        // An invalidation may have run between the check and the insert
        if self.generation() != seen {
            cache.invalidate(&key).await;
            return false;
        }
        true
    }

    /// Drop every entry whose path starts with one of `prefixes`, in any
    /// company scope. Returns how many entries were dropped.
    pub async fn invalidate_prefixes(&self, prefixes: &[&str]) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };
        if prefixes.is_empty() {
            return 0;
        }
        self.bump();

        let stale: Vec<Arc<CacheKey>> = cache
            .iter()
            .filter(|(key, _)| {
                prefixes
                    .iter()
                    .any(|p| key.path.starts_with(p.trim_start_matches('/')))
            })
            .map(|(key, _)| key)
            .collect();

        for key in &stale {
            cache.invalidate(key.as_ref()).await;
        }
        if !stale.is_empty() {
            debug!(?prefixes, dropped = stale.len(), "Cache entries invalidated");
        }
        stale.len()
    }

    /// Clear the cache.
    pub fn invalidate_all(&self) {
        self.bump();
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
            debug!("Cache cleared");
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(v: Value) -> Arc<Value> {
        Arc::new(v)
    }

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = ResponseCache::default();
        let key = CacheKey::new(Some("c1"), "evidence/evidence/", "page=1");

        // Cache miss
        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), value(json!({"count": 0}))).await;

        // Cache hit
        assert_eq!(*cache.get(&key).await.unwrap(), json!({"count": 0}));

        // Another company does not see it
        let other = CacheKey::new(Some("c2"), "evidence/evidence/", "page=1");
        assert!(cache.get(&other).await.is_none());
    }

    #[tokio::test]
    async fn test_prefix_invalidation() {
        let cache = ResponseCache::default();
        let evidence = CacheKey::new(Some("c1"), "evidence/evidence/", "");
        let quota = CacheKey::new(Some("c2"), "evidence/evidence/storage_quota/", "");
        let controls = CacheKey::new(Some("c1"), "controls/applied-controls/", "");
        for key in [&evidence, &quota, &controls] {
            cache.insert(key.clone(), value(json!([]))).await;
        }

        let dropped = cache.invalidate_prefixes(&["evidence/"]).await;
        assert_eq!(dropped, 2);
        assert!(cache.get(&evidence).await.is_none());
        assert!(cache.get(&quota).await.is_none());
        assert!(cache.get(&controls).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = ResponseCache::default();
        let key = CacheKey::new(None, "auth/me/", "");
        cache.insert(key.clone(), value(json!({}))).await;
        cache.invalidate_all();
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_stores_nothing() {
        let cache = ResponseCache::disabled();
        let key = CacheKey::new(None, "companies/", "");
        cache.insert(key.clone(), value(json!([]))).await;
        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.invalidate_prefixes(&["companies/"]).await, 0);
    }

    #[tokio::test]
    async fn test_insert_skipped_after_invalidation() {
        let cache = ResponseCache::default();
        let key = CacheKey::new(Some("c1"), "evidence/evidence/", "");

        let seen = cache.generation();
        cache.invalidate_prefixes(&["evidence/"]).await;
        assert!(!cache.insert_if_unchanged(key.clone(), value(json!({"count": 0})), seen).await);
        assert!(cache.get(&key).await.is_none());

        let seen = cache.generation();
        assert!(cache.insert_if_unchanged(key.clone(), value(json!({"count": 1})), seen).await);
        assert_eq!(*cache.get(&key).await.unwrap(), json!({"count": 1}));
    }

    #[tokio::test]
    async fn test_clear_bumps_generation() {
        let cache = ResponseCache::default();
        let seen = cache.generation();
        cache.invalidate_all();
        assert_ne!(cache.generation(), seen);
    }

    #[test]
    fn test_key_ignores_leading_slash() {
        assert_eq!(
            CacheKey::new(None, "/companies/", ""),
            CacheKey::new(None, "companies/", "")
        );
    }
}
