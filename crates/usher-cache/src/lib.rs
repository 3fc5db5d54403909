// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory TTL cache (TinyLFU admission) behind the [`TtlCache`] trait.
//!
//! Every entry carries its own time-to-live: reply caching, search caching,
//! and session context all share one store but expire on different clocks.
//! The cache is best-effort by contract -- a miss is never an error, and the
//! assistant stays correct (just slower) with caching disabled.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use tracing::debug;
use usher_core::TtlCache;

/// Expiry policy that reads the TTL stored alongside each value.
struct PerEntryTtl;

impl Expiry<String, (String, Duration)> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &(String, Duration),
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.1)
    }
}

/// Moka-backed in-memory cache with per-entry TTL.
pub struct MemoryCache {
    inner: Cache<String, (String, Duration)>,
}

impl MemoryCache {
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }

    /// Number of live entries. Approximate until pending maintenance runs.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl TtlCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let hit = self.inner.get(key).await.map(|(value, _ttl)| value);
        debug!(key, hit = hit.is_some(), "cache lookup");
        hit
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        self.inner.insert(key.to_owned(), (value, ttl)).await;
    }

    async fn ping(&self) -> bool {
        true
    }
}

/// Cache that stores nothing. Used when caching is disabled in config.
pub struct NoopCache;

#[async_trait]
impl TtlCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) {}

    async fn ping(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = MemoryCache::new(16);
        cache
            .set("reply:abc", "hello".into(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("reply:abc").await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = MemoryCache::new(16);
        assert_eq!(cache.get("reply:missing").await, None);
    }

    #[tokio::test]
    async fn entries_expire_on_their_own_ttl() {
        let cache = MemoryCache::new(16);
        cache
            .set("short", "a".into(), Duration::from_millis(20))
            .await;
        cache.set("long", "b".into(), Duration::from_secs(300)).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.get("long").await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let cache = MemoryCache::new(16);
        cache.set("k", "one".into(), Duration::from_secs(60)).await;
        cache.set("k", "two".into(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn noop_cache_never_stores() {
        let cache = NoopCache;
        cache.set("k", "v".into(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, None);
        assert!(!cache.ping().await);
    }
}
