//! TtlCache — guarded map of values with absolute expiry.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::key::CacheKey;

/// A stored value with its expiry instant.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL reaches past the clock's range.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

struct Inner<V> {
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries currently stored, live or not yet purged.
    pub entries: usize,
}

/// Thread-safe TTL cache. Clones share the same storage.
///
/// No duplicate-work suppression: two callers missing the same key at
/// the same time both compute, and the later insert wins.
pub struct TtlCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    /// Return the live value for `key`, evicting it if it has expired.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.inner.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => {
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(%key, "cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.inner.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(%key, "cache miss");
                    return None;
                }
            }
        }

        // Expired: remove unless someone refreshed it in between.
        let mut entries = self.inner.entries.write().await;
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
        debug!(%key, "cache entry expired");
        None
    }

    /// Store `value` under `key` for `ttl`.
    pub async fn insert(&self, key: CacheKey, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.inner.entries.write().await.insert(key, entry);
    }

    /// Return the cached value, or compute, store, and return it.
    pub async fn get_or_compute<F, Fut>(&self, key: &CacheKey, ttl: Duration, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(key).await {
            return value;
        }
        let value = compute().await;
        self.insert(key.clone(), value.clone(), ttl).await;
        value
    }

    /// Like [`get_or_compute`](Self::get_or_compute) for fallible work.
    /// Errors are returned to the caller and never cached.
    pub async fn try_get_or_compute<F, Fut, E>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(key.clone(), value.clone(), ttl).await;
        Ok(value)
    }

    /// Drop one entry. Returns true if it existed.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        self.inner.entries.write().await.remove(key).is_some()
    }

    /// Remove every expired entry and return how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, remaining = entries.len(), "purged expired cache entries");
        }
        purged
    }

    pub async fn clear(&self) {
        self.inner.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            entries: self.len().await,
        }
    }
}
