//! Scope cache.
//!
//! Scopes never change once created, so the cache has no expiry and no
//! invalidation. It is purely an optimization: [`NoCache`] is a valid choice.
//!
//! Concurrent misses for the same key may all call `compute`. That is fine
//! because `compute` goes through the store's idempotent get-or-create and
//! every caller ends up writing the same value.

use std::future::Future;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use crate::foundation::error::StoreResult;
use crate::foundation::scope::Scope;

/// A key-value tier in front of the scope store.
#[async_trait]
pub trait ScopeCache: Send + Sync {
    /// Returns the cached scope for `key`.
    async fn get(&self, key: &str) -> Option<Scope>;

    /// Stores `scope` under `key`.
    async fn set(&self, key: &str, scope: Scope);
}

/// Returns the cached scope for `key`, or computes and caches it.
///
/// Errors from `compute` are returned untouched and nothing is cached.
pub async fn get_or_compute<F, Fut>(cache: &dyn ScopeCache, key: &str, compute: F) -> StoreResult<Scope>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = StoreResult<Scope>>,
{
    if let Some(scope) = cache.get(key).await {
        trace!(key, scope = %scope, "Scope cache hit");
        return Ok(scope);
    }

    let scope = compute().await?;
    cache.set(key, scope).await;
    trace!(key, scope = %scope, "Scope cache filled");
    Ok(scope)
}

/// A cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl ScopeCache for NoCache {
    async fn get(&self, _key: &str) -> Option<Scope> {
        None
    }

    async fn set(&self, _key: &str, _scope: Scope) {}
}

/// An unbounded in-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Scope>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached scopes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ScopeCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Scope> {
        self.entries.get(key).map(|entry| *entry.value())
    }

    async fn set(&self, key: &str, scope: Scope) {
        self.entries.insert(key.to_string(), scope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::StoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_hit_skips_compute() {
        let cache = MemoryCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let scope = get_or_compute(&cache, "scope:irc:place:#a", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Scope(7))
            })
            .await
            .unwrap();
            assert_eq!(scope, Scope(7));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = MemoryCache::new();

        let err = get_or_compute(&cache, "k", || async { Err(StoreError::Closed) }).await;
        assert!(matches!(err, Err(StoreError::Closed)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_no_cache_always_computes() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        for _ in 0..2 {
            get_or_compute(&NoCache, "k", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Scope(1))
            })
            .await
            .unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
