//! In-process storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::foundation::error::StoreResult;
use crate::foundation::prefix::Prefix;
use crate::foundation::scope::{Scope, ScopeKey};
use crate::integration::store::{PrefixStore, ScopeStore};

#[derive(Default)]
struct Inner {
    scopes: HashMap<ScopeKey, Scope>,
    // keys[n] is the key of Scope(n + 1)
    keys: Vec<ScopeKey>,
    prefixes: HashMap<Scope, Vec<Prefix>>,
}

/// A [`ScopeStore`] and [`PrefixStore`] kept entirely in memory.
///
/// Scopes are numbered from 1 in creation order. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many scopes have been created.
    pub fn scope_count(&self) -> usize {
        self.inner.lock().keys.len()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryStore")
            .field("scopes", &inner.keys.len())
            .field("places_with_prefixes", &inner.prefixes.len())
            .finish()
    }
}

#[async_trait]
impl ScopeStore for MemoryStore {
    async fn scope_get_or_create(&self, key: &ScopeKey) -> StoreResult<Scope> {
        let mut inner = self.inner.lock();
        if let Some(scope) = inner.scopes.get(key) {
            return Ok(*scope);
        }

        inner.keys.push(key.clone());
        let scope = Scope(inner.keys.len() as i64);
        inner.scopes.insert(key.clone(), scope);
        trace!(key = %key, scope = %scope, "Created scope");
        Ok(scope)
    }

    async fn scope_key(&self, scope: Scope) -> StoreResult<Option<ScopeKey>> {
        let index = match usize::try_from(scope.get()) {
            Ok(n) if n > 0 => n - 1,
            _ => return Ok(None),
        };
        Ok(self.inner.lock().keys.get(index).cloned())
    }
}

#[async_trait]
impl PrefixStore for MemoryStore {
    async fn prefix_list(&self, place: Scope) -> StoreResult<Vec<Prefix>> {
        Ok(self
            .inner
            .lock()
            .prefixes
            .get(&place)
            .cloned()
            .unwrap_or_default())
    }

    async fn prefix_insert(&self, place: Scope, prefix: &Prefix) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        let rows = inner.prefixes.entry(place).or_default();
        if rows.iter().any(|p| p.prefix == prefix.prefix) {
            return Ok(false);
        }
        rows.push(prefix.clone());
        Ok(true)
    }

    async fn prefix_insert_many(&self, place: Scope, prefixes: &[Prefix]) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let rows = inner.prefixes.entry(place).or_default();
        for prefix in prefixes {
            if !rows.iter().any(|p| p.prefix == prefix.prefix) {
                rows.push(prefix.clone());
            }
        }
        Ok(())
    }

    async fn prefix_delete(&self, place: Scope, literal: &str) -> StoreResult<Option<Prefix>> {
        let mut inner = self.inner.lock();
        let Some(rows) = inner.prefixes.get_mut(&place) else {
            return Ok(None);
        };
        let removed = rows
            .iter()
            .position(|p| p.prefix == literal)
            .map(|index| rows.remove(index));
        if rows.is_empty() {
            inner.prefixes.remove(&place);
        }
        Ok(removed)
    }

    async fn prefix_reset(&self, place: Scope) -> StoreResult<u64> {
        Ok(self
            .inner
            .lock()
            .prefixes
            .remove(&place)
            .map_or(0, |rows| rows.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::prefix::CommandType;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let key = ScopeKey::place("irc", "#chan");

        let a = store.scope_get_or_create(&key).await.unwrap();
        let b = store.scope_get_or_create(&key).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.scope_count(), 1);

        let person = store
            .scope_get_or_create(&ScopeKey::person("irc", "#chan"))
            .await
            .unwrap();
        assert_ne!(a, person);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_sight() {
        let store = Arc::new(MemoryStore::new());
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store
                    .scope_get_or_create(&ScopeKey::person("discord", "1234"))
                    .await
                    .unwrap()
            }));
        }

        let mut scopes = Vec::new();
        for task in tasks {
            scopes.push(task.await.unwrap());
        }
        scopes.dedup();
        assert_eq!(scopes.len(), 1);
        assert_eq!(store.scope_count(), 1);
    }

    #[tokio::test]
    async fn test_scope_key_reverse_lookup() {
        let store = MemoryStore::new();
        let key = ScopeKey::person("twitch", "streamer");
        let scope = store.scope_get_or_create(&key).await.unwrap();

        assert_eq!(store.scope_key(scope).await.unwrap(), Some(key));
        assert_eq!(store.scope_key(Scope(0)).await.unwrap(), None);
        assert_eq!(store.scope_key(Scope(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prefix_rows_keep_insertion_order() {
        let store = MemoryStore::new();
        let place = Scope(1);

        assert!(store.prefix_list(place).await.unwrap().is_empty());
        store
            .prefix_insert_many(
                place,
                &[
                    Prefix::new(CommandType::Normal, "!"),
                    Prefix::new(CommandType::Advanced, "$"),
                ],
            )
            .await
            .unwrap();

        assert!(store.prefix_insert(place, &Prefix::new(CommandType::Normal, "?")).await.unwrap());
        assert!(!store.prefix_insert(place, &Prefix::new(CommandType::Normal, "$")).await.unwrap());

        let literals: Vec<_> = store
            .prefix_list(place)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.prefix)
            .collect();
        assert_eq!(literals, vec!["!", "$", "?"]);

        let removed = store.prefix_delete(place, "$").await.unwrap();
        assert_eq!(removed.map(|p| p.kind), Some(CommandType::Advanced));
        assert_eq!(store.prefix_reset(place).await.unwrap(), 2);
        assert!(store.prefix_list(place).await.unwrap().is_empty());
    }
}
