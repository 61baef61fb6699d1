//! Identity resolution.
//!
//! [`IdentityResolver`] turns frontend handles into [`Scope`]s. Every lookup
//! goes through the [`ScopeCache`] first and falls back to the store's
//! get-or-create. Storage errors are propagated as-is.
//!
//! Places resolve at two granularities:
//!
//! ```text
//! Discord guild 10 ─┬─ channel 100   exact = scope(channel 100), logical = scope(guild 10)
//!                   └─ channel 101   exact = scope(channel 101), logical = scope(guild 10)
//! IRC #chat           exact = logical = scope(#chat)
//! ```
//!
//! The `here_*` methods additionally honour [`Teleports`]: an operator who
//! teleported somewhere resolves to that place instead of the real one.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::foundation::error::StoreResult;
use crate::foundation::message::{Message, Personifier, Placer};
use crate::foundation::scope::{Place, Scope, ScopeKey};
use crate::integration::cache::{NoCache, ScopeCache, get_or_compute};
use crate::integration::store::ScopeStore;
use crate::integration::teleport::Teleports;

/// Resolves people and places to scopes.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn ScopeStore>,
    cache: Arc<dyn ScopeCache>,
    teleports: Teleports,
}

impl IdentityResolver {
    /// Creates a resolver without a cache.
    pub fn new(store: Arc<dyn ScopeStore>) -> Self {
        Self::with_cache(store, Arc::new(NoCache))
    }

    /// Creates a resolver with a cache tier.
    pub fn with_cache(store: Arc<dyn ScopeStore>, cache: Arc<dyn ScopeCache>) -> Self {
        Self {
            store,
            cache,
            teleports: Teleports::new(),
        }
    }

    /// Returns the teleport overrides consulted by the `here_*` methods.
    pub fn teleports(&self) -> &Teleports {
        &self.teleports
    }

    /// Resolves a natural key, creating the scope on first sight.
    pub async fn resolve(&self, key: &ScopeKey) -> StoreResult<Scope> {
        let cache_key = key.cache_key();
        get_or_compute(self.cache.as_ref(), &cache_key, || {
            self.store.scope_get_or_create(key)
        })
        .await
    }

    /// Returns the key a scope was created for.
    pub async fn scope_key(&self, scope: Scope) -> StoreResult<Option<ScopeKey>> {
        self.store.scope_key(scope).await
    }

    /// Resolves a person.
    pub async fn person(&self, person: &dyn Personifier) -> StoreResult<Scope> {
        self.resolve(&person.scope_key()).await
    }

    /// Resolves the literal origin of a place.
    pub async fn place_exact(&self, place: &dyn Placer) -> StoreResult<Scope> {
        self.resolve(&place.exact_key()).await
    }

    /// Resolves the broader context of a place.
    pub async fn place_logical(&self, place: &dyn Placer) -> StoreResult<Scope> {
        self.resolve(&place.logical_key()).await
    }

    /// Resolves a place at both granularities.
    pub async fn place(&self, place: &dyn Placer) -> StoreResult<Place> {
        let exact = self.place_exact(place).await?;
        let logical = if place.id_logical() == place.id_exact() {
            exact
        } else {
            self.place_logical(place).await?
        };
        Ok(Place::new(exact, logical))
    }

    /// Resolves where a message effectively comes from, honouring the
    /// author's teleport override.
    pub async fn here(&self, message: &Message) -> StoreResult<Place> {
        if let Some(place) = self.teleported(message).await? {
            return Ok(place);
        }
        self.place(message.here.as_ref()).await
    }

    /// Like [`here`](Self::here), exact granularity only.
    pub async fn here_exact(&self, message: &Message) -> StoreResult<Scope> {
        if let Some(place) = self.teleported(message).await? {
            return Ok(place.exact);
        }
        self.place_exact(message.here.as_ref()).await
    }

    /// Like [`here`](Self::here), logical granularity only.
    pub async fn here_logical(&self, message: &Message) -> StoreResult<Scope> {
        if let Some(place) = self.teleported(message).await? {
            return Ok(place.logical);
        }
        self.place_logical(message.here.as_ref()).await
    }

    async fn teleported(&self, message: &Message) -> StoreResult<Option<Place>> {
        // Skip resolving the author when nobody is teleported.
        if self.teleports.is_empty() {
            return Ok(None);
        }
        let author = self.person(message.author.as_ref()).await?;
        let place = self.teleports.get(author);
        if let Some(place) = place {
            debug!(person = %author, place = %place, "Applying teleport override");
        }
        Ok(place)
    }
}

impl fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("teleports", &self.teleports.len())
            .finish()
    }
}
