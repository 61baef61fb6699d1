//! Storage contracts.
//!
//! The core only needs get-or-create for scopes and list/insert/delete for
//! prefixes. Any engine can satisfy these; `chime-runtime` ships a SQLite
//! one and [`MemoryStore`](crate::integration::memory::MemoryStore) keeps
//! everything in process.

use async_trait::async_trait;

use crate::foundation::error::StoreResult;
use crate::foundation::prefix::Prefix;
use crate::foundation::scope::{Scope, ScopeKey};

// ─── ScopeStore ───────────────────────────────────────────────────────────────

/// Maps natural keys to scopes.
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Returns the scope for `key`, creating it on first sight.
    ///
    /// Concurrent calls for the same key must all return the same scope.
    async fn scope_get_or_create(&self, key: &ScopeKey) -> StoreResult<Scope>;

    /// Returns the key a scope was created for, if it exists.
    async fn scope_key(&self, scope: Scope) -> StoreResult<Option<ScopeKey>>;
}

// ─── PrefixStore ──────────────────────────────────────────────────────────────

/// Per-place prefix rows.
///
/// Stores enforce uniqueness of the literal within a place. Higher level
/// rules (at least one prefix left, defaults materialization) belong to the
/// prefix registry.
#[async_trait]
pub trait PrefixStore: Send + Sync {
    /// Returns the stored prefixes of `place` in insertion order.
    ///
    /// An empty list means the place never customized its prefixes.
    async fn prefix_list(&self, place: Scope) -> StoreResult<Vec<Prefix>>;

    /// Inserts a prefix. Returns `false` if the literal is already stored
    /// for `place`, whatever its type.
    async fn prefix_insert(&self, place: Scope, prefix: &Prefix) -> StoreResult<bool>;

    /// Inserts many prefixes atomically, skipping literals already present.
    async fn prefix_insert_many(&self, place: Scope, prefixes: &[Prefix]) -> StoreResult<()>;

    /// Deletes the prefix with the given literal, returning it if it existed.
    async fn prefix_delete(&self, place: Scope, literal: &str) -> StoreResult<Option<Prefix>>;

    /// Deletes every prefix of `place`, returning how many were removed.
    async fn prefix_reset(&self, place: Scope) -> StoreResult<u64>;
}

/// A backend serving both scopes and prefixes.
pub trait Store: ScopeStore + PrefixStore {}

impl<T: ScopeStore + PrefixStore> Store for T {}
