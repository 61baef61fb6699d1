//! The prefix registry.
//!
//! Every place has its own Normal and Advanced prefixes. A place that never
//! customized them uses the process-wide defaults. Admin prefixes are always
//! the process-wide ones and cannot be changed per place.
//!
//! Mutations copy the defaults into storage before touching anything, so a
//! later edit never resurrects a default the place had deleted. Writes to the
//! same place are serialized; different places proceed concurrently.
//!
//! # Matching
//!
//! [`PrefixList::match_token`] returns the first prefix the token strictly
//! starts with. Lists are ordered by descending length (stable, so prefixes
//! of equal length keep their stored order), which makes the longest prefix
//! win: with `!` and `!!` both defined, `!!ping` is matched by `!!`.

use std::collections::HashSet;
use std::sync::Arc;

use chime_core::{CommandType, Prefix, PrefixStore, Scope};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::error::{PrefixError, PrefixResult};

// =============================================================================
// Defaults
// =============================================================================

/// Process-wide prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixDefaults {
    normal: Vec<String>,
    advanced: Vec<String>,
    admin: Vec<String>,
}

impl Default for PrefixDefaults {
    fn default() -> Self {
        Self {
            normal: vec!["!".to_string()],
            advanced: vec!["$".to_string()],
            admin: vec!["##".to_string()],
        }
    }
}

impl PrefixDefaults {
    /// Creates validated defaults.
    ///
    /// Fails with [`PrefixError::Empty`] if a list or a literal is empty and
    /// with [`PrefixError::AlreadyExists`] if a literal serves two types.
    pub fn new(normal: Vec<String>, advanced: Vec<String>, admin: Vec<String>) -> PrefixResult<Self> {
        let defaults = Self {
            normal,
            advanced,
            admin,
        };

        let mut seen: HashSet<&str> = HashSet::new();
        for kind in CommandType::ALL {
            let literals = defaults.literals(kind);
            if literals.is_empty() {
                return Err(PrefixError::Empty);
            }
            for literal in literals {
                if literal.is_empty() {
                    return Err(PrefixError::Empty);
                }
                if !seen.insert(literal.as_str()) {
                    return Err(PrefixError::AlreadyExists {
                        prefix: literal.clone(),
                        kind,
                    });
                }
            }
        }

        Ok(defaults)
    }

    /// Returns the default literals of `kind`.
    pub fn literals(&self, kind: CommandType) -> &[String] {
        match kind {
            CommandType::Normal => &self.normal,
            CommandType::Advanced => &self.advanced,
            CommandType::Admin => &self.admin,
        }
    }

    /// Returns the first default literal of `kind`.
    pub fn first(&self, kind: CommandType) -> &str {
        self.literals(kind).first().map_or("", String::as_str)
    }

    fn place_scoped(&self) -> Vec<Prefix> {
        self.normal
            .iter()
            .map(|p| Prefix::new(CommandType::Normal, p.as_str()))
            .chain(
                self.advanced
                    .iter()
                    .map(|p| Prefix::new(CommandType::Advanced, p.as_str())),
            )
            .collect()
    }

    fn admin(&self) -> impl Iterator<Item = Prefix> + '_ {
        self.admin
            .iter()
            .map(|p| Prefix::new(CommandType::Admin, p.as_str()))
    }
}

// =============================================================================
// PrefixList
// =============================================================================

/// The effective prefixes of a place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixList {
    prefixes: Vec<Prefix>,
    in_store: bool,
}

impl PrefixList {
    fn new(mut prefixes: Vec<Prefix>, in_store: bool) -> Self {
        prefixes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { prefixes, in_store }
    }

    /// Returns every prefix, longest first, Admin ones included.
    pub fn all(&self) -> &[Prefix] {
        &self.prefixes
    }

    /// Returns whether the place has customized prefixes.
    pub fn in_store(&self) -> bool {
        self.in_store
    }

    /// Returns the literals of one type.
    pub fn of_type(&self, kind: CommandType) -> Vec<&str> {
        self.prefixes
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.prefix.as_str())
            .collect()
    }

    /// Returns the prefix with the given literal.
    pub fn get(&self, literal: &str) -> Option<&Prefix> {
        self.prefixes.iter().find(|p| p.prefix == literal)
    }

    /// Returns the first prefix `token` strictly starts with.
    ///
    /// A token equal to a prefix does not match: it would leave an empty
    /// command name.
    pub fn match_token(&self, token: &str) -> Option<&Prefix> {
        self.prefixes
            .iter()
            .find(|p| token != p.prefix && token.starts_with(p.prefix.as_str()))
    }
}

// =============================================================================
// PrefixRegistry
// =============================================================================

/// Per-place prefixes backed by a [`PrefixStore`].
pub struct PrefixRegistry {
    store: Arc<dyn PrefixStore>,
    defaults: PrefixDefaults,
    locks: DashMap<Scope, Arc<Mutex<()>>>,
}

impl PrefixRegistry {
    /// Creates a registry.
    pub fn new(store: Arc<dyn PrefixStore>, defaults: PrefixDefaults) -> Self {
        Self {
            store,
            defaults,
            locks: DashMap::new(),
        }
    }

    /// Returns the process-wide defaults.
    pub fn defaults(&self) -> &PrefixDefaults {
        &self.defaults
    }

    /// Returns the effective prefixes of `place`.
    ///
    /// These are the stored ones if any exist, the defaults otherwise, plus
    /// the Admin prefixes in both cases.
    pub async fn list(&self, place: Scope) -> PrefixResult<PrefixList> {
        let stored = self.store.prefix_list(place).await?;
        let in_store = !stored.is_empty();

        let mut prefixes = if in_store {
            stored
        } else {
            self.defaults.place_scoped()
        };
        prefixes.extend(self.defaults.admin());

        debug!(place = %place, in_store, count = prefixes.len(), "Listed prefixes");
        Ok(PrefixList::new(prefixes, in_store))
    }

    /// Adds a prefix to `place`.
    pub async fn add(&self, place: Scope, prefix: Prefix) -> PrefixResult<()> {
        if prefix.kind == CommandType::Admin {
            return Err(PrefixError::AdminImmutable);
        }
        if prefix.prefix.is_empty() {
            return Err(PrefixError::Empty);
        }

        let _guard = self.lock(place).await;

        let current = self.list(place).await?;
        if let Some(existing) = current.get(&prefix.prefix) {
            return Err(PrefixError::AlreadyExists {
                prefix: prefix.prefix,
                kind: existing.kind,
            });
        }

        self.materialize(place, &current).await?;
        if !self.store.prefix_insert(place, &prefix).await? {
            return Err(PrefixError::AlreadyExists {
                prefix: prefix.prefix,
                kind: prefix.kind,
            });
        }

        info!(place = %place, prefix = %prefix.prefix, kind = %prefix.kind, "Added prefix");
        Ok(())
    }

    /// Deletes a prefix of the given type from `place`.
    ///
    /// The last prefix of a type cannot be deleted.
    pub async fn delete(&self, place: Scope, kind: CommandType, literal: &str) -> PrefixResult<()> {
        if kind == CommandType::Admin {
            return Err(PrefixError::AdminImmutable);
        }

        let _guard = self.lock(place).await;

        let current = self.list(place).await?;
        let of_type = current.of_type(kind);
        if !of_type.contains(&literal) {
            return Err(PrefixError::NotFound(literal.to_string()));
        }
        if of_type.len() == 1 {
            return Err(PrefixError::OnlyOneLeft {
                prefix: literal.to_string(),
                kind,
            });
        }

        self.materialize(place, &current).await?;
        self.store.prefix_delete(place, literal).await?;

        info!(place = %place, prefix = literal, kind = %kind, "Deleted prefix");
        Ok(())
    }

    /// Drops every customization of `place`, returning to the defaults.
    pub async fn reset(&self, place: Scope) -> PrefixResult<u64> {
        let _guard = self.lock(place).await;

        let removed = self.store.prefix_reset(place).await?;
        info!(place = %place, removed, "Reset prefixes");
        Ok(removed)
    }

    async fn materialize(&self, place: Scope, current: &PrefixList) -> PrefixResult<()> {
        if current.in_store() {
            return Ok(());
        }
        debug!(place = %place, "Copying default prefixes into storage");
        self.store
            .prefix_insert_many(place, &self.defaults.place_scoped())
            .await?;
        Ok(())
    }

    async fn lock(&self, place: Scope) -> PlaceGuard<'_> {
        let lock = Arc::clone(self.locks.entry(place).or_default().value());
        PlaceGuard {
            locks: &self.locks,
            place,
            guard: Some(lock.lock_owned().await),
        }
    }
}

/// Serializes writes to one place. The place's lock leaves the map when the
/// last holder or waiter is gone.
struct PlaceGuard<'a> {
    locks: &'a DashMap<Scope, Arc<Mutex<()>>>,
    place: Scope,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PlaceGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone, so a count of one means only the map
        // is left. Cloning needs the shard lock `remove_if` holds.
        self.locks
            .remove_if(&self.place, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl std::fmt::Debug for PrefixRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixRegistry")
            .field("defaults", &self.defaults)
            .field("locked_places", &self.locks.len())
            .finish()
    }
}
