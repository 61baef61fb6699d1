//! Teleport overrides.
//!
//! An operator can "teleport" to another place and run commands as if they
//! were there. Overrides live only in memory and are lost on restart.

use std::sync::Arc;

use dashmap::DashMap;

use crate::foundation::scope::{Place, Scope};

/// Concurrent map from a person to the place they are teleported to.
///
/// Cloning is cheap and every clone shares the same overrides.
#[derive(Debug, Clone, Default)]
pub struct Teleports {
    overrides: Arc<DashMap<Scope, Place>>,
}

impl Teleports {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Teleports `person` to `place`, returning the previous override.
    pub fn set(&self, person: Scope, place: Place) -> Option<Place> {
        self.overrides.insert(person, place)
    }

    /// Returns the override for `person`.
    pub fn get(&self, person: Scope) -> Option<Place> {
        self.overrides.get(&person).map(|entry| *entry.value())
    }

    /// Removes the override for `person`, returning it.
    pub fn remove(&self, person: Scope) -> Option<Place> {
        self.overrides.remove(&person).map(|(_, place)| place)
    }

    /// Returns whether nobody is teleported.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Returns the number of active overrides.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }
}
