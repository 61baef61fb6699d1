//! Stable internal identities for the people and places the bot sees.
//!
//! Every frontend has its own notion of "who" and "where". A [`Scope`] is the
//! bot's own identifier for one of those, independent of the frontend it was
//! first seen on. Scopes are created lazily the first time a native identifier
//! is resolved and never change afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, persistent identity for a Person or a Place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(pub i64);

impl Scope {
    /// Returns the raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Scope {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Which kind of entity a scope stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// A message author or a referenced user.
    Person,
    /// A channel, a community, a DM, etc.
    Place,
}

impl ScopeKind {
    /// Returns the name used in storage and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Place => "place",
        }
    }

    /// Parses the storage name back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "person" => Some(Self::Person),
            "place" => Some(Self::Place),
            _ => None,
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The natural key a scope is created for: `(frontend, kind, native id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    /// Name of the frontend the identifier comes from (e.g. `"discord"`).
    pub frontend: String,
    /// Person or Place.
    pub kind: ScopeKind,
    /// The frontend's own identifier.
    pub native_id: String,
}

impl ScopeKey {
    /// Creates a new key.
    pub fn new(frontend: impl Into<String>, kind: ScopeKind, native_id: impl Into<String>) -> Self {
        Self {
            frontend: frontend.into(),
            kind,
            native_id: native_id.into(),
        }
    }

    /// Creates a person key.
    pub fn person(frontend: impl Into<String>, native_id: impl Into<String>) -> Self {
        Self::new(frontend, ScopeKind::Person, native_id)
    }

    /// Creates a place key.
    pub fn place(frontend: impl Into<String>, native_id: impl Into<String>) -> Self {
        Self::new(frontend, ScopeKind::Place, native_id)
    }

    /// Returns a globally unique cache key for this identity.
    pub fn cache_key(&self) -> String {
        format!("scope:{}:{}:{}", self.frontend, self.kind, self.native_id)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.frontend, self.kind, self.native_id)
    }
}

/// A place resolved at both granularities.
///
/// The exact scope is the literal origin of a message (a specific channel).
/// The logical scope is where settings are expected to apply (the community
/// the channel belongs to). When no broader context exists both are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Place {
    /// The literal origin.
    pub exact: Scope,
    /// The broader context.
    pub logical: Scope,
}

impl Place {
    /// Creates a place from both granularities.
    pub fn new(exact: Scope, logical: Scope) -> Self {
        Self { exact, logical }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exact={} logical={}", self.exact, self.logical)
    }
}
