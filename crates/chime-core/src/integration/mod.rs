//! Integration layer - storage, caching and identity resolution.
//!
//! - [`ScopeStore`] / [`PrefixStore`]: what a storage backend must provide
//! - [`MemoryStore`]: in-process backend
//! - [`ScopeCache`]: optional cache tier ([`NoCache`], [`MemoryCache`])
//! - [`IdentityResolver`]: handles to scopes, with [`Teleports`] applied

pub mod cache;
pub mod identity;
pub mod memory;
pub mod store;
pub mod teleport;

pub use cache::{MemoryCache, NoCache, ScopeCache, get_or_compute};
pub use identity::IdentityResolver;
pub use memory::MemoryStore;
pub use store::{PrefixStore, ScopeStore, Store};
pub use teleport::Teleports;
