//! Foundation layer - Core abstractions and type system.
//!
//! This module contains the fundamental building blocks of chime:
//! - Scopes: stable identities for people and places
//! - Command types and prefixes
//! - Message abstractions for cross-frontend communication
//! - Shared error types

pub mod error;
pub mod message;
pub mod prefix;
pub mod scope;

pub use error::{SendError, StoreError, StoreResult, UserError};
pub use message::{Message, Messenger, Personifier, Placer, Reply};
pub use prefix::{CommandType, Prefix, TypeMask};
pub use scope::{Place, Scope, ScopeKey, ScopeKind};
