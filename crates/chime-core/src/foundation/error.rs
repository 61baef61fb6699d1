//! Error types shared across the chime layers.
//!
//! Framework-level errors (matching, prefixes, tree validation) live in
//! `chime-framework`; this module only covers what the core itself produces.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors returned by a storage backend.
///
/// Storage errors are always propagated to the caller. The core never swallows
/// them or substitutes a sentinel scope.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed to execute a query.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A stored value could not be decoded.
    #[error("corrupt stored value: {0}")]
    Corrupt(String),

    /// The store has been closed.
    #[error("storage is closed")]
    Closed,
}

impl StoreError {
    /// Wraps any backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    /// Creates a corrupt value error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Send Errors
// =============================================================================

/// Errors a frontend messenger reports when delivering a reply.
#[derive(Debug, Clone, Error)]
pub enum SendError {
    /// The frontend is not connected.
    #[error("frontend is not connected")]
    NotConnected,

    /// Delivery failed.
    #[error("failed to send message: {0}")]
    Failed(String),
}

impl SendError {
    /// Creates a delivery failure.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

// =============================================================================
// User Errors
// =============================================================================

/// A user-induced ("soft") error.
///
/// Soft errors are expected outcomes of a command's business rules, such as
/// missing arguments or an unknown name. They travel alongside a successful
/// reply so the frontend can render them differently, and are never logged as
/// failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserError(Cow<'static, str>);

impl UserError {
    /// Not enough arguments were provided.
    pub const MISSING_ARGS: UserError = UserError::from_static("not enough arguments provided");

    /// The requested thing does not exist.
    pub const NOT_FOUND: UserError = UserError::from_static("not found");

    /// Carries no message. Frontends use it to style generic failure notices.
    pub const GENERIC: UserError = UserError::from_static("");

    /// Creates a user error from a static message.
    pub const fn from_static(msg: &'static str) -> Self {
        Self(Cow::Borrowed(msg))
    }

    /// Creates a user error from any message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(Cow::Owned(msg.into()))
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UserError {}
