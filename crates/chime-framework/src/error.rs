//! Error types for the chime framework.

use chime_core::{CommandType, StoreError};
use thiserror::Error;

// =============================================================================
// Tree Errors
// =============================================================================

/// Invalid command declarations, detected when the tree is built.
///
/// These are programming errors. The runtime refuses to start on any of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A command was declared without any name.
    #[error("command '{description}' has no names")]
    NoNames {
        /// Description of the offending command, to help find it.
        description: String,
    },

    /// A name is empty, contains whitespace or uppercase characters.
    #[error("invalid command name '{name}': names must be non-empty lowercase words")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// Two commands of the same type share an alias at the same tree level.
    #[error("duplicate {kind} command alias '{name}' under '{parent}'")]
    DuplicateAlias {
        /// Command type of both commands.
        kind: CommandType,
        /// The alias declared twice.
        name: String,
        /// Path of the parent, or `<root>`.
        parent: String,
    },

    /// A command declares a type different from its parent's.
    #[error("command '{name}' is declared {child} but its parent is {parent}")]
    TypeMismatch {
        /// Canonical name of the child.
        name: String,
        /// Parent type.
        parent: CommandType,
        /// Declared child type.
        child: CommandType,
    },
}

// =============================================================================
// Match Errors
// =============================================================================

/// Errors returned by the command matcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No permitted root command of the requested type has that name.
    #[error("command '{0}' not found")]
    CommandNotFound(String),
}

// =============================================================================
// Prefix Errors
// =============================================================================

/// Errors returned by the prefix registry.
///
/// Everything but [`Store`](Self::Store) is a user error.
#[derive(Debug, Error)]
pub enum PrefixError {
    /// The literal is already used in this place.
    #[error("prefix '{prefix}' already exists as a {kind} prefix")]
    AlreadyExists {
        /// The literal.
        prefix: String,
        /// Type it is currently bound to.
        kind: CommandType,
    },

    /// No prefix of that type has this literal.
    #[error("prefix '{0}' not found")]
    NotFound(String),

    /// Deleting would leave the place without prefixes of this type.
    #[error("prefix '{prefix}' is the only {kind} prefix left")]
    OnlyOneLeft {
        /// The literal.
        prefix: String,
        /// Its type.
        kind: CommandType,
    },

    /// Admin prefixes are process-wide and cannot be changed per place.
    #[error("admin prefixes cannot be changed per place")]
    AdminImmutable,

    /// A prefix cannot be the empty string.
    #[error("prefix cannot be empty")]
    Empty,

    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PrefixError {
    /// Returns whether this error was caused by the user rather than the system.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Result type for prefix operations.
pub type PrefixResult<T> = Result<T, PrefixError>;

// =============================================================================
// Parse Errors
// =============================================================================

/// Reasons a message did not turn into a command invocation.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The message has no tokens.
    #[error("empty message")]
    Empty,

    /// The first token does not start with any prefix of the place.
    #[error("no prefix matched '{0}'")]
    NoPrefix(String),

    /// A prefix matched but no command did.
    #[error(transparent)]
    NoCommand(#[from] MatchError),

    /// Prefixes could not be loaded.
    #[error("failed to load prefixes: {0}")]
    Prefixes(#[from] PrefixError),

    /// The place could not be resolved.
    #[error("failed to resolve place: {0}")]
    Store(#[from] StoreError),
}

impl ParseError {
    /// Returns whether the message simply is not a command.
    ///
    /// Misses are silent; anything else is a system failure.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Empty | Self::NoPrefix(_) | Self::NoCommand(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_error_classes() {
        assert!(PrefixError::Empty.is_user_error());
        assert!(PrefixError::NotFound("?".into()).is_user_error());
        assert!(!PrefixError::Store(StoreError::Closed).is_user_error());
    }

    #[test]
    fn test_parse_error_misses() {
        assert!(ParseError::Empty.is_miss());
        assert!(ParseError::NoCommand(MatchError::CommandNotFound("x".into())).is_miss());
        assert!(!ParseError::Store(StoreError::Closed).is_miss());
    }
}
