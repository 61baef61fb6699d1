//! Runtime error types.

use chime_core::StoreError;
use chime_framework::{PrefixError, TreeError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while building or running the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The storage backend could not be opened.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The command declarations are inconsistent.
    #[error("Invalid command tree: {0}")]
    Tree(#[from] TreeError),

    /// The default prefixes are invalid.
    #[error("Invalid default prefixes: {0}")]
    Prefixes(#[from] PrefixError),

    /// The event loop task panicked.
    #[error("Event loop failed: {0}")]
    EventLoop(#[from] tokio::task::JoinError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
