//! chime Runtime - orchestration layer for the chime chat-command bot.
//!
//! This crate provides:
//! - Configuration loading with figment (`config`)
//! - Logging setup on `tracing-subscriber` (`logging`)
//! - The SQLite storage backend (`store`)
//! - [`ChimeRuntime`], which wires everything and drives the event loop
//!
//! ```rust,ignore
//! use chime_runtime::ChimeRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ChimeRuntime::builder().build().await?;
//!
//!     // Frontends push messages through the sender.
//!     let sender = runtime.sender();
//!     tokio::spawn(my_frontend(sender));
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod store;

pub use config::{ChimeConfig, ConfigError, ConfigLoader, ConfigResult};
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::{ChimeRuntime, RuntimeBuilder};
pub use store::{Backend, SqliteStore};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
