//! # chime
//!
//! A chat-command bot framework. Frontends (Discord, Twitch, a console...)
//! hand raw messages to chime; chime finds the prefix configured for the
//! place the message came from, matches a typed command tree and replies
//! through the frontend.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐     ┌───────────┐     ┌───────┐     ┌──────────┐     ┌──────────────┐
//! │ Frontend │────▶│ EventLoop │────▶│ Hooks │────▶│ Pipeline │────▶│ Command tree │
//! └──────────┘     └───────────┘     └───────┘     └──────────┘     └──────────────┘
//!       ▲                                               │
//!       └──────────────────── reply ────────────────────┘
//! ```
//!
//! - **Core**: scopes, frontend handle traits, storage contracts, the event loop
//! - **Framework**: command tree, prefix registry, pipeline, builtin commands
//! - **Runtime**: configuration, logging, SQLite storage, orchestration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ChimeRuntime::builder()
//!         .command(
//!             CommandType::Normal,
//!             Command::with_names(["ping", "p"])
//!                 .description("Check that the bot is alive.")
//!                 .action(|_| async { Ok(Outcome::text("pong")) }),
//!         )
//!         .build()
//!         .await?;
//!
//!     let sender = runtime.sender();
//!     tokio::spawn(my_frontend(sender));
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use chime_core as core;
pub use chime_framework as framework;
pub use chime_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use chime::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use chime_runtime::{ChimeConfig, ChimeRuntime, RuntimeBuilder};

    // Commands
    pub use chime_framework::{
        Category, Command, CommandContext, CommandTree, Dispatch, Outcome, Pipeline, aliases,
        builtin,
    };

    // Frontend integration
    pub use chime_core::{
        CommandType, EventHooks, EventSender, Message, Messenger, Personifier, Place, Placer,
        Reply, Scope, SendError, UserError, async_trait,
    };

    // Logging macros
    pub use chime_runtime::prelude::*;
}
