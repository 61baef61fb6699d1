//! # Chime Framework
//!
//! The command layer of the chime chat-command bot.
//!
//! This layer provides:
//! - Declarative commands and the validated [`CommandTree`] built from them
//! - The per-place [`PrefixRegistry`] with process-wide defaults
//! - The [`Pipeline`] that turns messages into command executions
//! - Builtin commands for prefixes, help, search and teleporting
//!
//! ```rust,ignore
//! use chime_framework::prelude::*;
//!
//! let mut builder = CommandTree::builder();
//! builtin::register(&mut builder);
//! builder.register(
//!     CommandType::Normal,
//!     Command::with_names(["ping", "p"])
//!         .description("Check that the bot is alive.")
//!         .action(|_| async { Ok(Outcome::text("pong")) }),
//! );
//! let tree = builder.build()?;
//! ```

pub mod builtin;
pub mod command;
pub mod error;
pub mod pipeline;
pub mod prefix;
pub mod services;

#[cfg(test)]
mod testing;

pub use command::{
    ActionFn, Category, Command, CommandContext, CommandId, CommandNode, CommandTree, Invocation,
    Matched, Outcome, PermitFn, TreeBuilder, aliases,
};
pub use error::{MatchError, ParseError, PrefixError, PrefixResult, TreeError};
pub use pipeline::{Dispatch, FAILURE_NOTICE, Pipeline, Stage};
pub use prefix::{PrefixDefaults, PrefixList, PrefixRegistry};
pub use services::{Operators, Services};

/// The names most command modules need.
pub mod prelude {
    pub use crate::builtin;
    pub use crate::command::{Category, Command, CommandContext, CommandTree, Outcome, aliases};
    pub use chime_core::{CommandType, Reply, UserError};
}
