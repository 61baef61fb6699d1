//! Commands every bot ships with.
//!
//! | Type     | Command                 | Purpose                          |
//! |----------|-------------------------|----------------------------------|
//! | Normal   | `prefix`                | manage Normal prefixes           |
//! | Advanced | `prefix`                | manage prefixes of either type   |
//! | Advanced | `search`                | search commands                  |
//! | Admin    | `teleport`              | act from another place           |
//! | all      | `help`                  | explain a command of that type   |
//!
//! On top of that, a message consisting of [`EMERGENCY_RESET`] resets the
//! prefixes of its place. It is the way out when nobody remembers them.

pub mod help;
pub mod prefix;
pub mod search;
pub mod teleport;

use std::sync::Arc;

use chime_core::{CommandType, EventHooks, HookId, Message, Reply};
use tracing::{error, info};

use crate::command::TreeBuilder;
use crate::services::Services;

/// Resets the prefixes of the place it is sent in.
pub const EMERGENCY_RESET: &str = "!!!PleaseResetThePrefixesBackToTheDefaultsThanks!!!";

/// Registers the builtin commands.
pub fn register(builder: &mut TreeBuilder) {
    builder
        .register(CommandType::Normal, prefix::normal())
        .register(CommandType::Advanced, prefix::advanced())
        .register(CommandType::Advanced, search::advanced())
        .register(CommandType::Admin, teleport::admin());

    for kind in CommandType::ALL {
        builder.register(kind, help::command());
    }
}

/// Registers the emergency prefix reset as a message hook.
pub fn register_hooks(hooks: &EventHooks, services: Arc<Services>) -> HookId {
    hooks.message.register(move |message: Arc<Message>| {
        let services = Arc::clone(&services);
        async move {
            if message.raw.trim() != EMERGENCY_RESET {
                return;
            }
            if let Err(e) = emergency_reset(&services, &message).await {
                error!(error = format!("{e:#}"), "Emergency prefix reset failed");
            }
        }
    })
}

async fn emergency_reset(services: &Services, message: &Message) -> anyhow::Result<()> {
    let place = services.resolver().here_logical(message).await?;
    let removed = services.prefixes().reset(place).await?;
    info!(place = %place, removed, "Emergency prefix reset");

    let reply = Reply::text(prefix::reset_reply(services, CommandType::Normal));
    message.write(&reply, None).await?;
    Ok(())
}
