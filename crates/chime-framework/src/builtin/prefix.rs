//! Prefix management commands.
//!
//! ```text
//! !prefix add <prefix>              (Normal prefixes only)
//! !prefix delete <prefix>
//! !prefix list                   (Normal prefixes)
//! !prefix reset
//!
//! $prefix normal add <prefix>       (either type)
//! $prefix advanced delete <prefix>
//! $prefix advanced list            (Advanced prefixes)
//! $prefix reset
//! ```

use chime_core::{CommandType, Prefix, Reply, UserError};

use crate::command::{Command, CommandContext, Outcome, aliases};
use crate::error::PrefixError;

const EXISTS: UserError = UserError::from_static("prefix exists already");
const ONLY_ONE_LEFT: UserError = UserError::from_static("can't delete the last prefix");

/// `prefix` for the Normal tree. Manages Normal prefixes.
pub fn normal() -> Command {
    Command::new("prefix")
        .description("Add, delete, list or reset prefixes.")
        .usage_of_children()
        .child(add(CommandType::Normal))
        .child(delete(CommandType::Normal))
        .child(list(CommandType::Normal))
        .child(reset())
}

/// `prefix` for the Advanced tree. Manages prefixes of both types.
pub fn advanced() -> Command {
    Command::new("prefix")
        .description("Manage the normal and advanced prefixes of this place.")
        .usage_of_children()
        .child(typed("normal", CommandType::Normal))
        .child(typed("advanced", CommandType::Advanced))
        .child(reset())
}

fn typed(name: &str, kind: CommandType) -> Command {
    Command::new(name)
        .description(format!("Manage {name} prefixes."))
        .usage_of_children()
        .child(add(kind))
        .child(delete(kind))
        .child(list(kind))
}

fn add(kind: CommandType) -> Command {
    Command::with_names(aliases::ADD)
        .description("Add a prefix.")
        .usage("<prefix>")
        .action(move |ctx| async move {
            let Some(literal) = ctx.arg(0).map(str::to_string) else {
                return Ok(ctx.missing_args());
            };
            let place = ctx.here_logical().await?;

            match ctx
                .services()
                .prefixes()
                .add(place, Prefix::new(kind, literal.as_str()))
                .await
            {
                Ok(()) => Ok(Outcome::text(format!("Added prefix {literal}"))),
                Err(PrefixError::AlreadyExists { .. }) => Ok(Outcome::user_error(
                    Reply::text(format!("Prefix {literal} already exists.")),
                    EXISTS,
                )),
                Err(e) => refuse(e),
            }
        })
}

fn delete(kind: CommandType) -> Command {
    Command::with_names(aliases::DELETE)
        .description("Delete a prefix.")
        .usage("<prefix>")
        .action(move |ctx| async move {
            let Some(literal) = ctx.arg(0).map(str::to_string) else {
                return Ok(ctx.missing_args());
            };
            let place = ctx.here_logical().await?;

            match ctx.services().prefixes().delete(place, kind, &literal).await {
                Ok(()) => Ok(Outcome::text(format!("Deleted prefix {literal}"))),
                Err(PrefixError::NotFound(_)) => Ok(Outcome::user_error(
                    Reply::text(format!("Prefix {literal} doesn't exist.")),
                    UserError::NOT_FOUND,
                )),
                Err(PrefixError::OnlyOneLeft { .. }) => Ok(Outcome::user_error(
                    Reply::text(format!(
                        "Can't delete, {literal} is the only prefix left. \
                         If you wish to reset to the default prefixes run: {}",
                        reset_hint(&ctx)
                    )),
                    ONLY_ONE_LEFT,
                )),
                Err(e) => refuse(e),
            }
        })
}

fn list(kind: CommandType) -> Command {
    Command::with_names(aliases::LIST)
        .description("List the prefixes of this place.")
        .action(move |ctx| async move {
            let place = ctx.here_logical().await?;
            let prefixes = ctx.services().prefixes().list(place).await?;

            let items = prefixes
                .of_type(kind)
                .into_iter()
                .map(str::to_string)
                .collect();
            Ok(Outcome::reply(Reply::List {
                title: "Prefixes".to_string(),
                items,
            }))
        })
}

fn reset() -> Command {
    Command::new("reset")
        .description("Go back to the default prefixes.")
        .action(|ctx| async move {
            let place = ctx.here_logical().await?;
            ctx.services().prefixes().reset(place).await?;
            Ok(Outcome::text(reset_reply(ctx.services(), ctx.invocation().kind)))
        })
}

/// The reply to a successful reset, pointing at the list command of `kind`
/// as reachable through the default prefixes.
pub(crate) fn reset_reply(services: &crate::services::Services, kind: CommandType) -> String {
    let path: &[&str] = match kind {
        CommandType::Advanced => &["prefix", "normal", "list"],
        _ => &["prefix", "list"],
    };
    let prefix = services.prefixes().defaults().first(kind);
    let hint = services
        .tree()
        .find(kind, path)
        .map(|id| services.tree().format(id, prefix))
        .unwrap_or_default();

    format!(
        "Prefixes have been reset. To view the list of the currently available prefixes run: {hint}"
    )
}

fn reset_hint(ctx: &CommandContext) -> String {
    let tree = ctx.services().tree();
    tree.find(ctx.invocation().kind, &["prefix", "reset"])
        .map(|id| tree.format(id, ctx.prefix()))
        .unwrap_or_default()
}

fn refuse(e: PrefixError) -> anyhow::Result<Outcome> {
    if e.is_user_error() {
        let text = e.to_string();
        return Ok(Outcome::user_error(Reply::text(text.clone()), UserError::new(text)));
    }
    Err(e.into())
}
