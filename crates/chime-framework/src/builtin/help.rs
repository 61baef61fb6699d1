//! Per-command help.
//!
//! `help` is registered in every tree and explains commands of the tree it
//! was invoked through: `!help prefix` looks at Normal commands, `$help
//! prefix` at Advanced ones.

use chime_core::{Reply, UserError};

use crate::command::{Command, Outcome};

/// `help`. Explains a command of the invoking type.
pub fn command() -> Command {
    Command::new("help")
        .description("Show how to use a command.")
        .usage("<command...>")
        .action(|ctx| async move {
            if ctx.args().is_empty() {
                return Ok(ctx.missing_args());
            }

            let tree = ctx.services().tree();
            let Ok(matched) = tree.match_tokens(ctx.invocation().kind, ctx.message(), ctx.args())
            else {
                return Ok(Outcome::user_error(
                    Reply::text("Command could not be found."),
                    UserError::NOT_FOUND,
                ));
            };

            let node = tree.get(matched.command);
            let typed = &ctx.args()[..=matched.index];
            let mut text = format!("Usage: {}{}", ctx.prefix(), typed.join(" "));
            if !node.usage().is_empty() {
                text.push(' ');
                text.push_str(node.usage());
            }
            text.push('.');
            if !node.description().is_empty() {
                text.push(' ');
                text.push_str(node.description());
            }

            let last = typed[matched.index].to_lowercase();
            let others: Vec<&str> = node
                .names()
                .iter()
                .map(String::as_str)
                .filter(|name| *name != last)
                .collect();
            if !others.is_empty() {
                text.push_str(&format!(" Aliases: {}.", others.join(", ")));
            }

            Ok(Outcome::text(text))
        })
}
