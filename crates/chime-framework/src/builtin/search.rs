//! Command search.

use chime_core::{CommandType, Reply, UserError};

use crate::command::tree::CommandNode;
use crate::command::{Command, Outcome, aliases};

const SEPARATOR: &str = " █ ";

/// `search` for the Advanced tree.
pub fn advanced() -> Command {
    Command::with_names(aliases::SEARCH)
        .description("Search through the commands.")
        .usage("<query...>")
        .action(|ctx| async move {
            let query = ctx.raw_args(0).to_lowercase();
            let tokens: Vec<&str> = query.split_whitespace().collect();
            if tokens.is_empty() {
                return Ok(ctx.missing_args());
            }

            let kind = ctx.invocation().kind;
            let tree = ctx.services().tree();
            let mut hits: Vec<_> = tree
                .recurse(|node| node.kind() == kind && score(node, &tokens) > 0)
                .into_iter()
                .map(|id| (score(tree.get(id), &tokens), id))
                .collect();
            if hits.is_empty() {
                return Ok(Outcome::user_error(
                    Reply::text("No commands found."),
                    UserError::NOT_FOUND,
                ));
            }

            hits.sort_by(|a, b| b.0.cmp(&a.0));
            let text = hits
                .into_iter()
                .map(|(_, id)| tree.format(id, ctx.prefix()))
                .collect::<Vec<_>>()
                .join(SEPARATOR);
            Ok(Outcome::text(text))
        })
}

/// One point per token equal to a name, and one each when the description
/// or the usage contains it.
fn score(node: &CommandNode, tokens: &[&str]) -> usize {
    let description = node.description().to_lowercase();
    let usage = node.usage().to_lowercase();

    tokens
        .iter()
        .map(|token| {
            usize::from(node.names().iter().any(|name| name == token))
                + usize::from(description.contains(token))
                + usize::from(usage.contains(token))
        })
        .sum()
}
