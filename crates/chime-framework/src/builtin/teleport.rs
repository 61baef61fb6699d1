//! Operator teleport: run commands as if sent from another place.

use chime_core::{Place, ScopeKey};

use crate::command::{Command, Outcome, aliases};

/// `teleport` for the Admin tree.
pub fn admin() -> Command {
    Command::with_names(["teleport", "tp"])
        .description("Teleport to a place and back. Execute commands as if you were there.")
        .usage_of_children()
        .child(show())
        .child(to())
        .child(home())
}

fn show() -> Command {
    Command::with_names(aliases::SHOW)
        .description("Show the current teleport status.")
        .action(|ctx| async move {
            let author = ctx.author().await?;
            let text = match ctx.services().resolver().teleports().get(author) {
                None => "Home sweet home.".to_string(),
                Some(place) => format!("Currently teleported to: {place}."),
            };
            Ok(Outcome::text(text))
        })
}

fn to() -> Command {
    Command::with_names(["to", "->"])
        .description("Teleport to a place.")
        .usage("<frontend> <exact-id> [logical-id]")
        .action(|ctx| async move {
            let (Some(frontend), Some(exact)) = (ctx.arg(0), ctx.arg(1)) else {
                return Ok(ctx.missing_args());
            };
            let logical = ctx.arg(2).unwrap_or(exact);

            let resolver = ctx.services().resolver();
            let place = Place::new(
                resolver.resolve(&ScopeKey::place(frontend, exact)).await?,
                resolver.resolve(&ScopeKey::place(frontend, logical)).await?,
            );
            let author = ctx.author().await?;
            resolver.teleports().set(author, place);

            Ok(Outcome::text(format!("Teleported to {place}.")))
        })
}

fn home() -> Command {
    Command::new("home")
        .description("Teleport back home.")
        .action(|ctx| async move {
            let author = ctx.author().await?;
            let text = match ctx.services().resolver().teleports().remove(author) {
                Some(_) => "Teleported back home.",
                None => "Home sweet home.",
            };
            Ok(Outcome::text(text))
        })
}
