//! Console Bot Example
//!
//! A chime frontend that reads chat lines from stdin and prints replies to
//! stdout. Every line is sent by the same person from the same place, and
//! that person is an operator, so admin commands work too.
//!
//! # Try it
//!
//! ```text
//! !ping
//! !echo hello there
//! !prefix add ?
//! ?help prefix add
//! $search prefix
//! ##teleport to console elsewhere
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot
//! CHIME_STORAGE__BACKEND=memory cargo run --package console-bot
//! ```

use std::sync::Arc;

use anyhow::Result;
use chime::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

const FRONTEND: &str = "console";

// ============================================================================
// Frontend handles
// ============================================================================

struct Operator {
    name: String,
}

impl Personifier for Operator {
    fn frontend(&self) -> &str {
        FRONTEND
    }

    fn id(&self) -> &str {
        &self.name
    }

    fn is_bot_admin(&self) -> bool {
        true
    }
}

struct Terminal;

impl Placer for Terminal {
    fn frontend(&self) -> &str {
        FRONTEND
    }

    fn id_exact(&self) -> &str {
        "terminal"
    }

    fn name(&self) -> &str {
        "the terminal"
    }
}

struct Stdout;

/// Renders a reply as terminal lines. User errors with a message are shown
/// after the reply; the generic failure notice carries none.
fn render(reply: &Reply, urr: Option<&UserError>) -> String {
    match (reply, urr) {
        (Reply::List { title, items }, _) => format!("{title}:\n  {}\n", items.join("\n  ")),
        (reply, Some(urr)) if !urr.message().is_empty() => format!("{reply} ({urr})\n"),
        (reply, _) => format!("{reply}\n"),
    }
}

#[async_trait]
impl Messenger for Stdout {
    async fn send(&self, reply: &Reply, urr: Option<&UserError>) -> Result<(), SendError> {
        let line = render(reply, urr);

        let mut out = tokio::io::stdout();
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| SendError::failed(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| SendError::failed(e.to_string()))
    }
}

// ============================================================================
// Commands
// ============================================================================

fn ping() -> Command {
    Command::with_names(["ping", "p"])
        .description("Check that the bot is alive.")
        .action(|_| async { Ok(Outcome::text("Pong!")) })
}

fn echo() -> Command {
    Command::new("echo")
        .description("Repeat what you said.")
        .usage("<text...>")
        .category(Category::Games)
        .action(|ctx| async move {
            if ctx.args().is_empty() {
                return Ok(ctx.missing_args());
            }
            Ok(Outcome::text(ctx.raw_args(0)))
        })
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let runtime = ChimeRuntime::builder()
        .command(CommandType::Normal, ping())
        .command(CommandType::Normal, echo())
        .build()
        .await?;

    let sender = runtime.sender();
    let shutdown = runtime.shutdown_token();

    let author: Arc<dyn Personifier> = Arc::new(Operator {
        name: std::env::var("USER").unwrap_or_else(|_| "operator".to_string()),
    });
    let here: Arc<dyn Placer> = Arc::new(Terminal);
    let messenger: Arc<dyn Messenger> = Arc::new(Stdout);

    tokio::spawn(async move {
        let mut next_id = 0u64;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    next_id += 1;
                    let message = Message::new(
                        next_id.to_string(),
                        line,
                        Arc::clone(&author),
                        Arc::clone(&here),
                        Arc::clone(&messenger),
                    );
                    if sender.message(message).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    info!("stdin closed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }

        shutdown.cancel();
    });

    runtime.run().await?;
    Ok(())
}
