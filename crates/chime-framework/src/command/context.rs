//! Runtime data handed to a command action.

use std::fmt;
use std::sync::Arc;

use chime_core::{CommandType, Message, Place, Reply, Scope, StoreResult, UserError};

use crate::command::outcome::Outcome;
use crate::command::tree::{CommandId, CommandNode};
use crate::services::Services;

/// A matched command call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The matched command.
    pub command: CommandId,
    /// Type of the prefix that was used.
    pub kind: CommandType,
    /// Names as typed to reach the command, e.g. `["prefix", "rm"]`.
    pub path: Vec<String>,
    /// Everything after the path.
    pub args: Vec<String>,
    /// The prefix literal that was used.
    pub prefix: String,
}

/// Everything an action can look at.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct CommandContext {
    message: Arc<Message>,
    invocation: Arc<Invocation>,
    services: Arc<Services>,
}

impl CommandContext {
    /// Creates a context.
    pub fn new(message: Arc<Message>, invocation: Invocation, services: Arc<Services>) -> Self {
        Self {
            message,
            invocation: Arc::new(invocation),
            services,
        }
    }

    /// The inbound message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The invocation.
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// The shared services.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// The matched command.
    pub fn command(&self) -> &CommandNode {
        self.services.tree().get(self.invocation.command)
    }

    /// The arguments after the command path.
    pub fn args(&self) -> &[String] {
        &self.invocation.args
    }

    /// The `n`th argument.
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.invocation.args.get(n).map(String::as_str)
    }

    /// The prefix that was used.
    pub fn prefix(&self) -> &str {
        &self.invocation.prefix
    }

    /// Renders the usage line as the user typed the command, e.g.
    /// `$prefix rm <prefix>`.
    pub fn usage(&self) -> String {
        let mut usage = format!("{}{}", self.invocation.prefix, self.invocation.path.join(" "));
        let args = self.command().usage();
        if !args.is_empty() {
            usage.push(' ');
            usage.push_str(args);
        }
        usage
    }

    /// Replies with the usage line and a missing-arguments user error.
    pub fn missing_args(&self) -> Outcome {
        Outcome::user_error(Reply::Usage(self.usage()), UserError::MISSING_ARGS)
    }

    /// Returns the text after the command path and `n` further arguments,
    /// with its original whitespace.
    ///
    /// For `!say  hello   world` matched as `say`, `raw_args(0)` is
    /// `"hello   world"` and `raw_args(1)` is `"world"`.
    pub fn raw_args(&self, n: usize) -> String {
        self.message
            .fields_space()
            .into_iter()
            .skip(self.invocation.path.len() + n)
            .collect()
    }

    /// The person who sent the message.
    pub async fn author(&self) -> StoreResult<Scope> {
        self.services
            .resolver()
            .person(self.message.author.as_ref())
            .await
    }

    /// Where the message effectively comes from, teleports applied.
    pub async fn here(&self) -> StoreResult<Place> {
        self.services.resolver().here(&self.message).await
    }

    /// Exact granularity of [`here`](Self::here).
    pub async fn here_exact(&self) -> StoreResult<Scope> {
        self.services.resolver().here_exact(&self.message).await
    }

    /// Logical granularity of [`here`](Self::here). Settings such as prefixes
    /// live here.
    pub async fn here_logical(&self) -> StoreResult<Scope> {
        self.services.resolver().here_logical(&self.message).await
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("message", &self.message)
            .field("invocation", &self.invocation)
            .finish()
    }
}
