//! The message pipeline.
//!
//! Every inbound message goes through the same stages:
//!
//! ```text
//! Received ─▶ PrefixMatched ─▶ CommandMatched ─▶ Authorized ─▶ Executed ─▶ Responded
//!    │             │                 │               │            │
//!    └── empty     └── no prefix     └── no command  └── not an   └── hard error:
//!        (silent)      (silent)          (silent)        operator     generic notice
//! ```
//!
//! Parse misses are silent because most chat traffic is not a command. User
//! errors travel with the reply. Hard errors are logged and answered with a
//! generic notice; the message is dropped but the process carries on.
//!
//! [`Pipeline`] implements [`MessageHandler`] so it can sit behind the event
//! loop, and `tower::Service` so it can be wrapped in middleware.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chime_core::{CommandType, Message, MessageHandler, Reply, UserError};
use futures::future::BoxFuture;
use tower::Service;
use tracing::{Instrument, Level, debug, error, span, trace, warn};

use crate::command::context::{CommandContext, Invocation};
use crate::command::outcome::Outcome;
use crate::command::tree::CommandNode;
use crate::error::ParseError;
use crate::services::Services;

/// Text of the generic failure notice.
pub const FAILURE_NOTICE: &str = "Something went wrong...";

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// The message arrived.
    Received,
    /// The first token starts with a prefix of the place.
    PrefixMatched,
    /// A command was found.
    CommandMatched,
    /// The author may run it.
    Authorized,
    /// The action finished.
    Executed,
    /// The reply was handed to the frontend.
    Responded,
}

impl Stage {
    /// Returns the stage name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::PrefixMatched => "prefix_matched",
            Self::CommandMatched => "command_matched",
            Self::Authorized => "authorized",
            Self::Executed => "executed",
            Self::Responded => "responded",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a message left the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a command. Nothing was sent.
    NotCommand,
    /// An Admin command from someone who is not an operator.
    Unauthorized,
    /// The action chose to stay silent.
    Silent,
    /// A reply was sent, flagged with the user error if any.
    Replied {
        /// The user error explained by the reply.
        urr: Option<UserError>,
    },
    /// A hard error stopped the message after the given stage.
    Failed {
        /// Last stage reached.
        stage: Stage,
    },
}

/// Parses, authorizes and runs commands.
#[derive(Clone)]
pub struct Pipeline {
    services: Arc<Services>,
    action_timeout: Option<Duration>,
}

impl Pipeline {
    /// Creates a pipeline without an execution deadline.
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            action_timeout: None,
        }
    }

    /// Bounds every action by `timeout`. `None` disables the deadline.
    pub fn action_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Returns the shared services.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Turns a message into an invocation.
    pub async fn parse(&self, message: &Message) -> Result<Invocation, ParseError> {
        let mut tokens = message.fields();
        let Some(first) = tokens.first() else {
            return Err(ParseError::Empty);
        };

        let place = self.services.resolver().here_logical(message).await?;
        let prefixes = self.services.prefixes().list(place).await?;
        let Some(prefix) = prefixes.match_token(first).cloned() else {
            return Err(ParseError::NoPrefix(first.clone()));
        };
        trace!(stage = %Stage::PrefixMatched, prefix = %prefix.prefix, kind = %prefix.kind);

        tokens[0] = tokens[0][prefix.prefix.len()..].to_string();
        let matched = self
            .services
            .tree()
            .match_tokens(prefix.kind, message, &tokens)?;

        let args = tokens.split_off(matched.index + 1);
        Ok(Invocation {
            command: matched.command,
            kind: prefix.kind,
            path: tokens,
            args,
            prefix: prefix.prefix,
        })
    }

    /// Runs a message through every stage.
    pub async fn run(&self, message: Arc<Message>) -> Dispatch {
        let span = span!(
            Level::DEBUG,
            "pipeline",
            message = %message.id,
            frontend = %message.frontend(),
        );
        self.run_inner(message).instrument(span).await
    }

    async fn run_inner(&self, message: Arc<Message>) -> Dispatch {
        let invocation = match self.parse(&message).await {
            Ok(invocation) => invocation,
            Err(e) if e.is_miss() => {
                trace!(reason = %e, "Not a command");
                return Dispatch::NotCommand;
            }
            Err(e) => {
                error!(error = %e, "Failed to parse message");
                self.notify_failure(&message).await;
                return Dispatch::Failed {
                    stage: Stage::Received,
                };
            }
        };

        let node = self.services.tree().get(invocation.command);
        debug!(
            stage = %Stage::CommandMatched,
            command = %invocation.path.join(" "),
            args = ?invocation.args,
        );

        if node.kind() == CommandType::Admin
            && !self.services.operators().is_operator(message.author.as_ref())
        {
            warn!(
                author = %message.author.id(),
                command = %invocation.path.join(" "),
                "Admin command from non-operator"
            );
            self.notify_failure(&message).await;
            return Dispatch::Unauthorized;
        }
        trace!(stage = %Stage::Authorized);

        let ctx = CommandContext::new(Arc::clone(&message), invocation, Arc::clone(&self.services));
        let outcome = match self.execute(node, ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = format!("{e:#}"), command = %node.name(), "Command failed");
                self.notify_failure(&message).await;
                return Dispatch::Failed {
                    stage: Stage::Authorized,
                };
            }
        };
        trace!(stage = %Stage::Executed);

        match outcome {
            Outcome::Silent => Dispatch::Silent,
            Outcome::Reply { reply, urr } => {
                if let Err(e) = message.write(&reply, urr.as_ref()).await {
                    error!(error = %e, "Failed to send reply");
                    return Dispatch::Failed {
                        stage: Stage::Executed,
                    };
                }
                trace!(stage = %Stage::Responded, urr = ?urr);
                Dispatch::Replied { urr }
            }
        }
    }

    async fn execute(&self, node: &CommandNode, ctx: CommandContext) -> anyhow::Result<Outcome> {
        let Some(action) = node.action() else {
            return Ok(ctx.missing_args());
        };

        match self.action_timeout {
            Some(limit) => tokio::time::timeout(limit, action(ctx))
                .await
                .map_err(|_| anyhow!("action timed out after {limit:?}"))?,
            None => action(ctx).await,
        }
    }

    async fn notify_failure(&self, message: &Message) {
        if let Err(e) = message
            .write(&Reply::text(FAILURE_NOTICE), Some(&UserError::GENERIC))
            .await
        {
            warn!(error = %e, "Failed to send failure notice");
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("services", &self.services)
            .field("action_timeout", &self.action_timeout)
            .finish()
    }
}

#[async_trait]
impl MessageHandler for Pipeline {
    async fn handle(&self, message: Arc<Message>) {
        self.run(message).await;
    }
}

impl Service<Arc<Message>> for Pipeline {
    type Response = Dispatch;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Dispatch, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: Arc<Message>) -> Self::Future {
        let pipeline = self.clone();
        Box::pin(async move { Ok(pipeline.run(message).await) })
    }
}
