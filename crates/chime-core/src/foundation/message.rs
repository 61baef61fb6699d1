//! Frontend-facing abstractions: who sent a message, where, and how to reply.
//!
//! Frontend adapters implement [`Personifier`], [`Placer`] and [`Messenger`]
//! and wrap each inbound chat line in a [`Message`]. The core never looks at
//! frontend-specific data beyond these traits.

use std::fmt;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use crate::foundation::error::{SendError, UserError};
use crate::foundation::scope::ScopeKey;

/// The author of a message, or any referenced user.
pub trait Personifier: Send + Sync {
    /// Name of the frontend this person lives on.
    fn frontend(&self) -> &str;

    /// The frontend's unique, static identifier for this person.
    fn id(&self) -> &str;

    /// Human readable name. Defaults to the identifier.
    fn display_name(&self) -> &str {
        self.id()
    }

    /// Whether the frontend itself considers this person a bot operator.
    fn is_bot_admin(&self) -> bool {
        false
    }

    /// Returns the natural key used to resolve this person's scope.
    fn scope_key(&self) -> ScopeKey {
        ScopeKey::person(self.frontend(), self.id())
    }
}

/// The place a message came from.
///
/// See [`Place`](crate::foundation::scope::Place) for the difference between
/// the exact and the logical granularity.
pub trait Placer: Send + Sync {
    /// Name of the frontend this place lives on.
    fn frontend(&self) -> &str;

    /// Identifier of the literal origin, e.g. a channel.
    fn id_exact(&self) -> &str;

    /// Identifier of the broader context, e.g. the server a channel is in.
    /// Defaults to the exact identifier.
    fn id_logical(&self) -> &str {
        self.id_exact()
    }

    /// Human readable name. Defaults to the exact identifier.
    fn name(&self) -> &str {
        self.id_exact()
    }

    /// Returns the natural key of the exact place.
    fn exact_key(&self) -> ScopeKey {
        ScopeKey::place(self.frontend(), self.id_exact())
    }

    /// Returns the natural key of the logical place.
    fn logical_key(&self) -> ScopeKey {
        ScopeKey::place(self.frontend(), self.id_logical())
    }
}

/// The frontend's reply channel for a message.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Delivers a reply. `urr` is set when the reply explains a user error;
    /// the frontend decides how to render that distinction.
    async fn send(&self, reply: &Reply, urr: Option<&UserError>) -> Result<(), SendError>;
}

/// A frontend-agnostic response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text.
    Text(String),
    /// A command usage line, e.g. `!prefix add <prefix>`.
    Usage(String),
    /// A titled list of items.
    List {
        /// List heading.
        title: String,
        /// One entry per line.
        items: Vec<String>,
    },
}

impl Reply {
    /// Creates a plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Text(text) => f.write_str(text),
            Reply::Usage(usage) => write!(f, "Usage: {usage}"),
            Reply::List { title, items } => {
                write!(f, "{title}: {}", items.join(" "))
            }
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A raw inbound chat message.
#[derive(Clone)]
pub struct Message {
    /// Frontend-assigned message identifier.
    pub id: String,
    /// The message text as received.
    pub raw: String,
    /// Who sent it.
    pub author: Arc<dyn Personifier>,
    /// Where it was sent.
    pub here: Arc<dyn Placer>,
    /// How to answer.
    pub messenger: Arc<dyn Messenger>,
}

impl Message {
    /// Creates a new message.
    pub fn new(
        id: impl Into<String>,
        raw: impl Into<String>,
        author: Arc<dyn Personifier>,
        here: Arc<dyn Placer>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            id: id.into(),
            raw: raw.into(),
            author,
            here,
            messenger,
        }
    }

    /// Name of the frontend the message came from.
    pub fn frontend(&self) -> &str {
        self.here.frontend()
    }

    /// Splits the text on whitespace.
    pub fn fields(&self) -> Vec<String> {
        self.raw.split_whitespace().map(str::to_string).collect()
    }

    /// Splits the text into fields that keep their trailing whitespace.
    ///
    /// `"example of    text"` becomes `["example ", "of    ", "text"]`.
    pub fn fields_space(&self) -> Vec<String> {
        fields_with_space(&self.raw)
    }

    /// Sends a reply through the message's messenger.
    pub async fn write(&self, reply: &Reply, urr: Option<&UserError>) -> Result<(), SendError> {
        self.messenger.send(reply, urr).await
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("raw", &self.raw)
            .field("author", &self.author.id())
            .field("frontend", &self.here.frontend())
            .field("here", &self.here.id_exact())
            .finish()
    }
}

/// A field and the whitespace run that follows it.
static FIELD: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| Regex::new(r"\S+\s*"));

/// Leading and trailing whitespace is dropped first, so the last field never
/// carries any and no field is whitespace only.
fn fields_with_space(text: &str) -> Vec<String> {
    let text = text.trim();
    match &*FIELD {
        Ok(re) => re.find_iter(text).map(|m| m.as_str().to_string()).collect(),
        // Fallback to plain fields if the pattern failed to compile
        Err(_) => text.split_whitespace().map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_with_space() {
        assert_eq!(
            fields_with_space("example of    text"),
            vec!["example ", "of    ", "text"]
        );
    }

    #[test]
    fn test_fields_with_space_trims_edges() {
        assert_eq!(fields_with_space("  a\tb  "), vec!["a\t", "b"]);
        assert_eq!(fields_with_space("\n\n!ping"), vec!["!ping"]);
        assert_eq!(fields_with_space("!echo hi \t\n"), vec!["!echo ", "hi"]);
        assert!(fields_with_space("   ").is_empty());
        assert!(fields_with_space("").is_empty());
    }

    #[test]
    fn test_fields_with_space_keeps_mixed_runs() {
        assert_eq!(
            fields_with_space("!echo  \t a\u{3000}b"),
            vec!["!echo  \t ", "a\u{3000}", "b"]
        );
        let joined: String = fields_with_space("one  two\tthree").concat();
        assert_eq!(joined, "one  two\tthree");
    }

    #[test]
    fn test_reply_display() {
        assert_eq!(Reply::text("hi").to_string(), "hi");
        assert_eq!(Reply::Usage("!ping".into()).to_string(), "Usage: !ping");
        let list = Reply::List {
            title: "Prefixes".into(),
            items: vec!["!".into(), "?".into()],
        };
        assert_eq!(list.to_string(), "Prefixes: ! ?");
    }
}
