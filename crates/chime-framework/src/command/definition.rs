//! Command declarations.
//!
//! A [`Command`] is a plain builder value. Features declare their commands
//! with it and hand them to a [`TreeBuilder`](crate::command::TreeBuilder),
//! which validates them and freezes them into a
//! [`CommandTree`](crate::command::CommandTree).
//!
//! # Example
//!
//! ```rust,ignore
//! use chime_framework::command::{Command, Category, aliases};
//!
//! let nick = Command::new("nick")
//!     .description("Show or set your nickname.")
//!     .usage_of_children()
//!     .category(Category::Other)
//!     .child(
//!         Command::with_names(aliases::SHOW)
//!             .description("Show your nickname.")
//!             .action(|ctx| async move { Ok(Outcome::text("...")) }),
//!     );
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chime_core::{CommandType, Message};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::command::context::CommandContext;
use crate::command::outcome::Outcome;

/// A command's permission predicate.
pub type PermitFn = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// A command's executable action.
pub type ActionFn =
    Arc<dyn Fn(CommandContext) -> BoxFuture<'static, anyhow::Result<Outcome>> + Send + Sync>;

/// Broad grouping used when listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    /// Games and other pastimes.
    Games,
    /// Moderation tools.
    Moderators,
    /// Integrations with outside services.
    Services,
    /// Everything else.
    #[default]
    Other,
}

impl Category {
    /// Returns the display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Games => "Games",
            Self::Moderators => "Moderators",
            Self::Services => "Services",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a command's usage arguments are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum UsageSpec {
    /// No arguments.
    #[default]
    None,
    /// A literal grammar, e.g. `<prefix>`.
    Literal(String),
    /// `(a | b)` from the children's canonical names.
    Children,
    /// `[a | b]` from the children's canonical names.
    OptionalChildren,
}

/// A command declaration.
///
/// Children inherit the parent's type, category and permission unless they
/// set their own. The type can be declared on a child only to assert it; a
/// child whose type differs from its parent's is rejected when the tree is
/// built.
#[derive(Clone)]
pub struct Command {
    pub(crate) names: Vec<String>,
    pub(crate) description: String,
    pub(crate) usage: UsageSpec,
    pub(crate) kind: Option<CommandType>,
    pub(crate) category: Option<Category>,
    pub(crate) examples: Vec<String>,
    pub(crate) permit: Option<PermitFn>,
    pub(crate) action: Option<ActionFn>,
    pub(crate) children: Vec<Command>,
}

impl Command {
    /// Creates a command with a single name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_names([name.into()])
    }

    /// Creates a command from a list of aliases. The first is canonical.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            description: String::new(),
            usage: UsageSpec::None,
            kind: None,
            category: None,
            examples: Vec::new(),
            permit: None,
            action: None,
            children: Vec::new(),
        }
    }

    /// Adds an alias.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the usage grammar: `<required>`, `[optional]`, `(literal)` or
    /// `(many | literals)`.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = UsageSpec::Literal(usage.into());
        self
    }

    /// Uses `(child | child)` as usage.
    pub fn usage_of_children(mut self) -> Self {
        self.usage = UsageSpec::Children;
        self
    }

    /// Uses `[child | child]` as usage.
    pub fn optional_usage_of_children(mut self) -> Self {
        self.usage = UsageSpec::OptionalChildren;
        self
    }

    /// Declares the command type. Only needed to assert a child's type.
    pub fn of_type(mut self, kind: CommandType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Adds an example argument string, without prefix or command path.
    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Sets the permission predicate.
    pub fn permit<F>(mut self, f: F) -> Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        self.permit = Some(Arc::new(f));
        self
    }

    /// Sets the action.
    ///
    /// Commands without an action reply with their usage and a
    /// missing-arguments user error, which suits command groups.
    pub fn action<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Outcome>> + Send + 'static,
    {
        self.action = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }

    /// Adds a sub-command.
    pub fn child(mut self, child: Command) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the canonical name, if any.
    pub fn name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("names", &self.names)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .field("kind", &self.kind)
            .field("category", &self.category)
            .field("has_permit", &self.permit.is_some())
            .field("has_action", &self.action.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Common sub-command aliases.
pub mod aliases {
    /// `add` and its synonyms.
    pub const ADD: [&str; 3] = ["add", "new", "create"];
    /// `delete` and its synonyms.
    pub const DELETE: [&str; 4] = ["delete", "del", "remove", "rm"];
    /// `list` and its synonyms.
    pub const LIST: [&str; 2] = ["list", "ls"];
    /// `show` and its synonyms.
    pub const SHOW: [&str; 3] = ["show", "view", "get"];
    /// `search` and its synonyms.
    pub const SEARCH: [&str; 2] = ["search", "find"];
}
