//! The command tree and matcher.
//!
//! Declarations are registered into a [`TreeBuilder`] per [`CommandType`] and
//! frozen by [`TreeBuilder::build`] into a [`CommandTree`]: an arena of
//! [`CommandNode`]s addressed by [`CommandId`]. Each node knows its parent,
//! so paths can be rebuilt without any owning back-reference.
//!
//! The tree never changes after startup and is shared without locking.
//!
//! # Matching
//!
//! [`CommandTree::match_tokens`] case-folds the first token and looks for a
//! permitted root of the requested type with that alias. It then walks down
//! the children one token at a time and stops, without error, at the first
//! token that names no permitted child:
//!
//! ```text
//! tokens:  prefix   add   ?
//!          ──────   ───   ─
//! match:   prefix → add         index = 1, args = ["?"]
//! ```
//!
//! Alias collisions are rejected at build time, so the first match wins.

use std::collections::HashSet;
use std::fmt;

use chime_core::{CommandType, Message};
use tracing::{debug, trace};

use crate::command::definition::{ActionFn, Category, Command, PermitFn, UsageSpec};
use crate::error::{MatchError, TreeError};

/// Index of a node in a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

/// A frozen command definition.
pub struct CommandNode {
    id: CommandId,
    names: Vec<String>,
    description: String,
    usage: String,
    kind: CommandType,
    category: Category,
    examples: Vec<String>,
    parent: Option<CommandId>,
    children: Vec<CommandId>,
    permit: Option<PermitFn>,
    action: Option<ActionFn>,
}

impl CommandNode {
    /// Returns the node's id.
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Returns the canonical name.
    pub fn name(&self) -> &str {
        // Validated non-empty at build time.
        self.names.first().map_or("", String::as_str)
    }

    /// Returns every alias, canonical first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the usage grammar, possibly empty.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Returns the command type.
    pub fn kind(&self) -> CommandType {
        self.kind
    }

    /// Returns the category.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns the example argument strings.
    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// Returns the parent, `None` for roots.
    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    /// Returns the sub-commands in declaration order.
    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    /// Returns whether `message` may run this command.
    pub fn is_permitted(&self, message: &Message) -> bool {
        self.permit.as_ref().is_none_or(|permit| permit(message))
    }

    /// Returns the action, if one was declared.
    pub fn action(&self) -> Option<&ActionFn> {
        self.action.as_ref()
    }

    fn answers_to(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("id", &self.id)
            .field("names", &self.names)
            .field("kind", &self.kind)
            .field("usage", &self.usage)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

/// Result of a successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matched {
    /// The deepest matched command.
    pub command: CommandId,
    /// Index of the last token consumed by the command path.
    pub index: usize,
}

// =============================================================================
// CommandTree
// =============================================================================

/// An immutable forest of commands for every command type.
#[derive(Default)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
    roots: Vec<CommandId>,
}

impl CommandTree {
    /// Creates a builder.
    pub fn builder() -> TreeBuilder {
        TreeBuilder::new()
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different tree.
    pub fn get(&self, id: CommandId) -> &CommandNode {
        &self.nodes[id.0]
    }

    /// Returns the number of commands, sub-commands included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree has no commands.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the root commands of `kind` in registration order.
    pub fn roots(&self, kind: CommandType) -> impl Iterator<Item = &CommandNode> {
        self.roots
            .iter()
            .map(|&id| self.get(id))
            .filter(move |node| node.kind == kind)
    }

    /// Matches `tokens` against the commands of `kind` that `message` is
    /// permitted to run.
    pub fn match_tokens<S: AsRef<str>>(
        &self,
        kind: CommandType,
        message: &Message,
        tokens: &[S],
    ) -> Result<Matched, MatchError> {
        let Some(first) = tokens.first() else {
            return Err(MatchError::CommandNotFound(String::new()));
        };

        let name = first.as_ref().to_lowercase();
        let Some(mut command) = self.find_permitted(&self.roots, kind, message, &name) else {
            trace!(command = %name, kind = %kind, "No root command matched");
            return Err(MatchError::CommandNotFound(name));
        };

        let mut index = 0;
        for token in &tokens[1..] {
            let name = token.as_ref().to_lowercase();
            match self.find_permitted(&self.get(command).children, kind, message, &name) {
                Some(child) => {
                    command = child;
                    index += 1;
                }
                None => break,
            }
        }

        debug!(command = %self.path(command).join(" "), index, "Matched command");
        Ok(Matched { command, index })
    }

    /// Finds a command by its path of names, ignoring permissions.
    pub fn find(&self, kind: CommandType, path: &[&str]) -> Option<CommandId> {
        let (first, rest) = path.split_first()?;
        let mut current = self
            .roots
            .iter()
            .copied()
            .find(|&id| self.get(id).kind == kind && self.get(id).answers_to(first))?;

        for name in rest {
            current = self
                .get(current)
                .children
                .iter()
                .copied()
                .find(|&id| self.get(id).answers_to(name))?;
        }
        Some(current)
    }

    /// Walks every command depth-first and collects those matching
    /// `predicate`.
    ///
    /// When a command and its child match one after the other, only the
    /// child is kept: the child replaces its parent in the result.
    pub fn recurse<F>(&self, mut predicate: F) -> Vec<CommandId>
    where
        F: FnMut(&CommandNode) -> bool,
    {
        let mut collected = Vec::new();
        for &root in &self.roots {
            self.recurse_from(root, &mut predicate, &mut collected);
        }
        collected
    }

    fn recurse_from<F>(&self, id: CommandId, predicate: &mut F, collected: &mut Vec<CommandId>)
    where
        F: FnMut(&CommandNode) -> bool,
    {
        let node = self.get(id);
        if predicate(node) {
            if node.parent.is_some() && collected.last().copied() == node.parent {
                collected.pop();
            }
            collected.push(id);
        }
        for &child in &node.children {
            self.recurse_from(child, predicate, collected);
        }
    }

    /// Returns the canonical names from the root down to `id`.
    pub fn path(&self, id: CommandId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.get(id);
            path.push(node.name());
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Renders `<prefix><path> <usage>`, e.g. `!prefix delete <prefix>`.
    pub fn format(&self, id: CommandId, prefix: &str) -> String {
        let mut out = format!("{prefix}{}", self.path(id).join(" "));
        let usage = self.get(id).usage();
        if !usage.is_empty() {
            out.push(' ');
            out.push_str(usage);
        }
        out
    }

    /// Renders the children's canonical names as `(a | b)`.
    pub fn usage_of_children(&self, id: CommandId) -> String {
        format!("({})", self.child_names(id).join(" | "))
    }

    /// Renders the children's canonical names as `[a | b]`.
    pub fn optional_usage_of_children(&self, id: CommandId) -> String {
        format!("[{}]", self.child_names(id).join(" | "))
    }

    fn child_names(&self, id: CommandId) -> Vec<&str> {
        self.get(id)
            .children
            .iter()
            .map(|&child| self.get(child).name())
            .collect()
    }

    fn find_permitted(
        &self,
        candidates: &[CommandId],
        kind: CommandType,
        message: &Message,
        name: &str,
    ) -> Option<CommandId> {
        candidates.iter().copied().find(|&id| {
            let node = self.get(id);
            node.kind == kind && node.answers_to(name) && node.is_permitted(message)
        })
    }
}

impl fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("commands", &self.nodes.len())
            .field("roots", &self.roots.len())
            .finish()
    }
}

// =============================================================================
// TreeBuilder
// =============================================================================

/// Collects command declarations and validates them into a [`CommandTree`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    commands: Vec<(CommandType, Command)>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a root command of the given type.
    pub fn register(&mut self, kind: CommandType, command: Command) -> &mut Self {
        self.commands.push((kind, command));
        self
    }

    /// Registers a root command (builder pattern).
    pub fn with(mut self, kind: CommandType, command: Command) -> Self {
        self.register(kind, command);
        self
    }

    /// Validates every declaration and freezes the tree.
    pub fn build(self) -> Result<CommandTree, TreeError> {
        let mut tree = CommandTree::default();

        for (kind, command) in self.commands {
            let category = command.category.unwrap_or_default();
            let id = insert(&mut tree, kind, None, command, category, None)?;
            tree.roots.push(id);
        }

        for kind in CommandType::ALL {
            let roots: Vec<_> = tree
                .roots
                .iter()
                .copied()
                .filter(|&id| tree.get(id).kind == kind)
                .collect();
            check_unique(&tree, kind, None, &roots)?;
        }

        debug!(
            commands = tree.nodes.len(),
            roots = tree.roots.len(),
            "Command tree built"
        );
        Ok(tree)
    }
}

fn insert(
    tree: &mut CommandTree,
    kind: CommandType,
    parent: Option<CommandId>,
    command: Command,
    category: Category,
    permit: Option<PermitFn>,
) -> Result<CommandId, TreeError> {
    let Command {
        names,
        description,
        usage,
        kind: declared,
        category: own_category,
        examples,
        permit: own_permit,
        action,
        children,
    } = command;

    let Some(canonical) = names.first().cloned() else {
        return Err(TreeError::NoNames { description });
    };
    if let Some(bad) = names.iter().find(|n| !is_valid_name(n)) {
        return Err(TreeError::InvalidName { name: bad.clone() });
    }
    if let Some(declared) = declared
        && declared != kind
    {
        return Err(TreeError::TypeMismatch {
            name: canonical,
            parent: kind,
            child: declared,
        });
    }

    let category = own_category.unwrap_or(category);
    let permit = own_permit.or(permit);

    let id = CommandId(tree.nodes.len());
    tree.nodes.push(CommandNode {
        id,
        names,
        description,
        usage: String::new(),
        kind,
        category,
        examples,
        parent,
        children: Vec::new(),
        permit: permit.clone(),
        action,
    });

    let mut child_ids = Vec::with_capacity(children.len());
    for child in children {
        child_ids.push(insert(tree, kind, Some(id), child, category, permit.clone())?);
    }
    check_unique(tree, kind, Some(id), &child_ids)?;
    tree.nodes[id.0].children = child_ids;

    let usage = match usage {
        UsageSpec::None => String::new(),
        UsageSpec::Literal(usage) => usage,
        UsageSpec::Children => tree.usage_of_children(id),
        UsageSpec::OptionalChildren => tree.optional_usage_of_children(id),
    };
    tree.nodes[id.0].usage = usage;

    Ok(id)
}

fn check_unique(
    tree: &CommandTree,
    kind: CommandType,
    parent: Option<CommandId>,
    siblings: &[CommandId],
) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    for &id in siblings {
        for name in tree.get(id).names() {
            if !seen.insert(name.as_str()) {
                return Err(TreeError::DuplicateAlias {
                    kind,
                    name: name.clone(),
                    parent: parent.map_or_else(|| "<root>".to_string(), |p| tree.path(p).join(" ")),
                });
            }
        }
    }
    Ok(())
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace) && name.to_lowercase() == name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{message, message_from};

    fn tree() -> CommandTree {
        CommandTree::builder()
            .with(
                CommandType::Advanced,
                Command::new("cmd")
                    .alias("command")
                    .description("Manage custom commands.")
                    .usage_of_children()
                    .child(Command::new("add").usage("<trigger> <response...>"))
                    .child(
                        Command::with_names(["delete", "del", "rm"])
                            .usage("<trigger>")
                            .child(Command::new("all")),
                    ),
            )
            .with(CommandType::Normal, Command::new("cmd").usage("<trigger>"))
            .with(
                CommandType::Advanced,
                Command::new("secret")
                    .permit(|m| m.author.id() == "owner")
                    .child(Command::new("reveal")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_match_depth_and_index() {
        let tree = tree();
        let (msg, _) = message("$cmd delete extra-arg");

        let matched = tree
            .match_tokens(CommandType::Advanced, &msg, &["cmd", "delete", "extra-arg"])
            .unwrap();
        assert_eq!(tree.path(matched.command), vec!["cmd", "delete"]);
        assert_eq!(matched.index, 1);
    }

    #[test]
    fn test_match_is_case_insensitive_and_uses_aliases() {
        let tree = tree();
        let (msg, _) = message("");

        let matched = tree
            .match_tokens(CommandType::Advanced, &msg, &["COMMAND", "Rm", "all", "x"])
            .unwrap();
        assert_eq!(tree.path(matched.command), vec!["cmd", "delete", "all"]);
        assert_eq!(matched.index, 2);
    }

    #[test]
    fn test_match_filters_by_type() {
        let tree = tree();
        let (msg, _) = message("");

        let matched = tree
            .match_tokens(CommandType::Normal, &msg, &["cmd", "delete"])
            .unwrap();
        assert_eq!(tree.get(matched.command).kind(), CommandType::Normal);
        assert_eq!(matched.index, 0);

        assert_eq!(
            tree.match_tokens(CommandType::Admin, &msg, &["cmd"]),
            Err(MatchError::CommandNotFound("cmd".into()))
        );
    }

    #[test]
    fn test_match_respects_permissions() {
        let tree = tree();
        let (stranger, _) = message_from("someone", "");
        let (owner, _) = message_from("owner", "");

        assert!(matches!(
            tree.match_tokens(CommandType::Advanced, &stranger, &["secret", "reveal"]),
            Err(MatchError::CommandNotFound(_))
        ));

        let matched = tree
            .match_tokens(CommandType::Advanced, &owner, &["secret", "reveal"])
            .unwrap();
        assert_eq!(tree.get(matched.command).name(), "reveal");
        // Inherited from the parent.
        assert!(!tree.get(matched.command).is_permitted(&stranger));
    }

    #[test]
    fn test_usage_rendering() {
        let tree = tree();
        let cmd = tree.find(CommandType::Advanced, &["cmd"]).unwrap();
        let delete = tree.find(CommandType::Advanced, &["cmd", "del"]).unwrap();

        assert_eq!(tree.get(cmd).usage(), "(add | delete)");
        assert_eq!(tree.optional_usage_of_children(cmd), "[add | delete]");
        assert_eq!(tree.format(delete, "#"), "#cmd delete <trigger>");
        assert_eq!(tree.format(tree.get(delete).children()[0], "$"), "$cmd delete all");
    }

    #[test]
    fn test_recurse_collapses_parent_into_child() {
        let tree = tree();

        let found = tree.recurse(|node| node.name() == "delete" || node.name() == "all");
        assert_eq!(found.len(), 1);
        assert_eq!(tree.path(found[0]), vec!["cmd", "delete", "all"]);

        let found = tree.recurse(|node| node.name() == "add" || node.name() == "delete");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_children_inherit_category() {
        let tree = CommandTree::builder()
            .with(
                CommandType::Normal,
                Command::new("rps")
                    .category(Category::Games)
                    .child(Command::new("stats")),
            )
            .build()
            .unwrap();
        let stats = tree.find(CommandType::Normal, &["rps", "stats"]).unwrap();
        assert_eq!(tree.get(stats).category(), Category::Games);
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let err = CommandTree::builder()
            .with(CommandType::Normal, Command::new("nick"))
            .with(CommandType::Normal, Command::new("name").alias("nick"))
            .build()
            .unwrap_err();
        assert!(matches!(err, TreeError::DuplicateAlias { ref name, .. } if name == "nick"));

        // Same alias in different types or levels is fine.
        CommandTree::builder()
            .with(CommandType::Normal, Command::new("nick"))
            .with(CommandType::Advanced, Command::new("nick").child(Command::new("nick")))
            .build()
            .unwrap();
    }

    #[test]
    fn test_duplicate_child_alias_is_rejected() {
        let err = CommandTree::builder()
            .with(
                CommandType::Advanced,
                Command::new("prefix")
                    .child(Command::with_names(["delete", "rm"]))
                    .child(Command::new("rm")),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::DuplicateAlias {
                kind: CommandType::Advanced,
                name: "rm".into(),
                parent: "prefix".into(),
            }
        );
    }

    #[test]
    fn test_invalid_declarations() {
        let err = CommandTree::builder()
            .with(CommandType::Normal, Command::new("Help"))
            .build()
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidName { .. }));

        let err = CommandTree::builder()
            .with(
                CommandType::Normal,
                Command::with_names(Vec::<String>::new()).description("nameless"),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, TreeError::NoNames { .. }));

        let err = CommandTree::builder()
            .with(
                CommandType::Normal,
                Command::new("a").child(Command::new("b").of_type(CommandType::Admin)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, TreeError::TypeMismatch { .. }));
    }
}
