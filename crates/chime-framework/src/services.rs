//! Shared state handed to every command.

use std::collections::HashSet;
use std::fmt;

use chime_core::{IdentityResolver, Personifier};

use crate::command::tree::CommandTree;
use crate::prefix::PrefixRegistry;

/// People allowed to run Admin commands, on top of those the frontend
/// itself reports as bot admins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operators {
    entries: HashSet<(String, String)>,
}

impl Operators {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operator by frontend name and native id.
    pub fn with(mut self, frontend: impl Into<String>, id: impl Into<String>) -> Self {
        self.entries.insert((frontend.into(), id.into()));
        self
    }

    /// Returns whether `person` may run Admin commands.
    pub fn is_operator(&self, person: &dyn Personifier) -> bool {
        person.is_bot_admin()
            || self
                .entries
                .contains(&(person.frontend().to_string(), person.id().to_string()))
    }
}

impl<F: Into<String>, I: Into<String>> FromIterator<(F, I)> for Operators {
    fn from_iter<T: IntoIterator<Item = (F, I)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(f, i)| (f.into(), i.into()))
                .collect(),
        }
    }
}

/// Everything the pipeline and the commands share.
///
/// Built once at startup and passed around behind an `Arc`.
pub struct Services {
    tree: CommandTree,
    resolver: IdentityResolver,
    prefixes: PrefixRegistry,
    operators: Operators,
}

impl Services {
    /// Bundles the shared state.
    pub fn new(
        tree: CommandTree,
        resolver: IdentityResolver,
        prefixes: PrefixRegistry,
        operators: Operators,
    ) -> Self {
        Self {
            tree,
            resolver,
            prefixes,
            operators,
        }
    }

    /// The command tree.
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// The identity resolver.
    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// The prefix registry.
    pub fn prefixes(&self) -> &PrefixRegistry {
        &self.prefixes
    }

    /// The operator list.
    pub fn operators(&self) -> &Operators {
        &self.operators
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("tree", &self.tree)
            .field("resolver", &self.resolver)
            .field("prefixes", &self.prefixes)
            .field("operators", &self.operators)
            .finish()
    }
}
