//! Commands: declarations, the frozen tree and the matcher, and the context
//! actions run with.

pub mod context;
pub mod definition;
pub mod outcome;
pub mod tree;

pub use context::{CommandContext, Invocation};
pub use definition::{ActionFn, Category, Command, PermitFn, aliases};
pub use outcome::Outcome;
pub use tree::{CommandId, CommandNode, CommandTree, Matched, TreeBuilder};
