//! What an action produced.

use chime_core::{Reply, UserError};

/// The successful result of a command action.
///
/// Hard failures are the `Err` side of the action's `anyhow::Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send `reply`, flagged with `urr` when it explains a user error.
    Reply {
        /// The payload.
        reply: Reply,
        /// The user error being explained, if any.
        urr: Option<UserError>,
    },
    /// Send nothing. For actions that manage their own output.
    Silent,
}

impl Outcome {
    /// A successful reply.
    pub fn reply(reply: impl Into<Reply>) -> Self {
        Self::Reply {
            reply: reply.into(),
            urr: None,
        }
    }

    /// A successful plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self::reply(Reply::Text(text.into()))
    }

    /// A reply explaining a user error.
    pub fn user_error(reply: impl Into<Reply>, urr: UserError) -> Self {
        Self::Reply {
            reply: reply.into(),
            urr: Some(urr),
        }
    }

    /// Returns the user error carried by this outcome.
    pub fn urr(&self) -> Option<&UserError> {
        match self {
            Self::Reply { urr, .. } => urr.as_ref(),
            Self::Silent => None,
        }
    }
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Self::reply(reply)
    }
}
