//! Command types and the prefixes that trigger them.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// The tier a command belongs to.
///
/// Each tier has its own command tree and its own set of prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// Simplified commands with an easy to use interface.
    Normal,
    /// Full-control commands, usually made of many nested sub-commands.
    Advanced,
    /// Operator-only commands.
    Admin,
}

impl CommandType {
    /// All command types in declaration order.
    pub const ALL: [CommandType; 3] = [Self::Normal, Self::Advanced, Self::Admin];

    /// Returns the single-bit mask for this type.
    pub const fn bit(self) -> u8 {
        match self {
            Self::Normal => 1,
            Self::Advanced => 1 << 1,
            Self::Admin => 1 << 2,
        }
    }

    /// Returns the stable integer used in storage.
    pub fn to_db(self) -> i64 {
        i64::from(self.bit())
    }

    /// Parses the stable storage integer.
    pub fn from_db(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.to_db() == value)
    }

    /// Returns the lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Advanced => "advanced",
            Self::Admin => "admin",
        }
    }

    /// Parses a lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A combination of command types, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeMask(u8);

impl TypeMask {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Matches every command type.
    pub const ALL: Self = Self(1 | 1 << 1 | 1 << 2);

    /// Returns whether `t` is part of the mask.
    pub fn contains(self, t: CommandType) -> bool {
        self.0 & t.bit() != 0
    }
}

impl From<CommandType> for TypeMask {
    fn from(t: CommandType) -> Self {
        Self(t.bit())
    }
}

impl BitOr for CommandType {
    type Output = TypeMask;

    fn bitor(self, rhs: Self) -> TypeMask {
        TypeMask(self.bit() | rhs.bit())
    }
}

impl BitOr<CommandType> for TypeMask {
    type Output = TypeMask;

    fn bitor(self, rhs: CommandType) -> TypeMask {
        TypeMask(self.0 | rhs.bit())
    }
}

/// A literal trigger string bound to a command type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prefix {
    /// The command type this prefix invokes.
    pub kind: CommandType,
    /// The literal string, e.g. `"!"`.
    pub prefix: String,
}

impl Prefix {
    /// Creates a new prefix.
    pub fn new(kind: CommandType, prefix: impl Into<String>) -> Self {
        Self {
            kind,
            prefix: prefix.into(),
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.prefix, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mask() {
        let mask = CommandType::Normal | CommandType::Advanced;
        assert!(mask.contains(CommandType::Normal));
        assert!(mask.contains(CommandType::Advanced));
        assert!(!mask.contains(CommandType::Admin));
        assert!(TypeMask::ALL.contains(CommandType::Admin));
        assert!(!TypeMask::NONE.contains(CommandType::Normal));
    }

    #[test]
    fn test_db_values_are_stable() {
        assert_eq!(CommandType::Normal.to_db(), 1);
        assert_eq!(CommandType::Advanced.to_db(), 2);
        assert_eq!(CommandType::Admin.to_db(), 4);
        assert_eq!(CommandType::from_db(2), Some(CommandType::Advanced));
        assert_eq!(CommandType::from_db(3), None);
    }
}
