//! Chat model types.

use serde::{Deserialize, Serialize};

use crate::param::Param;

/// Unique identifier for a chat.
///
/// Ids up to [`ChatId::LAST_SPECIAL`] are reserved markers, not real
/// chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl ChatId {
    /// Unassigned incoming messages land here until classified.
    pub const DEADDROP: Self = Self(1);
    /// Locally deleted messages are moved here before remote cleanup.
    pub const TRASH: Self = Self(3);
    /// Largest reserved chat id.
    pub const LAST_SPECIAL: Self = Self(9);

    /// Create a new chat ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Whether this id is in the reserved range.
    #[must_use]
    pub const fn is_special(self) -> bool {
        self.0 <= Self::LAST_SPECIAL.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChatType {
    /// Not yet classified.
    #[default]
    Undefined,
    /// One-to-one conversation.
    Single,
    /// Named group with a member list.
    Group,
}

impl ChatType {
    /// Parses the stored integer representation.
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        match value {
            100 => Self::Single,
            120 => Self::Group,
            _ => Self::Undefined,
        }
    }

    /// The stored integer representation.
    #[must_use]
    pub const fn to_i64(self) -> i64 {
        match self {
            Self::Undefined => 0,
            Self::Single => 100,
            Self::Group => 120,
        }
    }
}

/// A conversation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    /// Row id.
    pub id: ChatId,
    /// Kind of chat.
    pub chat_type: ChatType,
    /// Display name; for 1:1 chats usually the peer's name.
    pub name: String,
    /// Stable group identifier shared by all members (groups only).
    pub group_id: String,
    /// Attribute bag; caches the thread-reference anchor.
    pub param: Param,
}
