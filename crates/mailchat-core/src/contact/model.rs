//! Contact model types.

use serde::{Deserialize, Serialize};

/// Unique identifier for a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactId(pub i64);

impl ContactId {
    /// The local user.
    pub const SELF: Self = Self(1);
    /// Largest reserved contact id.
    pub const LAST_SPECIAL: Self = Self(9);

    /// Create a new contact ID.
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

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An address book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Row id.
    pub id: ContactId,
    /// Display name (may be empty).
    pub name: String,
    /// Email address.
    pub addr: String,
}

impl Contact {
    /// Returns a display string for the contact.
    ///
    /// If a name is present, returns "Name <email>", otherwise just
    /// "email".
    #[must_use]
    pub fn display(&self) -> String {
        if self.name.is_empty() {
            self.addr.clone()
        } else {
            format!("{} <{}>", self.name, self.addr)
        }
    }
}
