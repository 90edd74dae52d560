//! Single-character-key attribute bag attached to messages and chats.
//!
//! Params are stored packed as `key=value` lines. The set of recognized
//! keys per record kind is documented in [`keys`]; unknown keys are
//! carried through opaquely so that newer writers do not lose data when
//! older code rewrites a record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognized param keys.
///
/// Message records use [`FILE`], [`MIME_TYPE`], [`WIDTH`], [`HEIGHT`],
/// [`DURATION_MS`], [`SYSTEM_COMMAND`], [`MEMBER_ADDR`],
/// [`FORWARDED_ADDR`], [`FORWARDED_NAME`], [`MEDIA_AUTHOR`],
/// [`MEDIA_TITLE`], [`GUARANTEE_E2EE`] and [`GHOST_ORIGINAL`]; chat
/// records use [`REFERENCES`].
pub mod keys {
    /// Path of the attachment file.
    pub const FILE: char = 'f';
    /// Explicit mime type of the attachment.
    pub const MIME_TYPE: char = 'm';
    /// Media width in pixels.
    pub const WIDTH: char = 'w';
    /// Media height in pixels.
    pub const HEIGHT: char = 'h';
    /// Media duration in milliseconds.
    pub const DURATION_MS: char = 'd';
    /// System command code, see [`crate::message::SystemCommand`].
    pub const SYSTEM_COMMAND: char = 'S';
    /// Address of the member added to or removed from a group.
    pub const MEMBER_ADDR: char = 'E';
    /// Address the message was originally sent from (forwarding).
    pub const FORWARDED_ADDR: char = 'a';
    /// Display name the message was originally sent from (forwarding).
    pub const FORWARDED_NAME: char = 'A';
    /// Author of an audio attachment.
    pub const MEDIA_AUTHOR: char = 'N';
    /// Title of an audio attachment.
    pub const MEDIA_TITLE: char = 'n';
    /// End-to-end encryption is guaranteed for this message.
    pub const GUARANTEE_E2EE: char = 'c';
    /// Cached thread-reference id of a chat.
    pub const REFERENCES: char = 'R';
    /// Id of the real message a ghost row stands in for.
    pub const GHOST_ORIGINAL: char = 'G';
}

/// Ordered mapping from a single-character key to a string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    entries: Vec<(char, String)>,
}

impl Param {
    /// Creates an empty param map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a packed `key=value` line representation.
    ///
    /// Lines without a `=`, or with a key longer than one character, are
    /// ignored.
    #[must_use]
    pub fn from_packed(packed: &str) -> Self {
        let mut param = Self::new();
        for line in packed.lines() {
            if let Some((key, value)) = line.split_once('=') {
                let mut chars = key.chars();
                if let (Some(key), None) = (chars.next(), chars.next()) {
                    param.entries.push((key, value.to_string()));
                }
            }
        }
        param
    }

    /// Packs the map back into its `key=value` line representation.
    #[must_use]
    pub fn to_packed(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, key: char) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Gets a value parsed as an integer.
    #[must_use]
    pub fn get_int(&self, key: char) -> Option<i64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Checks whether a key is present.
    #[must_use]
    pub fn exists(&self, key: char) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Sets a value, replacing an existing one in place.
    pub fn set(&mut self, key: char, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Sets an integer value.
    pub fn set_int(&mut self, key: char, value: i64) {
        self.set(key, value.to_string());
    }

    /// Removes a key.
    pub fn remove(&mut self, key: char) {
        self.entries.retain(|(k, _)| *k != key);
    }

    /// Returns true when no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_packed())
    }
}
