//! MIME header handling.

use crate::encoding::encode_rfc2047;
use std::fmt;

/// Collection of email headers.
///
/// Unlike a parser, a generator cares about header placement: headers
/// are written out in the order they were added. Lookup and replacement
/// are case-insensitive per RFC 5322.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value, keeping any existing values.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Sets a header value, replacing any existing values.
    ///
    /// The new value takes the position of the first existing occurrence,
    /// or is appended when the header was not present.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        let pos = self
            .headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&name));
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        match pos {
            Some(pos) => self.headers.insert(pos, (name, value)),
            None => self.headers.push((name, value)),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns true when no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.headers {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

/// Formats a mailbox as `Display Name <addr>` or bare `addr`.
///
/// The display name is RFC 2047-encoded when it contains non-ASCII
/// characters; empty names collapse to the bare address.
#[must_use]
pub fn format_mailbox(name: Option<&str>, addr: &str) -> String {
    match name {
        Some(name) if !name.is_empty() => {
            format!("{} <{addr}>", encode_rfc2047(name))
        }
        _ => addr.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_headers_set_replaces() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("To", "bob@example.com");
        assert_eq!(headers.get_all("To").len(), 2);

        headers.set("To", "charlie@example.com");
        assert_eq!(headers.get_all("To").len(), 1);
        assert_eq!(headers.get("To"), Some("charlie@example.com"));
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        headers.remove("subject");
        assert!(headers.get("Subject").is_none());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_display_preserves_order() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        headers.add("From", "sender@example.com");

        let s = headers.to_string();
        let subject_pos = s.find("Subject:").unwrap();
        let from_pos = s.find("From:").unwrap();
        assert!(subject_pos < from_pos);
        assert!(s.ends_with("\r\n"));
    }

    #[test]
    fn test_format_mailbox_plain() {
        assert_eq!(format_mailbox(None, "a@x.com"), "a@x.com");
        assert_eq!(format_mailbox(Some(""), "a@x.com"), "a@x.com");
        assert_eq!(format_mailbox(Some("Alice"), "a@x.com"), "Alice <a@x.com>");
    }

    #[test]
    fn test_format_mailbox_encodes_name() {
        let mailbox = format_mailbox(Some("Müller"), "m@x.com");
        assert!(mailbox.starts_with("=?utf-8?B?"));
        assert!(mailbox.ends_with("<m@x.com>"));
    }
}
