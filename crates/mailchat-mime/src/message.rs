//! MIME message building and serialization.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_rfc2047};
use crate::header::Headers;
use rand::Rng;
use rand::distributions::Alphanumeric;

/// MIME message part.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body, already transfer-encoded.
    pub body: String,
}

impl Part {
    /// Creates a text/plain part with 8bit transfer encoding.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", ContentType::text_plain().to_string());
        headers.add("Content-Transfer-Encoding", "8bit");
        Self {
            headers,
            body: text.into(),
        }
    }

    /// Creates an attachment part with Base64 transfer encoding.
    ///
    /// The filename is RFC 2047-encoded in the disposition header when it
    /// contains non-ASCII characters.
    #[must_use]
    pub fn attachment(filename: &str, content_type: &ContentType, data: &[u8]) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        headers.add("Content-Transfer-Encoding", "base64");
        headers.add(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", encode_rfc2047(filename)),
        );
        Self {
            headers,
            body: encode_base64_wrapped(data),
        }
    }

    /// Returns true when the part body carries no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// A MIME message under construction.
///
/// Rendering always produces a multipart/mixed structure, even for a
/// single text part: several mail clients mishandle non-text content in
/// the main part, and the enclosing multipart gives encryption layers a
/// stable body to rewrite.
#[derive(Debug, Clone, Default)]
pub struct MimeMessage {
    /// Top-level message headers.
    pub headers: Headers,
    /// Body parts in order.
    pub parts: Vec<Part>,
}

impl MimeMessage {
    /// Creates a new empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a body part.
    pub fn push_part(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Number of body parts.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Serializes the message to wire format.
    ///
    /// A fresh boundary is generated on every call; the top-level headers
    /// are written in insertion order, followed by the MIME envelope.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        let boundary = generate_boundary();
        let mut out = String::new();

        out.push_str(&self.headers.to_string());
        out.push_str("MIME-Version: 1.0\r\n");
        let envelope = ContentType::multipart_mixed(&boundary);
        out.push_str(&format!("Content-Type: {envelope}\r\n"));
        out.push_str("\r\n");

        for part in &self.parts {
            out.push_str(&format!("--{boundary}\r\n"));
            out.push_str(&part.headers.to_string());
            out.push_str("\r\n");
            out.push_str(&part.body);
            if !part.body.ends_with('\n') {
                out.push_str("\r\n");
            }
        }
        out.push_str(&format!("--{boundary}--\r\n"));

        out.into_bytes()
    }
}

/// Generates a random MIME boundary.
fn generate_boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("=_{token}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part() {
        let part = Part::text("Hello, World!");
        assert_eq!(
            part.headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(part.headers.get("Content-Transfer-Encoding"), Some("8bit"));
        assert_eq!(part.body, "Hello, World!");
        assert!(!part.is_empty());
    }

    #[test]
    fn test_attachment_part() {
        let ct = ContentType::from_extension("png");
        let part = Part::attachment("image.png", &ct, b"\x89PNG");
        assert_eq!(part.headers.get("Content-Type"), Some("image/png"));
        assert_eq!(
            part.headers.get("Content-Disposition"),
            Some("attachment; filename=\"image.png\"")
        );
        assert_eq!(
            part.headers.get("Content-Transfer-Encoding"),
            Some("base64")
        );
    }

    #[test]
    fn test_render_multipart_envelope() {
        let mut message = MimeMessage::new();
        message.headers.add("From", "alice@example.com");
        message.headers.add("To", "bob@example.com");
        message.push_part(Part::text("Hi"));

        let wire = String::from_utf8(message.render()).unwrap();
        assert!(wire.starts_with("From: alice@example.com\r\n"));
        assert!(wire.contains("MIME-Version: 1.0\r\n"));
        assert!(wire.contains("Content-Type: multipart/mixed; boundary="));
        assert!(wire.contains("\r\nHi\r\n"));

        // Closing boundary delimiter present exactly once
        assert_eq!(wire.matches("--\r\n").count(), 1);
    }

    #[test]
    fn test_render_two_parts_share_boundary() {
        let mut message = MimeMessage::new();
        message.push_part(Part::text("body"));
        message.push_part(Part::attachment(
            "video.mp4",
            &ContentType::from_extension("mp4"),
            b"data",
        ));

        let wire = String::from_utf8(message.render()).unwrap();
        let boundary = wire
            .split("boundary=")
            .nth(1)
            .unwrap()
            .split("\r\n")
            .next()
            .unwrap()
            .trim_matches('"')
            .to_string();
        assert_eq!(wire.matches(&format!("--{boundary}\r\n")).count(), 2);
        assert!(wire.contains(&format!("--{boundary}--\r\n")));
    }
}
