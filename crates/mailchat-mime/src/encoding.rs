//! MIME encoding utilities.
//!
//! Supports Base64 transfer encoding and RFC 2047 header encoding.
//! This crate only generates messages, so the decoding half of these
//! algorithms is intentionally absent.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum line length for Base64 transfer-encoded bodies.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 wrapped to 76-column lines (RFC 2045).
///
/// Suitable for use as the body of a `Content-Transfer-Encoding: base64`
/// part; each line is terminated with CRLF.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);

    let bytes = encoded.as_bytes();
    for chunk in bytes.chunks(MAX_LINE_LENGTH) {
        // Base64 output is ASCII, chunks cannot split a code point
        result.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        result.push_str("\r\n");
    }

    result
}

/// Encodes a header value using RFC 2047 encoding when needed.
///
/// Pure printable ASCII passes through unchanged; anything else is
/// encoded as a single `=?utf-8?B?...?=` word.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if text
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '=' && c != '?')
    {
        return text.to_string();
    }

    let encoded = encode_base64(text.as_bytes());
    format!("=?utf-8?B?{encoded}?=")
}
