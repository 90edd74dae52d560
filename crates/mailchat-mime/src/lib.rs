//! # mailchat-mime
//!
//! MIME message generation library for the mailchat messenger backend.
//!
//! ## Features
//!
//! - **Message generation**: Build multipart MIME messages with attachments
//! - **Encoding**: Base64 transfer encoding, RFC 2047 header encoding
//! - **Content types**: Content type construction, parsing, and
//!   suffix-based inference
//! - **Headers**: Order-preserving header collection with
//!   case-insensitive lookup
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailchat_mime::{MimeMessage, Part};
//!
//! let mut message = MimeMessage::new();
//! message.headers.add("From", "alice@example.com");
//! message.headers.add("To", "bob@example.com");
//! message.headers.add("Subject", "Hello");
//! message.push_part(Part::text("Hello, World!"));
//!
//! let wire = message.render();
//! ```
//!
//! Every rendered message is multipart/mixed, even when it carries a
//! single text part; the boundary is generated at render time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Headers, format_mailbox};
pub use message::{MimeMessage, Part};
