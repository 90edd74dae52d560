//! Error types for the core library.

use crate::chat::ChatId;
use crate::contact::ContactId;
use crate::message::MsgId;
use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// MIME building failed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailchat_mime::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Message not found.
    #[error("Message not found: {0}")]
    MessageNotFound(MsgId),

    /// Chat not found.
    #[error("Chat not found: {0}")]
    ChatNotFound(ChatId),

    /// Contact not found.
    #[error("Contact not found: {0}")]
    ContactNotFound(ContactId),

    /// A reserved special id was passed where a real row id is required.
    #[error("Reserved id: {0}")]
    ReservedId(i64),

    /// Rendering produced no body part with content.
    #[error("Message has no content to send")]
    EmptyMessage,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
