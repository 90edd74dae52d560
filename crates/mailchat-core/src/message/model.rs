//! Message model types.

use serde::{Deserialize, Serialize};

use crate::chat::ChatId;
use crate::contact::ContactId;
use crate::param::Param;

/// Unique identifier for a message row.
///
/// Several rows may share one *global* message id (multi-recipient
/// delivery, ghost placeholder rows); this id names exactly one row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MsgId(pub i64);

impl MsgId {
    /// Largest reserved message id.
    pub const LAST_SPECIAL: Self = Self(9);

    /// Create a new message ID.
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

impl std::fmt::Display for MsgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MsgType {
    /// Not yet classified.
    #[default]
    Undefined,
    /// Plain text.
    Text,
    /// Still image.
    Image,
    /// Animated image.
    Gif,
    /// Audio file.
    Audio,
    /// Recorded voice message.
    Voice,
    /// Video file.
    Video,
    /// Arbitrary file.
    File,
}

impl MsgType {
    /// Parses the stored integer representation.
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        match value {
            10 => Self::Text,
            20 => Self::Image,
            21 => Self::Gif,
            40 => Self::Audio,
            41 => Self::Voice,
            50 => Self::Video,
            60 => Self::File,
            _ => Self::Undefined,
        }
    }

    /// The stored integer representation.
    #[must_use]
    pub const fn to_i64(self) -> i64 {
        match self {
            Self::Undefined => 0,
            Self::Text => 10,
            Self::Image => 20,
            Self::Gif => 21,
            Self::Audio => 40,
            Self::Voice => 41,
            Self::Video => 50,
            Self::File => 60,
        }
    }

    /// Whether messages of this kind carry a file attachment.
    #[must_use]
    pub const fn needs_attachment(self) -> bool {
        matches!(
            self,
            Self::Image | Self::Gif | Self::Audio | Self::Voice | Self::Video | Self::File
        )
    }
}

/// Lifecycle state of a message.
///
/// The seen-flag transition is monotonic: `InUnseen` may become
/// `InSeen`, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MsgState {
    /// Not yet classified.
    #[default]
    Undefined,
    /// Incoming, not yet read.
    InUnseen,
    /// Incoming, read.
    InSeen,
    /// Outgoing, waiting for delivery.
    OutPending,
    /// Outgoing, delivery failed.
    OutError,
    /// Outgoing, accepted by the transport.
    OutDelivered,
    /// Outgoing, read receipt arrived.
    OutMdnReceived,
}

impl MsgState {
    /// Parses the stored integer representation.
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        match value {
            10 => Self::InUnseen,
            16 => Self::InSeen,
            20 => Self::OutPending,
            24 => Self::OutError,
            26 => Self::OutDelivered,
            28 => Self::OutMdnReceived,
            _ => Self::Undefined,
        }
    }

    /// The stored integer representation.
    #[must_use]
    pub const fn to_i64(self) -> i64 {
        match self {
            Self::Undefined => 0,
            Self::InUnseen => 10,
            Self::InSeen => 16,
            Self::OutPending => 20,
            Self::OutError => 24,
            Self::OutDelivered => 26,
            Self::OutMdnReceived => 28,
        }
    }
}

/// System event carried by a message, stored in the `S` param.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SystemCommand {
    /// Ordinary message.
    #[default]
    None,
    /// A member was added to the group.
    MemberAddedToGroup,
    /// A member was removed from the group.
    MemberRemovedFromGroup,
    /// The group was renamed.
    GroupNameChanged,
}

impl SystemCommand {
    /// Parses the stored integer representation.
    #[must_use]
    pub const fn from_i64(value: i64) -> Self {
        match value {
            1 => Self::MemberAddedToGroup,
            2 => Self::MemberRemovedFromGroup,
            3 => Self::GroupNameChanged,
            _ => Self::None,
        }
    }
}

/// A single message row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Row id.
    pub id: MsgId,
    /// Globally scoped message identifier; shared by duplicate rows.
    pub global_id: String,
    /// Remote folder the message lives in, empty until known.
    pub server_folder: String,
    /// Remote uid inside `server_folder`, 0 until known.
    pub server_uid: u32,
    /// Chat this message belongs to.
    pub chat_id: ChatId,
    /// Author.
    pub from_id: ContactId,
    /// Primary recipient (1:1 chats).
    pub to_id: ContactId,
    /// Unix timestamp of the message.
    pub timestamp: i64,
    /// Content kind.
    pub msg_type: MsgType,
    /// Lifecycle state.
    pub state: MsgState,
    /// Whether this message was sent by a chat client rather than a
    /// plain mailer.
    pub is_chat_message: bool,
    /// Message text; for attachments this may carry auxiliary data.
    pub text: String,
    /// Attribute bag.
    pub param: Param,
    /// Size hint of the attachment in bytes.
    pub byte_size: i64,
}

impl Message {
    /// The system event this message represents, if any.
    #[must_use]
    pub fn system_command(&self) -> SystemCommand {
        SystemCommand::from_i64(
            self.param
                .get_int(crate::param::keys::SYSTEM_COMMAND)
                .unwrap_or(0),
        )
    }

    /// A short content summary of this message.
    #[must_use]
    pub fn summary_text(&self, approx_chars: usize) -> String {
        summary_text_by_raw(self.msg_type, &self.text, approx_chars)
    }
}

/// A short content summary for the given type and raw text.
///
/// Media kinds map to a fixed word; everything else is the text with
/// line breaks flattened and truncated to roughly `approx_chars`.
#[must_use]
pub fn summary_text_by_raw(msg_type: MsgType, text: &str, approx_chars: usize) -> String {
    match msg_type {
        MsgType::Image => "Image".to_string(),
        MsgType::Video => "Video".to_string(),
        MsgType::Audio => "Audio".to_string(),
        MsgType::File => "File".to_string(),
        _ => truncate_and_unwrap(text, approx_chars),
    }
}

fn truncate_and_unwrap(text: &str, approx_chars: usize) -> String {
    let unwrapped: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if unwrapped.chars().count() <= approx_chars {
        return unwrapped;
    }

    let truncated: String = unwrapped.chars().take(approx_chars).collect();
    format!("{}...", truncated.trim_end())
}
