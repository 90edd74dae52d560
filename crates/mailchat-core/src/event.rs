//! Event notification contract.

use crate::chat::ChatId;
use crate::message::MsgId;

/// Notification fired towards the embedding application.
///
/// Events are emitted only after a transaction commits and never while
/// the storage lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Messages in a chat changed (created, deleted, state change).
    MsgsChanged {
        /// Affected chat.
        chat_id: ChatId,
        /// Affected message.
        msg_id: MsgId,
    },
}

/// Contract of the event sink.
pub trait EventEmitter {
    /// Delivers one event.
    fn notify(&self, event: Event);
}

/// Event sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEmitter;

impl EventEmitter for NullEmitter {
    fn notify(&self, _event: Event) {}
}
