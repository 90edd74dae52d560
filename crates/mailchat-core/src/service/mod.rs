//! High-level operations: message rendering, remote synchronization,
//! and forwarding.

mod forward;
mod mimefactory;
mod sync;

pub use forward::forward_messages;
pub use mimefactory::{MimeFactory, RenderedEmail};
pub use sync::{SyncJobRunner, delete_messages, ghost_global_id, mark_seen_message};
