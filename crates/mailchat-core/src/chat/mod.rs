//! Chats: conversation records grouping messages.

mod model;
mod repository;

pub use model::{Chat, ChatId, ChatType};
pub(crate) use repository::load_chat_tx;
