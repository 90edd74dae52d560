//! Messages: the central record of the data model.

mod model;
mod repository;

pub use model::{Message, MsgId, MsgState, MsgType, SystemCommand, summary_text_by_raw};
pub(crate) use repository::{
    insert_outgoing_message, load_message_tx, select_ids_ordered, update_message_chat_id,
};
