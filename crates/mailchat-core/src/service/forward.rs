//! Copies existing messages into another chat as one atomic batch.

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::debug;

use crate::chat::{self, ChatId};
use crate::contact::{self, ContactId};
use crate::event::{Event, EventEmitter};
use crate::message::{self, MsgId};
use crate::param::keys;
use crate::storage::Storage;
use crate::{Error, Result};

/// Forwards messages into the destination chat.
///
/// Messages are processed in ascending (timestamp, id) order inside one
/// transaction; any failure to load a source message rolls back the
/// whole batch. Each copy is stamped with forwarding provenance: an
/// existing origin is preserved across forward chains, self-authored
/// messages carry the configured own address, everything else the
/// original author's contact. Events fire per created message only
/// after the transaction commits.
///
/// Returns the (chat id, new message id) pairs of the created copies.
///
/// # Errors
///
/// Fails on a reserved destination chat id, a missing destination chat,
/// a missing source message or author contact, or a database error.
pub async fn forward_messages(
    storage: &Storage,
    events: &impl EventEmitter,
    msg_ids: &[MsgId],
    dest_chat_id: ChatId,
) -> Result<Vec<(ChatId, MsgId)>> {
    if dest_chat_id.is_special() {
        return Err(Error::ReservedId(dest_chat_id.0));
    }

    let created = {
        let guard = storage.lock().await;
        let self_addr = guard.get_config_opt("configured_addr").await?;
        let self_name = guard.get_config_opt("displayname").await?;

        let mut tx = guard.begin().await?;
        let dest = chat::load_chat_tx(&mut tx, dest_chat_id).await?;
        let ordered = message::select_ids_ordered(&mut tx, msg_ids).await?;

        let mut created = Vec::with_capacity(ordered.len());
        for src_id in ordered {
            let mut msg = message::load_message_tx(&mut tx, src_id).await?;

            if msg.param.exists(keys::FORWARDED_ADDR) {
                // Forwarding an already forwarded message: the original
                // attribution travels along unchanged
            } else if msg.from_id == ContactId::SELF {
                // Stamp own messages too; in a forwarded batch a
                // missing hint on some messages reads like an error
                if let Some(addr) = &self_addr {
                    msg.param.set(keys::FORWARDED_ADDR, addr.as_str());
                }
                if let Some(name) = &self_name {
                    msg.param.set(keys::FORWARDED_NAME, name.as_str());
                }
            } else {
                let author = contact::load_contact_tx(&mut tx, msg.from_id).await?;
                msg.param.set(keys::FORWARDED_ADDR, author.addr.as_str());
                if !author.name.is_empty() {
                    msg.param.set(keys::FORWARDED_NAME, author.name.as_str());
                }
            }

            let global_id = create_outgoing_global_id(self_addr.as_deref().unwrap_or_default());
            let new_id = message::insert_outgoing_message(
                &mut tx,
                dest.id,
                &msg,
                Utc::now().timestamp(),
                &global_id,
            )
            .await?;
            created.push((dest.id, new_id));
        }

        tx.commit().await?;
        debug!(chat = %dest_chat_id, count = created.len(), "messages forwarded");
        created
    };

    // The lock is gone and the batch is durable; now tell the world
    for &(chat_id, msg_id) in &created {
        events.notify(Event::MsgsChanged { chat_id, msg_id });
    }

    Ok(created)
}

/// Mints a fresh global id for an outgoing message, scoped to the
/// sender's domain.
fn create_outgoing_global_id(from_addr: &str) -> String {
    let domain = from_addr
        .split_once('@')
        .map_or("localhost", |(_, domain)| domain);

    let mut rng = rand::thread_rng();
    let part1: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(11)
        .map(char::from)
        .collect();
    let part2: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(11)
        .map(char::from)
        .collect();

    format!("{part1}.{part2}@{domain}")
}
