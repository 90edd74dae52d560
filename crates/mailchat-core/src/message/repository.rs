//! Message storage queries.

use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};

use super::model::{Message, MsgId, MsgState, MsgType};
use crate::chat::ChatId;
use crate::contact::ContactId;
use crate::param::Param;
use crate::storage::StorageGuard;
use crate::{Error, Result};

fn message_from_row(row: &SqliteRow) -> Message {
    Message {
        id: MsgId(row.get("id")),
        global_id: row.get("global_id"),
        server_folder: row.get("server_folder"),
        server_uid: row.get::<u32, _>("server_uid"),
        chat_id: ChatId(row.get("chat_id")),
        from_id: ContactId(row.get("from_id")),
        to_id: ContactId(row.get("to_id")),
        timestamp: row.get("timestamp"),
        msg_type: MsgType::from_i64(row.get("type")),
        state: MsgState::from_i64(row.get("state")),
        is_chat_message: row.get::<i64, _>("is_chat_msg") != 0,
        text: row.get("txt"),
        param: Param::from_packed(row.get("param")),
        byte_size: row.get("bytes"),
    }
}

const MSG_FIELDS: &str = r"id, global_id, server_folder, server_uid, chat_id, from_id, to_id,
    timestamp, type, state, is_chat_msg, txt, param, bytes";

impl StorageGuard<'_> {
    /// Loads a message by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if the row does not exist, or
    /// a database error.
    pub async fn load_message(&self, id: MsgId) -> Result<Message> {
        self.try_load_message(id)
            .await?
            .ok_or(Error::MessageNotFound(id))
    }

    /// Loads a message by id, returning `None` when the row is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn try_load_message(&self, id: MsgId) -> Result<Option<Message>> {
        let row = sqlx::query(&format!(r"SELECT {MSG_FIELDS} FROM msgs WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.as_ref().map(message_from_row))
    }

    /// Counts the rows sharing a global message id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_messages_with_global_id(&self, global_id: &str) -> Result<i64> {
        let row = sqlx::query(r"SELECT COUNT(*) AS count FROM msgs WHERE global_id = ?")
            .bind(global_id)
            .fetch_one(self.pool())
            .await?;

        Ok(row.get("count"))
    }

    /// Updates the state only when the message currently has the given
    /// old state. Returns whether a row actually changed.
    ///
    /// This conditional form keeps the seen-flag transition monotonic
    /// and makes repeated calls idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update_message_state_conditional(
        &self,
        id: MsgId,
        old_state: MsgState,
        new_state: MsgState,
    ) -> Result<bool> {
        let result = sqlx::query(r"UPDATE msgs SET state = ? WHERE id = ? AND state = ?")
            .bind(new_state.to_i64())
            .bind(id.0)
            .bind(old_state.to_i64())
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates the stored remote location of every row sharing the
    /// global id.
    ///
    /// Keyed by global id rather than row id because several rows may
    /// refer to the same remote copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update_remote_location(
        &self,
        global_id: &str,
        server_folder: &str,
        server_uid: u32,
    ) -> Result<()> {
        sqlx::query(r"UPDATE msgs SET server_folder = ?, server_uid = ? WHERE global_id = ?")
            .bind(server_folder)
            .bind(server_uid)
            .bind(global_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Deletes one message row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete_message_row(&self, id: MsgId) -> Result<()> {
        sqlx::query(r"DELETE FROM msgs WHERE id = ?")
            .bind(id.0)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Deletes every row carrying the given synthetic ghost global id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete_ghost_rows(&self, ghost_global_id: &str) -> Result<()> {
        sqlx::query(r"DELETE FROM msgs WHERE global_id = ?")
            .bind(ghost_global_id)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Checks whether any non-text message still references the given
    /// attachment path in its param.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn attachment_used_by_other_message(&self, path: &str) -> Result<bool> {
        let row = sqlx::query(r"SELECT id FROM msgs WHERE type != ? AND param LIKE ? LIMIT 1")
            .bind(MsgType::Text.to_i64())
            .bind(format!("%f={path}%"))
            .fetch_optional(self.pool())
            .await?;

        Ok(row.is_some())
    }

    /// Global id of the newest message in the chat not authored by the
    /// local user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn newest_foreign_global_id(&self, chat_id: ChatId) -> Result<Option<String>> {
        let row = sqlx::query(
            r"
            SELECT global_id FROM msgs
            WHERE chat_id = ? AND from_id != ?
            ORDER BY timestamp DESC, id DESC LIMIT 1
            ",
        )
        .bind(chat_id.0)
        .bind(ContactId::SELF.0)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|row| row.get("global_id")))
    }

    /// Timestamp of the newest message in the chat, excluding one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn newest_message_timestamp_excluding(
        &self,
        chat_id: ChatId,
        excluding: MsgId,
    ) -> Result<Option<i64>> {
        let row = sqlx::query(r"SELECT MAX(timestamp) AS ts FROM msgs WHERE chat_id = ? AND id != ?")
            .bind(chat_id.0)
            .bind(excluding.0)
            .fetch_one(self.pool())
            .await?;

        Ok(row.get("ts"))
    }
}

/// Loads a message inside an open transaction.
pub(crate) async fn load_message_tx(conn: &mut SqliteConnection, id: MsgId) -> Result<Message> {
    let row = sqlx::query(&format!(r"SELECT {MSG_FIELDS} FROM msgs WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(conn)
        .await?;

    row.as_ref()
        .map(message_from_row)
        .ok_or(Error::MessageNotFound(id))
}

/// Moves a message into another chat inside an open transaction.
pub(crate) async fn update_message_chat_id(
    conn: &mut SqliteConnection,
    id: MsgId,
    chat_id: ChatId,
) -> Result<()> {
    sqlx::query(r"UPDATE msgs SET chat_id = ? WHERE id = ?")
        .bind(chat_id.0)
        .bind(id.0)
        .execute(conn)
        .await?;

    Ok(())
}

/// Resolves the given ids to existing rows ordered by (timestamp, id).
///
/// # Errors
///
/// Returns [`Error::MessageNotFound`] when any id has no row, so that
/// batch callers abort instead of silently skipping.
pub(crate) async fn select_ids_ordered(
    conn: &mut SqliteConnection,
    ids: &[MsgId],
) -> Result<Vec<MsgId>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql =
        format!(r"SELECT id FROM msgs WHERE id IN ({placeholders}) ORDER BY timestamp, id");

    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id.0);
    }
    let rows = query.fetch_all(conn).await?;

    let found: Vec<MsgId> = rows.iter().map(|row| MsgId(row.get("id"))).collect();
    for &id in ids {
        if !found.contains(&id) {
            return Err(Error::MessageNotFound(id));
        }
    }

    Ok(found)
}

/// Inserts a copy of `msg` as a fresh outgoing message in `chat_id`.
///
/// Returns the new row id.
pub(crate) async fn insert_outgoing_message(
    conn: &mut SqliteConnection,
    chat_id: ChatId,
    msg: &Message,
    timestamp: i64,
    global_id: &str,
) -> Result<MsgId> {
    let result = sqlx::query(
        r"
        INSERT INTO msgs
            (global_id, chat_id, from_id, to_id, timestamp, type, state,
             is_chat_msg, txt, param, bytes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(global_id)
    .bind(chat_id.0)
    .bind(ContactId::SELF.0)
    .bind(msg.to_id.0)
    .bind(timestamp)
    .bind(msg.msg_type.to_i64())
    .bind(MsgState::OutPending.to_i64())
    .bind(i64::from(msg.is_chat_message))
    .bind(&msg.text)
    .bind(msg.param.to_packed())
    .bind(msg.byte_size)
    .execute(conn)
    .await?;

    Ok(MsgId(result.last_insert_rowid()))
}
