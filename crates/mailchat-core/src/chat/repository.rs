//! Chat storage queries.

use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};

use super::model::{Chat, ChatId, ChatType};
use crate::param::Param;
use crate::storage::StorageGuard;
use crate::{Error, Result};

fn chat_from_row(row: &SqliteRow) -> Chat {
    Chat {
        id: ChatId(row.get("id")),
        chat_type: ChatType::from_i64(row.get("type")),
        name: row.get("name"),
        group_id: row.get("grpid"),
        param: Param::from_packed(row.get("param")),
    }
}

const SELECT_CHAT: &str = r"SELECT id, type, name, grpid, param FROM chats WHERE id = ?";

impl StorageGuard<'_> {
    /// Loads a chat by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChatNotFound`] if the row does not exist, or a
    /// database error.
    pub async fn load_chat(&self, id: ChatId) -> Result<Chat> {
        let row = sqlx::query(SELECT_CHAT)
            .bind(id.0)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref()
            .map(chat_from_row)
            .ok_or(Error::ChatNotFound(id))
    }

    /// Persists a chat's param map.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update_chat_param(&self, chat: &Chat) -> Result<()> {
        sqlx::query(r"UPDATE chats SET param = ? WHERE id = ?")
            .bind(chat.param.to_packed())
            .bind(chat.id.0)
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Lists the (name, address) pairs of the chat's members, excluding
    /// reserved contacts.
    ///
    /// Rows come back in member-list order; deduplication is the
    /// caller's concern.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn chat_recipients(&self, chat_id: ChatId) -> Result<Vec<(String, String)>> {
        let rows = sqlx::query(
            r"
            SELECT c.name, c.addr FROM chats_contacts cc
            LEFT JOIN contacts c ON cc.contact_id = c.id
            WHERE cc.chat_id = ? AND cc.contact_id > ?
            ORDER BY cc.rowid
            ",
        )
        .bind(chat_id.0)
        .bind(crate::contact::ContactId::LAST_SPECIAL.0)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("name"), row.get("addr")))
            .collect())
    }
}

/// Loads a chat inside an open transaction.
pub(crate) async fn load_chat_tx(conn: &mut SqliteConnection, id: ChatId) -> Result<Chat> {
    let row = sqlx::query(SELECT_CHAT)
        .bind(id.0)
        .fetch_optional(conn)
        .await?;

    row.as_ref()
        .map(chat_from_row)
        .ok_or(Error::ChatNotFound(id))
}
