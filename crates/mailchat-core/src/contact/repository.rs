//! Contact storage queries.

use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};

use super::model::{Contact, ContactId};
use crate::storage::StorageGuard;
use crate::{Error, Result};

fn contact_from_row(row: &SqliteRow) -> Contact {
    Contact {
        id: ContactId(row.get("id")),
        name: row.get("name"),
        addr: row.get("addr"),
    }
}

const SELECT_CONTACT: &str = r"SELECT id, name, addr FROM contacts WHERE id = ?";

impl StorageGuard<'_> {
    /// Loads a contact by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContactNotFound`] if the row does not exist, or
    /// a database error.
    pub async fn load_contact(&self, id: ContactId) -> Result<Contact> {
        let row = sqlx::query(SELECT_CONTACT)
            .bind(id.0)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref()
            .map(contact_from_row)
            .ok_or(Error::ContactNotFound(id))
    }
}

/// Loads a contact inside an open transaction.
pub(crate) async fn load_contact_tx(conn: &mut SqliteConnection, id: ContactId) -> Result<Contact> {
    let row = sqlx::query(SELECT_CONTACT)
        .bind(id.0)
        .fetch_optional(conn)
        .await?;

    row.as_ref()
        .map(contact_from_row)
        .ok_or(Error::ContactNotFound(id))
}
