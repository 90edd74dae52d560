//! Coarse-locked `SQLite` storage handle.
//!
//! All row access goes through one [`StorageGuard`] obtained from
//! [`Storage::lock`]; the guard serializes every read-modify-write
//! sequence behind a single mutex. Multi-statement sections that must be
//! atomic additionally run inside an explicit transaction from
//! [`StorageGuard::begin`] - the lock alone does not provide rollback.
//!
//! The lock is never held across remote network calls: callers read what
//! the remote round-trip needs, drop the guard, and re-acquire it to
//! persist the result.

use std::path::{Path, PathBuf};

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::Result;

/// Storage handle owning the database pool and the coarse lock.
pub struct Storage {
    pool: SqlitePool,
    lock: Mutex<()>,
    blob_dir: PathBuf,
}

impl Storage {
    /// Opens the database at the given path, creating it and the schema
    /// if needed.
    ///
    /// Attachment files managed by this storage live in a `-blobs`
    /// directory next to the database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema
    /// creation fails.
    pub async fn open(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let storage = Self {
            pool,
            lock: Mutex::new(()),
            blob_dir: PathBuf::from(format!("{database_path}-blobs")),
        };
        storage.initialize().await?;
        debug!(path = database_path, "storage opened");
        Ok(storage)
    }

    /// Creates an in-memory storage for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema
    /// creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let storage = Self {
            pool,
            lock: Mutex::new(()),
            blob_dir: std::env::temp_dir().join("mailchat-blobs"),
        };
        storage.initialize().await?;
        Ok(storage)
    }

    /// Directory holding attachment files managed by this storage.
    #[must_use]
    pub fn blob_dir(&self) -> &Path {
        &self.blob_dir
    }

    /// Acquires the coarse storage lock.
    pub async fn lock(&self) -> StorageGuard<'_> {
        StorageGuard {
            pool: &self.pool,
            blob_dir: &self.blob_dir,
            _permit: self.lock.lock().await,
        }
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS config (
                keyname TEXT PRIMARY KEY,
                value TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL DEFAULT '',
                addr TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type INTEGER NOT NULL DEFAULT 0,
                name TEXT NOT NULL DEFAULT '',
                grpid TEXT NOT NULL DEFAULT '',
                param TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chats_contacts (
                chat_id INTEGER NOT NULL,
                contact_id INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS msgs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                global_id TEXT NOT NULL DEFAULT '',
                server_folder TEXT NOT NULL DEFAULT '',
                server_uid INTEGER NOT NULL DEFAULT 0,
                chat_id INTEGER NOT NULL DEFAULT 0,
                from_id INTEGER NOT NULL DEFAULT 0,
                to_id INTEGER NOT NULL DEFAULT 0,
                timestamp INTEGER NOT NULL DEFAULT 0,
                type INTEGER NOT NULL DEFAULT 0,
                state INTEGER NOT NULL DEFAULT 0,
                is_chat_msg INTEGER NOT NULL DEFAULT 0,
                txt TEXT NOT NULL DEFAULT '',
                param TEXT NOT NULL DEFAULT '',
                bytes INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_msgs_global_id ON msgs(global_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_msgs_chat ON msgs(chat_id, timestamp)")
            .execute(&self.pool)
            .await?;

        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_chats_contacts ON chats_contacts(chat_id)")
            .execute(&self.pool)
            .await?;

        // Row for the local user; its address lives in config
        sqlx::query(r"INSERT OR IGNORE INTO contacts (id, name, addr) VALUES (1, '', '')")
            .execute(&self.pool)
            .await?;

        // Keep organically assigned ids above the reserved special range
        for table in ["msgs", "chats", "contacts"] {
            sqlx::query(
                r"
                INSERT INTO sqlite_sequence (name, seq)
                SELECT ?, 9 WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = ?)
                ",
            )
            .bind(table)
            .bind(table)
            .execute(&self.pool)
            .await?;

            sqlx::query(r"UPDATE sqlite_sequence SET seq = 9 WHERE name = ? AND seq < 9")
                .bind(table)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}

/// Exclusive access to the storage.
///
/// Row-level queries are implemented as `impl StorageGuard` blocks in
/// the domain modules (`message`, `chat`, `contact`), so that all of
/// them flow through this one lock.
pub struct StorageGuard<'a> {
    pool: &'a SqlitePool,
    blob_dir: &'a Path,
    _permit: MutexGuard<'a, ()>,
}

impl StorageGuard<'_> {
    /// The underlying connection pool.
    pub(crate) fn pool(&self) -> &SqlitePool {
        self.pool
    }

    /// Directory holding attachment files managed by this storage.
    #[must_use]
    pub fn blob_dir(&self) -> &Path {
        self.blob_dir
    }

    /// Begins an explicit transaction.
    ///
    /// Dropping the transaction without committing rolls it back.
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be acquired.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Gets a config value, falling back to the given default.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_config(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_config_opt(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Gets a config value if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_config_opt(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query(r"SELECT value FROM config WHERE keyname = ?")
            .bind(key)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }

    /// Gets a config value interpreted as a boolean.
    ///
    /// Any non-zero integer counts as true; unset keys fall back to the
    /// given default.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_config_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self
            .get_config_opt(key)
            .await?
            .map_or(default, |value| value.parse::<i64>().unwrap_or(0) != 0))
    }

    /// Sets a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO config (keyname, value) VALUES (?, ?)
            ON CONFLICT(keyname) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
