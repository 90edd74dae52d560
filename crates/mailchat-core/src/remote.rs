//! Contract of the remote mailbox connection.
//!
//! The wire protocol (IMAP framing, fetching, idling) is implemented
//! elsewhere; this crate only needs the operations below and their
//! retry semantics. All remote calls are made *outside* the storage
//! lock.

use crate::storage::StorageGuard;
use crate::{Error, Result};

/// Where a message lives on the remote server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    /// Server-side folder name.
    pub folder: String,
    /// Uid within the folder.
    pub uid: u32,
}

/// Result of a remote mark-seen call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenOutcome {
    /// The flag was set. The server may have relocated the message as a
    /// side effect; the new location is reported when it did.
    Updated(Option<RemoteLocation>),
    /// Connection-level problem; try again later.
    RetryLater,
}

/// Credentials and endpoint of the remote account.
#[derive(Debug, Clone)]
pub struct LoginParams {
    /// The local user's configured address.
    pub addr: String,
    /// Mail server hostname.
    pub mail_server: String,
    /// Mail server port.
    pub mail_port: u16,
    /// Login user.
    pub mail_user: String,
    /// Login password.
    pub mail_pw: String,
}

impl LoginParams {
    /// Loads the login parameters from config.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no address is configured, or
    /// a database error.
    pub async fn load(guard: &StorageGuard<'_>) -> Result<Self> {
        let addr = guard
            .get_config_opt("configured_addr")
            .await?
            .ok_or_else(|| Error::Config("configured_addr is not set".to_string()))?;

        let mail_port = guard
            .get_config("mail_port", "993")
            .await?
            .parse()
            .unwrap_or(993);

        Ok(Self {
            addr,
            mail_server: guard.get_config("mail_server", "").await?,
            mail_port,
            mail_user: guard.get_config("mail_user", "").await?,
            mail_pw: guard.get_config("mail_pw", "").await?,
        })
    }
}

/// Contract of the remote mailbox connection.
///
/// `watch_and_wait` is the only long-blocking operation; it must return
/// promptly when `interrupt_watch` is called, with no missed-wakeup
/// window (see [`crate::watch::InterruptFlag`] for a primitive
/// implementors can build on). Operations returning `false` or
/// [`SeenOutcome::RetryLater`] signal a transient condition: the caller
/// reschedules, they are never hard errors.
pub trait RemoteMailbox {
    /// Connects with the given credentials; returns whether the session
    /// is usable afterwards.
    fn connect(&self, params: &LoginParams) -> impl Future<Output = bool> + Send;

    /// Whether a usable session currently exists.
    fn is_connected(&self) -> bool;

    /// Fetches pending remote messages; returns success.
    fn fetch(&self) -> impl Future<Output = bool> + Send;

    /// Blocks until remote activity or interruption.
    fn watch_and_wait(&self) -> impl Future<Output = ()> + Send;

    /// Wakes `watch_and_wait`, forcing an immediate reconnect/fetch
    /// cycle.
    fn interrupt_watch(&self);

    /// Uploads a rendered message; returns its remote location, or
    /// `None` on failure.
    fn append(
        &self,
        timestamp: i64,
        raw: &[u8],
    ) -> impl Future<Output = Option<RemoteLocation>> + Send;

    /// Marks a message seen, optionally moving chat messages to the
    /// chats folder.
    fn mark_seen(
        &self,
        folder: &str,
        uid: u32,
        also_move: bool,
    ) -> impl Future<Output = SeenOutcome> + Send;

    /// Deletes a message; `false` means "retry later".
    fn delete(
        &self,
        global_id: &str,
        folder: &str,
        uid: u32,
    ) -> impl Future<Output = bool> + Send;
}
