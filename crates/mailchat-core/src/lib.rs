//! # mailchat-core
//!
//! Core backend logic for the mailchat messenger, a store-and-forward
//! chat system riding on an email transport (IMAP/SMTP).
//!
//! This crate provides:
//! - Data model (messages, chats, contacts, the param attribute bag)
//! - Coarse-locked `SQLite` storage with explicit transactions
//! - **`MimeFactory`** - renders a stored message into a wire-format mail
//!   with threading, recipient, and encryption metadata
//! - **`SyncJobRunner`** - executes deferred delete/mark-seen operations
//!   against the remote mailbox with transient-failure retry
//! - **Forwarding** - copies messages into another chat as one atomic
//!   batch, stamping provenance
//! - Contracts for the external collaborators: remote mailbox,
//!   encryption, job scheduling, and event notification
//!
//! Local state changes (delete, mark-seen) are visible immediately;
//! remote synchronization converges eventually through rescheduled jobs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod chat;
pub mod contact;
pub mod encrypt;
mod error;
pub mod event;
pub mod job;
pub mod message;
pub mod param;
pub mod remote;
pub mod service;
pub mod storage;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_utils;

pub use chat::{Chat, ChatId, ChatType};
pub use contact::{Contact, ContactId};
pub use encrypt::{Encryptor, PlaintextEncryptor};
pub use error::{Error, Result};
pub use event::{Event, EventEmitter, NullEmitter};
pub use job::{Job, JobAction, JobOutcome, JobScheduler, STANDARD_DELAY};
pub use message::{Message, MsgId, MsgState, MsgType, SystemCommand};
pub use param::Param;
pub use remote::{LoginParams, RemoteLocation, RemoteMailbox, SeenOutcome};
pub use service::{
    MimeFactory, RenderedEmail, SyncJobRunner, delete_messages, forward_messages,
    mark_seen_message,
};
pub use storage::{Storage, StorageGuard};
pub use watch::InterruptFlag;
