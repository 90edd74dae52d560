//! Deferred remote synchronization and its synchronous local triggers.
//!
//! The local half of a state change (delete, mark-seen) mutates storage
//! immediately and enqueues a job; [`SyncJobRunner`] later reconciles
//! the remote mailbox with that state. Remote failures never surface to
//! the original caller - the run reports
//! [`JobOutcome::RetryLater`](crate::job::JobOutcome) and the scheduler
//! re-runs the job after [`STANDARD_DELAY`](crate::job::STANDARD_DELAY).

use std::path::Path;

use tracing::{debug, info, warn};

use crate::chat::ChatId;
use crate::job::{Job, JobAction, JobOutcome, JobScheduler};
use crate::message::{self, MsgId, MsgState};
use crate::param::{Param, keys};
use crate::remote::{LoginParams, RemoteMailbox, SeenOutcome};
use crate::storage::Storage;
use crate::Result;

/// The synthetic global id of the ghost rows bookkeeping a real row.
#[must_use]
pub fn ghost_global_id(id: MsgId) -> String {
    format!("GHOST-{}", id.0)
}

/// Executes deferred remote-synchronization jobs.
pub struct SyncJobRunner<'a, R> {
    storage: &'a Storage,
    remote: &'a R,
}

impl<'a, R: RemoteMailbox> SyncJobRunner<'a, R> {
    /// Creates a runner over the given storage and remote connection.
    #[must_use]
    pub fn new(storage: &'a Storage, remote: &'a R) -> Self {
        Self { storage, remote }
    }

    /// Runs one job to completion or transient failure.
    ///
    /// Missing rows abandon the job as already done; database errors
    /// count as transient and ask for a retry.
    pub async fn run(&self, job: &Job) -> JobOutcome {
        let result = match job.action {
            JobAction::DeleteOnRemote => self.delete_on_remote(job.foreign_id).await,
            JobAction::MarkSeenOnRemote => self.mark_seen_on_remote(job.foreign_id).await,
        };

        result.unwrap_or_else(|err| {
            warn!(action = ?job.action, msg = %job.foreign_id, %err, "job failed, retrying later");
            JobOutcome::RetryLater
        })
    }

    async fn ensure_connected(&self) -> Result<bool> {
        if self.remote.is_connected() {
            return Ok(true);
        }

        let params = {
            let guard = self.storage.lock().await;
            LoginParams::load(&guard).await?
        };
        // Network round-trip happens with the storage lock released
        self.remote.connect(&params).await;
        Ok(self.remote.is_connected())
    }

    async fn delete_on_remote(&self, msg_id: MsgId) -> Result<JobOutcome> {
        let (msg, delete_remote) = {
            let guard = self.storage.lock().await;
            let Some(msg) = guard.try_load_message(msg_id).await? else {
                debug!(msg = %msg_id, "message already gone, abandoning delete job");
                return Ok(JobOutcome::Done);
            };
            let copies = guard.count_messages_with_global_id(&msg.global_id).await?;
            (msg, copies == 1)
        };

        // Only the last local row owning the global id removes the
        // remote copy; as long as another row needs it, the remote
        // message must stay to avoid a re-download
        if delete_remote {
            if !self.ensure_connected().await? {
                return Ok(JobOutcome::RetryLater);
            }
            if !self
                .remote
                .delete(&msg.global_id, &msg.server_folder, msg.server_uid)
                .await
            {
                return Ok(JobOutcome::RetryLater);
            }
        } else {
            info!(global_id = %msg.global_id, "remote copy kept, other local rows still use it");
        }

        let guard = self.storage.lock().await;
        guard.delete_message_row(msg.id).await?;

        if let Some(path) = msg.param.get(keys::FILE) {
            if Path::new(path).starts_with(guard.blob_dir())
                && !guard.attachment_used_by_other_message(path).await?
            {
                if let Err(err) = tokio::fs::remove_file(path).await {
                    warn!(path, %err, "could not remove attachment file");
                }
            }
        }

        guard.delete_ghost_rows(&ghost_global_id(msg.id)).await?;

        Ok(JobOutcome::Done)
    }

    async fn mark_seen_on_remote(&self, msg_id: MsgId) -> Result<JobOutcome> {
        if !self.ensure_connected().await? {
            return Ok(JobOutcome::RetryLater);
        }

        let msg = {
            let guard = self.storage.lock().await;
            match guard.try_load_message(msg_id).await? {
                Some(msg) => msg,
                None => {
                    debug!(msg = %msg_id, "message gone, abandoning mark-seen job");
                    return Ok(JobOutcome::Done);
                }
            }
        };

        match self
            .remote
            .mark_seen(&msg.server_folder, msg.server_uid, msg.is_chat_message)
            .await
        {
            SeenOutcome::Updated(Some(location)) => {
                // The server moved the message; keep the stored remote
                // location in step for every row sharing the global id
                let guard = self.storage.lock().await;
                guard
                    .update_remote_location(&msg.global_id, &location.folder, location.uid)
                    .await?;
                Ok(JobOutcome::Done)
            }
            SeenOutcome::Updated(None) => Ok(JobOutcome::Done),
            SeenOutcome::RetryLater => Ok(JobOutcome::RetryLater),
        }
    }
}

/// Deletes messages locally and schedules their remote cleanup.
///
/// Each message moves to the trash chat inside one transaction, so the
/// caller observes the deletion instantly; the remote copy disappears
/// eventually through the enqueued jobs.
///
/// # Errors
///
/// Returns an error if the database transaction fails.
pub async fn delete_messages(
    storage: &Storage,
    scheduler: &impl JobScheduler,
    msg_ids: &[MsgId],
) -> Result<()> {
    if msg_ids.is_empty() {
        return Ok(());
    }

    {
        let guard = storage.lock().await;
        let mut tx = guard.begin().await?;
        for &id in msg_ids {
            message::update_message_chat_id(&mut tx, id, ChatId::TRASH).await?;
        }
        tx.commit().await?;
    }

    for &id in msg_ids {
        scheduler
            .enqueue(JobAction::DeleteOnRemote, id, Param::new())
            .await;
    }

    Ok(())
}

/// Marks a message seen locally and schedules the remote flag update.
///
/// The state moves from unseen to seen only when it currently is
/// unseen, which keeps the call idempotent, never flips an outgoing
/// message to incoming, and enqueues at most one job per transition.
/// Returns whether a state change happened.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub async fn mark_seen_message(
    storage: &Storage,
    scheduler: &impl JobScheduler,
    msg_id: MsgId,
) -> Result<bool> {
    let changed = {
        let guard = storage.lock().await;
        guard
            .update_message_state_conditional(msg_id, MsgState::InUnseen, MsgState::InSeen)
            .await?
    };

    if changed {
        scheduler
            .enqueue(JobAction::MarkSeenOnRemote, msg_id, Param::new())
            .await;
    }

    Ok(changed)
}
