//! Deferred remote-synchronization jobs and the scheduler contract.
//!
//! Job persistence and the scheduling loop live outside this crate; the
//! core only enqueues jobs and reports per-run outcomes. A
//! [`JobOutcome::RetryLater`] asks the scheduler to run the job again
//! after [`STANDARD_DELAY`]; retries continue until the job succeeds or
//! is removed externally.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::message::MsgId;
use crate::param::Param;

/// Fixed backoff interval applied after a transient failure.
pub const STANDARD_DELAY: Duration = Duration::from_secs(60);

/// Kind of deferred remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobAction {
    /// Delete the message on the remote mailbox, then clean up locally.
    DeleteOnRemote,
    /// Mark the message seen on the remote mailbox.
    MarkSeenOnRemote,
}

/// One queued unit of remote work.
///
/// Retry bookkeeping (attempt counters, next-run timestamps) belongs to
/// the external scheduler and is deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// What to do.
    pub action: JobAction,
    /// The message row the job refers to.
    pub foreign_id: MsgId,
    /// Extra job parameters.
    pub param: Param,
}

impl Job {
    /// Creates a job without extra parameters.
    #[must_use]
    pub fn new(action: JobAction, foreign_id: MsgId) -> Self {
        Self {
            action,
            foreign_id,
            param: Param::new(),
        }
    }
}

/// Result of one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job finished or was abandoned; do not run it again.
    Done,
    /// Transient failure; run the job again after [`STANDARD_DELAY`].
    RetryLater,
}

/// Contract of the external job scheduler.
pub trait JobScheduler {
    /// Enqueues a job for later execution.
    fn enqueue(
        &self,
        action: JobAction,
        foreign_id: MsgId,
        param: Param,
    ) -> impl Future<Output = ()> + Send;
}
