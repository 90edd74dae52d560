//! Interrupt-safe wait primitive for the remote watch loop.

use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

/// A wakeup flag with no missed-wakeup window.
///
/// The waiter re-checks the flag under the same mutex used to set it
/// before parking, and the notifier's permit is stored, so an interrupt
/// delivered at any point - before the waiter arrives, between its flag
/// check and its park, or while it sleeps - wakes exactly one wait.
///
/// Remote mailbox implementations use this to cut an idle period short
/// and force an immediate reconnect/fetch cycle.
#[derive(Debug, Default)]
pub struct InterruptFlag {
    flag: Mutex<bool>,
    notify: Notify,
}

impl InterruptFlag {
    /// Creates a new, unsignaled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals the flag, waking the current or next waiter.
    pub fn interrupt(&self) {
        let mut flag = self.flag.lock().unwrap_or_else(PoisonError::into_inner);
        *flag = true;
        drop(flag);
        self.notify.notify_one();
    }

    /// Waits until the flag is signaled, then clears it.
    pub async fn wait(&self) {
        loop {
            // Register interest before checking the flag, so a signal
            // arriving in between is not lost
            let notified = self.notify.notified();
            {
                let mut flag = self.flag.lock().unwrap_or_else(PoisonError::into_inner);
                if *flag {
                    *flag = false;
                    return;
                }
            }
            notified.await;
        }
    }
}
