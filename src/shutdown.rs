use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

// ═══════════════════════════════════════════════════════════════════════════════
// COOPERATIVE CANCELLATION
// ═══════════════════════════════════════════════════════════════════════════════
//
// A batch checks the signal at its suspension points only:
// - before issuing each relay request
// - while sleeping between fetches
// Entries already committed to the price cache are never rolled back.
// ═══════════════════════════════════════════════════════════════════════════════

/// Cancellation flag plus a waker for tasks sleeping on it
#[derive(Debug, Default)]
pub struct CancelSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; callable from signal handlers and other threads
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called (immediately if it already was)
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel is not missed
            notified.as_mut().enable();

            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
