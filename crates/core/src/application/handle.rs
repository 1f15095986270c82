// Outcome handles - shared view of one in-flight or finished validation

use crate::domain::{Outcome, RunError};
use std::time::Duration;
use tokio::sync::watch;

/// How a pending validation ended from the reader's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Done(Outcome),
    /// Work was dropped before it produced an outcome
    Cancelled,
}

/// Read side, cloned into every queue entry that references the same work
#[derive(Debug, Clone)]
pub struct OutcomeHandle {
    rx: watch::Receiver<Option<Outcome>>,
}

/// Write side, owned by whoever runs the work; dropping it unresolved cancels
#[derive(Debug)]
pub struct OutcomeSlot {
    tx: watch::Sender<Option<Outcome>>,
}

/// Create a linked slot/handle pair
pub fn outcome_channel() -> (OutcomeSlot, OutcomeHandle) {
    let (tx, rx) = watch::channel(None);
    (OutcomeSlot { tx }, OutcomeHandle { rx })
}

impl OutcomeSlot {
    /// Publish the outcome to every handle
    pub fn resolve(self, outcome: Outcome) {
        self.tx.send_replace(Some(outcome));
    }
}

impl OutcomeHandle {
    /// Handle that is already resolved
    pub fn ready(outcome: Outcome) -> Self {
        let (slot, handle) = outcome_channel();
        slot.resolve(outcome);
        handle
    }

    /// Non-blocking read; `None` while the work is still pending
    pub fn try_resolution(&self) -> Option<Resolution> {
        if let Some(outcome) = self.rx.borrow().clone() {
            return Some(Resolution::Done(outcome));
        }
        // Sender gone without a value
        if self.rx.has_changed().is_err() {
            return Some(Resolution::Cancelled);
        }
        None
    }

    pub fn is_resolved(&self) -> bool {
        self.try_resolution().is_some()
    }

    /// Wait at most `limit`; running out of time yields a timeout `RunError`
    pub async fn wait(&self, limit: Duration) -> Resolution {
        let mut rx = self.rx.clone();
        let resolution = match tokio::time::timeout(limit, rx.wait_for(Option::is_some)).await {
            Ok(Ok(value)) => match value.clone() {
                Some(outcome) => Resolution::Done(outcome),
                None => Resolution::Cancelled,
            },
            Ok(Err(_)) => Resolution::Cancelled,
            Err(_) => Resolution::Done(Outcome::RunError(RunError::Timeout(limit))),
        };
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_then_resolved() {
        let (slot, handle) = outcome_channel();
        let other = handle.clone();
        assert!(handle.try_resolution().is_none());

        slot.resolve(Outcome::Success);

        assert_eq!(handle.try_resolution(), Some(Resolution::Done(Outcome::Success)));
        assert_eq!(
            other.wait(Duration::from_millis(50)).await,
            Resolution::Done(Outcome::Success)
        );
    }

    #[tokio::test]
    async fn test_dropped_slot_is_cancelled() {
        let (slot, handle) = outcome_channel();
        drop(slot);
        assert_eq!(handle.try_resolution(), Some(Resolution::Cancelled));
        assert_eq!(
            handle.wait(Duration::from_secs(1)).await,
            Resolution::Cancelled
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wait_sees_outcome_resolved_later() {
        let (slot, handle) = outcome_channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            slot.resolve(Outcome::Success);
        });
        assert_eq!(
            handle.wait(Duration::from_secs(5)).await,
            Resolution::Done(Outcome::Success)
        );
        // Handle stays readable afterwards
        assert_eq!(handle.try_resolution(), Some(Resolution::Done(Outcome::Success)));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let (_slot, handle) = outcome_channel();
        let limit = Duration::from_millis(20);
        assert_eq!(
            handle.wait(limit).await,
            Resolution::Done(Outcome::RunError(RunError::Timeout(limit)))
        );
    }
}
