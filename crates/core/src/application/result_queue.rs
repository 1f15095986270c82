// Result queue - pending outcomes in submission order

use super::handle::OutcomeHandle;
use crate::domain::DocumentId;
use std::collections::VecDeque;

/// One requested validation waiting to be reported
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub document: DocumentId,
    pub content: String,
    pub command: String,
    pub handle: OutcomeHandle,
}

/// FIFO of pending entries
///
/// Appended to and drained from the control thread only. Entries leave from
/// the front, never out of order.
#[derive(Debug, Default)]
pub struct ResultQueue {
    entries: VecDeque<PendingEntry>,
}

impl ResultQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PendingEntry) {
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove the front entry regardless of its state
    pub fn pop_front(&mut self) -> Option<PendingEntry> {
        self.entries.pop_front()
    }

    /// Remove the front entry only if its outcome is already available
    pub fn pop_ready(&mut self) -> Option<PendingEntry> {
        if self.entries.front()?.handle.is_resolved() {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Drop every entry, returning how many were discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.entries.len();
        self.entries.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handle::outcome_channel;
    use crate::domain::Outcome;

    fn entry(command: &str, handle: OutcomeHandle) -> PendingEntry {
        PendingEntry {
            document: "doc.md".to_string(),
            content: "x".to_string(),
            command: command.to_string(),
            handle,
        }
    }

    #[test]
    fn test_pop_ready_stops_at_pending_front() {
        let (first_slot, first) = outcome_channel();
        let mut queue = ResultQueue::new();
        queue.push(entry("first", first));
        queue.push(entry("second", OutcomeHandle::ready(Outcome::Success)));

        // Second is done but must not overtake the first
        assert!(queue.pop_ready().is_none());
        assert_eq!(queue.len(), 2);

        first_slot.resolve(Outcome::Success);
        assert_eq!(queue.pop_ready().unwrap().command, "first");
        assert_eq!(queue.pop_ready().unwrap().command, "second");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_counts() {
        let mut queue = ResultQueue::new();
        queue.push(entry("a", OutcomeHandle::ready(Outcome::Success)));
        queue.push(entry("b", OutcomeHandle::ready(Outcome::Success)));
        assert_eq!(queue.clear(), 2);
        assert!(queue.pop_front().is_none());
    }
}
