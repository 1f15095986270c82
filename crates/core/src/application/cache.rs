// Validation cache - one run per (snippet text, command) pair

use super::handle::{outcome_channel, OutcomeHandle, OutcomeSlot};
use crate::domain::CacheKey;
use std::collections::HashMap;
use std::sync::Mutex;

/// Result of a cache lookup
#[derive(Debug)]
pub enum CacheLookup {
    /// Work already computed or in flight
    Hit(OutcomeHandle),
    /// Caller owns the slot and must get the work executed
    Miss(OutcomeHandle, OutcomeSlot),
}

/// Memo table of outcome handles
///
/// Lives for one run; entries are never evicted.
#[derive(Default)]
pub struct ValidationCache {
    entries: Mutex<HashMap<CacheKey, OutcomeHandle>>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically return the existing handle or reserve a new slot
    pub fn get_or_reserve(&self, key: CacheKey) -> CacheLookup {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(handle) = entries.get(&key) {
            return CacheLookup::Hit(handle.clone());
        }

        let (slot, handle) = outcome_channel();
        entries.insert(key, handle.clone());
        CacheLookup::Miss(handle, slot)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
