//! Election ledger
//!
//! Tracks, per group, whether this sentinel was elected to run the
//! in-flight failover. Never persisted: losing it only means this process
//! defers the write to the refresher or another sentinel.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ElectionLedger {
    elected: Mutex<HashMap<String, bool>>,
}

impl ElectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, bool>> {
        self.elected.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn mark_elected(&self, group: &str) {
        self.lock().insert(group.to_string(), true);
    }

    pub fn is_elected(&self, group: &str) -> bool {
        self.lock().get(group).copied().unwrap_or(false)
    }

    /// Return whether `group` was elected and clear the flag in one step.
    /// Absent groups stay absent.
    pub fn take(&self, group: &str) -> bool {
        match self.lock().get_mut(group) {
            Some(flag) => std::mem::replace(flag, false),
            None => false,
        }
    }

    /// Groups with an entry, elected or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
