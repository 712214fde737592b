//! Key-based membership set used to report each environment once.

use std::collections::HashSet;
use std::sync::Mutex;

/// A set of dedup keys shared across a discovery run.
///
/// Lookup-and-insert happens under one lock with no await point in
/// between, so concurrent candidate resolutions cannot both claim the same
/// key even on a multi-threaded runtime.
#[derive(Debug, Default)]
pub struct Ledger {
    keys: Mutex<HashSet<String>>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`. Returns `true` if it was not present before.
    pub fn insert(&self, key: impl Into<String>) -> bool {
        self.lock().insert(key.into())
    }

    /// Whether `key` has been recorded.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    /// Number of recorded keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A panic while holding the lock cannot leave the set half-updated.
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
