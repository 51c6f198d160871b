//! Per-repo run serialization.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Registry of per-repo async locks.
///
/// A scheduled run and a manual run for the same repo serialize on the
/// same lock; runs for different repos never contend. Locks are created
/// lazily and kept for the registry's lifetime (repo cardinality is small).
#[derive(Debug, Default)]
pub struct RunLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl RunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `repo`, creating it on first use.
    pub fn lock_for(&self, repo: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(
            locks
                .entry(repo.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}
