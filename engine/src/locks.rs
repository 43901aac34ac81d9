//! Per-record locks.
//!
//! Update and delete read a record, decide, then write. Running those steps
//! under the lock for the record's id keeps them atomic with respect to other
//! writers of the same id, while writers of different ids proceed in parallel.

use crate::RecordId;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

/// A lock per record id, created on first use and dropped once no caller
/// holds or waits on it.
#[derive(Debug, Default)]
pub struct RecordLocks {
    locks: DashMap<RecordId, Arc<Mutex<()>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `id`.
    pub fn with_lock<T>(&self, id: RecordId, f: impl FnOnce() -> T) -> T {
        // Clone out of the map so the shard is released before blocking.
        let lock = self.locks.entry(id).or_default().clone();
        let result = {
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f()
        };
        drop(lock);

        // Only the map's own handle left: nobody is waiting on this id.
        self.locks.remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Number of ids currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
