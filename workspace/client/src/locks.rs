//! Per-record mutual exclusion for store mutations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use common::ScenarioId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One FIFO lock per scenario id. Entries are created on demand and dropped
/// once nobody holds or waits for them.
#[derive(Debug, Default)]
pub(crate) struct RecordLocks {
    locks: Mutex<HashMap<ScenarioId, Arc<AsyncMutex<()>>>>,
}

impl RecordLocks {
    /// Waits until no other mutation of `id` is in progress.
    pub(crate) async fn acquire(&self, id: &ScenarioId) -> RecordGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(id.clone()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        RecordGuard {
            owner: self,
            id: id.clone(),
            _guard: guard,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub(crate) struct RecordGuard<'a> {
    owner: &'a RecordLocks,
    id: ScenarioId,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.owner.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // The map and this guard hold one reference each; anything above
        // that is a waiter.
        let idle = locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2);
        if idle {
            locks.remove(&self.id);
        }
    }
}
