//! Per-identifier mutual exclusion for analyze requests.
//!
//! Two requests for the same track served by this process run one after the
//! other, so the second one finds the record stored by the first instead of
//! downloading and inserting again. Requests for different tracks never wait
//! on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
pub struct IdentifierLocks {
    slots: Mutex<HashMap<String, Slot>>,
}

/// Holds the lock for one identifier until dropped.
pub struct IdentifierGuard<'a> {
    locks: &'a IdentifierLocks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl IdentifierLocks {
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // The map is only mutated by insert/remove, a poisoned map is still
        // consistent.
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Waits until no other holder has `id` locked, then locks it.
    pub async fn lock(&self, id: &str) -> IdentifierGuard<'_> {
        let slot = self
            .slots()
            .entry(id.to_string())
            .or_default()
            .clone();
        let guard = slot.lock_owned().await;
        IdentifierGuard {
            locks: self,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of identifiers currently locked or waited on.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for IdentifierGuard<'_> {
    fn drop(&mut self) {
        // Release the slot before checking whether anyone else still holds it.
        self.guard.take();
        let mut slots = self.locks.slots();
        if let Some(slot) = slots.get(&self.id) {
            if Arc::strong_count(slot) == 1 {
                slots.remove(&self.id);
            }
        }
    }
}
