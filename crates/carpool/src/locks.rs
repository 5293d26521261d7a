//! Per-event mutual exclusion.
//!
//! Recomputation is a read-modify-write over all records of one event, so two
//! runs for the same event must not interleave. Different events never share
//! a lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hangout_core::EventId;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

/// Registry handing out one async lock per event.
#[derive(Debug, Clone, Default)]
pub struct EventLocks {
    inner: Arc<Mutex<HashMap<EventId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl EventLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `event_id`. Released when the guard drops.
    pub async fn lock(&self, event_id: EventId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody holds or waits on can go.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            map.entry(event_id).or_default().clone()
        };
        debug!("Waiting for lock on event {}", event_id);
        lock.lock_owned().await
    }

    /// Number of events currently locked or waited on.
    pub fn active(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.values().filter(|m| Arc::strong_count(m) > 1).count()
    }
}
