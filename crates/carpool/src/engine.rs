//! The assignment engine - rebuilds an event's carpools from scratch.

use std::collections::HashMap;
use std::sync::Arc;

use hangout_core::{Attendance, AttendanceId, Driver, DriverId, EventId};
use hangout_storage::{Storage, StoreLock};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::{plan_assignment, CarpoolConfig, EventLocks, Result};

/// Result of one recomputation.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// The event's driver records after the run
    pub drivers: Vec<Driver>,
    /// The event's attendance records with their new driver references
    pub attendance: Vec<Attendance>,
    /// Eligible passengers that found no car
    pub unassigned: Vec<AttendanceId>,
}

impl Assignment {
    /// Attendance records riding with `driver`, the driver included.
    pub fn riders(&self, driver: DriverId) -> impl Iterator<Item = &Attendance> {
        self.attendance.iter().filter(move |a| a.driver_id == Some(driver))
    }
}

/// Exclusive access to one event, within this process and across processes
/// sharing the store. Released when dropped.
#[derive(Debug)]
pub struct EventGuard {
    _store: Option<StoreLock>,
    _local: OwnedMutexGuard<()>,
}

/// Rebuilds driver records and assignments for events in auto mode.
///
/// Each call discards the event's driver records, recreates them from the
/// driving attendees and reassigns every eligible passenger:
/// ```text
/// List → Plan → Replace drivers → Write assignments
/// ```
/// Runs for the same event are serialized through [`EventLocks`] and the
/// store's own event lock.
pub struct AssignmentEngine<S: Storage> {
    storage: Arc<S>,
    locks: EventLocks,
    config: CarpoolConfig,
}

impl<S: Storage> AssignmentEngine<S> {
    /// Create a new engine over `storage`.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            locks: EventLocks::new(),
            config: CarpoolConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: CarpoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing lock registry.
    pub fn with_locks(mut self, locks: EventLocks) -> Self {
        self.locks = locks;
        self
    }

    /// The underlying store.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The per-event lock registry.
    pub fn locks(&self) -> &EventLocks {
        &self.locks
    }

    /// The active configuration.
    pub fn config(&self) -> &CarpoolConfig {
        &self.config
    }

    /// Wait for exclusive access to `event_id`.
    ///
    /// Tasks of this process queue on [`EventLocks`] first, so at most one of
    /// them waits on the store's lock at a time.
    pub async fn lock_event(&self, event_id: EventId) -> Result<EventGuard> {
        let local = self.locks.lock(event_id).await;
        let store = self.storage.lock_event(event_id).await?;
        Ok(EventGuard { _store: store, _local: local })
    }

    /// Recompute every carpool of `event_id`.
    ///
    /// A store failure aborts the run and is returned. The store may then hold
    /// a partial result; calling `recompute` again repairs it.
    pub async fn recompute(&self, event_id: EventId) -> Result<Assignment> {
        let _guard = self.lock_event(event_id).await?;
        self.recompute_locked(event_id).await
    }

    /// Recompute while the caller already holds the event's lock.
    pub(crate) async fn recompute_locked(&self, event_id: EventId) -> Result<Assignment> {
        let attendance = self.storage.list_attendance(event_id).await?;
        let previous = self.storage.list_drivers(event_id).await?;

        let plan = plan_assignment(&attendance, &self.config);
        debug!(
            "Event {}: replacing {} driver records with {}",
            event_id,
            previous.len(),
            plan.drivers.len()
        );

        self.storage.replace_drivers(event_id, &plan.drivers).await?;

        let current: HashMap<AttendanceId, Option<DriverId>> =
            attendance.iter().map(|a| (a.id, a.driver_id)).collect();
        let mut writes = 0usize;
        for (id, driver) in &plan.assignments {
            if current.get(id) == Some(driver) {
                continue;
            }
            self.storage.set_assigned_driver(*id, *driver).await?;
            writes += 1;
        }

        let targets: HashMap<AttendanceId, Option<DriverId>> = plan.assignments.iter().copied().collect();
        let attendance = attendance
            .into_iter()
            .map(|mut a| {
                if let Some(driver) = targets.get(&a.id) {
                    a.driver_id = *driver;
                }
                a
            })
            .collect();

        info!(
            "Recomputed carpools for event {}: {} drivers, {} unassigned, {} records updated",
            event_id,
            plan.drivers.len(),
            plan.unassigned.len(),
            writes
        );

        Ok(Assignment {
            drivers: plan.drivers,
            attendance,
            unassigned: plan.unassigned,
        })
    }
}
