//! Storage trait abstraction.

use async_trait::async_trait;
use hangout_core::{Attendance, AttendanceId, Driver, DriverId, Event, EventId};

use crate::StoreLock;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for events, attendance and driver records.
///
/// Every operation takes `&self` so one store can be shared between
/// recomputations of different events. Listings are event-scoped and come
/// back in a stable order: attendance by ascending id, drivers by departure
/// time then id.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Event operations ===

    /// Save an event (create or update).
    async fn save_event(&self, event: &Event) -> Result<()>;

    /// Load an event by ID.
    async fn load_event(&self, id: EventId) -> Result<Option<Event>>;

    /// List all events, earliest start first.
    async fn list_events(&self) -> Result<Vec<Event>>;

    // === Attendance operations ===

    /// Save an attendance record (create or update).
    async fn save_attendance(&self, attendance: &Attendance) -> Result<()>;

    /// Load an attendance record by ID.
    async fn load_attendance(&self, id: AttendanceId) -> Result<Option<Attendance>>;

    /// List all attendance records of an event.
    async fn list_attendance(&self, event_id: EventId) -> Result<Vec<Attendance>>;

    /// Find the attendance record of `contact` for an event.
    async fn find_attendance(&self, event_id: EventId, contact: &str) -> Result<Option<Attendance>> {
        Ok(self
            .list_attendance(event_id)
            .await?
            .into_iter()
            .find(|a| a.contact.eq_ignore_ascii_case(contact)))
    }

    /// Point an attendance record at a driver, or clear it with `None`.
    async fn set_assigned_driver(&self, id: AttendanceId, driver: Option<DriverId>) -> Result<()> {
        let Some(mut attendance) = self.load_attendance(id).await? else {
            return Err(StorageError::NotFound(format!("attendance {}", id)));
        };
        attendance.driver_id = driver;
        self.save_attendance(&attendance).await
    }

    // === Driver operations ===

    /// Save a single driver record (create or update).
    async fn save_driver(&self, driver: &Driver) -> Result<()>;

    /// Load a driver record by ID.
    async fn load_driver(&self, id: DriverId) -> Result<Option<Driver>>;

    /// List the driver records of an event.
    async fn list_drivers(&self, event_id: EventId) -> Result<Vec<Driver>>;

    /// Delete every driver record of an event and store `drivers` instead.
    async fn replace_drivers(&self, event_id: EventId, drivers: &[Driver]) -> Result<()>;

    // === Locking ===

    /// Take the event's lock shared with other processes opening the same
    /// store. Stores only one process can reach return `None`.
    async fn lock_event(&self, _event_id: EventId) -> Result<Option<StoreLock>> {
        Ok(None)
    }
}

/// Order attendance the way every backend lists it.
pub(crate) fn sort_attendance(items: &mut [Attendance]) {
    items.sort_by(|a, b| a.id.cmp(&b.id));
}

/// Order drivers the way every backend lists them.
pub(crate) fn sort_drivers(items: &mut [Driver]) {
    items.sort_by(|a, b| a.departure.cmp(&b.departure).then(a.id.cmp(&b.id)));
}
