//! Carpool error types.

use hangout_core::{CarpoolMode, DriverId, EventId};
use hangout_storage::StorageError;

/// Result type for carpool operations.
pub type Result<T> = std::result::Result<T, CarpoolError>;

/// Errors surfaced by the assignment engine and the carpool services.
#[derive(Debug, thiserror::Error)]
pub enum CarpoolError {
    /// A store read or write failed; the current operation was aborted
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// No such event
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// No such driver record
    #[error("Driver not found: {0}")]
    DriverNotFound(DriverId),

    /// The contact has no confirmed RSVP for the event
    #[error("{contact} has no confirmed RSVP for event {event_id}")]
    NotAttending {
        /// Event looked up
        event_id: EventId,
        /// Contact looked up
        contact: String,
    },

    /// Every seat of the car is taken
    #[error("Car {0} is full")]
    CarFull(DriverId),

    /// The operation is not available in the event's carpool mode
    #[error("Event {event_id} is in {actual} carpool mode, expected {expected}")]
    ModeMismatch {
        /// Event checked
        event_id: EventId,
        /// Mode the operation needs
        expected: CarpoolMode,
        /// Mode the event is in
        actual: CarpoolMode,
    },

    /// A car must have room for at least its driver
    #[error("Capacity must be at least 1")]
    InvalidCapacity,
}
