//! Hangout core data models.
//!
//! Events, the attendance records people submit for them, and the driver
//! records carpools are built from.

#![warn(missing_docs)]

mod id;

mod event;
mod attendance;
mod driver;

pub use id::*;

pub use event::{Event, CarpoolMode};
pub use attendance::{Attendance, RsvpStatus, DEFAULT_SEATS};
pub use driver::{Driver, DriverOrigin};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// Errors from parsing user-supplied enum values.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Unknown RSVP status
    #[error("unknown RSVP status: {0} (expected confirmed, declined or tentative)")]
    RsvpStatus(String),

    /// Unknown carpool mode
    #[error("unknown carpool mode: {0} (expected off, manual or auto)")]
    CarpoolMode(String),
}
