//! Driver model - one car going to an event.

use crate::attendance::Attendance;
use crate::id::{DriverId, EventId};
use crate::Time;
use serde::{Deserialize, Serialize};

/// A driver record. Capacity includes the driver's own seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Unique identifier
    pub id: DriverId,

    /// Owning event
    pub event_id: EventId,

    /// Driver display name
    pub name: String,

    /// Driver contact identifier
    pub contact: String,

    /// When the car leaves
    pub departure: Time,

    /// Total seats, always >= 1
    pub capacity: u32,

    /// Free-text vehicle description
    pub vehicle: Option<String>,

    /// Who created this record
    pub origin: DriverOrigin,

    /// When the record was created
    pub created_at: Time,
}

impl Driver {
    /// Create a manually registered driver. A capacity of 0 is raised to 1.
    pub fn manual(
        event_id: EventId,
        name: impl Into<String>,
        contact: impl Into<String>,
        departure: Time,
        capacity: u32,
    ) -> Self {
        Self {
            id: DriverId::new(),
            event_id,
            name: name.into(),
            contact: contact.into(),
            departure,
            capacity: capacity.max(1),
            vehicle: None,
            origin: DriverOrigin::Manual,
            created_at: chrono::Utc::now(),
        }
    }

    /// Derive an auto-generated driver from a driving attendee.
    ///
    /// Returns `None` when the attendee has no departure time.
    pub fn from_attendance(
        attendance: &Attendance,
        default_seats: u32,
        vehicle: impl Into<String>,
    ) -> Option<Self> {
        let departure = attendance.arrival?;
        Some(Self {
            id: DriverId::new(),
            event_id: attendance.event_id,
            name: attendance.name.clone(),
            contact: attendance.contact.clone(),
            departure,
            capacity: attendance.seats.unwrap_or(default_seats).max(1),
            vehicle: Some(vehicle.into()),
            origin: DriverOrigin::Auto,
            created_at: chrono::Utc::now(),
        })
    }

    /// Set the vehicle description.
    pub fn with_vehicle(mut self, vehicle: impl Into<String>) -> Self {
        self.vehicle = Some(vehicle.into());
        self
    }
}

/// Where a driver record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverOrigin {
    /// Generated by the assignment engine
    Auto,
    /// Registered by the driver in manual mode
    Manual,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{RsvpStatus, DEFAULT_SEATS};

    #[test]
    fn test_from_attendance_copies_fields() {
        let at = chrono::Utc::now();
        let rsvp = Attendance::new(EventId::new(), "Dee", "dee@example.com", RsvpStatus::Confirmed)
            .arriving(at)
            .driving(None);

        let driver = Driver::from_attendance(&rsvp, DEFAULT_SEATS, "Auto-assigned").unwrap();
        assert_eq!(driver.event_id, rsvp.event_id);
        assert_eq!(driver.contact, "dee@example.com");
        assert_eq!(driver.departure, at);
        assert_eq!(driver.capacity, 4);
        assert_eq!(driver.origin, DriverOrigin::Auto);
        assert_eq!(driver.vehicle.as_deref(), Some("Auto-assigned"));
    }

    #[test]
    fn test_zero_seats_means_driver_only() {
        let rsvp = Attendance::new(EventId::new(), "Eve", "eve@example.com", RsvpStatus::Confirmed)
            .arriving(chrono::Utc::now())
            .driving(Some(0));
        let driver = Driver::from_attendance(&rsvp, DEFAULT_SEATS, "x").unwrap();
        assert_eq!(driver.capacity, 1);
    }

    #[test]
    fn test_from_attendance_requires_time() {
        let rsvp = Attendance::new(EventId::new(), "Fay", "fay@example.com", RsvpStatus::Confirmed)
            .driving(Some(3));
        assert!(Driver::from_attendance(&rsvp, DEFAULT_SEATS, "x").is_none());
    }
}
