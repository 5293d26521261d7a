//! Attendance model - one respondent's RSVP for one event.

use crate::id::{AttendanceId, DriverId, EventId};
use crate::{ParseError, Time};
use serde::{Deserialize, Serialize};

/// Seats assumed for a driver who did not state an offer.
pub const DEFAULT_SEATS: u32 = 4;

/// An attendance record, keyed by event + contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    /// Unique identifier
    pub id: AttendanceId,

    /// Event this response belongs to
    pub event_id: EventId,

    /// Display name of the respondent
    pub name: String,

    /// Contact identifier (email), unique per event
    pub contact: String,

    /// Response status
    pub status: RsvpStatus,

    /// Optional note to the organizer
    pub message: Option<String>,

    /// Whether the respondent is willing to drive
    #[serde(default)]
    pub will_drive: bool,

    /// Arrival (passenger) or departure (driver) time
    pub arrival: Option<Time>,

    /// Seats offered when driving
    pub seats: Option<u32>,

    /// Car this respondent is assigned to
    pub driver_id: Option<DriverId>,

    /// When the response was last submitted
    pub responded_at: Time,
}

impl Attendance {
    /// Create a new, unassigned attendance record.
    pub fn new(
        event_id: EventId,
        name: impl Into<String>,
        contact: impl Into<String>,
        status: RsvpStatus,
    ) -> Self {
        Self {
            id: AttendanceId::new(),
            event_id,
            name: name.into(),
            contact: contact.into(),
            status,
            message: None,
            will_drive: false,
            arrival: None,
            seats: None,
            driver_id: None,
            responded_at: chrono::Utc::now(),
        }
    }

    /// Set the arrival/departure time.
    pub fn arriving(mut self, at: Time) -> Self {
        self.arrival = Some(at);
        self
    }

    /// Mark as a driver offering `seats` (None means the default).
    pub fn driving(mut self, seats: Option<u32>) -> Self {
        self.will_drive = true;
        self.seats = seats;
        self
    }

    /// Confirmed and with a known time: the only records carpools consider.
    pub fn is_eligible(&self) -> bool {
        self.status == RsvpStatus::Confirmed && self.arrival.is_some()
    }
}

/// RSVP response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    /// Coming
    Confirmed,
    /// Not coming
    Declined,
    /// Maybe
    Tentative,
}

impl std::fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RsvpStatus::Confirmed => write!(f, "confirmed"),
            RsvpStatus::Declined => write!(f, "declined"),
            RsvpStatus::Tentative => write!(f, "tentative"),
        }
    }
}

impl std::str::FromStr for RsvpStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" | "yes" => Ok(RsvpStatus::Confirmed),
            "declined" | "no" => Ok(RsvpStatus::Declined),
            "tentative" | "maybe" => Ok(RsvpStatus::Tentative),
            _ => Err(ParseError::RsvpStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility() {
        let event_id = EventId::new();
        let now = chrono::Utc::now();

        let confirmed = Attendance::new(event_id, "Ann", "ann@example.com", RsvpStatus::Confirmed);
        assert!(!confirmed.is_eligible());
        assert!(confirmed.clone().arriving(now).is_eligible());

        let maybe = Attendance::new(event_id, "Bo", "bo@example.com", RsvpStatus::Tentative)
            .arriving(now);
        assert!(!maybe.is_eligible());
    }

    #[test]
    fn test_parse_status_aliases() {
        assert_eq!("yes".parse::<RsvpStatus>().unwrap(), RsvpStatus::Confirmed);
        assert_eq!("Maybe".parse::<RsvpStatus>().unwrap(), RsvpStatus::Tentative);
        assert!(matches!("later".parse::<RsvpStatus>(), Err(ParseError::RsvpStatus(_))));
    }
}
