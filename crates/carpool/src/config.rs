//! Carpool configuration.

use hangout_core::DEFAULT_SEATS;
use serde::{Deserialize, Serialize};

/// Vehicle description written on auto-generated driver records.
pub const AUTO_VEHICLE_NOTE: &str = "Auto-assigned";

/// Configuration for the assignment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarpoolConfig {
    /// Seats assumed when a driver did not state an offer
    pub default_seats: u32,
    /// Placeholder vehicle description for generated drivers
    pub vehicle_note: String,
}

impl Default for CarpoolConfig {
    fn default() -> Self {
        Self {
            default_seats: DEFAULT_SEATS,
            vehicle_note: AUTO_VEHICLE_NOTE.to_string(),
        }
    }
}

impl CarpoolConfig {
    /// Set the default seat count. Values below 1 are raised to 1.
    pub fn with_default_seats(mut self, seats: u32) -> Self {
        self.default_seats = seats.max(1);
        self
    }

    /// Set the generated vehicle description.
    pub fn with_vehicle_note(mut self, note: impl Into<String>) -> Self {
        self.vehicle_note = note.into();
        self
    }
}
