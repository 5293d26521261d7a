//! Event model - the gathering people respond to.

use crate::id::EventId;
use crate::{ParseError, Time};
use serde::{Deserialize, Serialize};

/// An event that collects RSVPs and optionally organizes carpools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub id: EventId,

    /// Title shown to invitees
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// When the event starts
    pub starts_at: Time,

    /// Where it takes place
    pub location: String,

    /// How carpools are organized for this event
    #[serde(default)]
    pub carpool_mode: CarpoolMode,

    /// When the event was created
    pub created_at: Time,
}

impl Event {
    /// Create a new event with carpooling turned off.
    pub fn new(title: impl Into<String>, starts_at: Time, location: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            title: title.into(),
            description: None,
            starts_at,
            location: location.into(),
            carpool_mode: CarpoolMode::Off,
            created_at: chrono::Utc::now(),
        }
    }

    /// Set the carpool mode.
    pub fn with_mode(mut self, mode: CarpoolMode) -> Self {
        self.carpool_mode = mode;
        self
    }
}

/// Carpool organization mode of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarpoolMode {
    /// No carpooling
    #[default]
    Off,
    /// Attendees create, join and leave cars themselves
    Manual,
    /// Assignments are recomputed on every RSVP change
    Auto,
}

impl std::fmt::Display for CarpoolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CarpoolMode::Off => write!(f, "off"),
            CarpoolMode::Manual => write!(f, "manual"),
            CarpoolMode::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for CarpoolMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(CarpoolMode::Off),
            "manual" => Ok(CarpoolMode::Manual),
            "auto" => Ok(CarpoolMode::Auto),
            _ => Err(ParseError::CarpoolMode(s.to_string())),
        }
    }
}
