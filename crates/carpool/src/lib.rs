//! Carpool assignment for Hangout events.
//!
//! The [`AssignmentEngine`] rebuilds an auto-mode event's carpools from its
//! attendance on every change. The services around it record RSVPs, manage
//! manual-mode cars and administer events.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod plan;
pub mod locks;
pub mod engine;
pub mod rsvp;
pub mod manual;
pub mod events;

pub use config::{CarpoolConfig, AUTO_VEHICLE_NOTE};
pub use error::{CarpoolError, Result};
pub use plan::{plan_assignment, minutes_between, AssignmentPlan};
pub use locks::EventLocks;
pub use engine::{AssignmentEngine, Assignment, EventGuard};
pub use rsvp::{RsvpService, RsvpRequest};
pub use manual::{ManualCarpool, DriverRequest, DriverRoster, PassengerInfo, occupied_seats};
pub use events::{EventService, NewEvent};
