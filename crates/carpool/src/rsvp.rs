//! RSVP submission.

use std::sync::Arc;

use hangout_core::{Attendance, CarpoolMode, EventId, RsvpStatus, Time};
use hangout_storage::Storage;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AssignmentEngine, CarpoolError, Result};

/// A response as submitted by an attendee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpRequest {
    /// Event responded to
    pub event_id: EventId,
    /// Display name
    pub name: String,
    /// Contact identifier; identifies the respondent within the event
    pub contact: String,
    /// Response
    pub status: RsvpStatus,
    /// Optional note
    pub message: Option<String>,
    /// Willing to drive
    pub will_drive: bool,
    /// Arrival or departure time
    pub arrival: Option<Time>,
    /// Seats offered when driving
    pub seats: Option<u32>,
}

/// Records RSVPs and keeps auto-mode carpools up to date.
pub struct RsvpService<S: Storage> {
    engine: Arc<AssignmentEngine<S>>,
}

impl<S: Storage> RsvpService<S> {
    /// Create a service on top of an engine.
    pub fn new(engine: Arc<AssignmentEngine<S>>) -> Self {
        Self { engine }
    }

    /// Create or update the respondent's attendance record.
    ///
    /// An existing record keeps its id and car; everything the respondent
    /// states is overwritten. Events in auto mode are recomputed before this
    /// returns, and the returned record carries the new assignment. The event
    /// stays locked from the lookup to the end of the recompute.
    pub async fn submit(&self, request: RsvpRequest) -> Result<Attendance> {
        let storage = self.engine.storage();
        if storage.load_event(request.event_id).await?.is_none() {
            return Err(CarpoolError::EventNotFound(request.event_id));
        }

        let _guard = self.engine.lock_event(request.event_id).await?;
        let Some(event) = storage.load_event(request.event_id).await? else {
            return Err(CarpoolError::EventNotFound(request.event_id));
        };

        let mut attendance = match storage.find_attendance(event.id, &request.contact).await? {
            Some(mut existing) => {
                existing.status = request.status;
                existing.responded_at = chrono::Utc::now();
                existing
            }
            None => Attendance::new(event.id, request.name.as_str(), request.contact.as_str(), request.status),
        };
        attendance.message = request.message;
        attendance.will_drive = request.will_drive;
        attendance.arrival = request.arrival;
        attendance.seats = request.seats;
        storage.save_attendance(&attendance).await?;

        info!("RSVP {} from {} for event {}", attendance.status, attendance.contact, event.id);

        if event.carpool_mode == CarpoolMode::Auto {
            let assignment = self.engine.recompute_locked(event.id).await?;
            if let Some(updated) = assignment.attendance.into_iter().find(|a| a.id == attendance.id) {
                attendance = updated;
            }
        }

        Ok(attendance)
    }

    /// All responses for an event.
    pub async fn list(&self, event_id: EventId) -> Result<Vec<Attendance>> {
        Ok(self.engine.storage().list_attendance(event_id).await?)
    }
}
