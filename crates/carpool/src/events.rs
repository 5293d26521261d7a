//! Event administration.

use std::sync::Arc;

use hangout_core::{CarpoolMode, Event, EventId, Time};
use hangout_storage::Storage;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AssignmentEngine, CarpoolError, Result};

/// Data for a new event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    /// Title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Start time
    pub starts_at: Time,
    /// Location
    pub location: String,
    /// Carpool mode
    pub carpool_mode: CarpoolMode,
}

/// Creates events and switches their carpool mode.
pub struct EventService<S: Storage> {
    engine: Arc<AssignmentEngine<S>>,
}

impl<S: Storage> EventService<S> {
    /// Create a service on top of an engine.
    pub fn new(engine: Arc<AssignmentEngine<S>>) -> Self {
        Self { engine }
    }

    /// Create and store an event.
    pub async fn create(&self, new: NewEvent) -> Result<Event> {
        let mut event = Event::new(new.title, new.starts_at, new.location).with_mode(new.carpool_mode);
        event.description = new.description;
        self.engine.storage().save_event(&event).await?;
        info!("Created event {} ({})", event.id, event.title);
        Ok(event)
    }

    /// Load an event.
    pub async fn get(&self, id: EventId) -> Result<Event> {
        self.engine
            .storage()
            .load_event(id)
            .await?
            .ok_or(CarpoolError::EventNotFound(id))
    }

    /// All events, earliest first.
    pub async fn list(&self) -> Result<Vec<Event>> {
        Ok(self.engine.storage().list_events().await?)
    }

    /// Change the carpool mode. Switching to auto builds carpools right away.
    pub async fn set_mode(&self, id: EventId, mode: CarpoolMode) -> Result<Event> {
        let _guard = self.engine.lock_event(id).await?;
        let mut event = self.get(id).await?;
        let previous = event.carpool_mode;
        event.carpool_mode = mode;
        self.engine.storage().save_event(&event).await?;
        info!("Event {} carpool mode {} -> {}", id, previous, mode);

        if mode == CarpoolMode::Auto && previous != CarpoolMode::Auto {
            self.engine.recompute_locked(id).await?;
        }
        Ok(event)
    }

    /// Recompute an auto-mode event on demand.
    pub async fn recompute(&self, id: EventId) -> Result<crate::Assignment> {
        let event = self.get(id).await?;
        if event.carpool_mode != CarpoolMode::Auto {
            return Err(CarpoolError::ModeMismatch {
                event_id: id,
                expected: CarpoolMode::Auto,
                actual: event.carpool_mode,
            });
        }
        self.engine.recompute(id).await
    }
}
