//! Manual carpools: drivers register cars and attendees join or leave them.

use std::sync::Arc;

use hangout_core::{Attendance, CarpoolMode, Driver, DriverId, Event, EventId, RsvpStatus, Time};
use hangout_storage::Storage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{AssignmentEngine, CarpoolError, Result};

/// A car offered by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRequest {
    /// Event the car goes to
    pub event_id: EventId,
    /// Driver display name
    pub name: String,
    /// Driver contact
    pub contact: String,
    /// When the car leaves
    pub departure: Time,
    /// Seats including the driver's
    pub capacity: u32,
    /// Vehicle description
    pub vehicle: Option<String>,
}

/// Someone riding in a car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerInfo {
    /// Display name
    pub name: String,
    /// Contact
    pub contact: String,
}

/// A driver with the people riding along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRoster {
    /// The car
    pub driver: Driver,
    /// Riders other than the driver
    pub passengers: Vec<PassengerInfo>,
    /// Seats still free
    pub spots_available: u32,
}

/// Seats taken in `driver`'s car. The driver's seat always counts, whether or
/// not their own attendance record points at the car.
pub fn occupied_seats(driver: &Driver, attendance: &[Attendance]) -> u32 {
    let riders: Vec<&Attendance> = attendance
        .iter()
        .filter(|a| a.driver_id == Some(driver.id))
        .collect();
    let driver_rides = riders.iter().any(|a| a.contact.eq_ignore_ascii_case(&driver.contact));
    riders.len() as u32 + u32::from(!driver_rides)
}

/// Driver-managed carpools for events in manual mode.
pub struct ManualCarpool<S: Storage> {
    engine: Arc<AssignmentEngine<S>>,
}

impl<S: Storage> ManualCarpool<S> {
    /// Create a service on top of an engine.
    pub fn new(engine: Arc<AssignmentEngine<S>>) -> Self {
        Self { engine }
    }

    async fn manual_event(&self, event_id: EventId) -> Result<Event> {
        let Some(event) = self.engine.storage().load_event(event_id).await? else {
            return Err(CarpoolError::EventNotFound(event_id));
        };
        if event.carpool_mode != CarpoolMode::Manual {
            return Err(CarpoolError::ModeMismatch {
                event_id,
                expected: CarpoolMode::Manual,
                actual: event.carpool_mode,
            });
        }
        Ok(event)
    }

    async fn driver(&self, driver_id: DriverId) -> Result<Driver> {
        self.engine
            .storage()
            .load_driver(driver_id)
            .await?
            .ok_or(CarpoolError::DriverNotFound(driver_id))
    }

    /// Register a car. A confirmed, carless RSVP of the driver is placed in it.
    pub async fn create_driver(&self, request: DriverRequest) -> Result<Driver> {
        if request.capacity == 0 {
            return Err(CarpoolError::InvalidCapacity);
        }
        let event = self.manual_event(request.event_id).await?;
        let _guard = self.engine.lock_event(event.id).await?;
        let storage = self.engine.storage();

        let mut driver = Driver::manual(event.id, request.name, request.contact, request.departure, request.capacity);
        if let Some(vehicle) = request.vehicle {
            driver = driver.with_vehicle(vehicle);
        }
        storage.save_driver(&driver).await?;

        if let Some(own) = storage.find_attendance(event.id, &driver.contact).await? {
            if own.status == RsvpStatus::Confirmed && own.driver_id.is_none() {
                storage.set_assigned_driver(own.id, Some(driver.id)).await?;
            }
        }

        info!("Driver {} offers {} seats for event {}", driver.contact, driver.capacity, event.id);
        Ok(driver)
    }

    /// Put `contact` in the car of `driver_id`.
    pub async fn join(&self, driver_id: DriverId, contact: &str) -> Result<()> {
        let driver = self.driver(driver_id).await?;
        self.manual_event(driver.event_id).await?;
        let _guard = self.engine.lock_event(driver.event_id).await?;
        let storage = self.engine.storage();

        let attendance = storage.list_attendance(driver.event_id).await?;
        let Some(rider) = attendance
            .iter()
            .find(|a| a.contact.eq_ignore_ascii_case(contact) && a.status == RsvpStatus::Confirmed)
        else {
            return Err(CarpoolError::NotAttending {
                event_id: driver.event_id,
                contact: contact.to_string(),
            });
        };

        if rider.driver_id == Some(driver.id) {
            debug!("{} already rides with {}", contact, driver.id);
            return Ok(());
        }
        if occupied_seats(&driver, &attendance) >= driver.capacity {
            return Err(CarpoolError::CarFull(driver.id));
        }

        storage.set_assigned_driver(rider.id, Some(driver.id)).await?;
        info!("{} joined car {}", contact, driver.id);
        Ok(())
    }

    /// Take `contact` out of the car of `driver_id`.
    pub async fn leave(&self, driver_id: DriverId, contact: &str) -> Result<()> {
        let driver = self.driver(driver_id).await?;
        self.manual_event(driver.event_id).await?;
        let _guard = self.engine.lock_event(driver.event_id).await?;
        let storage = self.engine.storage();

        let Some(rider) = storage.find_attendance(driver.event_id, contact).await? else {
            return Err(CarpoolError::NotAttending {
                event_id: driver.event_id,
                contact: contact.to_string(),
            });
        };
        if rider.driver_id == Some(driver.id) {
            storage.set_assigned_driver(rider.id, None).await?;
            info!("{} left car {}", contact, driver.id);
        }
        Ok(())
    }

    /// Every car of an event, earliest departure first, with its riders.
    pub async fn roster(&self, event_id: EventId) -> Result<Vec<DriverRoster>> {
        let storage = self.engine.storage();
        let drivers = storage.list_drivers(event_id).await?;
        let attendance = storage.list_attendance(event_id).await?;

        Ok(drivers
            .into_iter()
            .map(|driver| {
                let passengers = attendance
                    .iter()
                    .filter(|a| a.driver_id == Some(driver.id))
                    .filter(|a| !a.contact.eq_ignore_ascii_case(&driver.contact))
                    .map(|a| PassengerInfo {
                        name: a.name.clone(),
                        contact: a.contact.clone(),
                    })
                    .collect();
                let spots_available = driver.capacity.saturating_sub(occupied_seats(&driver, &attendance));
                DriverRoster {
                    driver,
                    passengers,
                    spots_available,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hangout_storage::JsonStorage;

    fn at(hour: u32, minute: u32) -> Time {
        chrono::Utc.with_ymd_and_hms(2026, 8, 1, hour, minute, 0).unwrap()
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        engine: Arc<AssignmentEngine<JsonStorage>>,
        manual: ManualCarpool<JsonStorage>,
        event_id: EventId,
    }

    async fn fixture(mode: CarpoolMode) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let event = Event::new("Concert", at(20, 0), "Arena").with_mode(mode);
        storage.save_event(&event).await.unwrap();
        let engine = Arc::new(AssignmentEngine::new(Arc::new(storage)));
        Fixture {
            _dir: dir,
            manual: ManualCarpool::new(engine.clone()),
            engine,
            event_id: event.id,
        }
    }

    async fn attend(f: &Fixture, name: &str, status: RsvpStatus) -> Attendance {
        let a = Attendance::new(f.event_id, name, format!("{}@example.com", name.to_lowercase()), status);
        f.engine.storage().save_attendance(&a).await.unwrap();
        a
    }

    fn car(f: &Fixture, capacity: u32) -> DriverRequest {
        DriverRequest {
            event_id: f.event_id,
            name: "Dana".to_string(),
            contact: "dana@example.com".to_string(),
            departure: at(19, 0),
            capacity,
            vehicle: Some("Blue hatchback".to_string()),
        }
    }

    #[tokio::test]
    async fn test_join_until_full() {
        let f = fixture(CarpoolMode::Manual).await;
        let dana = attend(&f, "Dana", RsvpStatus::Confirmed).await;
        attend(&f, "Ann", RsvpStatus::Confirmed).await;
        attend(&f, "Bo", RsvpStatus::Confirmed).await;

        let driver = f.manual.create_driver(car(&f, 2)).await.unwrap();
        let dana = f.engine.storage().load_attendance(dana.id).await.unwrap().unwrap();
        assert_eq!(dana.driver_id, Some(driver.id));

        f.manual.join(driver.id, "ann@example.com").await.unwrap();
        let err = f.manual.join(driver.id, "bo@example.com").await.unwrap_err();
        assert!(matches!(err, CarpoolError::CarFull(id) if id == driver.id));

        // Joining twice is not an error.
        f.manual.join(driver.id, "ann@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_driver_seat_counts_without_rsvp() {
        let f = fixture(CarpoolMode::Manual).await;
        attend(&f, "Ann", RsvpStatus::Confirmed).await;

        let driver = f.manual.create_driver(car(&f, 1)).await.unwrap();
        let err = f.manual.join(driver.id, "ann@example.com").await.unwrap_err();
        assert!(matches!(err, CarpoolError::CarFull(_)));
    }

    #[tokio::test]
    async fn test_leave_frees_seat() {
        let f = fixture(CarpoolMode::Manual).await;
        attend(&f, "Ann", RsvpStatus::Confirmed).await;
        attend(&f, "Bo", RsvpStatus::Confirmed).await;
        let driver = f.manual.create_driver(car(&f, 2)).await.unwrap();

        f.manual.join(driver.id, "ann@example.com").await.unwrap();
        assert_eq!(f.manual.roster(f.event_id).await.unwrap()[0].spots_available, 0);

        f.manual.leave(driver.id, "ann@example.com").await.unwrap();
        f.manual.join(driver.id, "bo@example.com").await.unwrap();

        let roster = f.manual.roster(f.event_id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(
            roster[0].passengers,
            vec![PassengerInfo { name: "Bo".to_string(), contact: "bo@example.com".to_string() }]
        );
    }

    #[tokio::test]
    async fn test_join_requires_confirmed_rsvp() {
        let f = fixture(CarpoolMode::Manual).await;
        attend(&f, "Maybe", RsvpStatus::Tentative).await;
        let driver = f.manual.create_driver(car(&f, 4)).await.unwrap();

        let err = f.manual.join(driver.id, "maybe@example.com").await.unwrap_err();
        assert!(matches!(err, CarpoolError::NotAttending { .. }));
        let err = f.manual.join(driver.id, "nobody@example.com").await.unwrap_err();
        assert!(matches!(err, CarpoolError::NotAttending { .. }));
    }

    #[tokio::test]
    async fn test_manual_ops_need_manual_mode() {
        let f = fixture(CarpoolMode::Auto).await;
        let err = f.manual.create_driver(car(&f, 3)).await.unwrap_err();
        assert!(matches!(
            err,
            CarpoolError::ModeMismatch { expected: CarpoolMode::Manual, actual: CarpoolMode::Auto, .. }
        ));
    }

    #[tokio::test]
    async fn test_invalid_capacity_and_unknown_driver() {
        let f = fixture(CarpoolMode::Manual).await;
        assert!(matches!(f.manual.create_driver(car(&f, 0)).await, Err(CarpoolError::InvalidCapacity)));
        assert!(matches!(
            f.manual.join(DriverId::new(), "ann@example.com").await,
            Err(CarpoolError::DriverNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_roster_after_auto_run() {
        let f = fixture(CarpoolMode::Auto).await;
        let d = Attendance::new(f.event_id, "Dee", "dee@example.com", RsvpStatus::Confirmed)
            .arriving(at(19, 0))
            .driving(Some(3));
        let p = Attendance::new(f.event_id, "Pim", "pim@example.com", RsvpStatus::Confirmed)
            .arriving(at(19, 10));
        f.engine.storage().save_attendance(&d).await.unwrap();
        f.engine.storage().save_attendance(&p).await.unwrap();
        f.engine.recompute(f.event_id).await.unwrap();

        let roster = f.manual.roster(f.event_id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].passengers.len(), 1);
        assert_eq!(roster[0].spots_available, 1);
    }
}
