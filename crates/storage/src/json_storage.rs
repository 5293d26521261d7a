//! JSON file storage implementation.
//!
//! Stores one JSON file per record under `events/`, `attendance/` and
//! `drivers/` in the storage root. Event scoping happens on read by the
//! `event_id` carried in each record. Writes go to a temporary file that is
//! renamed over the record, so readers never see a partial file. A record
//! that fails to read fails the whole listing.
//!
//! `locks/` holds one lock file per event for processes sharing the root.

use std::path::{Path, PathBuf};
use hangout_core::{Attendance, AttendanceId, Driver, DriverId, Event, EventId};
use super::trait_::{sort_attendance, sort_drivers};
use super::{Storage, StoreLock, Result};
use tokio::fs;
use tracing::{debug, warn};

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage, creating the record directories under `root`.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("events")).await?;
        fs::create_dir_all(root.join("attendance")).await?;
        fs::create_dir_all(root.join("drivers")).await?;
        fs::create_dir_all(root.join("locks")).await?;

        Ok(Self { root })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn event_path(&self, id: EventId) -> PathBuf {
        self.root.join("events").join(format!("{}.json", id))
    }
    fn attendance_path(&self, id: AttendanceId) -> PathBuf {
        self.root.join("attendance").join(format!("{}.json", id))
    }
    fn driver_path(&self, id: DriverId) -> PathBuf {
        self.root.join("drivers").join(format!("{}.json", id))
    }
    fn lock_path(&self, id: EventId) -> PathBuf {
        self.root.join("locks").join(format!("{}.lock", id))
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_event(&self, event: &Event) -> Result<()> {
        write_json(&self.event_path(event.id), event).await
    }

    async fn load_event(&self, id: EventId) -> Result<Option<Event>> {
        read_json(&self.event_path(id)).await
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events = list_dir(&self.root.join("events")).await?;
        events.sort_by(|a: &Event, b| a.starts_at.cmp(&b.starts_at));
        Ok(events)
    }

    async fn save_attendance(&self, attendance: &Attendance) -> Result<()> {
        write_json(&self.attendance_path(attendance.id), attendance).await
    }

    async fn load_attendance(&self, id: AttendanceId) -> Result<Option<Attendance>> {
        read_json(&self.attendance_path(id)).await
    }

    async fn list_attendance(&self, event_id: EventId) -> Result<Vec<Attendance>> {
        let all = list_dir(&self.root.join("attendance")).await?;
        let mut items: Vec<Attendance> = all
            .into_iter()
            .filter(|a: &Attendance| a.event_id == event_id)
            .collect();
        sort_attendance(&mut items);
        Ok(items)
    }

    async fn save_driver(&self, driver: &Driver) -> Result<()> {
        write_json(&self.driver_path(driver.id), driver).await
    }

    async fn load_driver(&self, id: DriverId) -> Result<Option<Driver>> {
        read_json(&self.driver_path(id)).await
    }

    async fn list_drivers(&self, event_id: EventId) -> Result<Vec<Driver>> {
        let all = list_dir(&self.root.join("drivers")).await?;
        let mut items: Vec<Driver> = all
            .into_iter()
            .filter(|d: &Driver| d.event_id == event_id)
            .collect();
        sort_drivers(&mut items);
        Ok(items)
    }

    async fn replace_drivers(&self, event_id: EventId, drivers: &[Driver]) -> Result<()> {
        let existing = self.list_drivers(event_id).await?;
        for old in &existing {
            fs::remove_file(self.driver_path(old.id)).await.or_else(|e| {
                if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
            })?;
        }
        debug!("Removed {} driver records of event {}", existing.len(), event_id);

        for driver in drivers {
            if driver.event_id != event_id {
                warn!("Skipping driver {} of event {} while replacing {}", driver.id, driver.event_id, event_id);
                continue;
            }
            self.save_driver(driver).await?;
        }
        Ok(())
    }

    async fn lock_event(&self, event_id: EventId) -> Result<Option<StoreLock>> {
        StoreLock::acquire(self.lock_path(event_id)).await.map(Some)
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension(format!("{}.tmp", ulid::Ulid::new()));
    fs::write(&tmp, json.as_bytes()).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            // Removed between listing and reading
            Ok(None) => {}
            Err(e) => {
                warn!("Unreadable record {}: {}", entry.path().display(), e);
                return Err(e);
            }
        }
    }
    Ok(items)
}
