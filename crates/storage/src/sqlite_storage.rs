//! SQLite storage backend for Hangout.
//!
//! Records are kept as JSON payloads in a single `entities` table, indexed by
//! type and owning event. Replacing an event's drivers runs in one
//! transaction, so a failed replace leaves the previous drivers in place.
//! A database file gets a `<file>.locks/` directory for per-event locks.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::Row;
use hangout_core::{Attendance, AttendanceId, Driver, DriverId, Event, EventId};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::trait_::{sort_attendance, sort_drivers, Storage, StorageError, Result};
use super::StoreLock;

const UPSERT: &str = "INSERT INTO entities (id, entity_type, event_id, data, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET data = excluded.data, event_id = excluded.event_id, updated_at = excluded.updated_at";

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: sqlx::SqlitePool,
    /// Lock files for processes sharing the database file
    lock_dir: Option<PathBuf>,
}

impl SqliteStorage {
    /// Open (or create) the database file at `path`.
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let lock_dir = path.with_extension("locks");
        tokio::fs::create_dir_all(&lock_dir).await?;

        let storage = Self { pool, lock_dir: Some(lock_dir) };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Create an in-memory SQLite storage for testing.
    pub async fn in_memory() -> Result<Self> {
        // Every in-memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;

        let storage = Self { pool, lock_dir: None };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                entity_type TEXT NOT NULL,
                event_id TEXT,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_event ON entities(entity_type, event_id)")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn upsert<T: serde::Serialize + Sync>(
        &self,
        kind: &str,
        id: String,
        event_id: Option<EventId>,
        value: &T,
    ) -> Result<()> {
        let data = serde_json::to_string(value)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(UPSERT)
            .bind(id)
            .bind(kind)
            .bind(event_id.map(|e| e.to_string()))
            .bind(data)
            .bind(now.clone())
            .bind(now.clone())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn fetch_one<T: serde::de::DeserializeOwned + Send>(&self, kind: &str, id: String) -> Result<Option<T>> {
        let row = sqlx::query("SELECT data FROM entities WHERE id = ? AND entity_type = ?")
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data").map_err(db_err)?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_all<T: serde::de::DeserializeOwned + Send>(&self, kind: &str, event_id: Option<EventId>) -> Result<Vec<T>> {
        let rows = match event_id {
            Some(event_id) => sqlx::query("SELECT data FROM entities WHERE entity_type = ? AND event_id = ?")
                .bind(kind)
                .bind(event_id.to_string())
                .fetch_all(&self.pool)
                .await,
            None => sqlx::query("SELECT data FROM entities WHERE entity_type = ?")
                .bind(kind)
                .fetch_all(&self.pool)
                .await,
        }
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                let data: String = row.try_get("data").map_err(db_err)?;
                serde_json::from_str(&data).map_err(StorageError::from)
            })
            .collect()
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    // === Event operations ===

    async fn save_event(&self, event: &Event) -> Result<()> {
        self.upsert("event", event.id.to_string(), None, event).await
    }

    async fn load_event(&self, id: EventId) -> Result<Option<Event>> {
        self.fetch_one("event", id.to_string()).await
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.fetch_all("event", None).await?;
        events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
        Ok(events)
    }

    // === Attendance operations ===

    async fn save_attendance(&self, attendance: &Attendance) -> Result<()> {
        self.upsert("attendance", attendance.id.to_string(), Some(attendance.event_id), attendance)
            .await
    }

    async fn load_attendance(&self, id: AttendanceId) -> Result<Option<Attendance>> {
        self.fetch_one("attendance", id.to_string()).await
    }

    async fn list_attendance(&self, event_id: EventId) -> Result<Vec<Attendance>> {
        let mut items: Vec<Attendance> = self.fetch_all("attendance", Some(event_id)).await?;
        sort_attendance(&mut items);
        Ok(items)
    }

    // === Driver operations ===

    async fn save_driver(&self, driver: &Driver) -> Result<()> {
        self.upsert("driver", driver.id.to_string(), Some(driver.event_id), driver).await
    }

    async fn load_driver(&self, id: DriverId) -> Result<Option<Driver>> {
        self.fetch_one("driver", id.to_string()).await
    }

    async fn list_drivers(&self, event_id: EventId) -> Result<Vec<Driver>> {
        let mut items: Vec<Driver> = self.fetch_all("driver", Some(event_id)).await?;
        sort_drivers(&mut items);
        Ok(items)
    }

    async fn replace_drivers(&self, event_id: EventId, drivers: &[Driver]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let removed = sqlx::query("DELETE FROM entities WHERE entity_type = 'driver' AND event_id = ?")
            .bind(event_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        let now = chrono::Utc::now().to_rfc3339();
        for driver in drivers.iter().filter(|d| d.event_id == event_id) {
            let data = serde_json::to_string(driver)?;
            sqlx::query(UPSERT)
                .bind(driver.id.to_string())
                .bind("driver")
                .bind(event_id.to_string())
                .bind(data)
                .bind(now.clone())
                .bind(now.clone())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        debug!("Replaced {} driver records of event {} with {}", removed, event_id, drivers.len());
        Ok(())
    }

    async fn lock_event(&self, event_id: EventId) -> Result<Option<StoreLock>> {
        match &self.lock_dir {
            Some(dir) => StoreLock::acquire(dir.join(format!("{}.lock", event_id))).await.map(Some),
            None => Ok(None),
        }
    }
}

fn db_err(e: sqlx::Error) -> StorageError {
    StorageError::Other(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangout_core::RsvpStatus;

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        assert!(storage.health_check().await);

        let event = Event::new("Hike", chrono::Utc::now(), "Trailhead");
        storage.save_event(&event).await.unwrap();
        let loaded = storage.load_event(event.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Hike");
    }

    #[tokio::test]
    async fn test_attendance_update_in_place() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let event_id = EventId::new();
        let mut a = Attendance::new(event_id, "Ann", "ann@example.com", RsvpStatus::Tentative);
        storage.save_attendance(&a).await.unwrap();

        a.status = RsvpStatus::Confirmed;
        storage.save_attendance(&a).await.unwrap();

        let listed = storage.list_attendance(event_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, RsvpStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_replace_drivers() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let event_id = EventId::new();
        let now = chrono::Utc::now();

        let old = Driver::manual(event_id, "Old", "old@example.com", now, 4);
        storage.save_driver(&old).await.unwrap();

        let new = Driver::manual(event_id, "New", "new@example.com", now, 2);
        storage.replace_drivers(event_id, std::slice::from_ref(&new)).await.unwrap();

        let listed = storage.list_drivers(event_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, new.id);
    }

    #[tokio::test]
    async fn test_file_database_locks_events() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new_from_path(&dir.path().join("hangout.db")).await.unwrap();
        let lock = storage.lock_event(EventId::new()).await.unwrap().unwrap();
        assert!(lock.path().starts_with(dir.path().join("hangout.locks")));

        let memory = SqliteStorage::in_memory().await.unwrap();
        assert!(memory.lock_event(EventId::new()).await.unwrap().is_none());
    }
}
