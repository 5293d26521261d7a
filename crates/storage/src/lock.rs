//! Advisory lock files shared between processes using one store.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use fs4::fs_std::FileExt;
use tracing::debug;

use super::{Result, StorageError};

/// Exclusive lock on one lock file. Released when dropped.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Block until the lock on `path` is held, creating the file if needed.
    pub async fn acquire(path: PathBuf) -> Result<Self> {
        tokio::task::spawn_blocking(move || {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)?;
            file.lock_exclusive()?;
            debug!("Holding store lock {}", path.display());
            Ok(Self { _file: file, path })
        })
        .await
        .map_err(|e| StorageError::Other(format!("lock task failed: {}", e)))?
    }

    /// Path of the lock file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_excludes_second_holder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.lock");

        let held = StoreLock::acquire(path.clone()).await.unwrap();
        let waiting = tokio::spawn(StoreLock::acquire(path.clone()));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiting.is_finished());

        drop(held);
        let second = tokio::time::timeout(Duration::from_secs(5), waiting).await.unwrap().unwrap().unwrap();
        assert_eq!(second.path(), path.as_path());
    }
}
