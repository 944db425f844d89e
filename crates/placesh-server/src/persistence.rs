//! Periodic snapshots of the canvas and restore at startup.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use placesh_core::{read_snapshot, ChunkStore, SnapshotError};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::canvas::SharedCanvas;

/// Errors from a single snapshot cycle
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Encoding error: {0}")]
    Encode(#[from] SnapshotError),
}

/// Restores the canvas from disk and writes it back on a timer
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    path: PathBuf,
    interval: Duration,
}

impl PersistenceManager {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Load the last snapshot into a fresh store.
    ///
    /// Never fails: a missing file gives an empty store, and a damaged file
    /// gives whatever could be decoded before the damage.
    pub async fn restore(&self) -> ChunkStore {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting with an empty canvas", self.path.display());
                return ChunkStore::new();
            }
            Err(e) => {
                tracing::error!("Failed to read snapshot {}: {}", self.path.display(), e);
                return ChunkStore::new();
            }
        };

        let restored = read_snapshot(&mut bytes.as_slice());
        if let Some(e) = &restored.error {
            tracing::warn!(
                "Snapshot {} is damaged ({}), keeping {} chunks decoded before it",
                self.path.display(),
                e,
                restored.store.len()
            );
        }
        tracing::info!(
            chunks = restored.store.len(),
            records = restored.records,
            "Restored snapshot from {}",
            self.path.display()
        );
        restored.store
    }

    /// Write the whole canvas to disk.
    ///
    /// The store is encoded under its read lock, then written to a temporary
    /// file that is renamed over the previous snapshot. Returns the number of
    /// chunks written.
    pub async fn snapshot(&self, canvas: &SharedCanvas) -> Result<usize, PersistError> {
        let (bytes, chunks) = canvas.encode_snapshot().await?;

        let temp = self.temp_path();
        self.write_file(&temp, &bytes)
            .await
            .map_err(|source| PersistError::Io { path: temp.clone(), source })?;
        if let Err(source) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(PersistError::Io {
                path: self.path.clone(),
                source,
            });
        }

        Ok(chunks)
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Snapshot `canvas` every interval until `shutdown` flips to `true`, then
    /// write one final snapshot.
    ///
    /// A failed cycle is logged and skipped; the next tick tries again.
    pub async fn run(self, canvas: Arc<SharedCanvas>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.snapshot_logged(&canvas).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Writing final snapshot before shutdown");
        self.snapshot_logged(&canvas).await;
    }

    async fn snapshot_logged(&self, canvas: &SharedCanvas) {
        match self.snapshot(canvas).await {
            Ok(chunks) => tracing::debug!(chunks, "Snapshot written to {}", self.path.display()),
            Err(e) => tracing::error!("Snapshot failed, skipping this cycle: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use placesh_core::{Pixel, WorldCoord};

    use super::*;

    fn manager(dir: &tempfile::TempDir) -> PersistenceManager {
        PersistenceManager::new(dir.path().join("canvas.chunks"), Duration::from_millis(20))
    }

    async fn painted_canvas() -> SharedCanvas {
        let canvas = SharedCanvas::new(ChunkStore::new(), Duration::ZERO);
        let now = Instant::now();
        canvas.place("a", WorldCoord::new(300, 5), Pixel(196), now).await.unwrap();
        canvas.place("a", WorldCoord::new(-1, -1), Pixel(21), now).await.unwrap();
        canvas.place("a", WorldCoord::new(-9000, 70000), Pixel(244), now).await.unwrap();
        canvas
    }

    #[tokio::test]
    async fn test_restore_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = manager(&dir).restore().await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        let canvas = painted_canvas().await;

        assert_eq!(manager.snapshot(&canvas).await.unwrap(), 3);
        assert!(manager.path().exists());
        assert!(!manager.temp_path().exists());

        let store = manager.restore().await;
        assert_eq!(store.len(), 3);
        assert_eq!(store.get_pixel(WorldCoord::new(300, 5)), Pixel(196));
        assert_eq!(store.get_pixel(WorldCoord::new(-1, -1)), Pixel(21));
        assert_eq!(store.get_pixel(WorldCoord::new(-9000, 70000)), Pixel(244));
        assert_eq!(store.get_pixel(WorldCoord::new(300, 6)), Pixel::BLANK);
    }

    #[tokio::test]
    async fn test_snapshot_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);

        let empty = SharedCanvas::new(ChunkStore::new(), Duration::ZERO);
        manager.snapshot(&painted_canvas().await).await.unwrap();
        manager.snapshot(&empty).await.unwrap();

        assert!(manager.restore().await.is_empty());
    }

    #[tokio::test]
    async fn test_restore_truncated_file_keeps_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        manager.snapshot(&painted_canvas().await).await.unwrap();

        let bytes = std::fs::read(manager.path()).unwrap();
        let cut = placesh_core::snapshot::HEADER_SIZE + placesh_core::snapshot::RECORD_SIZE + 7;
        std::fs::write(manager.path(), &bytes[..cut]).unwrap();

        assert_eq!(manager.restore().await.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_foreign_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        std::fs::write(manager.path(), b"definitely not a canvas").unwrap();

        assert!(manager.restore().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_last_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        manager.snapshot(&painted_canvas().await).await.unwrap();

        // A directory squatting on the temp path makes the next write fail
        std::fs::create_dir(manager.temp_path()).unwrap();
        let empty = SharedCanvas::new(ChunkStore::new(), Duration::ZERO);
        assert!(matches!(
            manager.snapshot(&empty).await,
            Err(PersistError::Io { .. })
        ));

        assert_eq!(manager.restore().await.len(), 3);
    }

    #[tokio::test]
    async fn test_run_flushes_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PersistenceManager::new(dir.path().join("canvas.chunks"), Duration::from_secs(3600));
        let canvas = Arc::new(painted_canvas().await);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(manager.clone().run(Arc::clone(&canvas), shutdown_rx));
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(manager.restore().await.len(), 3);
    }

    #[tokio::test]
    async fn test_run_snapshots_on_interval() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        let canvas = Arc::new(painted_canvas().await);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(manager.clone().run(Arc::clone(&canvas), shutdown_rx));
        let deadline = Instant::now() + Duration::from_secs(5);
        while !manager.path().exists() {
            assert!(Instant::now() < deadline, "no snapshot was written");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
        assert_eq!(manager.restore().await.len(), 3);
    }
}
