use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use placesh_core::{
    build_window, write_snapshot, ChunkStore, Pixel, Placement, RateLimiter, SnapshotError,
    Window, WindowError, WorldCoord,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Returned by [`SharedCanvas::place`] once the canvas has been closed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("canvas is closed to placements")]
pub struct CanvasClosed;

/// An accepted placement, as pushed to live subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelUpdate {
    pub x: i32,
    pub y: i32,
    pub pixel: Pixel,
}

/// The canvas shared by every connected session.
///
/// The store and the rate limiter are guarded separately. A placement locks
/// the limiter first and the store second, never the other way around.
pub struct SharedCanvas {
    store: RwLock<ChunkStore>,
    limiter: Mutex<RateLimiter>,
    closed: AtomicBool,
    updates: broadcast::Sender<PixelUpdate>,
}

impl SharedCanvas {
    pub fn new(store: ChunkStore, cooldown: Duration) -> Self {
        let (updates, _) = broadcast::channel(1024);
        Self {
            store: RwLock::new(store),
            limiter: Mutex::new(RateLimiter::new(cooldown)),
            closed: AtomicBool::new(false),
            updates,
        }
    }

    /// Place a pixel on behalf of `user` if their cooldown has elapsed.
    ///
    /// The limiter stays locked until the placement is recorded, so two
    /// concurrent attempts by one user cannot both be allowed.
    pub async fn place(
        &self,
        user: &str,
        world: WorldCoord,
        pixel: Pixel,
        now: Instant,
    ) -> Result<Placement, CanvasClosed> {
        let mut limiter = self.limiter.lock().await;
        if self.closed.load(Ordering::Acquire) {
            return Err(CanvasClosed);
        }
        let placement = limiter.try_place(user, now);
        if let Placement::Rejected { remaining } = placement {
            tracing::debug!(user, ?remaining, "placement rejected");
            return Ok(placement);
        }

        self.store.write().await.set_pixel(world, pixel);
        limiter.record(user, now);
        drop(limiter);

        tracing::debug!(user, x = world.x, y = world.y, pixel = pixel.0, "pixel placed");
        // Ignore errors if no receivers
        let _ = self.updates.send(PixelUpdate {
            x: world.x,
            y: world.y,
            pixel,
        });
        Ok(placement)
    }

    /// Refuse every later placement.
    ///
    /// Returns once any placement already past the gate has been written, so a
    /// snapshot taken afterwards holds every accepted pixel.
    pub async fn close(&self) {
        let _limiter = self.limiter.lock().await;
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Build a `width x height` window centered on `center`
    pub async fn window(
        &self,
        center: WorldCoord,
        width: usize,
        height: usize,
    ) -> Result<Window, WindowError> {
        let store = self.store.read().await;
        build_window(&store, center, width, height)
    }

    /// Read a single pixel
    pub async fn pixel(&self, world: WorldCoord) -> Pixel {
        self.store.read().await.get_pixel(world)
    }

    /// Number of chunks in the store
    pub async fn chunk_count(&self) -> usize {
        self.store.read().await.len()
    }

    /// Encode the whole store as a snapshot.
    ///
    /// Holds the read lock for the whole pass, so the result is a consistent
    /// view: placements wait until encoding finishes. Returns the encoded bytes
    /// and the number of chunks written.
    pub async fn encode_snapshot(&self) -> Result<(Vec<u8>, usize), SnapshotError> {
        let store = self.store.read().await;
        let mut bytes = Vec::new();
        let chunks = write_snapshot(&store, &mut bytes)?;
        Ok((bytes, chunks))
    }

    /// Subscribe to accepted placements
    pub fn subscribe(&self) -> broadcast::Receiver<PixelUpdate> {
        self.updates.subscribe()
    }
}
