//! Coordinate spaces of the canvas.
//!
//! The canvas is an unbounded plane of pixels addressed by [`WorldCoord`].
//! Storage is split into square chunks of `CHUNK_SIZE x CHUNK_SIZE` pixels,
//! addressed by [`ChunkCoord`], and a pixel inside its chunk is addressed by a
//! [`LocalOffset`].
//!
//! Conversion always uses floored division and floored modulo, so the negative
//! half-plane tiles the same way as the positive one: world `x = -1` lives in
//! chunk `-1` at offset `CHUNK_SIZE - 1`.

use serde::{Deserialize, Serialize};

/// Edge length of a chunk in pixels (256x256 pixels per chunk).
pub const CHUNK_SIZE: usize = 256;

const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;

/// Absolute position of a single pixel on the plane.
///
/// `y` grows downwards: moving the cursor up decreases `y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldCoord {
    pub x: i32,
    pub y: i32,
}

impl WorldCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Coordinate of a chunk in the grid.
///
/// Represents which `CHUNK_SIZE x CHUNK_SIZE` tile a pixel belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Which tile column (x / CHUNK_SIZE, floored)
    pub cx: i32,
    /// Which tile row (y / CHUNK_SIZE, floored)
    pub cy: i32,
}

impl ChunkCoord {
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// Create a ChunkCoord from a pixel's world coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use placesh_core::{ChunkCoord, WorldCoord};
    ///
    /// assert_eq!(ChunkCoord::containing(WorldCoord::new(300, 5)), ChunkCoord::new(1, 0));
    /// assert_eq!(ChunkCoord::containing(WorldCoord::new(-1, -1)), ChunkCoord::new(-1, -1));
    /// ```
    pub fn containing(world: WorldCoord) -> Self {
        Self {
            cx: world.x.div_euclid(CHUNK_SIZE_I32),
            cy: world.y.div_euclid(CHUNK_SIZE_I32),
        }
    }

    /// World coordinate of this chunk's top-left pixel.
    ///
    /// Returned as `i64` so callers can offset it without overflowing.
    pub fn origin(&self) -> (i64, i64) {
        (
            i64::from(self.cx) * CHUNK_SIZE as i64,
            i64::from(self.cy) * CHUNK_SIZE as i64,
        )
    }

    /// World coordinate of the pixel at `offset` inside this chunk.
    pub fn world_at(&self, offset: LocalOffset) -> WorldCoord {
        let (ox, oy) = self.origin();
        WorldCoord {
            x: (ox + i64::from(offset.x)) as i32,
            y: (oy + i64::from(offset.y)) as i32,
        }
    }
}

/// Position of a pixel within its chunk, each axis in `0..CHUNK_SIZE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalOffset {
    pub x: u16,
    pub y: u16,
}

impl LocalOffset {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Row-major index of this offset in a chunk's pixel buffer.
    pub fn index(&self) -> usize {
        usize::from(self.y) * CHUNK_SIZE + usize::from(self.x)
    }
}

/// Split a world coordinate into its chunk and the offset inside that chunk.
pub fn resolve(world: WorldCoord) -> (ChunkCoord, LocalOffset) {
    let offset = LocalOffset {
        x: world.x.rem_euclid(CHUNK_SIZE_I32) as u16,
        y: world.y.rem_euclid(CHUNK_SIZE_I32) as u16,
    };
    (ChunkCoord::containing(world), offset)
}
