//! Chunked sparse storage for the canvas.
//!
//! This module implements a sparse two-level structure for an unbounded plane:
//! - Top level: HashMap keyed by chunk coordinate
//! - Bottom level: a dense `CHUNK_SIZE x CHUNK_SIZE` pixel buffer per chunk
//!
//! Chunks are created on first write and never removed. Reads over regions
//! nobody painted return [`Pixel::BLANK`] without allocating.

use std::collections::HashMap;

use crate::coords::{resolve, ChunkCoord, LocalOffset, WorldCoord, CHUNK_SIZE};
use crate::pixel::Pixel;

/// Number of pixels in one chunk.
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// A single `CHUNK_SIZE x CHUNK_SIZE` tile of pixels.
///
/// The buffer is allocated once at creation and never reallocated, so a chunk
/// keeps the same pixel storage for as long as the store holds it.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Row-major pixels, indexed by [`LocalOffset::index`].
    pixels: Box<[Pixel]>,
}

impl Chunk {
    /// Create a new blank chunk.
    pub fn new() -> Self {
        Self {
            pixels: vec![Pixel::BLANK; CHUNK_AREA].into_boxed_slice(),
        }
    }

    /// Build a chunk from a row-major pixel buffer.
    ///
    /// Returns `None` unless the buffer holds exactly [`CHUNK_AREA`] pixels.
    pub fn from_pixels(pixels: Vec<Pixel>) -> Option<Self> {
        if pixels.len() != CHUNK_AREA {
            return None;
        }
        Some(Self {
            pixels: pixels.into_boxed_slice(),
        })
    }

    /// Get the pixel at the given local offset.
    pub fn get(&self, offset: LocalOffset) -> Pixel {
        self.pixels[offset.index()]
    }

    /// Write a pixel at the given local offset.
    ///
    /// Returns the previous value.
    pub fn set(&mut self, offset: LocalOffset, pixel: Pixel) -> Pixel {
        std::mem::replace(&mut self.pixels[offset.index()], pixel)
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Check if no pixel in this chunk has been painted.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(Pixel::is_blank)
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let painted = self.pixels.iter().filter(|p| !p.is_blank()).count();
        f.debug_struct("Chunk").field("painted", &painted).finish()
    }
}

/// The set of all chunks on the canvas.
///
/// Only allocates storage for chunks that were written to. Lookup by chunk
/// coordinate is O(1) regardless of how many chunks exist.
#[derive(Clone, Debug, Default)]
pub struct ChunkStore {
    /// Map of chunk coordinates to chunks.
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl ChunkStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
        }
    }

    /// Get the chunk at `coord` if it exists. Never allocates.
    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    /// Get or create the chunk at `coord`.
    ///
    /// Repeated calls with the same coordinate return the same chunk.
    pub fn get_or_create(&mut self, coord: ChunkCoord) -> &mut Chunk {
        self.chunks.entry(coord).or_default()
    }

    /// Register a chunk, replacing any chunk already stored at `coord`.
    ///
    /// Returns the replaced chunk, if there was one.
    pub fn insert(&mut self, coord: ChunkCoord, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(coord, chunk)
    }

    /// Write a pixel at the given world coordinate, creating its chunk if
    /// necessary.
    ///
    /// Returns the previous value.
    pub fn set_pixel(&mut self, world: WorldCoord, pixel: Pixel) -> Pixel {
        let (coord, offset) = resolve(world);
        self.get_or_create(coord).set(offset, pixel)
    }

    /// Read the pixel at the given world coordinate.
    ///
    /// Unpainted regions read as [`Pixel::BLANK`] and are not materialized.
    pub fn get_pixel(&self, world: WorldCoord) -> Pixel {
        let (coord, offset) = resolve(world);
        self.chunks
            .get(&coord)
            .map_or(Pixel::BLANK, |chunk| chunk.get(offset))
    }

    /// Check if a chunk exists at `coord`.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of chunks in the store.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate over all chunks with their coordinates, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkCoord, &Chunk)> {
        self.chunks.iter().map(|(coord, chunk)| (*coord, chunk))
    }
}
