//! Finite views of the canvas for rendering.
//!
//! A window is a `width x height` rectangle of pixels centered on a world
//! coordinate. Building one only reads the store, so it is safe to do on every
//! frame without growing memory.

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkStore};
use crate::coords::{resolve, ChunkCoord, WorldCoord, CHUNK_SIZE};
use crate::error::WindowError;
use crate::pixel::Pixel;

const N: i64 = CHUNK_SIZE as i64;

/// Largest number of cells a single window may hold.
pub const MAX_WINDOW_CELLS: usize = 1 << 24;

/// Rectangle of world pixels covered by a window.
///
/// `left`/`top` are kept as `i64` so a window hanging over the edge of the
/// `i32` plane can still be described; cells out there read as blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub left: i64,
    pub top: i64,
    pub width: usize,
    pub height: usize,
}

impl WindowBounds {
    /// Bounds of a `width x height` window centered on `center`.
    ///
    /// The half extents are `width / 2` and `height / 2`, rounded down for odd
    /// and even sizes alike, so the center always sits at cell
    /// `(width / 2, height / 2)`. See [`WindowBounds::cursor`].
    pub fn centered(center: WorldCoord, width: usize, height: usize) -> Self {
        Self {
            left: i64::from(center.x) - (width / 2) as i64,
            top: i64::from(center.y) - (height / 2) as i64,
            width,
            height,
        }
    }

    /// Window cell `(col, row)` holding the center the window was built on.
    pub fn cursor(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// World coordinate of window cell `(col, row)`, or `None` if it falls
    /// outside the `i32` plane.
    pub fn world_at(&self, col: usize, row: usize) -> Option<WorldCoord> {
        let x = i32::try_from(self.left + col as i64).ok()?;
        let y = i32::try_from(self.top + row as i64).ok()?;
        Some(WorldCoord::new(x, y))
    }

    /// Inclusive range of chunk coordinates overlapping the window, clamped to
    /// chunks that exist on the `i32` plane.
    fn chunk_span(&self) -> Option<(ChunkCoord, ChunkCoord)> {
        if self.is_empty() {
            return None;
        }
        let lo = i64::from(i32::MIN).div_euclid(N);
        let hi = i64::from(i32::MAX).div_euclid(N);

        let min_cx = self.left.div_euclid(N).max(lo);
        let min_cy = self.top.div_euclid(N).max(lo);
        let max_cx = (self.left + self.width as i64 - 1).div_euclid(N).min(hi);
        let max_cy = (self.top + self.height as i64 - 1).div_euclid(N).min(hi);
        if min_cx > max_cx || min_cy > max_cy {
            return None;
        }

        Some((
            ChunkCoord::new(min_cx as i32, min_cy as i32),
            ChunkCoord::new(max_cx as i32, max_cy as i32),
        ))
    }

    /// Every distinct chunk coordinate overlapping the window.
    pub fn chunk_coords(&self) -> Vec<ChunkCoord> {
        let Some((min, max)) = self.chunk_span() else {
            return Vec::new();
        };
        (min.cy..=max.cy)
            .flat_map(|cy| (min.cx..=max.cx).map(move |cx| ChunkCoord::new(cx, cy)))
            .collect()
    }
}

/// A rendered `width x height` grid of pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    bounds: WindowBounds,
    /// Row-major cells, `width * height` of them.
    cells: Vec<Pixel>,
}

impl Window {
    pub fn bounds(&self) -> WindowBounds {
        self.bounds
    }

    pub fn width(&self) -> usize {
        self.bounds.width
    }

    pub fn height(&self) -> usize {
        self.bounds.height
    }

    /// Pixel at window cell `(col, row)`.
    pub fn get(&self, col: usize, row: usize) -> Option<Pixel> {
        if col >= self.bounds.width || row >= self.bounds.height {
            return None;
        }
        Some(self.cells[row * self.bounds.width + col])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Pixel] {
        &self.cells
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> {
        let width = self.bounds.width;
        (0..self.bounds.height).map(move |row| &self.cells[row * width..(row + 1) * width])
    }

    pub fn into_rows(self) -> Vec<Vec<Pixel>> {
        self.rows().map(<[Pixel]>::to_vec).collect()
    }
}

/// Extract a `width x height` window centered on `center`.
///
/// Chunks are fetched read-only; regions without a chunk come back blank. The
/// result always holds exactly `width * height` cells, which may not exceed
/// [`MAX_WINDOW_CELLS`].
pub fn build_window(
    store: &ChunkStore,
    center: WorldCoord,
    width: usize,
    height: usize,
) -> Result<Window, WindowError> {
    let area = width
        .checked_mul(height)
        .filter(|&area| area <= MAX_WINDOW_CELLS)
        .ok_or(WindowError::TooLarge {
            width,
            height,
            limit: MAX_WINDOW_CELLS,
        })?;
    let bounds = WindowBounds::centered(center, width, height);
    let mut cells = vec![Pixel::BLANK; area];

    let Some((min, max)) = bounds.chunk_span() else {
        return Ok(Window { bounds, cells });
    };

    // Dense lookup table over the overlapped chunk span
    let span_w = (i64::from(max.cx) - i64::from(min.cx) + 1) as usize;
    let span_h = (i64::from(max.cy) - i64::from(min.cy) + 1) as usize;
    let mut chunks: Vec<Option<&Chunk>> = Vec::with_capacity(span_w * span_h);
    for coord in bounds.chunk_coords() {
        chunks.push(store.get(coord));
    }
    if chunks.iter().all(Option::is_none) {
        return Ok(Window { bounds, cells });
    }

    for row in 0..height {
        for col in 0..width {
            let Some(world) = bounds.world_at(col, row) else {
                continue;
            };
            let (coord, offset) = resolve(world);
            let slot = (i64::from(coord.cy) - i64::from(min.cy)) as usize * span_w
                + (i64::from(coord.cx) - i64::from(min.cx)) as usize;
            if let Some(chunk) = chunks[slot] {
                cells[row * width + col] = chunk.get(offset);
            }
        }
    }

    Ok(Window { bounds, cells })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centering_rule() {
        let even = WindowBounds::centered(WorldCoord::new(10, 20), 4, 6);
        assert_eq!((even.left, even.top), (8, 17));
        assert_eq!(even.cursor(), (2, 3));
        assert_eq!(even.world_at(2, 3), Some(WorldCoord::new(10, 20)));

        let odd = WindowBounds::centered(WorldCoord::new(10, 20), 5, 7);
        assert_eq!((odd.left, odd.top), (8, 17));
        assert_eq!(odd.cursor(), (2, 3));
        assert_eq!(odd.world_at(2, 3), Some(WorldCoord::new(10, 20)));
    }

    #[test]
    fn test_window_size_invariant() {
        let mut store = ChunkStore::new();
        store.set_pixel(WorldCoord::new(0, 0), Pixel(1));

        for &(w, h) in &[(0, 0), (1, 1), (80, 24), (513, 3), (3, 600), (0, 10)] {
            for &(x, y) in &[(0, 0), (-300, 4000), (255, -256)] {
                let window = build_window(&store, WorldCoord::new(x, y), w, h).unwrap();
                assert_eq!(window.cells().len(), w * h);
                assert_eq!(window.rows().count(), h);
                assert!(window.rows().all(|row| row.len() == w));
            }
        }
    }

    #[test]
    fn test_empty_store_window_is_blank() {
        let store = ChunkStore::new();
        let window = build_window(&store, WorldCoord::new(-77, 123), 40, 30).unwrap();
        assert!(window.cells().iter().all(Pixel::is_blank));
        assert!(store.is_empty());
    }

    #[test]
    fn test_window_does_not_allocate() {
        let mut store = ChunkStore::new();
        store.set_pixel(WorldCoord::new(5, 5), Pixel(8));

        let window = build_window(&store, WorldCoord::new(0, 0), 1024, 1024).unwrap();
        assert_eq!(window.cells().len(), 1024 * 1024);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_window_straddles_chunk_boundaries() {
        let mut store = ChunkStore::new();
        // Four pixels around the origin, one in each of four chunks
        store.set_pixel(WorldCoord::new(-1, -1), Pixel(1));
        store.set_pixel(WorldCoord::new(0, -1), Pixel(2));
        store.set_pixel(WorldCoord::new(-1, 0), Pixel(3));
        store.set_pixel(WorldCoord::new(0, 0), Pixel(4));
        assert_eq!(store.len(), 4);

        let window = build_window(&store, WorldCoord::new(0, 0), 4, 4).unwrap();
        // left/top = -2, so world (-1,-1) is window cell (1,1)
        assert_eq!(window.get(1, 1), Some(Pixel(1)));
        assert_eq!(window.get(2, 1), Some(Pixel(2)));
        assert_eq!(window.get(1, 2), Some(Pixel(3)));
        assert_eq!(window.get(2, 2), Some(Pixel(4)));
        assert_eq!(window.get(0, 0), Some(Pixel::BLANK));
        assert_eq!(window.get(3, 3), Some(Pixel::BLANK));
        assert_eq!(window.get(4, 0), None);
    }

    #[test]
    fn test_window_matches_get_pixel() {
        let mut store = ChunkStore::new();
        for i in -600..600 {
            store.set_pixel(WorldCoord::new(i, i / 3), Pixel((i.rem_euclid(250) + 1) as u8));
        }

        let center = WorldCoord::new(-20, 7);
        let window = build_window(&store, center, 700, 300).unwrap();
        let bounds = window.bounds();
        for row in 0..window.height() {
            for col in 0..window.width() {
                let world = bounds.world_at(col, row).unwrap();
                assert_eq!(window.get(col, row), Some(store.get_pixel(world)));
            }
        }
    }

    #[test]
    fn test_chunk_coords_covers_window() {
        let bounds = WindowBounds::centered(WorldCoord::new(0, 0), 10, 10);
        assert_eq!(
            bounds.chunk_coords(),
            vec![
                ChunkCoord::new(-1, -1),
                ChunkCoord::new(0, -1),
                ChunkCoord::new(-1, 0),
                ChunkCoord::new(0, 0),
            ]
        );

        let inside = WindowBounds::centered(WorldCoord::new(100, 100), 10, 10);
        assert_eq!(inside.chunk_coords(), vec![ChunkCoord::new(0, 0)]);

        let empty = WindowBounds::centered(WorldCoord::new(0, 0), 0, 10);
        assert!(empty.chunk_coords().is_empty());
    }

    #[test]
    fn test_window_at_plane_edge() {
        let mut store = ChunkStore::new();
        store.set_pixel(WorldCoord::new(i32::MAX, i32::MAX), Pixel(77));

        let window = build_window(&store, WorldCoord::new(i32::MAX, i32::MAX), 4, 4).unwrap();
        assert_eq!(window.cells().len(), 16);
        assert_eq!(window.get(2, 2), Some(Pixel(77)));
        // Cells past i32::MAX are blank
        assert_eq!(window.get(3, 3), Some(Pixel::BLANK));
    }

    #[test]
    fn test_oversized_window_is_refused() {
        let store = ChunkStore::new();
        assert_eq!(
            build_window(&store, WorldCoord::new(0, 0), usize::MAX, 2),
            Err(WindowError::TooLarge {
                width: usize::MAX,
                height: 2,
                limit: MAX_WINDOW_CELLS,
            })
        );
        assert!(build_window(&store, WorldCoord::new(0, 0), MAX_WINDOW_CELLS + 1, 1).is_err());
        assert!(build_window(&store, WorldCoord::new(0, 0), MAX_WINDOW_CELLS, 1).is_ok());
        assert!(store.is_empty());
    }

    #[test]
    fn test_into_rows() {
        let mut store = ChunkStore::new();
        store.set_pixel(WorldCoord::new(1, 0), Pixel(9));

        let rows = build_window(&store, WorldCoord::new(1, 1), 3, 3).unwrap().into_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![Pixel::BLANK, Pixel(9), Pixel::BLANK]);
    }
}
