pub mod chunk;
pub mod color;
pub mod coords;
pub mod error;
pub mod pixel;
pub mod rate_limit;
pub mod snapshot;
pub mod window;

pub use chunk::{Chunk, ChunkStore};
pub use color::{parse_hex, Rgb};
pub use coords::{resolve, ChunkCoord, LocalOffset, WorldCoord, CHUNK_SIZE};
pub use error::{ColorError, SnapshotError, WindowError};
pub use pixel::{Pixel, PIXEL_WIDTH};
pub use rate_limit::{Placement, RateLimiter};
pub use snapshot::{read_snapshot, write_snapshot, Restored};
pub use window::{build_window, Window, WindowBounds, MAX_WINDOW_CELLS};
