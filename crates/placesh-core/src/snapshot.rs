//! Binary snapshot format for the chunk store.
//!
//! A snapshot is a 16-byte header followed by one fixed-length record per
//! chunk, with no record count:
//!
//! ```text
//! header:  magic "PLSH" | version u16 | chunk size u16 | pixel width u8 | 7 reserved
//! record:  cx i32 | cy i32 | CHUNK_SIZE^2 pixels, row-major | crc32 u32
//! ```
//!
//! All integers are little-endian. The CRC covers the coordinates and pixels of
//! its own record.
//!
//! Reading is forgiving about the tail: a truncated or corrupt record stops
//! decoding but keeps every chunk decoded before it.

use std::io::{self, Read, Write};

use crc32fast::Hasher;

use crate::chunk::{Chunk, ChunkStore, CHUNK_AREA};
use crate::coords::{ChunkCoord, CHUNK_SIZE};
use crate::error::SnapshotError;
use crate::pixel::{Pixel, PIXEL_WIDTH};

/// Magic bytes identifying a canvas snapshot.
pub const MAGIC: [u8; 4] = *b"PLSH";

/// Current format version.
pub const VERSION: u16 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size in bytes of one chunk record, checksum included.
pub const RECORD_SIZE: usize = 4 + 4 + CHUNK_AREA * PIXEL_WIDTH + 4;

/// Snapshot file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub chunk_size: u16,
    pub pixel_width: u8,
}

impl Header {
    /// Header describing this build's layout.
    pub fn current() -> Self {
        Self {
            version: VERSION,
            chunk_size: CHUNK_SIZE as u16,
            pixel_width: PIXEL_WIDTH as u8,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&self.chunk_size.to_le_bytes());
        buf[8] = self.pixel_width;
        buf
    }

    /// Parse and validate a header against this build's layout.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, SnapshotError> {
        let magic = [buf[0], buf[1], buf[2], buf[3]];
        if magic != MAGIC {
            return Err(SnapshotError::InvalidMagic(magic));
        }
        let header = Self {
            version: u16::from_le_bytes([buf[4], buf[5]]),
            chunk_size: u16::from_le_bytes([buf[6], buf[7]]),
            pixel_width: buf[8],
        };

        let expected = Self::current();
        if header.version != expected.version {
            return Err(SnapshotError::UnsupportedVersion(header.version));
        }
        if header.chunk_size != expected.chunk_size {
            return Err(SnapshotError::ChunkSizeMismatch {
                file: header.chunk_size,
                expected: expected.chunk_size,
            });
        }
        if header.pixel_width != expected.pixel_width {
            return Err(SnapshotError::PixelWidthMismatch {
                file: header.pixel_width,
                expected: expected.pixel_width,
            });
        }
        Ok(header)
    }
}

/// Write every chunk in `store` to `writer`.
///
/// Returns the number of chunk records written.
pub fn write_snapshot<W: Write>(store: &ChunkStore, writer: &mut W) -> Result<usize, SnapshotError> {
    writer.write_all(&Header::current().to_bytes())?;

    let mut record = Vec::with_capacity(RECORD_SIZE);
    let mut count = 0;
    for (coord, chunk) in store.iter() {
        record.clear();
        encode_record(coord, chunk, &mut record);
        writer.write_all(&record)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

fn encode_record(coord: ChunkCoord, chunk: &Chunk, out: &mut Vec<u8>) {
    out.extend_from_slice(&coord.cx.to_le_bytes());
    out.extend_from_slice(&coord.cy.to_le_bytes());
    for pixel in chunk.pixels() {
        out.extend_from_slice(&pixel.to_le_bytes());
    }
    let crc = crc32(out);
    out.extend_from_slice(&crc.to_le_bytes());
}

/// Result of reading a snapshot.
#[derive(Debug, Default)]
pub struct Restored {
    /// Every chunk decoded before reading stopped.
    pub store: ChunkStore,
    /// Number of records decoded, including any that replaced an earlier
    /// record with the same coordinate.
    pub records: usize,
    /// Why decoding stopped early, if it did.
    pub error: Option<SnapshotError>,
}

/// Read a snapshot from `reader` into a fresh store.
///
/// An empty input yields an empty store. A bad header yields an empty store
/// and the header error. A bad record stops decoding; the chunks before it are
/// kept.
pub fn read_snapshot<R: Read>(reader: &mut R) -> Restored {
    let mut restored = Restored::default();

    let mut header = [0u8; HEADER_SIZE];
    match read_full(reader, &mut header) {
        Ok(0) => return restored,
        Ok(n) if n < HEADER_SIZE => {
            restored.error = Some(SnapshotError::TruncatedHeader);
            return restored;
        }
        Ok(_) => {}
        Err(e) => {
            restored.error = Some(e.into());
            return restored;
        }
    }
    if let Err(e) = Header::from_bytes(&header) {
        restored.error = Some(e);
        return restored;
    }

    let mut record = vec![0u8; RECORD_SIZE];
    loop {
        let index = restored.records;
        match read_full(reader, &mut record) {
            Ok(0) => break,
            Ok(n) if n < RECORD_SIZE => {
                restored.error = Some(SnapshotError::TruncatedRecord { index });
                break;
            }
            Ok(_) => {}
            Err(e) => {
                restored.error = Some(e.into());
                break;
            }
        }

        match decode_record(&record) {
            Some((coord, chunk)) => {
                restored.store.insert(coord, chunk);
                restored.records += 1;
            }
            None => {
                restored.error = Some(SnapshotError::ChecksumMismatch { index });
                break;
            }
        }
    }

    restored
}

fn decode_record(record: &[u8]) -> Option<(ChunkCoord, Chunk)> {
    let (body, crc) = record.split_at(RECORD_SIZE - 4);
    let expected = u32::from_le_bytes(crc.try_into().ok()?);
    if crc32(body) != expected {
        return None;
    }

    let cx = i32::from_le_bytes(body[0..4].try_into().ok()?);
    let cy = i32::from_le_bytes(body[4..8].try_into().ok()?);
    let pixels = body[8..]
        .chunks_exact(PIXEL_WIDTH)
        .map(|bytes| bytes.try_into().map(Pixel::from_le_bytes))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    Some((ChunkCoord::new(cx, cy), Chunk::from_pixels(pixels)?))
}

/// Fill `buf` as far as the reader allows, returning the bytes read.
///
/// Unlike `read_exact`, a short read at end of input is reported as a count
/// instead of an error so the caller can tell a clean end from a torn record.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}
