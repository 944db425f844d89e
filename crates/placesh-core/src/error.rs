use thiserror::Error;

/// Errors reading or writing a canvas snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a canvas snapshot (magic {0:02x?})")]
    InvalidMagic([u8; 4]),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),

    #[error("chunk size mismatch: file={file}, expected={expected}")]
    ChunkSizeMismatch { file: u16, expected: u16 },

    #[error("pixel width mismatch: file={file}, expected={expected}")]
    PixelWidthMismatch { file: u8, expected: u8 },

    #[error("snapshot header is truncated")]
    TruncatedHeader,

    #[error("record {index} is truncated")]
    TruncatedRecord { index: usize },

    #[error("record {index} failed its checksum")]
    ChecksumMismatch { index: usize },
}

/// Errors parsing a color string from user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("expected 6 hex digits, got {0} characters")]
    InvalidLength(usize),

    #[error("invalid hex color: {0}")]
    InvalidHex(String),
}

/// Errors building a window.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("window of {width}x{height} exceeds {limit} cells")]
    TooLarge {
        width: usize,
        height: usize,
        limit: usize,
    },
}
