use serde::{Deserialize, Serialize};

/// Width of a serialized [`Pixel`] in bytes.
pub const PIXEL_WIDTH: usize = std::mem::size_of::<Pixel>();

/// A single canvas pixel.
///
/// The value is an xterm-256 palette index, but storage never interprets it:
/// pixels are only stored, compared and copied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pixel(pub u8);

impl Pixel {
    /// Value of every pixel nobody has painted.
    pub const BLANK: Pixel = Pixel(0);

    pub fn is_blank(&self) -> bool {
        *self == Self::BLANK
    }

    pub fn to_le_bytes(self) -> [u8; PIXEL_WIDTH] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; PIXEL_WIDTH]) -> Self {
        Pixel(u8::from_le_bytes(bytes))
    }
}

impl From<u8> for Pixel {
    fn from(value: u8) -> Self {
        Pixel(value)
    }
}
