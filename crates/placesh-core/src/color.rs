//! Conversion of user color input to palette pixels.
//!
//! Pixels are xterm-256 palette indices. User input arrives as `#RRGGBB` and
//! is reduced to the nearest entry of the 6x6x6 color cube, or of the 24-step
//! gray ramp for pure grays.

use crate::error::ColorError;
use crate::pixel::Pixel;

/// Channel levels of the xterm 6x6x6 color cube.
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Reduce to the nearest xterm-256 palette index.
    pub fn to_ansi256(self) -> Pixel {
        let (ri, gi, bi) = (cube_index(self.r), cube_index(self.g), cube_index(self.b));
        let cube = Pixel(16 + 36 * ri + 6 * gi + bi);

        if self.r == self.g && self.g == self.b {
            let gray = match self.r {
                0..=7 => 16,
                249..=255 => 231,
                level => 232 + ((f32::from(level - 8) / 10.0).round() as u8).min(23),
            };
            let cube_dist = distance(self, Rgb::new(
                CUBE_LEVELS[ri as usize],
                CUBE_LEVELS[gi as usize],
                CUBE_LEVELS[bi as usize],
            ));
            let gray_dist = distance(self, gray_rgb(gray));
            if gray_dist < cube_dist {
                return Pixel(gray);
            }
        }

        cube
    }
}

/// Parse `#RRGGBB` or `RRGGBB`, case-insensitive.
pub fn parse_hex(input: &str) -> Result<Rgb, ColorError> {
    let digits = input.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if digits.len() != 6 {
        return Err(ColorError::InvalidLength(digits.chars().count()));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(input.to_string()));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| ColorError::InvalidHex(input.to_string()))
    };
    Ok(Rgb {
        r: channel(0..2)?,
        g: channel(2..4)?,
        b: channel(4..6)?,
    })
}

fn cube_index(value: u8) -> u8 {
    CUBE_LEVELS
        .iter()
        .enumerate()
        .min_by_key(|&(_, &level)| value.abs_diff(level))
        .map_or(0, |(i, _)| i as u8)
}

/// RGB value of a palette index, for the entries `to_ansi256` can produce.
fn gray_rgb(index: u8) -> Rgb {
    match index {
        16 => Rgb::new(0, 0, 0),
        231 => Rgb::new(255, 255, 255),
        _ => {
            let level = 8 + 10 * (index - 232);
            Rgb::new(level, level, level)
        }
    }
}

fn distance(a: Rgb, b: Rgb) -> u32 {
    let d = |x: u8, y: u8| u32::from(x.abs_diff(y)).pow(2);
    d(a.r, b.r) + d(a.g, b.g) + d(a.b, b.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff0000"), Ok(Rgb::new(255, 0, 0)));
        assert_eq!(parse_hex("00FF7f"), Ok(Rgb::new(0, 255, 127)));
        assert_eq!(parse_hex(" #123456 "), Ok(Rgb::new(0x12, 0x34, 0x56)));
    }

    #[test]
    fn test_parse_hex_rejects_malformed() {
        assert_eq!(parse_hex(""), Err(ColorError::InvalidLength(0)));
        assert_eq!(parse_hex("#fff"), Err(ColorError::InvalidLength(3)));
        assert_eq!(parse_hex("#1234567"), Err(ColorError::InvalidLength(7)));
        assert!(matches!(parse_hex("#gg0000"), Err(ColorError::InvalidHex(_))));
        assert!(matches!(parse_hex("+12345"), Err(ColorError::InvalidHex(_))));
        // Six bytes but not six hex digits
        assert!(parse_hex("ééé").is_err());
    }

    #[test]
    fn test_primary_colors_hit_the_cube() {
        assert_eq!(Rgb::new(255, 0, 0).to_ansi256(), Pixel(196));
        assert_eq!(Rgb::new(0, 255, 0).to_ansi256(), Pixel(46));
        assert_eq!(Rgb::new(0, 0, 255).to_ansi256(), Pixel(21));
        assert_eq!(Rgb::new(100, 140, 210).to_ansi256(), Pixel(16 + 36 + 12 + 4));
    }

    #[test]
    fn test_black_and_white() {
        assert_eq!(Rgb::new(0, 0, 0).to_ansi256(), Pixel(16));
        assert_eq!(Rgb::new(255, 255, 255).to_ansi256(), Pixel(231));
    }

    #[test]
    fn test_grays_use_the_ramp() {
        assert_eq!(Rgb::new(8, 8, 8).to_ansi256(), Pixel(232));
        assert_eq!(Rgb::new(128, 128, 128).to_ansi256(), Pixel(244));
        assert_eq!(Rgb::new(238, 238, 238).to_ansi256(), Pixel(255));
        // A cube level is an exact match and wins over the ramp
        assert_eq!(Rgb::new(95, 95, 95).to_ansi256(), Pixel(59));
    }

    #[test]
    fn test_never_blank() {
        for v in 0..=255u8 {
            assert!(!Rgb::new(v, v, v).to_ansi256().is_blank());
            assert!(!Rgb::new(v, 0, 255 - v).to_ansi256().is_blank());
        }
    }
}
