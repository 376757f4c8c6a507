//! Packed RGB colors and the flame palette.

use core::fmt::{self, Display};

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};
use smart_leds::RGB8;

/// 24-bit color packed as `0xRRGGBB`.
#[derive(
    Serialize, Deserialize, MaxSize, PartialEq, Eq, Clone, Copy, Debug, Hash, Default,
)]
pub struct Color(pub u32);

impl Color {
    /// All channels off.
    pub const BLACK: Self = Self(0x00_00_00);
    pub const BLUE: Self = Self(0x00_00_ff);
    pub const GREEN: Self = Self(0x00_ff_00);
    pub const RED: Self = Self(0xff_00_00);

    /// Packs separate channels into a single color value.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Returns true if every channel is off.
    pub const fn is_black(self) -> bool {
        self.0 & 0x00ff_ffff == 0
    }
}

/// Colors cycled by the flame animation, in order.
pub const PALETTE: [Color; 3] = [Color::BLUE, Color::GREEN, Color::RED];

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0 & 0x00ff_ffff)
    }
}

impl From<u32> for Color {
    fn from(inner: u32) -> Self {
        Self(inner)
    }
}

impl From<Color> for RGB8 {
    fn from(color: Color) -> Self {
        RGB8::new(color.r(), color.g(), color.b())
    }
}

impl From<RGB8> for Color {
    fn from(pixel: RGB8) -> Self {
        Self::from_rgb(pixel.r, pixel.g, pixel.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_order() {
        assert_eq!(PALETTE, [Color(0x00_00_ff), Color(0x00_ff_00), Color(0xff_00_00)]);
    }

    #[test]
    fn test_channels() {
        let color = Color::from_rgb(0x12, 0x34, 0x56);
        assert_eq!(color, Color(0x12_34_56));
        assert_eq!((color.r(), color.g(), color.b()), (0x12, 0x34, 0x56));
        assert_eq!(RGB8::from(Color::RED), RGB8::new(255, 0, 0));
        assert_eq!(Color::from(RGB8::new(0, 0, 255)), Color::BLUE);
    }

    #[test]
    fn test_display_as_hex() {
        assert_eq!(Color::BLUE.to_string(), "0000FF");
        assert_eq!(Color::BLACK.to_string(), "000000");
        assert!(Color::BLACK.is_black());
        assert!(!Color::GREEN.is_black());
    }
}
