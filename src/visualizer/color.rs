// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use image::Rgba;

/// Color type for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// Bright green used for tracking lines.
    pub const GREEN: Color = Color(0, 255, 0);
    /// Yellow used for low-confidence readouts.
    pub const YELLOW: Color = Color(250, 204, 21);
    /// Gold accent used for readout values.
    pub const GOLD: Color = Color(212, 175, 55);
    /// White color.
    pub const WHITE: Color = Color(255, 255, 255);
    /// Black color.
    pub const BLACK: Color = Color(0, 0, 0);

    /// Create a new color from RGB values.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }

    /// Opaque RGBA pixel.
    pub fn rgba(self) -> Rgba<u8> {
        Rgba([self.0, self.1, self.2, 255])
    }

    /// RGBA pixel with the given alpha.
    pub fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.0, self.1, self.2, alpha])
    }

    /// Pack as `0x00RRGGBB`, the window buffer format.
    pub fn packed(self) -> u32 {
        (u32::from(self.0) << 16) | (u32::from(self.1) << 8) | u32::from(self.2)
    }
}

/// Fully transparent pixel; the cleared state of an overlay surface.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed() {
        assert_eq!(Color::GREEN.packed(), 0x00_FF_00);
        assert_eq!(Color::new(1, 2, 3).packed(), 0x01_02_03);
    }

    #[test]
    fn test_rgba() {
        assert_eq!(Color::GREEN.rgba(), Rgba([0, 255, 0, 255]));
        assert_eq!(Color::BLACK.with_alpha(120), Rgba([0, 0, 0, 120]));
    }
}
