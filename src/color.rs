//! Color lookup tables
//!
//! Cells hold byte indices (terrain material, particle heat); a `ColorMap`
//! turns them into RGBA at the renderer boundary. Maps are built explicitly
//! and handed to whoever needs them.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// One RGBA8 pixel, laid out for direct upload
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::from_hex(0x0000_0000);
    pub const BLACK: Rgba = Rgba::from_hex(0x0000_00FF);
    pub const GREY: Rgba = Rgba::from_hex(0x3232_32FF);
    pub const DARKER_GREY: Rgba = Rgba::from_hex(0x1010_10FF);
    pub const ORANGERED: Rgba = Rgba::from_hex(0xE342_34FF);
    pub const YELLOW: Rgba = Rgba::from_hex(0xFFFF_00FF);

    /// From `0xRRGGBBAA`
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: (hex >> 24) as u8,
            g: (hex >> 16) as u8,
            b: (hex >> 8) as u8,
            a: hex as u8,
        }
    }

    /// Per-channel linear blend, `t` in [0, 1]
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// 256-entry byte-to-color table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
    colors: Vec<Rgba>,
}

impl ColorMap {
    pub const LEN: usize = 256;

    /// Index 0 is transparent; indices `1..=255` blend from `start` to `end`
    pub fn gradient(start: Rgba, end: Rgba) -> Self {
        let mut colors = vec![Rgba::TRANSPARENT; Self::LEN];
        let last = (Self::LEN - 1) as f64;
        for (i, color) in colors.iter_mut().enumerate().skip(1) {
            *color = start.lerp(end, (i - 1) as f64 / (last - 1.0));
        }
        Self { colors }
    }

    /// Terrain palette: strong (high material) cells dark, weakened cells hot
    pub fn terrain() -> Self {
        let mut map = Self::gradient(Rgba::ORANGERED, Rgba::GREY);
        map.set(crate::sim::material::FULL, Rgba::DARKER_GREY);
        map.set(crate::sim::material::EDGE, Rgba::GREY);
        map.set(crate::sim::material::SHIP, Rgba::YELLOW);
        map
    }

    /// Particle heat palette
    pub fn exhaust() -> Self {
        Self::gradient(Rgba::BLACK, Rgba::ORANGERED)
    }

    pub fn set(&mut self, index: u8, color: Rgba) {
        self.colors[index as usize] = color;
    }

    #[inline]
    pub fn get(&self, index: u8) -> Rgba {
        self.colors[index as usize]
    }

    /// Map a whole cell buffer to pixels
    pub fn colorize(&self, cells: &[u8]) -> Vec<Rgba> {
        cells.iter().map(|c| self.get(*c)).collect()
    }

    /// Raw table bytes (1 KiB), e.g. for a palette texture
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::material;

    #[test]
    fn test_hex_roundtrip_channels() {
        let c = Rgba::from_hex(0x1122_3344);
        assert_eq!((c.r, c.g, c.b, c.a), (0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn test_gradient_endpoints() {
        let map = ColorMap::gradient(Rgba::BLACK, Rgba::ORANGERED);
        assert_eq!(map.get(0), Rgba::TRANSPARENT);
        assert_eq!(map.get(1), Rgba::BLACK);
        assert_eq!(map.get(255), Rgba::ORANGERED);
    }

    #[test]
    fn test_terrain_overrides() {
        let map = ColorMap::terrain();
        assert_eq!(map.get(material::FULL), Rgba::DARKER_GREY);
        assert_eq!(map.get(material::EMPTY), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_bytes_view() {
        let map = ColorMap::exhaust();
        let bytes = map.as_bytes();
        assert_eq!(bytes.len(), 256 * 4);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_colorize() {
        let map = ColorMap::terrain();
        let px = map.colorize(&[material::EMPTY, material::FULL]);
        assert_eq!(px, vec![Rgba::TRANSPARENT, Rgba::DARKER_GREY]);
    }
}
