//! Spout - steer a thrust-driven ship up through destructible terrain
//!
//! Core modules:
//! - `sim`: Bit-packed terrain, ray/terrain collision, scrolling level
//!   streaming, particles and the per-frame update
//! - `screen`: Viewport-sized output buffers the simulation draws into
//! - `color`: Byte-to-RGBA lookup tables for the renderer boundary
//! - `handoff`: Single-slot frame handoff between simulation and render threads
//! - `settings`: Data-driven tunables

pub mod color;
pub mod handoff;
pub mod screen;
pub mod settings;
pub mod sim;

pub use color::{ColorMap, Rgba};
pub use handoff::FrameHandoff;
pub use screen::Screen;
pub use settings::{QualityPreset, Settings};

use glam::{DVec2, IVec2};

/// Game configuration constants
pub mod consts {
    /// Offset used to park a bounced object just outside the surface it hit
    pub const EPSILON: f64 = 0.001;
    /// Block size used for terrain occupancy words (8x8 cells)
    pub const TERRAIN_BLOCK: i32 = 8;
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Unit vector pointing along `angle` (radians, counter-clockwise from +x)
#[inline]
pub fn unit_vector(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Cell containing a continuous position
#[inline]
pub fn cell_of(pos: DVec2) -> IVec2 {
    pos.floor().as_ivec2()
}

/// Visit every cell of the 8-connected Bresenham line from `from` to `to`,
/// both ends included
pub fn line_cells(from: IVec2, to: IVec2, mut plot: impl FnMut(IVec2)) {
    let d = IVec2::new((to.x - from.x).abs(), -(to.y - from.y).abs());
    let step = IVec2::new(
        if from.x < to.x { 1 } else { -1 },
        if from.y < to.y { 1 } else { -1 },
    );
    let mut err = d.x + d.y;
    let mut curr = from;
    loop {
        plot(curr);
        if curr == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= d.y {
            err += d.y;
            curr.x += step.x;
        }
        if e2 <= d.x {
            err += d.x;
            curr.y += step.y;
        }
    }
}
