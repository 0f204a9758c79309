//! Procedural chunk generation
//!
//! Every generator is a pure function of the buffer dimensions, the level
//! number and the RNG handed in, so regenerating a level with the same seed
//! rebuilds it cell for cell.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::tile_buffer::TileBuffer;
use super::tile_buffer::material::{EDGE, EMPTY, FULL};

/// How chunks are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LevelStyle {
    /// Solid rock with random rectangular caves
    #[default]
    Rect,
    /// Thin outline plus a web of lines; denser every level
    Webbing,
    /// Completely solid (throughput testing)
    Solid,
}

/// Carve `num_vacancies` random rectangles of up to `max_dimension - 1`
/// cells per side out of a completely solid buffer
pub fn rect_level(buffer: &mut TileBuffer, rng: &mut Pcg32, max_dimension: i32, num_vacancies: u32) {
    buffer.set_all(FULL);
    let max_dimension = max_dimension.max(1);
    let width = buffer.width();
    let height = buffer.height();

    for _ in 0..num_vacancies {
        let w = rng.random_range(0..max_dimension).min(width);
        let left = rng.random_range(0..=width - w);
        let h = rng.random_range(0..max_dimension).min(height);
        let bottom = rng.random_range(0..=height - h);
        buffer.fill_rect(left, bottom, w, h, EMPTY);
    }
}

/// Rect-style parameters for `level`: `(max_dimension, num_vacancies)`.
/// Caves shrink and multiply as levels climb.
pub fn rect_params(width: i32, height: i32, level: u32) -> (i32, u32) {
    if level > 1 {
        let per_level = (width as f64 / level as f64).ceil() as i32;
        (per_level / 2, (height as f64 * (level as f64).sqrt()) as u32)
    } else {
        (width / 2, height as u32)
    }
}

pub fn webbing_level(buffer: &mut TileBuffer, level: u32) {
    buffer.clear();
    let (w, h) = (buffer.width(), buffer.height());
    buffer.cool_rect(0, 0, w, h, level.max(1) as i32, FULL);
}

pub fn solid_level(buffer: &mut TileBuffer) {
    buffer.set_all(FULL);
}

/// Empty the bottom `rows` rows so play starts in open air
pub fn clear_floor(buffer: &mut TileBuffer, rows: i32) {
    let w = buffer.width();
    buffer.fill_rect(0, 0, w, rows, EMPTY);
}

/// Re-tag solid cells with an empty 4-neighbour inside the buffer as `EDGE`
pub fn mark_edges(buffer: &mut TileBuffer) {
    let (w, h) = (buffer.width(), buffer.height());
    let mut edges = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if buffer.cell(x, y) == EMPTY {
                continue;
            }
            let exposed = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                .iter()
                .any(|(dx, dy)| buffer.cell(x + dx, y + dy) == EMPTY);
            if exposed {
                edges.push((x, y));
            }
        }
    }
    for (x, y) in edges {
        buffer.set_cell_direct(x, y, EDGE);
    }
}
