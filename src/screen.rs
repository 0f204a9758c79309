//! Output cell buffers
//!
//! A `Screen` is the viewport-sized byte image the simulation draws into each
//! frame. Writes take world (global) coordinates; `bottom` is the world row
//! shown at the bottom of the viewport.

use glam::IVec2;

use crate::line_cells;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    width: i32,
    height: i32,
    /// World row of the bottom screen row
    bottom: i32,
    /// Row-major, bottom row first
    cells: Vec<u8>,
}

impl Screen {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "screen must be non-empty");
        Self {
            width,
            height,
            bottom: 0,
            cells: vec![0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    /// World row just above the top screen row
    pub fn top(&self) -> i32 {
        self.bottom + self.height
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Scroll so that world row `bottom` is at the bottom edge
    pub fn sync_height(&mut self, bottom: i32) {
        self.bottom = bottom;
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn reset(&mut self) {
        self.clear();
        self.bottom = 0;
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let row = y - self.bottom;
        (x >= 0 && x < self.width && row >= 0 && row < self.height).then(|| (row * self.width + x) as usize)
    }

    /// Whether world cell `(x, y)` is on screen
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Value at world cell `(x, y)`, 0 off screen
    pub fn cell(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map_or(0, |i| self.cells[i])
    }

    /// Overwrite world cell `(x, y)`; off-screen writes are dropped
    pub fn set_cell(&mut self, x: i32, y: i32, value: u8) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value;
        }
    }

    /// Additive write, saturating at 255
    pub fn add_to_cell(&mut self, x: i32, y: i32, value: u8) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = self.cells[i].saturating_add(value);
        }
    }

    /// Overwrite by screen-relative row
    pub fn set_cell_relative(&mut self, x: i32, row: i32, value: u8) {
        self.set_cell(x, row + self.bottom, value);
    }

    /// Line in world coordinates, clipped to the screen
    pub fn draw_line(&mut self, from: IVec2, to: IVec2, value: u8) {
        line_cells(from, to, |p| self.set_cell(p.x, p.y, value));
    }
}
