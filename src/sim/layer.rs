//! Two-chunk vertical scrolling window
//!
//! The world is an unbounded column of equally sized chunks, of which exactly
//! two are buffered at a time: the lower one in the `bottom` slot, the upper
//! one in the other. Scrolling past the seam flips which slot is the bottom
//! and shifts the tracked heights by one chunk; the caller then refills the
//! slot that just went out of view.
//!
//! ```text
//! top_height    ----------------
//!                  upper chunk
//! middle_height ---------------- seam
//!                  lower chunk
//! bottom_height ----------------
//! ```

use glam::IVec2;

use super::tile_buffer::{TerrainWord, TileBuffer, material};
use crate::color::ColorMap;
use crate::screen::Screen;

/// Direction of a buffer swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scroll {
    /// Old lower chunk retired; its slot now sits on top
    Forward,
    /// Old upper chunk retired; its slot now sits at the bottom
    Backward,
}

/// Where a global row lives in the buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRef {
    /// Buffer slot (0 or 1)
    pub slot: usize,
    /// Row inside that buffer
    pub row: i32,
}

#[derive(Debug, Clone)]
pub struct TileLayer {
    buffers: [TileBuffer; 2],
    /// Slot holding the lower chunk
    bottom: usize,
    bottom_height: i32,
    middle_height: i32,
    top_height: i32,
}

impl TileLayer {
    pub fn new(width: i32, chunk_height: i32, palette: ColorMap) -> Self {
        let lower = TileBuffer::new(width, chunk_height, palette.clone());
        let upper = TileBuffer::new(width, chunk_height, palette);
        Self {
            buffers: [lower, upper],
            bottom: 0,
            bottom_height: 0,
            middle_height: chunk_height,
            top_height: 2 * chunk_height,
        }
    }

    pub fn width(&self) -> i32 {
        self.buffers[0].width()
    }

    pub fn chunk_height(&self) -> i32 {
        self.buffers[0].height()
    }

    pub fn bottom_height(&self) -> i32 {
        self.bottom_height
    }

    pub fn middle_height(&self) -> i32 {
        self.middle_height
    }

    pub fn top_height(&self) -> i32 {
        self.top_height
    }

    /// Slot index of the lower chunk
    pub fn bottom_slot(&self) -> usize {
        self.bottom
    }

    pub fn top_slot(&self) -> usize {
        self.bottom ^ 1
    }

    pub fn bot(&self) -> &TileBuffer {
        &self.buffers[self.bottom]
    }

    pub fn top(&self) -> &TileBuffer {
        &self.buffers[self.bottom ^ 1]
    }

    pub fn bot_mut(&mut self) -> &mut TileBuffer {
        &mut self.buffers[self.bottom]
    }

    pub fn top_mut(&mut self) -> &mut TileBuffer {
        &mut self.buffers[self.bottom ^ 1]
    }

    pub fn buffer(&self, slot: usize) -> &TileBuffer {
        &self.buffers[slot]
    }

    /// Back to the initial window: heights from row 0, slot 0 at the bottom
    pub fn reset_heights(&mut self) {
        let h = self.chunk_height();
        self.bottom = 0;
        self.bottom_height = 0;
        self.middle_height = h;
        self.top_height = 2 * h;
    }

    /// Move the window up by one chunk
    pub fn swap_buffers(&mut self) {
        let h = self.bot().height();
        self.bottom_height += h;
        self.middle_height += h;
        self.top_height += h;
        self.bottom ^= 1;
        log::debug!("layer scrolled up, window [{}, {})", self.bottom_height, self.top_height);
    }

    /// Move the window down by one chunk
    pub fn unswap_buffers(&mut self) {
        let h = self.top().height();
        self.bottom_height -= h;
        self.middle_height -= h;
        self.top_height -= h;
        self.bottom ^= 1;
        log::debug!("layer scrolled down, window [{}, {})", self.bottom_height, self.top_height);
    }

    /// Follow the viewport: swap once if its bottom row crossed the seam
    /// (forward) or fell below the window (backward).
    pub fn sync_height(&mut self, screen_bottom: i32) -> Option<Scroll> {
        if screen_bottom > self.middle_height {
            self.swap_buffers();
            Some(Scroll::Forward)
        } else if screen_bottom < self.bottom_height {
            self.unswap_buffers();
            Some(Scroll::Backward)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_off_x(&self, x: i32) -> bool {
        x < 0 || x >= self.width()
    }

    #[inline]
    pub fn is_off_y(&self, y: i32) -> bool {
        y < self.bottom_height || y >= self.top_height
    }

    /// Map global row `y` to its buffer slot and local row
    #[inline]
    pub fn locate(&self, y: i32) -> Option<RowRef> {
        if self.is_off_y(y) {
            return None;
        }
        let local = y - self.bottom_height;
        let h = self.bot().height();
        Some(if local < h {
            RowRef {
                slot: self.bottom,
                row: local,
            }
        } else {
            RowRef {
                slot: self.bottom ^ 1,
                row: local - h,
            }
        })
    }

    /// Global row of row 0 in `slot`
    pub fn slot_origin(&self, slot: usize) -> i32 {
        if slot == self.bottom {
            self.bottom_height
        } else {
            self.middle_height
        }
    }

    /// Material at global `(x, y)`; outside the window reads as empty
    pub fn cell(&self, x: i32, y: i32) -> u8 {
        match self.locate(y) {
            Some(r) if !self.is_off_x(x) => self.buffers[r.slot].cell(x, r.row),
            _ => material::EMPTY,
        }
    }

    /// Write global `(x, y)`; outside the window is ignored
    pub fn set_cell(&mut self, x: i32, y: i32, material: u8) {
        if let Some(r) = self.locate(y) {
            self.buffers[r.slot].set_cell(x, r.row, material);
        }
    }

    /// Occupancy at global `(x, y)`: side walls are solid, rows outside the
    /// window are open
    pub fn occupancy(&self, x: i32, y: i32) -> bool {
        if self.is_off_x(x) {
            return true;
        }
        self.locate(y)
            .is_some_and(|r| self.buffers[r.slot].occupancy(x, r.row))
    }

    /// See [`TileBuffer::decrease_cell`]; false outside the window
    pub fn decrease_cell(&mut self, x: i32, y: i32, amount: u8, floor: u8) -> bool {
        match self.locate(y) {
            Some(r) if !self.is_off_x(x) => self.buffers[r.slot].decrease_cell(x, r.row, amount, floor),
            _ => false,
        }
    }

    /// Occupancy word of block column `bx` at block row `by` of `slot`
    #[inline]
    pub fn block(&self, slot: usize, bx: i32, by: i32) -> TerrainWord {
        self.buffers[slot].block(bx, by)
    }

    /// Mutable access to a slot, for generation
    pub fn buffer_mut(&mut self, slot: usize) -> &mut TileBuffer {
        &mut self.buffers[slot]
    }

    /// Draw both chunks
    pub fn draw(&self, screen: &mut Screen) {
        self.bot().draw(screen, self.bottom_height);
        self.top().draw(screen, self.middle_height);
    }

    /// Chunk index containing global row `y`
    pub fn buff_count(&self, y: i32) -> i32 {
        y.div_euclid(self.chunk_height())
    }

    /// Global cell of a slot-local cell
    pub fn to_global(&self, slot: usize, local: IVec2) -> IVec2 {
        IVec2::new(local.x, local.y + self.slot_origin(slot))
    }
}
