//! One chunk of terrain: material bytes plus packed occupancy
//!
//! Every write goes through [`TileBuffer::set_cell_direct`], which updates the
//! material byte and the occupancy bit together, so
//! `occupancy(x, y) == (material(x, y) != EMPTY)` always holds.

use glam::IVec2;

use super::collision::Collision;
use super::grid::{BlockWord, PackedGrid};
use crate::color::ColorMap;
use crate::line_cells;
use crate::screen::Screen;

/// Terrain material values
pub mod material {
    /// Open air
    pub const EMPTY: u8 = 0;
    /// Reported for reads outside a buffer
    pub const WALL: u8 = 1;
    /// Solid cell bordering open air (render hint)
    pub const EDGE: u8 = 249;
    /// Freshly generated, undamaged terrain
    pub const FULL: u8 = 250;
    /// Screen-only value for the ship; never stored in a buffer
    pub const SHIP: u8 = 255;
}

use material::{EMPTY, WALL};

/// Block word used for terrain occupancy (8x8 cells)
pub type TerrainWord = u64;

#[derive(Debug, Clone)]
pub struct TileBuffer {
    width: i32,
    height: i32,
    /// Row-major materials, bottom row first
    cells: Vec<u8>,
    occupancy: PackedGrid<TerrainWord>,
    palette: ColorMap,
    /// World chunk currently held, 0 when never generated
    level: u32,
}

impl TileBuffer {
    pub fn new(width: i32, height: i32, palette: ColorMap) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY; (width * height) as usize],
            occupancy: PackedGrid::new(width, height),
            palette,
            level: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    pub fn palette(&self) -> &ColorMap {
        &self.palette
    }

    pub fn occupancy_grid(&self) -> &PackedGrid<TerrainWord> {
        &self.occupancy
    }

    #[inline]
    pub fn is_off_x(&self, x: i32) -> bool {
        x < 0 || x >= self.width
    }

    #[inline]
    pub fn is_off_y(&self, y: i32) -> bool {
        y < 0 || y >= self.height
    }

    #[inline]
    pub fn is_off(&self, x: i32, y: i32) -> bool {
        self.is_off_x(x) || self.is_off_y(y)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Write material and occupancy together. Panics off the buffer.
    #[inline]
    pub fn set_cell_direct(&mut self, x: i32, y: i32, material: u8) {
        assert!(!self.is_off(x, y), "cell ({x}, {y}) outside {}x{} buffer", self.width, self.height);
        let i = self.index(x, y);
        self.cells[i] = material;
        self.occupancy.write_cell(x, y, material != EMPTY);
    }

    /// Like `set_cell_direct` but ignores cells off the buffer
    pub fn set_cell(&mut self, x: i32, y: i32, material: u8) {
        if !self.is_off(x, y) {
            self.set_cell_direct(x, y, material);
        }
    }

    /// Material at `(x, y)`; off the buffer reads as `WALL`
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> u8 {
        if self.is_off(x, y) {
            WALL
        } else {
            self.cells[self.index(x, y)]
        }
    }

    /// Occupancy bit at `(x, y)`; off the buffer counts as occupied
    #[inline]
    pub fn occupancy(&self, x: i32, y: i32) -> bool {
        self.is_off(x, y) || self.occupancy.get_cell(x, y)
    }

    /// Raw occupancy word of block `(bx, by)`
    #[inline]
    pub fn block(&self, bx: i32, by: i32) -> TerrainWord {
        self.occupancy.block(bx, by)
    }

    /// Erode `(x, y)` by `amount`, never going below `floor`.
    ///
    /// Returns true once the cell sits at `floor`, either already or because
    /// this call drove it there.
    pub fn decrease_cell(&mut self, x: i32, y: i32, amount: u8, floor: u8) -> bool {
        let prev = self.cell(x, y);
        if self.is_off(x, y) || prev <= floor {
            return prev <= floor;
        }
        let next = prev.saturating_sub(amount);
        if next <= floor {
            self.set_cell_direct(x, y, floor);
            true
        } else {
            self.set_cell_direct(x, y, next);
            false
        }
    }

    pub fn set_all(&mut self, material: u8) {
        self.cells.fill(material);
        if material == EMPTY {
            self.occupancy.clear_all();
        } else {
            self.occupancy.set_all();
        }
    }

    pub fn clear(&mut self) {
        self.set_all(EMPTY);
    }

    /// Fill the rectangle with lower-left `(left, bottom)`, clipped to the buffer
    pub fn fill_rect(&mut self, left: i32, bottom: i32, width: i32, height: i32, material: u8) {
        let x0 = left.max(0);
        let x1 = (left + width).min(self.width);
        let y0 = bottom.max(0);
        let y1 = (bottom + height).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.set_cell_direct(x, y, material);
            }
        }
    }

    /// Straight line of `material`, clipped to the buffer
    pub fn draw_line(&mut self, from: IVec2, to: IVec2, material: u8) {
        line_cells(from, to, |p| self.set_cell(p.x, p.y, material));
    }

    /// Rectangle outline plus a web of `n_lines - 1` line pairs joining
    /// points spaced along opposite sides
    pub fn cool_rect(&mut self, left: i32, bottom: i32, width: i32, height: i32, n_lines: i32, material: u8) {
        let n_lines = n_lines.max(1);
        let x_inc = if width >= n_lines { width / n_lines } else { 1 };
        let y_inc = if height >= n_lines { height / n_lines } else { 1 };
        let right = left + width - 1;
        let top = bottom + height - 1;

        self.draw_line(IVec2::new(left, bottom), IVec2::new(right, bottom), material);
        self.draw_line(IVec2::new(left, bottom), IVec2::new(left, top), material);
        self.draw_line(IVec2::new(right, bottom), IVec2::new(right, top), material);
        self.draw_line(IVec2::new(left, top), IVec2::new(right, top), material);

        for i in 1..n_lines {
            self.draw_line(
                IVec2::new(left + i * x_inc, bottom),
                IVec2::new(right, bottom + i * y_inc),
                material,
            );
            self.draw_line(
                IVec2::new(left, bottom + i * y_inc),
                IVec2::new(left + i * x_inc, top),
                material,
            );
        }
    }

    /// First occupied cell between two buffer-local cells. World queries
    /// spanning both chunks go through `TileLayer::cast_ray` instead.
    pub fn check_pair(&self, start: IVec2, end: IVec2) -> Collision {
        self.occupancy.check_pair(start, end)
    }

    /// Copy visible non-empty cells into `screen`, this buffer's row 0 being
    /// world row `origin_y`. Blocks with a zero occupancy word are skipped
    /// without touching their cells.
    pub fn draw(&self, screen: &mut Screen, origin_y: i32) {
        let bottom = screen.bottom().max(origin_y);
        let top = screen.top().min(origin_y + self.height);
        if bottom >= top {
            return;
        }

        let first_row = bottom - origin_y;
        let last_row = top - origin_y;
        let bw = TerrainWord::WIDTH;
        let bh = TerrainWord::HEIGHT;
        let max_x = self.width.min(screen.width());

        for by in first_row / bh..=(last_row - 1) / bh {
            let y0 = (by * bh).max(first_row);
            let y1 = ((by + 1) * bh).min(last_row);
            for bx in 0..self.occupancy.blocks_wide() {
                if self.block(bx, by) == 0 {
                    continue;
                }
                let x0 = bx * bw;
                let x1 = (x0 + bw).min(max_x);
                for y in y0..y1 {
                    let row = self.index(0, y);
                    for x in x0..x1 {
                        let material = self.cells[row + x as usize];
                        if material != EMPTY {
                            screen.set_cell(x, y + origin_y, material);
                        }
                    }
                }
            }
        }
    }

    /// Number of non-empty cells
    pub fn solid_count(&self) -> u32 {
        self.occupancy.pop_count()
    }
}

#[cfg(test)]
mod tests {
    use super::material::{EDGE, FULL};
    use super::*;
    use proptest::prelude::*;

    fn buffer(w: i32, h: i32) -> TileBuffer {
        TileBuffer::new(w, h, ColorMap::terrain())
    }

    fn assert_consistent(buf: &TileBuffer) {
        for y in 0..buf.height() {
            for x in 0..buf.width() {
                assert_eq!(buf.occupancy(x, y), buf.cell(x, y) != EMPTY, "mismatch at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_set_cell_direct_keeps_bits_in_sync() {
        let mut buf = buffer(16, 16);
        buf.set_cell_direct(3, 4, FULL);
        assert!(buf.occupancy(3, 4));
        assert_eq!(buf.cell(3, 4), FULL);
        buf.set_cell_direct(3, 4, EMPTY);
        assert!(!buf.occupancy(3, 4));
        assert_consistent(&buf);
    }

    #[test]
    fn test_off_buffer_reads_solid() {
        let buf = buffer(16, 16);
        assert_eq!(buf.cell(-1, 0), WALL);
        assert_eq!(buf.cell(0, 16), WALL);
        assert!(buf.occupancy(16, 3));
    }

    #[test]
    fn test_set_cell_ignores_off_buffer() {
        let mut buf = buffer(16, 16);
        buf.set_cell(-1, 0, FULL);
        buf.set_cell(0, 99, FULL);
        assert_eq!(buf.solid_count(), 0);
    }

    #[test]
    fn test_decrease_cell_erodes_then_empties() {
        let mut buf = buffer(16, 16);
        buf.set_cell_direct(5, 5, 30);
        assert!(!buf.decrease_cell(5, 5, 20, EMPTY));
        assert_eq!(buf.cell(5, 5), 10);
        assert!(buf.occupancy(5, 5));
        assert!(buf.decrease_cell(5, 5, 20, EMPTY));
        assert_eq!(buf.cell(5, 5), EMPTY);
        assert!(!buf.occupancy(5, 5));
        // Already at the floor
        assert!(buf.decrease_cell(5, 5, 1, EMPTY));
    }

    #[test]
    fn test_decrease_by_zero_holds() {
        let mut buf = buffer(16, 16);
        buf.set_cell_direct(1, 1, FULL);
        assert!(!buf.decrease_cell(1, 1, 0, EMPTY));
        assert_eq!(buf.cell(1, 1), FULL);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut buf = buffer(16, 16);
        buf.fill_rect(-4, 14, 8, 8, FULL);
        assert_eq!(buf.solid_count(), 4 * 2);
        assert_consistent(&buf);
    }

    #[test]
    fn test_set_all_and_clear() {
        let mut buf = buffer(16, 8);
        buf.set_all(FULL);
        assert_eq!(buf.solid_count(), 128);
        assert_consistent(&buf);
        buf.clear();
        assert_eq!(buf.solid_count(), 0);
    }

    #[test]
    fn test_cool_rect_outline() {
        let mut buf = buffer(16, 16);
        buf.cool_rect(0, 0, 16, 16, 1, FULL);
        // Outline only: 4 sides minus the shared corners
        assert_eq!(buf.solid_count(), 16 * 4 - 4);
        assert!(!buf.occupancy(8, 8));
        buf.cool_rect(0, 0, 16, 16, 4, EDGE);
        assert!(buf.solid_count() > 60);
        assert_consistent(&buf);
    }

    #[test]
    fn test_draw_skips_empty_blocks_and_clips() {
        let mut buf = buffer(16, 16);
        buf.set_cell_direct(1, 1, FULL);
        buf.set_cell_direct(9, 12, 40);
        let mut screen = Screen::new(16, 8);
        screen.sync_height(105);
        // Buffer rows 0..16 map to world rows 100..116; screen shows 105..113
        buf.draw(&mut screen, 100);
        assert_eq!(screen.cell(9, 112), 40);
        assert_eq!(screen.cell(1, 101), 0);
        assert_eq!(screen.cells().iter().filter(|c| **c != 0).count(), 1);
    }

    #[test]
    fn test_draw_outside_screen_is_noop() {
        let mut buf = buffer(16, 16);
        buf.set_all(FULL);
        let mut screen = Screen::new(16, 8);
        screen.sync_height(200);
        buf.draw(&mut screen, 0);
        assert!(screen.cells().iter().all(|c| *c == 0));
    }

    #[test]
    fn test_check_pair_uses_local_cells() {
        let mut buf = buffer(16, 16);
        buf.set_cell_direct(8, 8, FULL);
        assert_eq!(
            buf.check_pair(IVec2::new(0, 8), IVec2::new(15, 8)),
            Collision::Hit {
                cell: IVec2::new(8, 8),
                normal: IVec2::NEG_X
            }
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(i32, i32, u8),
        Decrease(i32, i32, u8),
        Fill(i32, i32, i32, i32, u8),
        Line(i32, i32, i32, i32, u8),
        All(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0i32..16, 0i32..16, any::<u8>()).prop_map(|(x, y, m)| Op::Set(x, y, m)),
            (-2i32..18, -2i32..18, any::<u8>()).prop_map(|(x, y, a)| Op::Decrease(x, y, a)),
            (-4i32..16, -4i32..16, 0i32..8, 0i32..8, any::<u8>()).prop_map(|(x, y, w, h, m)| Op::Fill(x, y, w, h, m)),
            (-4i32..20, -4i32..20, -4i32..20, -4i32..20, any::<u8>())
                .prop_map(|(a, b, c, d, m)| Op::Line(a, b, c, d, m)),
            prop_oneof![Just(EMPTY), Just(FULL)].prop_map(Op::All),
        ]
    }

    proptest! {
        #[test]
        fn prop_occupancy_matches_material(ops in prop::collection::vec(op(), 0..40)) {
            let mut buf = buffer(16, 16);
            for op in ops {
                match op {
                    Op::Set(x, y, m) => buf.set_cell_direct(x, y, m),
                    Op::Decrease(x, y, a) => { buf.decrease_cell(x, y, a, EMPTY); }
                    Op::Fill(x, y, w, h, m) => buf.fill_rect(x, y, w, h, m),
                    Op::Line(a, b, c, d, m) => buf.draw_line(IVec2::new(a, b), IVec2::new(c, d), m),
                    Op::All(m) => buf.set_all(m),
                }
                for y in 0..16 {
                    for x in 0..16 {
                        prop_assert_eq!(buf.occupancy(x, y), buf.cell(x, y) != EMPTY);
                    }
                }
            }
        }
    }
}
