//! Packed occupancy bitboard
//!
//! The grid is cut into fixed-size blocks and each block's occupancy is packed
//! into one machine word, one bit per cell. Within a block the bit for local
//! cell `(x, y)` is `x * BLOCK_HEIGHT + y` (column-major), so a vertical step
//! moves to the neighbouring bit and a horizontal step moves `BLOCK_HEIGHT`
//! bits. A zero word proves the whole block is empty, which is what lets ray
//! queries and drawing skip open air a block at a time.
//!
//! [`PackedGrid::check_pair`] queries a single grid. Gameplay collision runs
//! through `TileLayer::cast_ray`, which walks both stacked chunks.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use glam::IVec2;

use super::collision::Collision;
use super::edge::rect_edge;

/// Machine word holding one block of occupancy bits
pub trait BlockWord:
    Copy
    + Eq
    + Default
    + fmt::Debug
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
{
    /// Block width in cells
    const WIDTH: i32;
    /// Block height in cells
    const HEIGHT: i32;
    const ZERO: Self;

    /// Word with only bit `index` set
    fn bit(index: u32) -> Self;
    fn count_ones(self) -> u32;
}

macro_rules! block_word {
    ($word:ty, $width:expr, $height:expr) => {
        impl BlockWord for $word {
            const WIDTH: i32 = $width;
            const HEIGHT: i32 = $height;
            const ZERO: Self = 0;

            #[inline]
            fn bit(index: u32) -> Self {
                1 << index
            }

            #[inline]
            fn count_ones(self) -> u32 {
                <$word>::count_ones(self)
            }
        }
    };
}

// 4x8 blocks in a 32-bit word, 8x8 blocks in a 64-bit word
block_word!(u32, 4, 8);
block_word!(u64, 8, 8);

/// Occupancy grid packed into blocks of `W`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedGrid<W: BlockWord = u64> {
    width: i32,
    height: i32,
    blocks_wide: i32,
    blocks_high: i32,
    /// Indexed `[bx][by]`: a block column is contiguous
    blocks: Vec<W>,
}

impl<W: BlockWord> PackedGrid<W> {
    /// Empty grid. Dimensions must be positive multiples of the block size.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "grid must be non-empty");
        assert!(
            width % W::WIDTH == 0 && height % W::HEIGHT == 0,
            "grid {width}x{height} is not a multiple of the {}x{} block",
            W::WIDTH,
            W::HEIGHT
        );
        let blocks_wide = width / W::WIDTH;
        let blocks_high = height / W::HEIGHT;
        Self {
            width,
            height,
            blocks_wide,
            blocks_high,
            blocks: vec![W::ZERO; (blocks_wide * blocks_high) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn blocks_wide(&self) -> i32 {
        self.blocks_wide
    }

    pub fn blocks_high(&self) -> i32 {
        self.blocks_high
    }

    /// Block dimensions as a vector
    #[inline]
    pub fn block_size() -> IVec2 {
        IVec2::new(W::WIDTH, W::HEIGHT)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Bit of block-local cell `local`
    #[inline]
    pub fn mask(local: IVec2) -> W {
        debug_assert!(local.x >= 0 && local.x < W::WIDTH && local.y >= 0 && local.y < W::HEIGHT);
        W::bit((local.x * W::HEIGHT + local.y) as u32)
    }

    /// Block coordinates containing global cell `p`
    #[inline]
    pub fn global_to_block(p: IVec2) -> IVec2 {
        IVec2::new(p.x.div_euclid(W::WIDTH), p.y.div_euclid(W::HEIGHT))
    }

    /// Position of global cell `p` inside its block
    #[inline]
    pub fn global_to_cell(p: IVec2) -> IVec2 {
        IVec2::new(p.x.rem_euclid(W::WIDTH), p.y.rem_euclid(W::HEIGHT))
    }

    /// Test a block-local cell against a raw block word
    #[inline]
    pub fn check_block_cell(block: W, local: IVec2) -> bool {
        block & Self::mask(local) != W::ZERO
    }

    #[inline]
    fn block_index(&self, bx: i32, by: i32) -> usize {
        (bx * self.blocks_high + by) as usize
    }

    #[inline]
    fn locate(&self, x: i32, y: i32) -> (usize, W) {
        assert!(
            self.in_bounds(x, y),
            "cell ({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        let p = IVec2::new(x, y);
        let b = Self::global_to_block(p);
        (self.block_index(b.x, b.y), Self::mask(Self::global_to_cell(p)))
    }

    pub fn set_cell(&mut self, x: i32, y: i32) {
        let (i, mask) = self.locate(x, y);
        self.blocks[i] = self.blocks[i] | mask;
    }

    pub fn clear_cell(&mut self, x: i32, y: i32) {
        let (i, mask) = self.locate(x, y);
        self.blocks[i] = self.blocks[i] & !mask;
    }

    /// Set or clear depending on `occupied`
    #[inline]
    pub fn write_cell(&mut self, x: i32, y: i32, occupied: bool) {
        if occupied {
            self.set_cell(x, y);
        } else {
            self.clear_cell(x, y);
        }
    }

    #[inline]
    pub fn get_cell(&self, x: i32, y: i32) -> bool {
        let (i, mask) = self.locate(x, y);
        self.blocks[i] & mask != W::ZERO
    }

    /// Raw word of block `(bx, by)`
    #[inline]
    pub fn block(&self, bx: i32, by: i32) -> W {
        assert!(
            bx >= 0 && bx < self.blocks_wide && by >= 0 && by < self.blocks_high,
            "block ({bx}, {by}) outside {}x{} blocks",
            self.blocks_wide,
            self.blocks_high
        );
        self.blocks[self.block_index(bx, by)]
    }

    pub fn clear_all(&mut self) {
        self.blocks.fill(W::ZERO);
    }

    pub fn set_all(&mut self) {
        self.blocks.fill(!W::ZERO);
    }

    /// Set every cell in the `width x height` rectangle with lower-left `(left, bottom)`
    pub fn fill_rect(&mut self, left: i32, bottom: i32, width: i32, height: i32) {
        for x in left..left + width {
            for y in bottom..bottom + height {
                self.set_cell(x, y);
            }
        }
    }

    pub fn clear_rect(&mut self, left: i32, bottom: i32, width: i32, height: i32) {
        for x in left..left + width {
            for y in bottom..bottom + height {
                self.clear_cell(x, y);
            }
        }
    }

    /// Number of occupied cells
    pub fn pop_count(&self) -> u32 {
        self.blocks.iter().map(|b| b.count_ones()).sum()
    }

    /// Walk from `start` to `end` inside a single block, testing each visited
    /// cell against `block`. Both endpoints are block-local; `start` itself
    /// is not tested.
    ///
    /// The walk is 4-connected: x and y are stepped separately, so the ray
    /// cannot slip diagonally between two occupied cells. A hit carries the
    /// negated step of whichever axis moved into the occupied cell.
    pub fn intra_block_bresenham(block: W, start: IVec2, end: IVec2) -> Collision {
        let d = (end - start).abs();
        let step = IVec2::new(
            if end.x < start.x { -1 } else { 1 },
            if end.y < start.y { -1 } else { 1 },
        );
        let mut curr = start;

        if d.x > d.y {
            let mut err = d.x;
            while curr != end {
                if err < d.y {
                    curr.y += step.y;
                    if Self::check_block_cell(block, curr) {
                        return Collision::hit_y(curr, step.y);
                    }
                    err += 2 * d.x;
                } else {
                    curr.x += step.x;
                    if Self::check_block_cell(block, curr) {
                        return Collision::hit_x(curr, step.x);
                    }
                    err -= 2 * d.y;
                }
            }
        } else {
            let mut err = d.y;
            while curr != end {
                if err <= d.x {
                    curr.x += step.x;
                    if Self::check_block_cell(block, curr) {
                        return Collision::hit_x(curr, step.x);
                    }
                    err += 2 * d.y;
                } else {
                    curr.y += step.y;
                    if Self::check_block_cell(block, curr) {
                        return Collision::hit_y(curr, step.y);
                    }
                    err -= 2 * d.x;
                }
            }
        }

        Collision::None
    }

    /// First occupied cell on the way from `start` to `end` (global cells,
    /// both inside the grid). `start` itself is not tested.
    ///
    /// Hops block to block: an all-zero block is crossed with one word
    /// compare, otherwise the block-local walk runs up to the exit edge. The
    /// first cell of every newly entered block is tested explicitly since an
    /// empty-block skip never looks at it.
    pub fn check_pair(&self, start: IVec2, end: IVec2) -> Collision {
        assert!(self.in_bounds(start.x, start.y), "ray start {start} outside grid");
        assert!(self.in_bounds(end.x, end.y), "ray end {end} outside grid");

        if start == end {
            return Collision::None;
        }

        let size = Self::block_size();
        let end_block = Self::global_to_block(end);
        let mut curr = start;

        loop {
            let block_pos = Self::global_to_block(curr);
            let corner = block_pos * size;
            let local = curr - corner;

            let (target, exit_normal) = if block_pos == end_block {
                (end - corner, None)
            } else {
                let edge = rect_edge(local, end - curr, W::WIDTH, W::HEIGHT);
                (edge.inside, Some(edge.normal))
            };

            let word = self.block(block_pos.x, block_pos.y);
            if word != W::ZERO {
                let hit = Self::intra_block_bresenham(word, local, target);
                if hit.is_hit() {
                    return hit.translated(corner);
                }
            }

            let Some(normal) = exit_normal else {
                return Collision::None;
            };

            curr = corner + target + normal;
            if self.get_cell(curr.x, curr.y) {
                return Collision::Hit {
                    cell: curr,
                    normal: -normal,
                };
            }
            if curr == end {
                return Collision::None;
            }
        }
    }
}

impl<W: BlockWord> fmt::Display for PackedGrid<W> {
    /// Top row first, `#` for occupied
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                f.write_str(if self.get_cell(x, y) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Straightforward per-cell walk using the same stepping rule
    fn naive_walk(occupied: &dyn Fn(IVec2) -> bool, start: IVec2, end: IVec2) -> Collision {
        let d = (end - start).abs();
        let step = IVec2::new(
            if end.x < start.x { -1 } else { 1 },
            if end.y < start.y { -1 } else { 1 },
        );
        let mut curr = start;
        let mut err = if d.x > d.y { d.x } else { d.y };
        while curr != end {
            let step_x = if d.x > d.y { err >= d.y } else { err <= d.x };
            if step_x {
                curr.x += step.x;
                err = if d.x > d.y { err - 2 * d.y } else { err + 2 * d.y };
                if occupied(curr) {
                    return Collision::hit_x(curr, step.x);
                }
            } else {
                curr.y += step.y;
                err = if d.x > d.y { err + 2 * d.x } else { err - 2 * d.x };
                if occupied(curr) {
                    return Collision::hit_y(curr, step.y);
                }
            }
        }
        Collision::None
    }

    #[test]
    fn test_bit_layout_is_column_major() {
        assert_eq!(PackedGrid::<u32>::mask(IVec2::new(0, 0)), 1);
        assert_eq!(PackedGrid::<u32>::mask(IVec2::new(0, 1)), 1 << 1);
        assert_eq!(PackedGrid::<u32>::mask(IVec2::new(1, 0)), 1 << 8);
        assert_eq!(PackedGrid::<u32>::mask(IVec2::new(3, 7)), 1 << 31);
        assert_eq!(PackedGrid::<u64>::mask(IVec2::new(7, 7)), 1 << 63);
    }

    #[test]
    fn test_set_get_clear() {
        let mut grid = PackedGrid::<u32>::new(16, 16);
        assert!(!grid.get_cell(5, 9));
        grid.set_cell(5, 9);
        assert!(grid.get_cell(5, 9));
        assert_eq!(grid.pop_count(), 1);
        // Cell (5, 9) is local (1, 1) of block (1, 1)
        assert_eq!(grid.block(1, 1), 1 << 9);
        grid.clear_cell(5, 9);
        assert!(!grid.get_cell(5, 9));
        assert_eq!(grid.block(1, 1), 0);
    }

    #[test]
    fn test_rects_and_bulk() {
        let mut grid = PackedGrid::<u64>::new(16, 16);
        grid.fill_rect(2, 3, 4, 5);
        assert_eq!(grid.pop_count(), 20);
        assert!(grid.get_cell(2, 3));
        assert!(grid.get_cell(5, 7));
        assert!(!grid.get_cell(6, 7));
        grid.clear_rect(3, 3, 2, 5);
        assert_eq!(grid.pop_count(), 10);
        grid.set_all();
        assert_eq!(grid.pop_count(), 256);
        grid.clear_all();
        assert_eq!(grid.pop_count(), 0);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_set_panics() {
        let mut grid = PackedGrid::<u32>::new(16, 16);
        grid.set_cell(16, 0);
    }

    #[test]
    #[should_panic]
    fn test_unaligned_dimensions_rejected() {
        let _ = PackedGrid::<u64>::new(12, 16);
    }

    #[test]
    fn test_block_helpers() {
        let p = IVec2::new(13, 17);
        assert_eq!(PackedGrid::<u32>::global_to_block(p), IVec2::new(3, 2));
        assert_eq!(PackedGrid::<u32>::global_to_cell(p), IVec2::new(1, 1));
        assert_eq!(PackedGrid::<u64>::global_to_block(p), IVec2::new(1, 2));
        assert_eq!(PackedGrid::<u64>::global_to_cell(p), IVec2::new(5, 1));
    }

    #[test]
    fn test_display_top_row_first() {
        let mut grid = PackedGrid::<u32>::new(4, 8);
        grid.set_cell(0, 7);
        let text = grid.to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "#...");
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn test_scenario_horizontal_hit_across_blocks() {
        let mut grid = PackedGrid::<u32>::new(16, 16);
        grid.set_cell(8, 8);
        let hit = grid.check_pair(IVec2::new(0, 8), IVec2::new(15, 8));
        assert_eq!(
            hit,
            Collision::Hit {
                cell: IVec2::new(8, 8),
                normal: IVec2::new(-1, 0)
            }
        );
    }

    #[test]
    fn test_leftward_and_vertical_hits() {
        let mut grid = PackedGrid::<u32>::new(16, 16);
        grid.set_cell(8, 8);
        assert_eq!(
            grid.check_pair(IVec2::new(15, 8), IVec2::new(0, 8)),
            Collision::Hit {
                cell: IVec2::new(8, 8),
                normal: IVec2::X
            }
        );
        assert_eq!(
            grid.check_pair(IVec2::new(8, 0), IVec2::new(8, 15)),
            Collision::Hit {
                cell: IVec2::new(8, 8),
                normal: IVec2::NEG_Y
            }
        );
        assert_eq!(
            grid.check_pair(IVec2::new(8, 15), IVec2::new(8, 0)),
            Collision::Hit {
                cell: IVec2::new(8, 8),
                normal: IVec2::Y
            }
        );
    }

    #[test]
    fn test_hit_inside_same_block() {
        let mut grid = PackedGrid::<u32>::new(16, 16);
        grid.set_cell(2, 8);
        assert_eq!(
            grid.check_pair(IVec2::new(0, 8), IVec2::new(3, 8)),
            Collision::Hit {
                cell: IVec2::new(2, 8),
                normal: IVec2::NEG_X
            }
        );
    }

    #[test]
    fn test_start_equals_end_is_clear() {
        let mut grid = PackedGrid::<u32>::new(16, 16);
        grid.set_all();
        assert_eq!(grid.check_pair(IVec2::new(5, 5), IVec2::new(5, 5)), Collision::None);
    }

    #[test]
    fn test_stops_at_end_before_obstacle() {
        let mut grid = PackedGrid::<u32>::new(16, 16);
        grid.set_cell(12, 8);
        assert_eq!(grid.check_pair(IVec2::new(0, 8), IVec2::new(11, 8)), Collision::None);
    }

    #[test]
    fn test_intra_block_diagonal_steps_both_axes() {
        // Wall along column 2: a shallow ray must strike it stepping in x
        let mut block = 0u32;
        for y in 0..8 {
            block |= PackedGrid::<u32>::mask(IVec2::new(2, y));
        }
        let hit = PackedGrid::<u32>::intra_block_bresenham(block, IVec2::new(0, 0), IVec2::new(3, 1));
        assert_eq!(
            hit,
            Collision::Hit {
                cell: IVec2::new(2, 0),
                normal: IVec2::NEG_X
            }
        );

        // Floor along row 3: a steep downward ray strikes it stepping in y
        let mut block = 0u32;
        for x in 0..4 {
            block |= PackedGrid::<u32>::mask(IVec2::new(x, 3));
        }
        let hit = PackedGrid::<u32>::intra_block_bresenham(block, IVec2::new(1, 7), IVec2::new(2, 0));
        assert_eq!(
            hit,
            Collision::Hit {
                cell: IVec2::new(1, 3),
                normal: IVec2::Y
            }
        );
    }

    #[test]
    fn test_intra_block_reaches_end_exactly() {
        // Occupy everything except the 4-connected path; the walk must not overshoot
        for (start, end) in [
            (IVec2::new(0, 0), IVec2::new(3, 1)),
            (IVec2::new(0, 0), IVec2::new(1, 7)),
            (IVec2::new(3, 7), IVec2::new(0, 0)),
            (IVec2::new(0, 7), IVec2::new(3, 5)),
        ] {
            let mut visited = vec![start];
            let d = (end - start).abs();
            let step = IVec2::new(
                if end.x < start.x { -1 } else { 1 },
                if end.y < start.y { -1 } else { 1 },
            );
            let mut curr = start;
            let mut err = d.x.max(d.y);
            while curr != end {
                let step_x = if d.x > d.y { err >= d.y } else { err <= d.x };
                if step_x {
                    curr.x += step.x;
                    err = if d.x > d.y { err - 2 * d.y } else { err + 2 * d.y };
                } else {
                    curr.y += step.y;
                    err = if d.x > d.y { err + 2 * d.x } else { err - 2 * d.x };
                }
                visited.push(curr);
            }
            assert_eq!(visited.len() as i32, d.x + d.y + 1);

            let mut block = !0u32;
            for cell in &visited {
                block &= !PackedGrid::<u32>::mask(*cell);
            }
            assert_eq!(
                PackedGrid::<u32>::intra_block_bresenham(block, start, end),
                Collision::None
            );
        }
    }

    #[test]
    fn test_empty_grid_never_hits() {
        let grid = PackedGrid::<u64>::new(64, 64);
        for (a, b) in [
            (IVec2::new(0, 0), IVec2::new(63, 63)),
            (IVec2::new(63, 0), IVec2::new(0, 63)),
            (IVec2::new(10, 3), IVec2::new(11, 60)),
            (IVec2::new(0, 30), IVec2::new(63, 31)),
        ] {
            assert_eq!(grid.check_pair(a, b), Collision::None);
            assert_eq!(grid.check_pair(b, a), Collision::None);
        }
    }

    #[test]
    fn test_seam_cell_hit_on_entry() {
        // Obstacle on the first cell of the next block, previous block empty
        let mut grid = PackedGrid::<u64>::new(32, 8);
        grid.set_cell(16, 4);
        assert_eq!(
            grid.check_pair(IVec2::new(1, 4), IVec2::new(30, 4)),
            Collision::Hit {
                cell: IVec2::new(16, 4),
                normal: IVec2::NEG_X
            }
        );
    }

    proptest! {
        #[test]
        fn prop_packed_matches_naive(ops in prop::collection::vec((0i32..32, 0i32..24, any::<bool>()), 0..200)) {
            let mut grid = PackedGrid::<u32>::new(32, 24);
            let mut naive = vec![false; 32 * 24];
            for (x, y, on) in ops {
                grid.write_cell(x, y, on);
                naive[(y * 32 + x) as usize] = on;
            }
            for y in 0..24 {
                for x in 0..32 {
                    prop_assert_eq!(grid.get_cell(x, y), naive[(y * 32 + x) as usize]);
                }
            }
            prop_assert_eq!(grid.pop_count() as usize, naive.iter().filter(|c| **c).count());
        }

        #[test]
        fn prop_empty_grid_ray_is_clear(ax in 0i32..48, ay in 0i32..40, bx in 0i32..48, by in 0i32..40) {
            let grid = PackedGrid::<u64>::new(48, 40);
            prop_assert_eq!(grid.check_pair(IVec2::new(ax, ay), IVec2::new(bx, by)), Collision::None);
        }

        #[test]
        fn prop_check_pair_is_deterministic(
            cells in prop::collection::vec((0i32..32, 0i32..32), 0..40),
            ax in 0i32..32, ay in 0i32..32, bx in 0i32..32, by in 0i32..32,
        ) {
            let mut grid = PackedGrid::<u32>::new(32, 32);
            for (x, y) in cells {
                grid.set_cell(x, y);
            }
            let a = IVec2::new(ax, ay);
            let b = IVec2::new(bx, by);
            let first = grid.check_pair(a, b);
            prop_assert_eq!(first, grid.check_pair(a, b));
            if let Collision::Hit { cell, normal } = first {
                prop_assert!(grid.get_cell(cell.x, cell.y));
                prop_assert_eq!(normal.x.abs() + normal.y.abs(), 1);
                // The cell the ray came from is on the normal side
                prop_assert!(cell != a);
            }
        }

        #[test]
        fn prop_single_obstacle_on_axis_ray(y in 0i32..32, hit_x in 1i32..31) {
            let mut grid = PackedGrid::<u32>::new(32, 32);
            grid.set_cell(hit_x, y);
            prop_assert_eq!(
                grid.check_pair(IVec2::new(0, y), IVec2::new(31, y)),
                Collision::Hit { cell: IVec2::new(hit_x, y), normal: IVec2::NEG_X }
            );
            prop_assert_eq!(
                grid.check_pair(IVec2::new(31, y), IVec2::new(0, y)),
                Collision::Hit { cell: IVec2::new(hit_x, y), normal: IVec2::X }
            );
        }

        #[test]
        fn prop_same_block_matches_naive(
            cells in prop::collection::vec((0i32..4, 0i32..8), 0..10),
            sx in 0i32..4, sy in 0i32..8, ex in 0i32..4, ey in 0i32..8,
        ) {
            let mut block = 0u32;
            for (x, y) in &cells {
                block |= PackedGrid::<u32>::mask(IVec2::new(*x, *y));
            }
            let occupied = |p: IVec2| PackedGrid::<u32>::check_block_cell(block, p);
            let start = IVec2::new(sx, sy);
            let end = IVec2::new(ex, ey);
            prop_assert_eq!(
                PackedGrid::<u32>::intra_block_bresenham(block, start, end),
                naive_walk(&occupied, start, end)
            );
        }
    }
}
