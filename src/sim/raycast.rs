//! Ray walk across the two buffered chunks
//!
//! Cell-by-cell 4-connected Bresenham in world coordinates, with the
//! occupancy word of the current block cached so consecutive steps inside one
//! block cost a mask test. An empty block that also holds the target ends the
//! walk immediately: the rest of the path cannot leave it.

use glam::IVec2;

use super::collision::{Collision, ScopeEdge};
use super::grid::PackedGrid;
use super::layer::TileLayer;
use super::tile_buffer::TerrainWord;

type Grid = PackedGrid<TerrainWord>;

/// Identifies one block across both buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockKey {
    slot: usize,
    block: IVec2,
}

struct BlockCache {
    key: Option<BlockKey>,
    word: TerrainWord,
}

impl BlockCache {
    fn new() -> Self {
        Self { key: None, word: 0 }
    }

    #[inline]
    fn word(&mut self, layer: &TileLayer, key: BlockKey) -> TerrainWord {
        if self.key != Some(key) {
            self.key = Some(key);
            self.word = layer.block(key.slot, key.block.x, key.block.y);
        }
        self.word
    }
}

impl TileLayer {
    /// Slot-local block and cell of a world cell inside the window
    #[inline]
    fn block_of(&self, p: IVec2) -> Option<(BlockKey, IVec2)> {
        if self.is_off_x(p.x) {
            return None;
        }
        let r = self.locate(p.y)?;
        let local = IVec2::new(p.x, r.row);
        Some((
            BlockKey {
                slot: r.slot,
                block: Grid::global_to_block(local),
            },
            Grid::global_to_cell(local),
        ))
    }

    /// First solid cell on the way from world cell `from` to `to`.
    ///
    /// `from` itself is not tested unless it lies beyond a side wall, in which
    /// case the wall is reported at `from` with an inward normal. Leaving the
    /// buffered rows yields `OutOfScope`; stepping past a side wall yields a
    /// hit on the off-grid cell with the normal pointing back in.
    pub fn cast_ray(&self, from: IVec2, to: IVec2) -> Collision {
        if from == to {
            return Collision::None;
        }
        if self.is_off_y(from.y) {
            let edge = if from.y < self.bottom_height() {
                ScopeEdge::Below
            } else {
                ScopeEdge::Above
            };
            return Collision::OutOfScope { edge };
        }
        if self.is_off_x(from.x) {
            return Collision::hit_x(from, if from.x < 0 { -1 } else { 1 });
        }

        let d = (to - from).abs();
        let step = IVec2::new(
            if to.x < from.x { -1 } else { 1 },
            if to.y < from.y { -1 } else { 1 },
        );
        let x_major = d.x > d.y;
        let mut err = if x_major { d.x } else { d.y };
        let target = self.block_of(to).map(|(key, _)| key);
        let mut cache = BlockCache::new();
        let mut curr = from;

        while curr != to {
            let step_x = if x_major { err >= d.y } else { err < d.x };
            if step_x {
                curr.x += step.x;
                err += if x_major { -2 * d.y } else { 2 * d.y };
            } else {
                curr.y += step.y;
                err += if x_major { 2 * d.x } else { -2 * d.x };
            }

            if self.is_off_x(curr.x) {
                return Collision::hit_x(curr, step.x);
            }
            let Some((key, local)) = self.block_of(curr) else {
                let edge = if step.y > 0 {
                    ScopeEdge::Above
                } else {
                    ScopeEdge::Below
                };
                return Collision::OutOfScope { edge };
            };

            let word = cache.word(self, key);
            if word == 0 {
                if target == Some(key) {
                    return Collision::None;
                }
                continue;
            }
            if Grid::check_block_cell(word, local) {
                return if step_x {
                    Collision::hit_x(curr, step.x)
                } else {
                    Collision::hit_y(curr, step.y)
                };
            }
        }

        Collision::None
    }
}
