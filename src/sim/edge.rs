//! Block exit edge finder
//!
//! Given a cell inside a `w x h` block and a direction of travel, find the
//! last cell the ray visits before leaving the block and the outward normal of
//! the side it leaves through. The general case is folded into the
//! "down-left" quadrant and mirrored back.

use glam::IVec2;

/// Where a ray leaves a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectEdge {
    /// Last cell inside the block, block-local
    pub inside: IVec2,
    /// Outward normal of the exit side; `inside + normal` is the first cell
    /// of the neighbouring block
    pub normal: IVec2,
}

/// Exit edge for a ray travelling with `dx <= 0` and `dy <= 0`.
///
/// `(x, y)` are the distances (in cells) from the left and bottom sides.
pub fn quadrant_edge(x: i32, y: i32, dx: i32, dy: i32) -> RectEdge {
    debug_assert!(dx <= 0 && dy <= 0, "quadrant_edge expects a down-left direction");
    debug_assert!(dx != 0 || dy != 0, "quadrant_edge needs a non-zero direction");

    // Cross-multiplied exit times through the bottom and the left side
    let x_diff = (y + 1) * dx;
    let y_diff = (x + 1) * dy;

    if y_diff < x_diff {
        // Bottom side first
        RectEdge {
            inside: IVec2::new(x - x_diff / dy, 0),
            normal: IVec2::NEG_Y,
        }
    } else if y_diff > x_diff {
        // Left side first
        RectEdge {
            inside: IVec2::new(0, y - y_diff / dx),
            normal: IVec2::NEG_X,
        }
    } else {
        // Exactly through the corner
        RectEdge {
            inside: IVec2::ZERO,
            normal: if x > y { IVec2::NEG_Y } else { IVec2::NEG_X },
        }
    }
}

/// Exit edge for a ray starting at block-local `cell` heading along `dir`
/// inside a `width x height` block.
pub fn rect_edge(cell: IVec2, dir: IVec2, width: i32, height: i32) -> RectEdge {
    let (x, y) = (cell.x, cell.y);
    let (dx, dy) = (dir.x, dir.y);
    let right = width - 1;
    let top = height - 1;

    match (dx > 0, dy > 0) {
        (true, true) => {
            let e = quadrant_edge(right - x, top - y, -dx, -dy);
            RectEdge {
                inside: IVec2::new(right - e.inside.x, top - e.inside.y),
                normal: -e.normal,
            }
        }
        (true, false) => {
            let e = quadrant_edge(right - x, y, -dx, dy);
            RectEdge {
                inside: IVec2::new(right - e.inside.x, e.inside.y),
                normal: IVec2::new(-e.normal.x, e.normal.y),
            }
        }
        (false, true) => {
            let e = quadrant_edge(x, top - y, dx, -dy);
            RectEdge {
                inside: IVec2::new(e.inside.x, top - e.inside.y),
                normal: IVec2::new(e.normal.x, -e.normal.y),
            }
        }
        (false, false) => quadrant_edge(x, y, dx, dy),
    }
}
