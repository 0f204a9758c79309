//! Collision query results
//!
//! Every ray query against the terrain ends in exactly one of three outcomes:
//! nothing in the way, a solid cell struck, or the ray left the part of the
//! world that is currently buffered.

use glam::IVec2;

/// Which end of the buffered world a query ran off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEdge {
    Below,
    Above,
}

/// Result of a collision query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Clear path to the target cell
    None,
    /// Struck a solid cell (or a side wall, in which case `cell.x` lies
    /// outside the play field)
    Hit {
        /// Global coordinates of the occupied cell
        cell: IVec2,
        /// Axis-aligned outward normal; exactly one component is non-zero
        normal: IVec2,
    },
    /// Left the buffered vertical extent of the world
    OutOfScope { edge: ScopeEdge },
}

impl Collision {
    /// Hit while stepping along x; the normal points back against the step
    #[inline]
    pub fn hit_x(cell: IVec2, step_x: i32) -> Self {
        Collision::Hit {
            cell,
            normal: IVec2::new(-step_x, 0),
        }
    }

    /// Hit while stepping along y
    #[inline]
    pub fn hit_y(cell: IVec2, step_y: i32) -> Self {
        Collision::Hit {
            cell,
            normal: IVec2::new(0, -step_y),
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Collision::Hit { .. })
    }

    pub fn is_out_of_scope(&self) -> bool {
        matches!(self, Collision::OutOfScope { .. })
    }

    /// Shift a hit by `offset` (block-local to global, buffer row to world row)
    pub fn translated(self, offset: IVec2) -> Self {
        match self {
            Collision::Hit { cell, normal } => Collision::Hit {
                cell: cell + offset,
                normal,
            },
            other => other,
        }
    }
}
