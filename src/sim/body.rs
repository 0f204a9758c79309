//! Kinematic point shared by the ship and every particle
//!
//! Semi-implicit Euler with a caller-supplied gravity, and a one-step bounce
//! against an axis-aligned grid surface.

use glam::{DVec2, IVec2};

use crate::cell_of;
use crate::consts::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematic {
    pub pos: DVec2,
    /// Position before the last integration step; the segment
    /// `prev_pos -> pos` is what gets collided
    pub prev_pos: DVec2,
    pub velocity: DVec2,
    pub active: bool,
}

impl Kinematic {
    pub fn new(pos: DVec2, velocity: DVec2) -> Self {
        Self {
            pos,
            prev_pos: pos,
            velocity,
            active: true,
        }
    }

    /// Velocity first, then position from the new velocity
    #[inline]
    pub fn integrate(&mut self, dt: f64, gravity: DVec2) {
        self.velocity += gravity * dt;
        self.prev_pos = self.pos;
        self.pos += self.velocity * dt;
    }

    #[inline]
    pub fn cell(&self) -> IVec2 {
        cell_of(self.pos)
    }

    #[inline]
    pub fn prev_cell(&self) -> IVec2 {
        cell_of(self.prev_pos)
    }

    /// Bounce off the face of `cell` whose outward normal is `normal`.
    ///
    /// `prev_pos` is parked just outside that face, the hit-axis velocity is
    /// reversed and scaled by `restitution`, and `pos` is mirrored across the
    /// face so the remaining travel continues in the reflected direction.
    pub fn process_collision(&mut self, cell: IVec2, normal: IVec2, restitution: f64) {
        debug_assert!(
            (normal.x == 0) != (normal.y == 0),
            "normal {normal} must be axis-aligned and non-zero"
        );
        let cell_f = cell.as_dvec2();

        if normal.x != 0 {
            self.prev_pos.x = if normal.x > 0 {
                cell_f.x + 1.0 + EPSILON
            } else {
                cell_f.x - EPSILON
            };
            self.prev_pos.y = cell_f.y + 0.5;
            self.velocity.x *= -restitution;
            self.pos.x = self.prev_pos.x - (self.pos.x - self.prev_pos.x);
        } else {
            self.prev_pos.y = if normal.y > 0 {
                cell_f.y + 1.0 + EPSILON
            } else {
                cell_f.y - EPSILON
            };
            self.prev_pos.x = cell_f.x + 0.5;
            self.velocity.y *= -restitution;
            self.pos.y = self.prev_pos.y - (self.pos.y - self.prev_pos.y);
        }
    }
}
