//! Exhaust particles

use glam::DVec2;

use super::body::Kinematic;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub body: Kinematic,
    /// Seconds left to live
    pub ttl: f64,
    /// Lifetime at emission, for fading
    pub initial_life: f64,
    /// Per-particle palette offset
    pub variation: u8,
}

impl Particle {
    /// Reuse this slot for a fresh particle
    pub fn reset(&mut self, pos: DVec2, velocity: DVec2, life: f64, variation: u8) {
        debug_assert!(life.is_finite(), "particle life must be finite");
        self.body = Kinematic::new(pos, velocity);
        self.body.active = life > 0.0;
        self.ttl = life;
        self.initial_life = life;
        self.variation = variation;
    }

    /// Age by `dt`, integrating only while still alive
    pub fn update(&mut self, dt: f64, gravity: DVec2) {
        self.ttl -= dt;
        if self.ttl > 0.0 {
            self.body.integrate(dt, gravity);
        } else {
            self.body.active = false;
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.body.active && self.ttl > 0.0
    }

    /// Remaining share of the lifetime in [0, 1]
    pub fn life_fraction(&self) -> f64 {
        if self.initial_life > 0.0 {
            (self.ttl / self.initial_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
