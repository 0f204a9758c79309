//! Rate-controlled particle source
//!
//! Particles live in a ring sized so that, at the configured rate and
//! lifetime, the slot being recycled has always expired already. Emission is
//! driven by elapsed time with the fractional remainder carried between
//! frames, so the long-run rate is exact regardless of frame timing.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg32;

use super::particle::Particle;
use super::ring::RingBuffer;
use crate::settings::EmitterSettings;
use crate::unit_vector;

/// Where and how an emission batch is sprayed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitState {
    pub pos: DVec2,
    /// Added to every particle's own velocity
    pub velocity: DVec2,
    /// Spray direction (radians)
    pub angle: f64,
}

impl EmitState {
    /// Linear blend; `t = 0` is `self`, `t = 1` is `other`
    pub fn lerp(&self, other: &EmitState, t: f64) -> EmitState {
        EmitState {
            pos: self.pos.lerp(other.pos, t),
            velocity: self.velocity.lerp(other.velocity, t),
            angle: self.angle + (other.angle - self.angle) * t,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Emitter {
    params: EmitterSettings,
    particles: RingBuffer<Particle>,
    /// Seconds between emissions
    period: f64,
    /// Time accumulated towards the next emission
    progress: f64,
    rng: Pcg32,
    emitted: u64,
    /// Live particles recycled before expiry
    overwritten: u64,
}

/// Slots needed so steady emission never recycles a live particle
pub fn required_capacity(rate: f64, life: f64) -> usize {
    (rate * life).ceil() as usize + 1
}

impl Emitter {
    pub fn new(params: EmitterSettings, seed: u64) -> Self {
        assert!(params.rate > 0.0 && params.life > 0.0, "emitter needs positive rate and life");
        assert!(params.min_speed <= params.max_speed, "min_speed above max_speed");
        let capacity = required_capacity(params.rate, params.life);
        let particles = RingBuffer::new(capacity, Particle::default());
        assert!(
            particles.capacity() as f64 >= params.rate * params.life + 1.0,
            "ring of {} slots cannot hold {} particles/s for {}s",
            particles.capacity(),
            params.rate,
            params.life
        );
        Self {
            period: 1.0 / params.rate,
            params,
            particles,
            progress: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            emitted: 0,
            overwritten: 0,
        }
    }

    pub fn params(&self) -> &EmitterSettings {
        &self.params
    }

    pub fn capacity(&self) -> usize {
        self.particles.capacity()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn particles_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_alive()).count()
    }

    /// Kill every particle and drop any partial emission time
    pub fn clear(&mut self) {
        for p in self.particles.iter_mut() {
            p.body.active = false;
            p.ttl = 0.0;
        }
        self.progress = 0.0;
    }

    /// Emit whatever is due after `dt` more seconds, all from `at`
    pub fn emit_over_time(&mut self, dt: f64, at: EmitState) -> usize {
        self.emit_swept(dt, at, at)
    }

    /// Emit whatever is due after `dt` more seconds, spreading the batch
    /// evenly from `start` to `end` so a moving source leaves a continuous
    /// trail. Returns the number emitted.
    pub fn emit_swept(&mut self, dt: f64, start: EmitState, end: EmitState) -> usize {
        self.progress += dt;
        if self.progress < self.period {
            return 0;
        }
        let n = (self.progress / self.period).floor() as usize;
        self.progress -= n as f64 * self.period;

        let before = self.overwritten;
        for i in 0..n {
            let t = (i + 1) as f64 / n as f64;
            self.emit(&start.lerp(&end, t));
        }
        if self.overwritten > before {
            log::warn!(
                "emitter recycled {} live particles (capacity {})",
                self.overwritten - before,
                self.capacity()
            );
        }
        n
    }

    /// Emit one particle
    pub fn emit(&mut self, at: &EmitState) {
        let z: f64 = self.rng.sample(StandardNormal);
        let angle = at.angle + z * self.params.angular_stdev;
        let speed = self.rng.random_range(self.params.min_speed..=self.params.max_speed);
        let variation: u8 = self.rng.random();
        let velocity = unit_vector(angle) * speed + at.velocity;
        let life = self.params.life;

        let slot = self.particles.next_slot();
        if slot.is_alive() {
            self.overwritten += 1;
        }
        slot.reset(at.pos, velocity, life, variation);
        self.emitted += 1;
    }

    /// Age and move every live particle, ignoring terrain
    pub fn update(&mut self, dt: f64, gravity: DVec2) {
        for p in self.particles.iter_mut().filter(|p| p.body.active) {
            p.update(dt, gravity);
        }
    }
}
