//! The player's ship
//!
//! A kinematic point with a heading and its own exhaust emitter. The tip is
//! at `body.pos`; the tail fans out behind it and exhaust leaves from the
//! middle of the tail, opposite the heading.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec2;

use super::body::Kinematic;
use super::emitter::{EmitState, Emitter};
use super::tick::TickInput;
use super::tile_buffer::material::SHIP;
use crate::screen::Screen;
use crate::settings::Settings;
use crate::{cell_of, unit_vector, wrap_angle};

#[derive(Debug, Clone)]
pub struct Ship {
    pub body: Kinematic,
    /// Heading in [0, 2π)
    direction: f64,
    pub emitter: Emitter,
    /// Tail vertices relative to the tip
    tail_mid: DVec2,
    tail_min: DVec2,
    tail_max: DVec2,
    rotation_speed: f64,
    acceleration: f64,
    tail_length: f64,
    tail_spread: f64,
    /// Nozzle state at the previous thrusting frame
    last_exhaust: Option<EmitState>,
}

impl Ship {
    pub fn new(pos: DVec2, settings: &Settings) -> Self {
        let mut ship = Self {
            body: Kinematic::new(pos, DVec2::ZERO),
            direction: 0.0,
            emitter: Emitter::new(settings.emitter.clone(), settings.world.seed.wrapping_add(1)),
            tail_mid: DVec2::ZERO,
            tail_min: DVec2::ZERO,
            tail_max: DVec2::ZERO,
            rotation_speed: settings.ship.rotation_speed,
            acceleration: settings.ship.acceleration,
            tail_length: settings.ship.tail_length,
            tail_spread: settings.ship.tail_spread,
            last_exhaust: None,
        };
        ship.set_direction(FRAC_PI_2);
        ship
    }

    /// Put the ship back at `pos`, at rest, pointing up, with no exhaust in flight
    pub fn respawn(&mut self, pos: DVec2) {
        self.body = Kinematic::new(pos, DVec2::ZERO);
        self.set_direction(FRAC_PI_2);
        self.emitter.clear();
        self.last_exhaust = None;
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn tail_mid(&self) -> DVec2 {
        self.tail_mid
    }

    pub fn set_direction(&mut self, direction: f64) {
        self.direction = wrap_angle(direction);
        let back = self.direction + PI;
        let half = self.tail_spread / 2.0;
        self.tail_mid = unit_vector(back) * self.tail_length;
        self.tail_min = unit_vector(back - half) * self.tail_length;
        self.tail_max = unit_vector(back + half) * self.tail_length;
    }

    pub fn rotate(&mut self, radians: f64) {
        self.set_direction(self.direction + radians);
    }

    /// Push along the heading by `amount` (a velocity change)
    pub fn accelerate(&mut self, amount: f64) {
        self.body.velocity += unit_vector(self.direction) * amount;
    }

    /// Steer and thrust. Exhaust is swept from where the nozzle was on the
    /// previous thrusting frame to where it is now.
    pub fn handle_input(&mut self, input: &TickInput, dt: f64) {
        let turn = (input.left as i32 - input.right as i32) as f64;
        self.rotate(turn * dt * self.rotation_speed);

        if input.up {
            self.accelerate(dt * self.acceleration);
            let nozzle = EmitState {
                pos: self.body.pos + self.tail_mid,
                velocity: self.body.velocity,
                angle: self.direction + PI,
            };
            let from = self.last_exhaust.unwrap_or(nozzle);
            self.emitter.emit_swept(dt, from, nozzle);
            self.last_exhaust = Some(nozzle);
        } else {
            self.last_exhaust = None;
        }
    }

    pub fn update(&mut self, dt: f64, gravity: DVec2) {
        self.body.integrate(dt, gravity);
    }

    /// Two tail strokes meeting at the tip
    pub fn draw(&self, screen: &mut Screen) {
        let tip = cell_of(self.body.pos);
        screen.draw_line(cell_of(self.body.pos + self.tail_min), tip, SHIP);
        screen.draw_line(cell_of(self.body.pos + self.tail_max), tip, SHIP);
        screen.set_cell(tip.x, tip.y, SHIP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship() -> Ship {
        let mut s = Settings::default();
        s.emitter.rate = 1000.0;
        Ship::new(DVec2::new(50.5, 50.5), &s)
    }

    #[test]
    fn test_starts_pointing_up_with_tail_below() {
        let ship = ship();
        assert!((ship.direction() - FRAC_PI_2).abs() < 1e-12);
        assert!(ship.tail_mid().y < 0.0);
        assert!(ship.tail_mid().x.abs() < 1e-9);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut ship = ship();
        ship.rotate(-PI);
        assert!((ship.direction() - 1.5 * PI).abs() < 1e-12);
        ship.rotate(PI);
        assert!((ship.direction() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_left_turns_counter_clockwise() {
        let mut ship = ship();
        let input = TickInput {
            left: true,
            ..Default::default()
        };
        ship.handle_input(&input, 0.01);
        assert!(ship.direction() > FRAC_PI_2);
        assert_eq!(ship.emitter.emitted(), 0);
    }

    #[test]
    fn test_thrust_accelerates_and_emits_behind() {
        let mut ship = ship();
        let input = TickInput {
            up: true,
            ..Default::default()
        };
        ship.handle_input(&input, 0.1);
        assert!((ship.body.velocity.y - 20.0).abs() < 1e-9);
        assert_eq!(ship.emitter.emitted(), 100);
        // Exhaust sprays downward from the nozzle
        let below = ship
            .emitter
            .particles()
            .filter(|p| p.is_alive())
            .filter(|p| p.body.velocity.y < ship.body.velocity.y)
            .count();
        assert!(below > 90);
    }

    #[test]
    fn test_draw_marks_tip() {
        let ship = ship();
        let mut screen = Screen::new(100, 100);
        ship.draw(&mut screen);
        assert_eq!(screen.cell(50, 50), SHIP);
        assert!(screen.cells().iter().filter(|c| **c == SHIP).count() > 3);
    }

    #[test]
    fn test_respawn_clears_exhaust() {
        let mut ship = ship();
        let input = TickInput {
            up: true,
            ..Default::default()
        };
        ship.handle_input(&input, 0.1);
        ship.respawn(DVec2::new(10.5, 10.5));
        assert_eq!(ship.emitter.active_count(), 0);
        assert_eq!(ship.body.velocity, DVec2::ZERO);
    }
}
