//! Destructible, procedurally generated terrain
//!
//! A [`TileLayer`] plus the policy for filling chunks: level `n` is always
//! generated from an RNG seeded by `n` and the world seed, so scrolling back
//! to a chunk rebuilds it exactly as it first appeared (damage aside).

use glam::{DVec2, IVec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::Kinematic;
use super::collision::{Collision, ScopeEdge};
use super::layer::{Scroll, TileLayer};
use super::levelgen::{self, LevelStyle};
use super::tile_buffer::material::EMPTY;
use crate::cell_of;
use crate::color::ColorMap;
use crate::screen::Screen;
use crate::settings::Settings;

/// Outcome of resolving one object's motion for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Path is clear after `bounces` bounces
    Clear { bounces: u32 },
    /// Object left the buffered rows
    OutOfScope(ScopeEdge),
    /// Still colliding after the bounce cap; the object was deactivated
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct Terrain {
    layer: TileLayer,
    style: LevelStyle,
    seed: u64,
    first_level_empty_height: i32,
    mark_edges: bool,
    speed_damage: f64,
    /// Level number held by the lower buffer
    bottom_level: u32,
}

/// Per-level RNG
pub fn level_rng(seed: u64, level: u32) -> Pcg32 {
    Pcg32::seed_from_u64(seed ^ (level as u64).wrapping_mul(2654435761))
}

impl Terrain {
    pub fn new(settings: &Settings) -> Self {
        let world = &settings.world;
        let mut terrain = Self {
            layer: TileLayer::new(world.level_width, world.level_height, ColorMap::terrain()),
            style: world.style,
            seed: world.seed,
            first_level_empty_height: world.first_level_empty_height,
            mark_edges: world.mark_edges,
            speed_damage: settings.physics.speed_damage,
            bottom_level: 1,
        };
        terrain.reset();
        terrain
    }

    /// Regenerate levels 1 and 2 and move the window back to the ground
    pub fn reset(&mut self) {
        self.layer.reset_heights();
        self.bottom_level = 1;
        self.make_level(self.layer.bottom_slot(), 1);
        self.make_level(self.layer.top_slot(), 2);
    }

    /// Fill buffer `slot` with level `level`
    fn make_level(&mut self, slot: usize, level: u32) {
        let mut rng = level_rng(self.seed, level);
        let first_rows = self.first_level_empty_height;
        let buffer = self.layer.buffer_mut(slot);

        match self.style {
            LevelStyle::Rect => {
                let (max_dimension, vacancies) = levelgen::rect_params(buffer.width(), buffer.height(), level);
                levelgen::rect_level(buffer, &mut rng, max_dimension, vacancies);
            }
            LevelStyle::Webbing => levelgen::webbing_level(buffer, level),
            LevelStyle::Solid => levelgen::solid_level(buffer),
        }
        if level <= 1 {
            levelgen::clear_floor(buffer, first_rows);
        }
        if self.mark_edges {
            levelgen::mark_edges(buffer);
        }
        buffer.set_level(level);
        log::debug!(
            "generated level {level} ({:?}) into slot {slot}, {} solid cells",
            self.style,
            buffer.solid_count()
        );
    }

    /// Follow the viewport, regenerating whichever chunk scrolled out.
    /// Returns true when the window moved.
    pub fn sync_height(&mut self, screen_bottom: i32) -> bool {
        // Nothing exists below level 1
        if screen_bottom < self.layer.bottom_height() && self.bottom_level <= 1 {
            return false;
        }
        match self.layer.sync_height(screen_bottom) {
            Some(Scroll::Forward) => {
                self.bottom_level += 1;
                self.make_level(self.layer.top_slot(), self.bottom_level + 1);
                true
            }
            Some(Scroll::Backward) => {
                self.bottom_level -= 1;
                self.make_level(self.layer.bottom_slot(), self.bottom_level);
                true
            }
            None => false,
        }
    }

    pub fn layer(&self) -> &TileLayer {
        &self.layer
    }

    pub fn bottom_level(&self) -> u32 {
        self.bottom_level
    }

    pub fn width(&self) -> i32 {
        self.layer.width()
    }

    pub fn bottom_height(&self) -> i32 {
        self.layer.bottom_height()
    }

    pub fn top_height(&self) -> i32 {
        self.layer.top_height()
    }

    pub fn palette(&self) -> &ColorMap {
        self.layer.bot().palette()
    }

    /// Level index of world row `y` (0 for the first chunk)
    pub fn buff_count(&self, y: i32) -> i32 {
        self.layer.buff_count(y)
    }

    /// Ray query between two continuous positions
    pub fn collision(&self, from: DVec2, to: DVec2) -> Collision {
        self.layer.cast_ray(cell_of(from), cell_of(to))
    }

    /// Solid at world `(x, y)`; side walls count as solid
    pub fn is_full(&self, x: i32, y: i32) -> bool {
        self.layer.occupancy(x, y)
    }

    pub fn cell(&self, x: i32, y: i32) -> u8 {
        self.layer.cell(x, y)
    }

    pub fn set_cell(&mut self, x: i32, y: i32, material: u8) {
        self.layer.set_cell(x, y, material);
    }

    pub fn remove(&mut self, x: i32, y: i32) {
        self.layer.set_cell(x, y, EMPTY);
    }

    /// Erode `(x, y)` by an impact at `speed`. Returns true if the cell was
    /// destroyed.
    pub fn damage(&mut self, x: i32, y: i32, speed: f64) -> bool {
        let amount = (speed * self.speed_damage).clamp(0.0, u8::MAX as f64) as u8;
        if self.layer.decrease_cell(x, y, amount, EMPTY) {
            self.remove(x, y);
            true
        } else {
            false
        }
    }

    /// Bounce `body` off the terrain until its last step is clear.
    ///
    /// Each hit reflects the body; with `erode` set the struck cell is also
    /// damaged by the post-bounce speed. After `max_bounces` bounces a
    /// further hit deactivates the body.
    pub fn resolve(&mut self, body: &mut Kinematic, restitution: f64, max_bounces: u32, erode: bool) -> Resolution {
        let mut bounces = 0;
        loop {
            match self.collision(body.prev_pos, body.pos) {
                Collision::None => return Resolution::Clear { bounces },
                Collision::OutOfScope { edge } => return Resolution::OutOfScope(edge),
                Collision::Hit { cell, normal } => {
                    if bounces >= max_bounces {
                        body.active = false;
                        return Resolution::Exhausted;
                    }
                    body.process_collision(cell, normal, restitution);
                    bounces += 1;
                    if erode {
                        self.damage(cell.x, cell.y, body.velocity.length());
                    }
                }
            }
        }
    }

    pub fn draw(&self, screen: &mut Screen) {
        self.layer.draw(screen);
    }

    /// Empty cell nearest the centre of the `size` window at `origin`
    pub fn find_empty_spot(&self, origin: IVec2, size: IVec2) -> Option<IVec2> {
        super::spawn::find_empty_spot(size, |p| !self.is_full(origin.x + p.x, origin.y + p.y)).map(|p| p + origin)
    }
}
