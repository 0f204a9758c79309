//! Game state
//!
//! The `Environment` owns everything one game session mutates: ship, terrain,
//! and the two output screens. [`Environment::update`] is one simulated frame.

use anyhow::anyhow;
use glam::{DVec2, IVec2};

use super::collision::Collision;
use super::ship::Ship;
use super::terrain::{Resolution, Terrain};
use crate::screen::Screen;
use crate::settings::Settings;

/// Current game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    Playing,
    Paused,
    GameOver,
}

/// Why the last game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// Ship struck terrain
    Crashed,
    /// Ship flew past the buffered world
    LeftWorld,
    /// Ship dropped below the bottom of the screen
    FellBehind,
    /// Clock ran out
    OutOfTime,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub width: i32,
    pub height: i32,
    /// World row at the bottom of the screen
    pub bottom: i32,
    /// Terrain materials plus the ship, row-major, bottom row first
    pub terrain: Vec<u8>,
    /// Particle heat, same layout
    pub particles: Vec<u8>,
    pub score: i32,
    pub level: i32,
    pub time_left: f64,
    pub phase: GamePhase,
}

#[derive(Debug, Clone)]
pub struct Environment {
    pub settings: Settings,
    pub ship: Ship,
    pub terrain: Terrain,
    /// Terrain and ship
    pub screen: Screen,
    /// Additive particle heat
    pub particle_screen: Screen,
    /// Highest screen bottom reached
    pub score: i32,
    /// Highest chunk index reached
    pub level: i32,
    /// Seconds left on the clock
    pub time_left: f64,
    pub phase: GamePhase,
    pub game_over_reason: Option<GameOverReason>,
    /// Frames simulated this session
    pub frame: u64,
    /// Particles retired this frame by the bounce cap
    pub stuck_particles: usize,
}

impl Environment {
    /// Build a session. Fails on invalid settings or when level 1 leaves no
    /// room to place the ship.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let terrain = Terrain::new(&settings);
        let spawn = Self::spawn_point(&terrain, &settings)?;
        let (w, h) = (settings.world.viewport_width, settings.world.viewport_height);

        let env = Self {
            ship: Ship::new(spawn, &settings),
            terrain,
            screen: Screen::new(w, h),
            particle_screen: Screen::new(w, h),
            score: 0,
            level: 0,
            time_left: settings.timing.initial_time,
            phase: GamePhase::Playing,
            game_over_reason: None,
            frame: 0,
            stuck_particles: 0,
            settings,
        };
        log::info!("New game: spawn at {spawn}, seed {}", env.settings.world.seed);
        Ok(env)
    }

    /// Empty cell nearest the centre of the first viewport
    fn spawn_point(terrain: &Terrain, settings: &Settings) -> anyhow::Result<DVec2> {
        let size = IVec2::new(settings.world.viewport_width, settings.world.viewport_height);
        let cell = terrain.find_empty_spot(IVec2::ZERO, size).ok_or_else(|| {
            anyhow!(
                "level 1 has no empty cell in the {}x{} starting viewport",
                size.x,
                size.y
            )
        })?;
        Ok(cell.as_dvec2() + DVec2::splat(0.5))
    }

    /// Start over from level 1
    pub fn reset(&mut self) -> anyhow::Result<()> {
        self.terrain.reset();
        let spawn = Self::spawn_point(&self.terrain, &self.settings)?;
        self.ship.respawn(spawn);
        self.screen.reset();
        self.particle_screen.reset();
        self.score = 0;
        self.level = 0;
        self.time_left = self.settings.timing.initial_time;
        self.phase = GamePhase::Playing;
        self.game_over_reason = None;
        self.frame = 0;
        self.stuck_particles = 0;
        log::info!("Game reset");
        Ok(())
    }

    /// Advance one frame of `dt` seconds. Returns true if the game just ended.
    pub fn update(&mut self, dt: f64) -> bool {
        self.frame += 1;
        self.ship.update(dt, self.settings.physics.ship_gravity);
        self.time_left -= dt;

        self.scroll();

        self.screen.clear();
        self.particle_screen.clear();
        self.check_collisions(dt);
        self.terrain.draw(&mut self.screen);
        self.ship.draw(&mut self.screen);

        match self.check_game_over() {
            Some(reason) => {
                self.phase = GamePhase::GameOver;
                self.game_over_reason = Some(reason);
                log::info!(
                    "Game over ({reason:?}) at frame {}: score {}, level {}",
                    self.frame,
                    self.score,
                    self.level + 1
                );
                true
            }
            None => false,
        }
    }

    /// Keep the ship at mid-screen while it climbs; the view never scrolls down
    fn scroll(&mut self) {
        let ship_cell = self.ship.body.cell();
        let target = ship_cell.y - self.screen.height() / 2;
        if target <= self.screen.bottom() {
            return;
        }

        self.score = self.score.max(target);
        self.screen.sync_height(target);
        self.particle_screen.sync_height(target);

        let mut swapped = false;
        while self.terrain.sync_height(target) {
            swapped = true;
        }
        if swapped {
            // Particles in a retired chunk have nothing left to collide with
            let lo = self.terrain.bottom_height() as f64;
            let hi = self.terrain.top_height() as f64;
            for p in self.ship.emitter.particles_mut() {
                if p.body.active && (p.body.pos.y < lo || p.body.pos.y >= hi) {
                    p.body.active = false;
                }
            }
        }

        let level = self.terrain.buff_count(ship_cell.y);
        if level > self.level {
            self.level = level;
            self.time_left += self.settings.timing.incremental_time;
            log::info!("Reached level {}, {:.1}s left", level + 1, self.time_left);
        }
    }

    /// Move, bounce and draw every live particle, eroding what it hits
    fn check_collisions(&mut self, dt: f64) {
        let physics = &self.settings.physics;
        let heat = self.settings.render.particle_heat;
        let mut stuck = 0;

        for p in self.ship.emitter.particles_mut() {
            if !p.body.active {
                continue;
            }
            p.update(dt, physics.particle_gravity);
            if !p.body.active {
                continue;
            }
            match self
                .terrain
                .resolve(&mut p.body, physics.restitution, physics.max_bounces, true)
            {
                Resolution::Clear { .. } => {
                    let cell = p.body.cell();
                    let value = (heat * p.life_fraction()).clamp(0.0, 254.0) as u8 + 1;
                    self.particle_screen.add_to_cell(cell.x, cell.y, value);
                }
                Resolution::OutOfScope(_) => p.body.active = false,
                Resolution::Exhausted => stuck += 1,
            }
        }

        if stuck > 0 {
            log::warn!("{stuck} particles still colliding after {} bounces, retired", physics.max_bounces);
        }
        self.stuck_particles = stuck;
    }

    fn check_game_over(&mut self) -> Option<GameOverReason> {
        match self.terrain.collision(self.ship.body.prev_pos, self.ship.body.pos) {
            Collision::Hit { cell, normal } => {
                self.ship
                    .body
                    .process_collision(cell, normal, self.settings.physics.restitution);
                return Some(GameOverReason::Crashed);
            }
            Collision::OutOfScope { .. } => {
                self.ship.body.active = false;
                return Some(GameOverReason::LeftWorld);
            }
            Collision::None => {}
        }
        if self.ship.body.pos.y < self.screen.bottom() as f64 {
            return Some(GameOverReason::FellBehind);
        }
        if self.time_left < 0.0 {
            return Some(GameOverReason::OutOfTime);
        }
        None
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Copy out the current screens for the renderer
    pub fn snapshot(&self) -> Frame {
        Frame {
            index: self.frame,
            width: self.screen.width(),
            height: self.screen.height(),
            bottom: self.screen.bottom(),
            terrain: self.screen.cells().to_vec(),
            particles: self.particle_screen.cells().to_vec(),
            score: self.score,
            level: self.level,
            time_left: self.time_left,
            phase: self.phase,
        }
    }
}
