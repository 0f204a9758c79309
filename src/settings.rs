//! Game settings and tunables
//!
//! World geometry, physics constants, exhaust spray and the time budget.
//! Loaded from JSON; missing fields fall back to defaults.

use std::f64::consts::PI;
use std::path::Path;

use anyhow::{Context, ensure};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::TERRAIN_BLOCK;
use crate::sim::LevelStyle;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Exhaust particles per second of thrust
    pub fn emission_rate(&self) -> f64 {
        match self {
            QualityPreset::Low => 5_000.0,
            QualityPreset::Medium => 20_000.0,
            QualityPreset::High => 100_000.0,
        }
    }
}

/// World geometry and generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Viewport size in cells
    pub viewport_width: i32,
    pub viewport_height: i32,
    /// Chunk size in cells; both must be multiples of the terrain block
    pub level_width: i32,
    pub level_height: i32,
    /// Rows left open at the bottom of level 1
    pub first_level_empty_height: i32,
    /// Mixed into every chunk's RNG seed
    pub seed: u64,
    pub style: LevelStyle,
    /// Tag exposed terrain surfaces after generation
    pub mark_edges: bool,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            viewport_width: 320,
            viewport_height: 180,
            level_width: 320,
            level_height: 360,
            first_level_empty_height: 120,
            seed: 0,
            style: LevelStyle::Rect,
            mark_edges: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Cells/s² applied to the ship
    pub ship_gravity: DVec2,
    /// Cells/s² applied to exhaust particles
    pub particle_gravity: DVec2,
    /// Fraction of the hit-axis speed kept on a bounce, in (0, 1)
    pub restitution: f64,
    /// Material removed per unit of impact speed
    pub speed_damage: f64,
    /// Bounces resolved per object per frame before it is retired
    pub max_bounces: u32,
    /// Longest frame the simulation will integrate in one step (seconds)
    pub max_frame_dt: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        let ship_gravity = DVec2::new(0.0, -40.0);
        Self {
            ship_gravity,
            particle_gravity: ship_gravity * 10.0,
            restitution: 0.4,
            speed_damage: 0.05,
            max_bounces: 16,
            max_frame_dt: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipSettings {
    /// Radians per second at full stick
    pub rotation_speed: f64,
    /// Cells/s² while thrusting
    pub acceleration: f64,
    /// Distance from the tip to the nozzle
    pub tail_length: f64,
    /// Opening angle of the drawn tail
    pub tail_spread: f64,
}

impl Default for ShipSettings {
    fn default() -> Self {
        Self {
            rotation_speed: 15.0,
            acceleration: 200.0,
            tail_length: 6.0,
            tail_spread: PI / 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    /// Particles per second
    pub rate: f64,
    /// Seconds each particle lives
    pub life: f64,
    /// Standard deviation of the spray angle (radians)
    pub angular_stdev: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            rate: QualityPreset::default().emission_rate(),
            life: 2.0,
            angular_stdev: PI / 16.0,
            min_speed: 100.0,
            max_speed: 500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Seconds on the clock at the start
    pub initial_time: f64,
    /// Seconds added on reaching each new level
    pub incremental_time: f64,
    /// Target simulation frames per second
    pub fps: u32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            initial_time: 15.0,
            incremental_time: 15.0,
            fps: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Heat a fresh particle adds to its cell
    pub particle_heat: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self { particle_heat: 40.0 }
    }
}

/// All tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Simulation ===
    pub world: WorldSettings,
    pub physics: PhysicsSettings,
    pub ship: ShipSettings,
    pub emitter: EmitterSettings,
    pub timing: TimingSettings,

    // === Output ===
    pub render: RenderSettings,
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        self.emitter.rate = preset.emission_rate();
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parsing settings JSON")
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serializing settings")
    }

    /// Read and validate a JSON settings file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings = Self::from_json(&json).with_context(|| format!("in {}", path.display()))?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).with_context(|| format!("writing settings to {}", path.display()))?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints the simulation relies on
    pub fn validate(&self) -> anyhow::Result<()> {
        let w = &self.world;
        ensure!(
            w.viewport_width > 0 && w.viewport_height > 0,
            "viewport must be non-empty, got {}x{}",
            w.viewport_width,
            w.viewport_height
        );
        ensure!(
            w.level_width > 0
                && w.level_height > 0
                && w.level_width % TERRAIN_BLOCK == 0
                && w.level_height % TERRAIN_BLOCK == 0,
            "level size {}x{} must be a positive multiple of {TERRAIN_BLOCK}",
            w.level_width,
            w.level_height
        );
        ensure!(
            w.viewport_height <= w.level_height,
            "viewport height {} exceeds level height {}",
            w.viewport_height,
            w.level_height
        );
        ensure!(
            (0..=w.level_height).contains(&w.first_level_empty_height),
            "first_level_empty_height {} outside 0..={}",
            w.first_level_empty_height,
            w.level_height
        );

        let p = &self.physics;
        ensure!(
            p.restitution > 0.0 && p.restitution < 1.0,
            "restitution must be in (0, 1), got {}",
            p.restitution
        );
        ensure!(p.speed_damage >= 0.0, "speed_damage must be non-negative");
        ensure!(p.max_bounces >= 1, "max_bounces must be at least 1");
        ensure!(
            p.max_frame_dt > 0.0 && p.max_frame_dt.is_finite(),
            "max_frame_dt must be positive"
        );

        let e = &self.emitter;
        ensure!(e.rate > 0.0 && e.rate.is_finite(), "emitter rate must be positive");
        ensure!(e.life > 0.0 && e.life.is_finite(), "particle life must be positive");
        ensure!(
            e.angular_stdev >= 0.0 && e.angular_stdev.is_finite(),
            "angular_stdev must be a non-negative number"
        );
        ensure!(
            0.0 <= e.min_speed && e.min_speed <= e.max_speed,
            "speed range {}..={} is invalid",
            e.min_speed,
            e.max_speed
        );

        ensure!(self.timing.fps > 0, "fps must be positive");
        ensure!(self.timing.initial_time > 0.0, "initial_time must be positive");
        Ok(())
    }
}
