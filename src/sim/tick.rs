//! Per-frame simulation step
//!
//! Applies one frame of player input to an [`Environment`] and advances it.

use super::state::{Environment, GamePhase};

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Thrust
    pub up: bool,
    pub down: bool,
    /// Rotate counter-clockwise
    pub left: bool,
    /// Rotate clockwise
    pub right: bool,
    /// Start a new game
    pub reset: bool,
    /// Pause toggle
    pub pause: bool,
    /// Stop the session; acted on by the caller's loop
    pub quit: bool,
}

/// Advance the environment by one frame of `dt` seconds. Long frames are
/// clamped to `physics.max_frame_dt` so a stall cannot tunnel the ship.
pub fn tick(env: &mut Environment, input: &TickInput, dt: f64) -> anyhow::Result<()> {
    if input.reset {
        env.reset()?;
        return Ok(());
    }

    if input.pause {
        match env.phase {
            GamePhase::Playing => {
                env.phase = GamePhase::Paused;
                log::info!("Paused");
                return Ok(());
            }
            GamePhase::Paused => {
                env.phase = GamePhase::Playing;
                log::info!("Resumed");
            }
            GamePhase::GameOver => {}
        }
    }

    if env.phase != GamePhase::Playing {
        return Ok(());
    }

    let dt = dt.min(env.settings.physics.max_frame_dt);
    if dt <= 0.0 {
        return Ok(());
    }

    env.ship.handle_input(input, dt);
    env.update(dt);
    Ok(())
}
