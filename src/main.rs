//! Spout headless runner
//!
//! Runs the simulation on its own thread with an autopilot at the stick and
//! hands every frame to the main thread, which colorizes it the way a
//! renderer would and logs progress.
//!
//! Usage: `spout [settings.json] [frames]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::f64::consts::FRAC_PI_2;
    use std::path::Path;
    use std::sync::Arc;
    use std::thread;

    use anyhow::Context;

    use spout::sim::{Environment, Frame, GamePhase, TickInput, tick};
    use spout::{ColorMap, FrameHandoff, Rgba, Settings};

    const DEFAULT_FRAMES: u64 = 3600;

    /// Thrust constantly and steer back towards straight up, with a slow
    /// weave so the exhaust sweeps the walls
    fn autopilot(env: &Environment) -> TickInput {
        let weave = (env.frame as f64 / 90.0).sin() * 0.5;
        let error = env.ship.direction() - (FRAC_PI_2 + weave);
        TickInput {
            up: true,
            left: error < -0.05,
            right: error > 0.05,
            reset: env.phase == GamePhase::GameOver,
            ..Default::default()
        }
    }

    fn simulate(mut env: Environment, frames: u64, handoff: &FrameHandoff<Frame>) -> anyhow::Result<()> {
        let dt = 1.0 / env.settings.timing.fps as f64;
        let mut games = 1;
        for _ in 0..frames {
            let input = autopilot(&env);
            if input.quit {
                break;
            }
            if input.reset {
                log::info!("Game {games} over: score {}, level {}", env.score, env.level + 1);
                games += 1;
            }
            tick(&mut env, &input, dt)?;
            if !handoff.publish(env.snapshot()) {
                break;
            }
        }
        log::info!("Simulation finished after {games} game(s)");
        Ok(())
    }

    pub fn run() -> anyhow::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let mut args = std::env::args().skip(1);
        let settings = match args.next() {
            Some(path) => Settings::load(Path::new(&path))?,
            None => Settings::default(),
        };
        let frames = match args.next() {
            Some(n) => n.parse().with_context(|| format!("invalid frame count {n:?}"))?,
            None => DEFAULT_FRAMES,
        };

        let env = Environment::new(settings)?;
        log::info!(
            "Spout starting: {}x{} viewport, {:?} quality, {} frames",
            env.screen.width(),
            env.screen.height(),
            env.settings.quality,
            frames
        );

        let handoff = Arc::new(FrameHandoff::new());
        let sim = {
            let handoff = Arc::clone(&handoff);
            thread::Builder::new()
                .name("simulation".into())
                .spawn(move || {
                    let result = simulate(env, frames, &handoff);
                    handoff.close();
                    result
                })
                .context("failed to spawn simulation thread")?
        };

        let terrain_colors = ColorMap::terrain();
        let exhaust_colors = ColorMap::exhaust();
        let mut rendered = 0u64;
        let mut best_score = 0;
        while let Some(frame) = handoff.take() {
            let terrain = terrain_colors.colorize(&frame.terrain);
            let exhaust = exhaust_colors.colorize(&frame.particles);
            let lit = terrain.iter().filter(|px| **px != Rgba::TRANSPARENT).count();
            let hot = exhaust.iter().filter(|px| **px != Rgba::TRANSPARENT).count();
            best_score = best_score.max(frame.score);
            rendered += 1;

            log::trace!("frame {}: {lit} terrain px, {hot} exhaust px", frame.index);
            if rendered % 300 == 0 {
                log::info!(
                    "frame {rendered}: height {}, level {}, {:.1}s left, {hot} hot px",
                    frame.bottom,
                    frame.level + 1,
                    frame.time_left
                );
            }
        }

        match sim.join() {
            Ok(result) => result?,
            Err(_) => anyhow::bail!("simulation thread panicked"),
        }
        log::info!("Rendered {rendered} frames, best score {best_score}");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
