//! Simulation module
//!
//! All gameplay logic lives here, with no rendering or platform dependencies:
//! - Seeded RNG only; level `n` always regenerates identically
//! - Terrain occupancy is bit-packed into fixed-size blocks for ray queries
//! - Output is a pair of byte screens the caller colorizes

pub mod body;
pub mod collision;
pub mod edge;
pub mod emitter;
pub mod grid;
pub mod layer;
pub mod levelgen;
pub mod particle;
pub mod raycast;
pub mod ring;
pub mod ship;
pub mod spawn;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod tile_buffer;

pub use body::Kinematic;
pub use collision::{Collision, ScopeEdge};
pub use edge::{RectEdge, rect_edge};
pub use emitter::{EmitState, Emitter};
pub use grid::{BlockWord, PackedGrid};
pub use layer::{Scroll, TileLayer};
pub use levelgen::LevelStyle;
pub use particle::Particle;
pub use ring::RingBuffer;
pub use ship::Ship;
pub use spawn::find_empty_spot;
pub use state::{Environment, Frame, GameOverReason, GamePhase};
pub use terrain::{Resolution, Terrain};
pub use tick::{TickInput, tick};
pub use tile_buffer::{TerrainWord, TileBuffer, material};
