//! Frame simulation module
//!
//! All gameplay logic lives here:
//! - Frame-counted cadence only (spawns, score)
//! - Randomness comes from an injected RNG
//! - Stable iteration order (obstacles in spawn order)
//! - No drawing or platform dependencies beyond frame layout

pub mod collision;
pub mod obstacles;
pub mod speed;
pub mod state;
pub mod tick;

pub use collision::{VerticalSpan, collides, first_collision};
pub use obstacles::{ObstacleManager, advance, prune, spawn};
pub use speed::{SpeedController, SpeedTuning};
pub use state::{GameEvent, GamePhase, GameSession, GameState, Obstacle, PlayerState};
pub use tick::{FrameContext, FrameError, tick};
