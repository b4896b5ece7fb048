//! Lane Runner - A voice-controlled lane-dodging arcade game
//!
//! Core modules:
//! - `sim`: Frame simulation (obstacles, speed easing, collisions, session state)
//! - `voice`: Classification intake and lane-change routing
//! - `renderer`: Abstract drawing surface and frame layout
//! - `engine`: Mounted game component with its scheduled tasks
//! - `platform`: Browser canvas/DOM glue and headless native pieces
//! - `settings`: Data-driven game tuning

pub mod engine;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod sprites;
pub mod voice;

pub use engine::{Engine, SessionError};
pub use settings::{Settings, SettingsError};
pub use sprites::{SpriteCatalog, SpriteId, SpriteSize};

/// Game configuration constants
pub mod consts {
    /// Number of discrete lanes
    pub const LANES: usize = 3;

    /// Minimum gap between two accepted voice commands (ms)
    pub const VOICE_COOLDOWN_MS: f64 = 400.0;
    /// Minimum top score for the recognizer to emit a classification
    pub const PROBABILITY_THRESHOLD: f32 = 0.7;

    /// Frames between obstacle spawns (~2 seconds at 60fps)
    pub const SPAWN_INTERVAL: u64 = 120;
    /// Score added per simulated frame
    pub const SCORE_PER_FRAME: f32 = 0.1;

    /// Cruising scroll speed (pixels/frame)
    pub const NORMAL_SPEED: f32 = 5.0;
    /// Scroll speed while an obstacle is close in the player's lane
    pub const SLOWDOWN_SPEED: f32 = 3.0;
    /// Obstacle y below which the speed controller slows down
    pub const PROXIMITY_THRESHOLD: f32 = 150.0;
    /// Fraction of the remaining gap closed per easing tick
    pub const SPEED_EASE: f32 = 0.1;

    /// Initial obstacle y (above the visible area)
    pub const SPAWN_Y: f32 = -120.0;
    /// Distance past the bottom edge before an obstacle is dropped
    pub const PRUNE_MARGIN: f32 = 200.0;

    /// Lane stripe period for the scrolling background
    pub const STRIPE_TILE: f32 = 40.0;
    /// Visible dash length inside one stripe period
    pub const STRIPE_DASH: f32 = 20.0;

    /// Sprites are authored against this canvas size
    pub const SPRITE_REFERENCE_SIZE: f32 = 1200.0;
    /// Gap between the player sprite and the bottom edge
    pub const PLAYER_BOTTOM_MARGIN: f32 = 10.0;
    /// Height used when a sprite's size is not known yet
    pub const FALLBACK_SPRITE_HEIGHT: f32 = 80.0;
}

/// Clamp a signed lane index into `[0, lanes - 1]`
#[inline]
pub fn clamp_lane(lane: i64, lanes: usize) -> usize {
    let max = lanes.saturating_sub(1) as i64;
    lane.clamp(0, max) as usize
}

/// Lane the player starts in
#[inline]
pub fn center_lane(lanes: usize) -> usize {
    lanes / 2
}
