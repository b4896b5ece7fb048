//! Game state and core simulation types

use serde::{Deserialize, Serialize};

use crate::{center_lane, clamp_lane};
use crate::sprites::SpriteId;

/// Current phase of a session, derived from the session flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session started; only setup actions allowed
    Idle,
    /// Active gameplay
    Running,
    /// Run ended; frozen until restart
    GameOver,
}

/// The player's sprite position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Lane index in `[0, lanes - 1]`
    pub lane: usize,
}

impl PlayerState {
    /// Player placed in the middle lane
    pub fn centered(lanes: usize) -> Self {
        Self {
            lane: center_lane(lanes),
        }
    }

    /// Move one lane left, stopping at lane 0. Returns the new lane.
    pub fn shift_left(&mut self, lanes: usize) -> usize {
        self.shift(-1, lanes)
    }

    /// Move one lane right, stopping at the last lane. Returns the new lane.
    pub fn shift_right(&mut self, lanes: usize) -> usize {
        self.shift(1, lanes)
    }

    fn shift(&mut self, step: i64, lanes: usize) -> usize {
        self.lane = clamp_lane(self.lane as i64 + step, lanes);
        self.lane
    }
}

/// An obstacle scrolling down a lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub lane: usize,
    /// Top edge; negative while above the visible area
    pub y: f32,
    pub sprite: SpriteId,
}

/// Session lifecycle and score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub started: bool,
    pub game_over: bool,
    pub score: f32,
    pub frame_count: u64,
}

impl GameSession {
    /// A fresh running session
    pub fn running() -> Self {
        Self {
            started: true,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> GamePhase {
        match (self.started, self.game_over) {
            (false, _) => GamePhase::Idle,
            (true, false) => GamePhase::Running,
            (true, true) => GamePhase::GameOver,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase() == GamePhase::Running
    }
}

/// Things that happened during a frame, for the UI and logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ObstacleSpawned { id: u32, lane: usize, sprite: SpriteId },
    Collision { obstacle_id: u32, lane: usize },
    GameOver { score: f32 },
}

/// Everything a frame reads and writes except the speed controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub session: GameSession,
    pub player: PlayerState,
    /// Background stripe offset, wrapped to the stripe tile
    pub scroll_offset: f32,
    /// Lane count this state was built for
    pub lanes: usize,
}

impl GameState {
    /// Idle state with the player centred
    pub fn new(lanes: usize) -> Self {
        Self {
            session: GameSession::default(),
            player: PlayerState::centered(lanes),
            scroll_offset: 0.0,
            lanes,
        }
    }

    /// Reset to a fresh running session
    pub fn begin_session(&mut self) {
        self.session = GameSession::running();
        self.player = PlayerState::centered(self.lanes);
    }

    /// Return to idle, discarding the current session
    pub fn reset_idle(&mut self) {
        self.session = GameSession::default();
        self.player = PlayerState::centered(self.lanes);
    }
}
