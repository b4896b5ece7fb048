//! Classification events to debounced lane changes

use super::ClassificationEvent;
use crate::sim::{GameSession, PlayerState, SpeedController};

/// Lane change requested by a spoken command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneCommand {
    Left,
    Right,
}

impl LaneCommand {
    /// Case-insensitive substring match; "left" wins if both appear
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        if label.contains("left") {
            Some(LaneCommand::Left)
        } else if label.contains("right") {
            Some(LaneCommand::Right)
        } else {
            None
        }
    }
}

/// Why an event did not move the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Listening is stopped
    NotListening,
    /// No running session
    SessionInactive,
    /// Event carried no label
    Malformed,
    /// Top score under the probability threshold
    LowConfidence,
    /// Too soon after the last accepted command
    Cooldown,
    /// Label is not a lane command
    Unmatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Command applied; `lane` is the player's lane afterwards
    Accepted { command: LaneCommand, lane: usize },
    Dropped(DropReason),
}

/// Routes classification events to the player lane and speed controller
#[derive(Debug, Clone)]
pub struct VoiceRouter {
    lanes: usize,
    cooldown_ms: f64,
    probability_threshold: f32,
    last_accepted_ms: Option<f64>,
    listening: bool,
}

impl VoiceRouter {
    /// A router that is not yet listening
    pub fn new(lanes: usize, cooldown_ms: f64) -> Self {
        Self {
            lanes,
            cooldown_ms,
            probability_threshold: 0.0,
            last_accepted_ms: None,
            listening: false,
        }
    }

    /// Drop events whose scores top out under `threshold`
    pub fn with_probability_threshold(mut self, threshold: f32) -> Self {
        self.probability_threshold = threshold;
        self
    }

    pub fn start_listening(&mut self) {
        self.listening = true;
    }

    /// Stop routing immediately; later events are dropped
    pub fn stop_listening(&mut self) {
        self.listening = false;
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Apply one event.
    ///
    /// Only accepted commands reset the cooldown and restore the speed
    /// target. Dropped events leave every piece of state untouched.
    pub fn route(
        &mut self,
        event: &ClassificationEvent,
        now_ms: f64,
        session: &GameSession,
        player: &mut PlayerState,
        speed: &mut SpeedController,
    ) -> RouteOutcome {
        let outcome = self.classify(event, now_ms, session);
        let command = match outcome {
            Ok(command) => command,
            Err(reason) => {
                log::trace!("Voice event {:?} dropped: {:?}", event.label, reason);
                return RouteOutcome::Dropped(reason);
            }
        };

        let lane = match command {
            LaneCommand::Left => player.shift_left(self.lanes),
            LaneCommand::Right => player.shift_right(self.lanes),
        };
        self.last_accepted_ms = Some(now_ms);
        speed.restore();

        log::debug!("Voice command {:?} -> lane {}", command, lane);
        RouteOutcome::Accepted { command, lane }
    }

    fn classify(
        &self,
        event: &ClassificationEvent,
        now_ms: f64,
        session: &GameSession,
    ) -> Result<LaneCommand, DropReason> {
        if !self.listening {
            return Err(DropReason::NotListening);
        }
        if !session.is_running() {
            return Err(DropReason::SessionInactive);
        }
        let label = match event.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => return Err(DropReason::Malformed),
        };
        if !event.is_confident(self.probability_threshold) {
            return Err(DropReason::LowConfidence);
        }
        if let Some(last) = self.last_accepted_ms {
            if now_ms - last < self.cooldown_ms {
                return Err(DropReason::Cooldown);
            }
        }
        LaneCommand::parse(label).ok_or(DropReason::Unmatched)
    }
}
