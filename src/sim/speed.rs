//! Proximity-driven scroll speed with exponential easing
//!
//! The target changes in discrete steps from the game loop (`update`,
//! `restore`). The current value only moves on `ease`, which runs on its own
//! cadence and may run while no session is active.

use serde::{Deserialize, Serialize};

use super::state::Obstacle;
use crate::settings::Settings;

/// Speed controller tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedTuning {
    pub normal: f32,
    pub slowdown: f32,
    /// An obstacle with `y` below this triggers the slowdown target
    pub threshold: f32,
    /// Fraction of the remaining gap closed per tick, in (0, 1]
    pub ease: f32,
}

impl From<&Settings> for SpeedTuning {
    fn from(settings: &Settings) -> Self {
        Self {
            normal: settings.normal_speed,
            slowdown: settings.slowdown_speed,
            threshold: settings.proximity_threshold,
            ease: settings.ease_factor,
        }
    }
}

/// Eased scalar speed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedController {
    tuning: SpeedTuning,
    current: f32,
    target: f32,
}

impl SpeedController {
    /// Starts at rest on the normal speed
    pub fn new(tuning: SpeedTuning) -> Self {
        Self {
            tuning,
            current: tuning.normal,
            target: tuning.normal,
        }
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn tuning(&self) -> &SpeedTuning {
        &self.tuning
    }

    /// Pick the target from the first visible obstacle in the player's lane
    pub fn update(&mut self, player_lane: usize, obstacles: &[Obstacle]) {
        let next = obstacles.iter().find(|o| o.lane == player_lane && o.y > 0.0);
        self.target = match next {
            Some(o) if o.y < self.tuning.threshold => self.tuning.slowdown,
            _ => self.tuning.normal,
        };
    }

    /// Reset the target to the normal speed
    pub fn restore(&mut self) {
        self.target = self.tuning.normal;
    }

    /// One easing tick toward the target
    pub fn ease(&mut self) {
        self.current += (self.target - self.current) * self.tuning.ease;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprites::SpriteId;
    use proptest::prelude::*;

    fn tuning() -> SpeedTuning {
        SpeedTuning {
            normal: 5.0,
            slowdown: 3.0,
            threshold: 150.0,
            ease: 0.1,
        }
    }

    fn obstacle(lane: usize, y: f32) -> Obstacle {
        Obstacle {
            id: 0,
            lane,
            y,
            sprite: SpriteId::from("car.png"),
        }
    }

    #[test]
    fn test_slowdown_when_obstacle_near_top() {
        let mut speed = SpeedController::new(tuning());
        speed.update(1, &[obstacle(1, 100.0)]);
        assert_eq!(speed.target(), 3.0);
    }

    #[test]
    fn test_normal_when_obstacle_past_threshold() {
        let mut speed = SpeedController::new(tuning());
        speed.update(1, &[obstacle(1, 150.0)]);
        assert_eq!(speed.target(), 5.0);
    }

    #[test]
    fn test_ignores_hidden_and_other_lanes() {
        let mut speed = SpeedController::new(tuning());
        speed.update(1, &[obstacle(1, -40.0), obstacle(1, 0.0), obstacle(0, 50.0)]);
        assert_eq!(speed.target(), 5.0);
    }

    #[test]
    fn test_first_visible_in_lane_decides() {
        // Spawn order puts the lower obstacle first
        let mut speed = SpeedController::new(tuning());
        speed.update(2, &[obstacle(2, 400.0), obstacle(2, 60.0)]);
        assert_eq!(speed.target(), 5.0);
    }

    #[test]
    fn test_update_does_not_move_current() {
        let mut speed = SpeedController::new(tuning());
        speed.update(0, &[obstacle(0, 10.0)]);
        assert_eq!(speed.current(), 5.0);
        speed.ease();
        assert!((speed.current() - 4.8).abs() < 1e-5);
    }

    #[test]
    fn test_restore_resets_target() {
        let mut speed = SpeedController::new(tuning());
        speed.update(0, &[obstacle(0, 10.0)]);
        speed.restore();
        assert_eq!(speed.target(), 5.0);
    }

    #[test]
    fn test_full_ease_jumps_to_target() {
        let mut speed = SpeedController::new(SpeedTuning {
            ease: 1.0,
            ..tuning()
        });
        speed.update(0, &[obstacle(0, 10.0)]);
        speed.ease();
        assert_eq!(speed.current(), 3.0);
    }

    proptest! {
        #[test]
        fn test_restore_is_idempotent(y in -200.0f32..800.0, lane in 0usize..3) {
            let mut once = SpeedController::new(tuning());
            once.update(lane, &[obstacle(lane, y)]);
            let mut twice = once.clone();

            once.restore();
            twice.restore();
            twice.restore();
            prop_assert_eq!(once.target(), twice.target());
        }

        #[test]
        fn test_easing_converges_without_overshoot(
            ease in 0.01f32..=1.0,
            slow_first in any::<bool>(),
            ticks in 1usize..200,
        ) {
            let mut speed = SpeedController::new(SpeedTuning { ease, ..tuning() });
            if slow_first {
                speed.update(0, &[obstacle(0, 10.0)]);
            }
            let target = speed.target();
            let (lo, hi) = (3.0f32, 5.0f32);

            let mut gap = (target - speed.current()).abs();
            for _ in 0..ticks {
                speed.ease();
                let next_gap = (target - speed.current()).abs();
                prop_assert!(next_gap <= gap);
                if gap > 1e-3 {
                    prop_assert!(next_gap < gap);
                }
                prop_assert!(speed.current() >= lo - 1e-4 && speed.current() <= hi + 1e-4);
                gap = next_gap;
            }
        }
    }
}
