//! One simulation frame
//!
//! Steps run in a fixed order: speed target, stripe scroll, obstacle
//! advance/prune, collision, score, spawn. Every fallible step runs before
//! anything is written back, so a failed frame leaves the session exactly as
//! it was.

use rand::Rng;
use thiserror::Error;

use super::collision::first_collision;
use super::obstacles::ObstacleManager;
use super::speed::SpeedController;
use super::state::{GameEvent, GameState};
use crate::renderer::{Layout, SurfaceError};
use crate::settings::Settings;
use crate::sprites::SpriteCatalog;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("scroll speed is not finite: {0}")]
    NonFiniteSpeed(f32),
    #[error("obstacle {id} has a non-finite position")]
    NonFiniteObstacle { id: u32 },
    #[error("lane {lane} outside 0..{lanes}")]
    LaneOutOfRange { lane: usize, lanes: usize },
    #[error("render failed: {0}")]
    Surface(#[from] SurfaceError),
}

/// Read-only inputs of a frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub layout: &'a Layout,
    pub catalog: &'a SpriteCatalog,
    pub settings: &'a Settings,
}

/// Advance a running session by one frame.
///
/// Does nothing unless the session is running. On collision the session is
/// marked game over and the frame ends without scoring or spawning.
pub fn tick<R: Rng>(
    state: &mut GameState,
    speed: &mut SpeedController,
    obstacles: &mut ObstacleManager<R>,
    ctx: &FrameContext<'_>,
) -> Result<Vec<GameEvent>, FrameError> {
    let mut events = Vec::new();
    if !state.session.is_running() {
        return Ok(events);
    }

    let lanes = ctx.settings.lanes;
    if state.player.lane >= lanes {
        return Err(FrameError::LaneOutOfRange {
            lane: state.player.lane,
            lanes,
        });
    }

    // 1. Speed target from the obstacles as they were at the start of the frame
    speed.update(state.player.lane, obstacles.live());
    let current = speed.current();
    if !current.is_finite() {
        return Err(FrameError::NonFiniteSpeed(current));
    }

    // 2. Background stripes
    let scroll_offset = (state.scroll_offset + current).rem_euclid(ctx.settings.stripe_tile);

    // 3. Advance and prune
    let next = obstacles.stepped(current, ctx.layout.height(), ctx.settings.prune_margin);
    for o in &next {
        if !o.y.is_finite() {
            return Err(FrameError::NonFiniteObstacle { id: o.id });
        }
        if o.lane >= lanes {
            return Err(FrameError::LaneOutOfRange { lane: o.lane, lanes });
        }
    }

    // 4. Collision against the post-advance set
    let player_span = ctx.layout.player_span(ctx.catalog);
    let hit = first_collision(state.player.lane, player_span, &next, |o| {
        ctx.layout.sprite_height(ctx.catalog, &o.sprite)
    })
    .map(|o| (o.id, o.lane));

    state.scroll_offset = scroll_offset;
    obstacles.commit(next);

    if let Some((obstacle_id, lane)) = hit {
        state.session.game_over = true;
        log::info!(
            "Collision with obstacle {} in lane {}, final score {}",
            obstacle_id,
            lane,
            state.session.score.floor()
        );
        events.push(GameEvent::Collision { obstacle_id, lane });
        events.push(GameEvent::GameOver {
            score: state.session.score,
        });
        return Ok(events);
    }

    // 5. Score counts frames survived, not distance
    state.session.score += ctx.settings.score_per_frame;

    // 6. Spawn cadence is counted in frames
    state.session.frame_count += 1;
    if state.session.frame_count % ctx.settings.spawn_interval == 0 {
        let o = obstacles.spawn(lanes, ctx.catalog, ctx.settings.spawn_y);
        events.push(GameEvent::ObstacleSpawned {
            id: o.id,
            lane: o.lane,
            sprite: o.sprite,
        });
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::speed::SpeedTuning;
    use crate::sprites::SpriteId;
    use glam::Vec2;

    struct Fixture {
        state: GameState,
        speed: SpeedController,
        obstacles: ObstacleManager,
        settings: Settings,
        catalog: SpriteCatalog,
        layout: Layout,
    }

    impl Fixture {
        fn new() -> Self {
            let settings = Settings::default();
            let mut state = GameState::new(settings.lanes);
            state.begin_session();
            Self {
                state,
                speed: SpeedController::new(SpeedTuning::from(&settings)),
                obstacles: ObstacleManager::seeded(12345),
                layout: Layout::new(Vec2::new(600.0, 1000.0), &settings),
                catalog: SpriteCatalog::default(),
                settings,
            }
        }

        fn tick(&mut self) -> Result<Vec<GameEvent>, FrameError> {
            let ctx = FrameContext {
                layout: &self.layout,
                catalog: &self.catalog,
                settings: &self.settings,
            };
            tick(&mut self.state, &mut self.speed, &mut self.obstacles, &ctx)
        }
    }

    #[test]
    fn test_idle_does_nothing() {
        let mut f = Fixture::new();
        f.state.reset_idle();
        assert!(f.tick().expect("tick").is_empty());
        assert_eq!(f.state.session.frame_count, 0);
        assert_eq!(f.state.session.score, 0.0);
    }

    #[test]
    fn test_score_and_frame_count() {
        let mut f = Fixture::new();
        for _ in 0..10 {
            f.tick().expect("tick");
        }
        assert_eq!(f.state.session.frame_count, 10);
        assert!((f.state.session.score - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_on_interval() {
        let mut f = Fixture::new();
        let mut spawned = Vec::new();
        for frame in 1..=240u64 {
            for e in f.tick().expect("tick") {
                if let GameEvent::ObstacleSpawned { .. } = e {
                    spawned.push(frame);
                }
            }
            if f.state.session.game_over {
                break;
            }
        }
        assert_eq!(spawned.first(), Some(&120));
    }

    #[test]
    fn test_scroll_wraps() {
        let mut f = Fixture::new();
        for _ in 0..9 {
            f.tick().expect("tick");
        }
        // 9 frames at speed 5 = 45 -> wraps to 5
        assert!((f.state.scroll_offset - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_collision_ends_session_without_scoring() {
        let mut f = Fixture::new();
        let lane = f.state.player.lane;
        // Player band is [910, 990]; one frame at speed 5 brings the obstacle to 830
        f.obstacles.push(lane, 825.0, SpriteId::from("car.png"));
        f.state.session.score = 3.0;

        let events = f.tick().expect("tick");
        assert!(f.state.session.game_over);
        assert_eq!(f.state.session.score, 3.0);
        assert_eq!(f.state.session.frame_count, 0);
        assert!(matches!(events[0], GameEvent::Collision { lane: l, .. } if l == lane));
        assert_eq!(events[1], GameEvent::GameOver { score: 3.0 });

        // Frozen afterwards
        assert!(f.tick().expect("tick").is_empty());
        assert_eq!(f.state.session.score, 3.0);
    }

    #[test]
    fn test_other_lane_passes_by() {
        let mut f = Fixture::new();
        f.obstacles.push(0, 900.0, SpriteId::from("car.png"));
        f.tick().expect("tick");
        assert!(!f.state.session.game_over);
        assert_eq!(f.obstacles.len(), 1);
    }

    #[test]
    fn test_passed_obstacles_are_pruned() {
        let mut f = Fixture::new();
        f.obstacles.push(0, 1199.0, SpriteId::from("car.png"));
        f.tick().expect("tick");
        assert!(f.obstacles.is_empty());
    }

    #[test]
    fn test_bad_speed_aborts_without_commit() {
        let mut f = Fixture::new();
        f.speed = SpeedController::new(SpeedTuning {
            normal: f32::NAN,
            ..SpeedTuning::from(&f.settings)
        });
        f.obstacles.push(0, 100.0, SpriteId::from("car.png"));

        let err = f.tick().unwrap_err();
        assert!(matches!(err, FrameError::NonFiniteSpeed(_)));
        assert_eq!(f.obstacles.live()[0].y, 100.0);
        assert_eq!(f.state.session.frame_count, 0);
        assert_eq!(f.state.scroll_offset, 0.0);
    }

    #[test]
    fn test_lane_out_of_range_rejected() {
        let mut f = Fixture::new();
        f.state.player.lane = 7;
        let err = f.tick().unwrap_err();
        assert_eq!(err, FrameError::LaneOutOfRange { lane: 7, lanes: 3 });
    }
}
