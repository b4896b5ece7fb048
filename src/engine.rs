//! The mounted game component
//!
//! Owns the session state and drives two independently scheduled tasks from
//! the display refresh:
//! - the speed easing task, alive from mount to unmount
//! - the game loop task, alive while a session is running
//!
//! Both are plain flags checked on every refresh, so cancelling either one
//! takes effect before the next refresh with no drain period.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::renderer::draw::RenderStats;
use crate::renderer::{DrawSurface, Layout, render_frame};
use crate::settings::{Settings, SettingsError};
use crate::sim::{
    FrameContext, FrameError, GameEvent, GamePhase, GameState, ObstacleManager, SpeedController,
    SpeedTuning, tick,
};
use crate::sprites::SpriteCatalog;
use crate::voice::{
    ClassificationEvent, ModelError, ModelSource, ModelStatus, RouteOutcome, VoiceInbox,
    VoiceRouter, VoiceSender, validate_bundle,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no voice model is loaded")]
    ModelNotLoaded,
    #[error("cannot start from {0:?}; only an idle game can start")]
    NotIdle(GamePhase),
    #[error("no session has been started")]
    NotStarted,
    #[error("the game has been unmounted")]
    Unmounted,
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A repeating per-refresh callback that can be cancelled
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    name: &'static str,
    scheduled: bool,
    runs: u64,
}

impl ScheduledTask {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            scheduled: false,
            runs: 0,
        }
    }

    fn schedule(&mut self) {
        if !self.scheduled {
            log::debug!("Scheduling {} task", self.name);
        }
        self.scheduled = true;
    }

    fn cancel(&mut self) {
        if self.scheduled {
            log::debug!("Cancelling {} task", self.name);
        }
        self.scheduled = false;
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Number of times the task has run
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

/// What one display refresh did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Whether the game loop task ran this refresh
    pub simulated: bool,
    pub events: Vec<GameEvent>,
    pub render: RenderStats,
}

type GameOverHandler = Box<dyn FnMut(f32)>;

pub struct Engine<R = Pcg32> {
    settings: Settings,
    catalog: SpriteCatalog,
    state: GameState,
    speed: SpeedController,
    obstacles: ObstacleManager<R>,
    router: VoiceRouter,
    inbox: Option<VoiceInbox>,
    model: ModelStatus,
    easing_task: ScheduledTask,
    game_task: ScheduledTask,
    mounted: bool,
    on_game_over: Option<GameOverHandler>,
}

impl Engine<Pcg32> {
    /// Mount a game with an unseeded obstacle RNG
    pub fn new(settings: Settings, catalog: SpriteCatalog) -> Result<Self, SettingsError> {
        let seed: u64 = rand::random();
        log::info!("Obstacle RNG seed: {}", seed);
        Self::with_rng(settings, catalog, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> Engine<R> {
    /// Mount a game with an injected obstacle RNG
    pub fn with_rng(
        settings: Settings,
        catalog: SpriteCatalog,
        rng: R,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;

        let mut easing_task = ScheduledTask::new("speed easing");
        easing_task.schedule();

        Ok(Self {
            state: GameState::new(settings.lanes),
            speed: SpeedController::new(SpeedTuning::from(&settings)),
            obstacles: ObstacleManager::with_rng(rng),
            router: VoiceRouter::new(settings.lanes, settings.voice_cooldown_ms)
                .with_probability_threshold(settings.probability_threshold),
            inbox: None,
            model: ModelStatus::NotLoaded,
            easing_task,
            game_task: ScheduledTask::new("game loop"),
            mounted: true,
            on_game_over: None,
            settings,
            catalog,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &SpriteCatalog {
        &self.catalog
    }

    /// Sprite sizes are filled in here as images finish loading
    pub fn catalog_mut(&mut self) -> &mut SpriteCatalog {
        &mut self.catalog
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.session.phase()
    }

    pub fn speed(&self) -> &SpeedController {
        &self.speed
    }

    pub fn obstacles(&self) -> &ObstacleManager<R> {
        &self.obstacles
    }

    /// Direct obstacle access for scripted scenarios
    pub fn obstacles_mut(&mut self) -> &mut ObstacleManager<R> {
        &mut self.obstacles
    }

    pub fn model_status(&self) -> &ModelStatus {
        &self.model
    }

    pub fn is_listening(&self) -> bool {
        self.router.is_listening()
    }

    pub fn easing_task(&self) -> &ScheduledTask {
        &self.easing_task
    }

    pub fn game_task(&self) -> &ScheduledTask {
        &self.game_task
    }

    /// Register the game-over notification (receives the final score)
    pub fn on_game_over(&mut self, handler: impl FnMut(f32) + 'static) {
        self.on_game_over = Some(Box::new(handler));
    }

    /// Open the bounded voice channel; replaces any earlier inbox
    pub fn connect_voice(&mut self) -> VoiceSender {
        let (tx, rx) = crate::voice::channel();
        self.inbox = Some(rx);
        tx
    }

    // === Model lifecycle ===

    pub fn model_loading(&mut self, source: ModelSource) {
        log::info!("Loading {}", source);
        self.model = ModelStatus::Loading(source);
    }

    /// Check an uploaded bundle and mark it loading.
    ///
    /// An incomplete bundle marks the model as failed.
    pub fn load_bundle<'a, I>(&mut self, name: &str, entries: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if !self.mounted {
            return Err(SessionError::Unmounted);
        }
        if let Err(e) = validate_bundle(entries) {
            self.model_failed(&e.to_string());
            return Err(e.into());
        }
        self.model_loading(ModelSource::Uploaded {
            name: name.to_string(),
        });
        Ok(())
    }

    /// The recognizer is ready; listening starts right away
    pub fn model_ready(&mut self, source: ModelSource) {
        if !self.mounted {
            return;
        }
        log::info!("Ready: {}", source);
        self.model = ModelStatus::Ready(source);
        self.router.start_listening();
    }

    pub fn model_failed(&mut self, reason: &str) {
        log::warn!("Voice model failed to load: {}", reason);
        self.model = ModelStatus::NotLoaded;
    }

    // === Session control ===

    /// Idle -> Running
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !self.mounted {
            return Err(SessionError::Unmounted);
        }
        if !self.model.is_ready() {
            return Err(SessionError::ModelNotLoaded);
        }
        let phase = self.phase();
        if phase != GamePhase::Idle {
            return Err(SessionError::NotIdle(phase));
        }
        self.begin_session();
        log::info!("Game started");
        Ok(())
    }

    /// Running or GameOver -> fresh Running session
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if !self.mounted {
            return Err(SessionError::Unmounted);
        }
        if self.phase() == GamePhase::Idle {
            return Err(SessionError::NotStarted);
        }
        if !self.model.is_ready() {
            return Err(SessionError::ModelNotLoaded);
        }
        self.begin_session();
        log::info!("Game restarted");
        Ok(())
    }

    /// Back to Idle so another model can be loaded
    pub fn switch_model(&mut self) {
        self.game_task.cancel();
        self.router.stop_listening();
        self.state.reset_idle();
        self.obstacles.clear();
        self.model = ModelStatus::NotLoaded;
        log::info!("Switching voice model, game idle");
    }

    /// Tear down: cancel both tasks and stop routing voice events
    pub fn unmount(&mut self) {
        self.game_task.cancel();
        self.easing_task.cancel();
        self.router.stop_listening();
        self.inbox = None;
        self.mounted = false;
        log::info!("Game unmounted");
    }

    fn begin_session(&mut self) {
        self.obstacles.clear();
        self.state.begin_session();
        self.router.start_listening();
        self.game_task.schedule();
    }

    // === Input ===

    /// Route one classification event received at `now_ms`
    pub fn handle_voice(&mut self, event: &ClassificationEvent, now_ms: f64) -> RouteOutcome {
        self.router.route(
            event,
            now_ms,
            &self.state.session,
            &mut self.state.player,
            &mut self.speed,
        )
    }

    /// Route everything pending in the voice inbox
    pub fn pump_voice(&mut self, now_ms: f64) -> Vec<RouteOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let Some(event) = self.inbox.as_ref().and_then(|inbox| inbox.try_next()) else {
                break;
            };
            outcomes.push(self.handle_voice(&event, now_ms));
        }
        outcomes
    }

    // === Refresh ===

    /// Run every scheduled task once for this display refresh.
    ///
    /// A failed frame is reported to the caller; both tasks stay scheduled
    /// and the next refresh runs from the current state.
    pub fn on_refresh<S: DrawSurface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<FrameReport, FrameError> {
        let mut report = FrameReport::default();

        if self.easing_task.is_scheduled()
            && (self.settings.ease_while_idle || self.state.session.is_running())
        {
            self.speed.ease();
            self.easing_task.runs += 1;
        }

        if !self.game_task.is_scheduled() {
            return Ok(report);
        }
        self.game_task.runs += 1;
        report.simulated = true;

        let layout = Layout::new(surface.size(), &self.settings);
        let ctx = FrameContext {
            layout: &layout,
            catalog: &self.catalog,
            settings: &self.settings,
        };
        report.events = tick(&mut self.state, &mut self.speed, &mut self.obstacles, &ctx)
            .inspect_err(|e| log::warn!("Frame {} aborted: {}", self.game_task.runs, e))?;

        let final_score = report.events.iter().find_map(|e| match e {
            GameEvent::GameOver { score } => Some(*score),
            _ => None,
        });
        if let Some(score) = final_score {
            self.router.stop_listening();
            self.game_task.cancel();
            if let Some(handler) = self.on_game_over.as_mut() {
                handler(score);
            }
        }

        report.render = render_frame(
            surface,
            &layout,
            &self.state,
            self.obstacles.live(),
            &self.catalog,
            &self.settings,
        )
        .inspect_err(|e| log::warn!("Render failed: {}", e))?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCommand, RecordingSurface};
    use crate::sprites::SpriteId;
    use glam::Vec2;
    use std::cell::Cell;
    use std::rc::Rc;

    fn engine() -> Engine {
        let mut engine = Engine::with_rng(
            Settings::default(),
            SpriteCatalog::default(),
            Pcg32::seed_from_u64(12345),
        )
        .expect("default settings are valid");
        engine.model_ready(ModelSource::Default);
        engine
    }

    fn surface() -> RecordingSurface {
        RecordingSurface::new(Vec2::new(600.0, 1000.0))
    }

    #[test]
    fn test_start_requires_model() {
        let mut engine = Engine::with_rng(
            Settings::default(),
            SpriteCatalog::default(),
            Pcg32::seed_from_u64(1),
        )
        .expect("valid");
        assert_eq!(engine.start(), Err(SessionError::ModelNotLoaded));

        engine.model_ready(ModelSource::Default);
        assert_eq!(engine.start(), Ok(()));
        assert_eq!(
            engine.start(),
            Err(SessionError::NotIdle(GamePhase::Running))
        );
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            spawn_interval: 0,
            ..Default::default()
        };
        assert!(
            Engine::with_rng(settings, SpriteCatalog::default(), Pcg32::seed_from_u64(1)).is_err()
        );
    }

    #[test]
    fn test_idle_refresh_does_not_simulate() {
        let mut engine = engine();
        let mut surface = surface();
        let report = engine.on_refresh(&mut surface).expect("refresh");
        assert!(!report.simulated);
        assert!(surface.commands().is_empty());
        assert_eq!(engine.easing_task().runs(), 1);
    }

    #[test]
    fn test_survival_scenario() {
        let mut engine = engine();
        let mut surface = surface();
        engine.start().expect("start");

        let mut spawns = Vec::new();
        for frame in 1..=130u64 {
            let report = engine.on_refresh(&mut surface).expect("refresh");
            for e in report.events {
                if let GameEvent::ObstacleSpawned { .. } = e {
                    spawns.push(frame);
                }
            }
        }

        let session = &engine.state().session;
        assert!((session.score - 13.0).abs() < 1e-3);
        assert!(!session.game_over);
        assert_eq!(session.frame_count, 130);
        assert_eq!(spawns, vec![120]);
    }

    #[test]
    fn test_voice_scenario() {
        let mut engine = engine();
        engine.start().expect("start");
        assert_eq!(engine.state().player.lane, 1);

        let go_left = ClassificationEvent::labeled("go_left");
        engine.handle_voice(&go_left, 10_000.0);
        assert_eq!(engine.state().player.lane, 0);

        engine.handle_voice(&go_left, 10_100.0);
        assert_eq!(engine.state().player.lane, 0);
    }

    #[test]
    fn test_collision_scenario() {
        let mut engine = engine();
        let mut surface = surface();
        engine.start().expect("start");

        let final_score = Rc::new(Cell::new(None));
        let seen = final_score.clone();
        engine.on_game_over(move |score| seen.set(Some(score)));

        // Player band is [910, 990]; the obstacle bottom reaches 910 after 26 frames
        let lane = engine.state().player.lane;
        engine
            .obstacles_mut()
            .push(lane, 700.0, SpriteId::from("car.png"));

        for _ in 0..25 {
            engine.on_refresh(&mut surface).expect("refresh");
            assert!(!engine.state().session.game_over);
        }
        let report = engine.on_refresh(&mut surface).expect("refresh");
        assert!(engine.state().session.game_over);
        let score = engine.state().session.score;
        assert!(report.events.contains(&GameEvent::GameOver { score }));
        assert!(!engine.game_task().is_scheduled());
        assert!(!engine.is_listening());
        assert!(final_score.get().is_some());

        let frozen = engine.state().session.clone();
        for _ in 0..10 {
            let report = engine.on_refresh(&mut surface).expect("refresh");
            assert!(!report.simulated);
        }
        assert_eq!(engine.state().session, frozen);

        // Voice is ignored after game over
        engine.handle_voice(&ClassificationEvent::labeled("right"), 1e9);
        assert_eq!(engine.state().player.lane, lane);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut engine = engine();
        let mut surface = surface();
        engine.start().expect("start");
        let lane = engine.state().player.lane;
        engine.obstacles_mut().push(lane, 900.0, SpriteId::from("car.png"));
        engine.obstacles_mut().push(0, 100.0, SpriteId::from("car.png"));
        engine.on_refresh(&mut surface).expect("refresh");
        assert!(engine.state().session.game_over);

        engine.restart().expect("restart");
        assert_eq!(engine.phase(), GamePhase::Running);
        assert!(engine.obstacles().is_empty());
        assert_eq!(engine.state().player.lane, 1);
        assert_eq!(engine.state().session.score, 0.0);
        assert_eq!(engine.state().session.frame_count, 0);
        assert!(engine.is_listening());
        assert!(engine.game_task().is_scheduled());
    }

    #[test]
    fn test_switch_model_returns_to_idle() {
        let mut engine = engine();
        engine.start().expect("start");
        engine.obstacles_mut().push(2, 50.0, SpriteId::from("car.png"));

        engine.switch_model();
        assert_eq!(engine.phase(), GamePhase::Idle);
        assert!(engine.obstacles().is_empty());
        assert_eq!(engine.model_status(), &ModelStatus::NotLoaded);
        assert_eq!(engine.start(), Err(SessionError::ModelNotLoaded));
    }

    #[test]
    fn test_easing_runs_while_idle() {
        let mut engine = engine();
        let mut surface = surface();
        engine.start().expect("start");

        // Close obstacle in the player's lane drops the target to slowdown
        let lane = engine.state().player.lane;
        engine.obstacles_mut().push(lane, 50.0, SpriteId::from("car.png"));
        engine.on_refresh(&mut surface).expect("refresh");
        assert_eq!(engine.speed().target(), 3.0);

        engine.switch_model();
        let before = engine.speed().current();
        for _ in 0..5 {
            engine.on_refresh(&mut surface).expect("refresh");
        }
        assert!(engine.speed().current() < before);
    }

    #[test]
    fn test_easing_gated_when_configured() {
        let settings = Settings {
            ease_while_idle: false,
            ..Default::default()
        };
        let mut engine =
            Engine::with_rng(settings, SpriteCatalog::default(), Pcg32::seed_from_u64(3))
                .expect("valid");
        engine.model_ready(ModelSource::Default);
        let mut surface = surface();
        engine.start().expect("start");

        let lane = engine.state().player.lane;
        engine.obstacles_mut().push(lane, 50.0, SpriteId::from("car.png"));
        engine.on_refresh(&mut surface).expect("refresh");

        engine.switch_model();
        let before = engine.speed().current();
        for _ in 0..5 {
            engine.on_refresh(&mut surface).expect("refresh");
        }
        assert_eq!(engine.speed().current(), before);
    }

    #[test]
    fn test_unmount_cancels_everything() {
        let mut engine = engine();
        let mut surface = surface();
        engine.start().expect("start");
        let tx = engine.connect_voice();

        engine.unmount();
        let report = engine.on_refresh(&mut surface).expect("refresh");
        assert!(!report.simulated);
        assert_eq!(engine.easing_task().runs(), 0);
        assert!(!tx.send(ClassificationEvent::labeled("left")));
        assert_eq!(engine.start(), Err(SessionError::Unmounted));
    }

    #[test]
    fn test_voice_channel_pumped() {
        let mut engine = engine();
        engine.start().expect("start");
        let tx = engine.connect_voice();

        assert!(tx.send(ClassificationEvent::labeled("right")));
        assert!(!tx.send(ClassificationEvent::labeled("right")));
        let outcomes = engine.pump_voice(0.0);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(engine.state().player.lane, 2);
    }

    #[test]
    fn test_render_failure_keeps_loop_scheduled() {
        let mut engine = engine();
        let mut surface = surface();
        engine.start().expect("start");

        surface.fail_next("context lost");
        assert!(matches!(
            engine.on_refresh(&mut surface),
            Err(FrameError::Surface(_))
        ));
        assert!(engine.game_task().is_scheduled());
        assert_eq!(engine.state().session.frame_count, 1);

        engine.on_refresh(&mut surface).expect("next frame recovers");
        assert_eq!(engine.state().session.frame_count, 2);
    }

    #[test]
    fn test_restart_needs_a_started_session() {
        let mut engine = engine();
        let mut surface = surface();
        assert_eq!(engine.restart(), Err(SessionError::NotStarted));
        assert_eq!(engine.phase(), GamePhase::Idle);
        assert!(!engine.game_task().is_scheduled());

        engine.start().expect("start");
        let lane = engine.state().player.lane;
        engine.obstacles_mut().push(lane, 900.0, SpriteId::from("car.png"));
        engine.on_refresh(&mut surface).expect("refresh");
        assert_eq!(
            engine.start(),
            Err(SessionError::NotIdle(GamePhase::GameOver))
        );
        assert_eq!(engine.restart(), Ok(()));
    }

    #[test]
    fn test_low_confidence_voice_ignored() {
        let mut engine = engine();
        engine.start().expect("start");

        let unsure = ClassificationEvent {
            label: Some("go_right".into()),
            scores: vec![0.1, 0.2, 0.69],
        };
        assert_eq!(
            engine.handle_voice(&unsure, 0.0),
            RouteOutcome::Dropped(crate::voice::DropReason::LowConfidence)
        );
        assert_eq!(engine.state().player.lane, 1);

        let sure = ClassificationEvent {
            label: Some("go_right".into()),
            scores: vec![0.05, 0.05, 0.9],
        };
        assert!(matches!(
            engine.handle_voice(&sure, 1.0),
            RouteOutcome::Accepted { lane: 2, .. }
        ));
    }

    #[test]
    fn test_layout_recomputed_after_resize() {
        let mut engine = engine();
        let mut surface = surface();
        engine.start().expect("start");

        let lane = engine.state().player.lane;
        let other = (lane + 1) % 3;
        let far = engine
            .obstacles_mut()
            .push(other, 850.0, SpriteId::from("car.png"));
        engine.on_refresh(&mut surface).expect("refresh");
        assert!(engine.obstacles().live().iter().any(|o| o.id == far));

        // 855 is past the new prune limit of 600 + 200
        surface.set_size(Vec2::new(400.0, 600.0));
        engine.on_refresh(&mut surface).expect("refresh");
        assert!(engine.obstacles().is_empty());
        assert!(!engine.state().session.game_over);

        // Player band is now [510, 590]; at 1000px tall this would miss
        engine
            .obstacles_mut()
            .push(lane, 430.0, SpriteId::from("car.png"));
        let report = engine.on_refresh(&mut surface).expect("refresh");
        assert!(engine.state().session.game_over);
        assert!(report.events.iter().any(|e| matches!(e, GameEvent::Collision { .. })));

        let stripes_bottom = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Stroke { segments, .. } => {
                    segments.iter().map(|s| s.0.y).reduce(f32::max)
                }
                _ => None,
            })
            .last();
        // Dashes reach at most one stripe period past the new bottom edge
        assert!(stripes_bottom.is_some_and(|y| y < 640.0));
    }

    #[test]
    fn test_bundle_validation() {
        let mut engine = engine();
        assert_eq!(
            engine.load_bundle("mine.zip", ["model.json"]),
            Err(SessionError::Model(ModelError::MissingFile("metadata.json")))
        );
        assert_eq!(engine.model_status(), &ModelStatus::NotLoaded);
        assert_eq!(engine.start(), Err(SessionError::ModelNotLoaded));
        engine
            .load_bundle("mine.zip", ["model.json", "metadata.json"])
            .expect("complete bundle");
        assert!(matches!(
            engine.model_status(),
            ModelStatus::Loading(ModelSource::Uploaded { .. })
        ));
    }
}
