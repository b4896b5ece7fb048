//! Game tuning and preferences
//!
//! Every tunable defaults to the value in `consts`. Settings are persisted as
//! JSON: LocalStorage on the web, an optional file on native.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Game tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Layout ===
    /// Number of lanes
    pub lanes: usize,

    // === Voice ===
    /// Minimum gap between accepted commands (ms)
    pub voice_cooldown_ms: f64,
    /// Minimum top score for a classification to be emitted
    pub probability_threshold: f32,

    // === Pacing ===
    /// Frames between obstacle spawns
    pub spawn_interval: u64,
    /// Score added per frame
    pub score_per_frame: f32,

    // === Speed ===
    pub normal_speed: f32,
    pub slowdown_speed: f32,
    /// Obstacle y below which the speed target drops to `slowdown_speed`
    pub proximity_threshold: f32,
    /// Fraction of the remaining gap closed per easing tick, in (0, 1]
    pub ease_factor: f32,
    /// Keep easing the speed while no session is running
    pub ease_while_idle: bool,

    // === Obstacles ===
    pub spawn_y: f32,
    pub prune_margin: f32,

    // === Drawing ===
    pub stripe_tile: f32,
    pub stripe_dash: f32,
    pub sprite_reference_size: f32,
    pub player_bottom_margin: f32,
    pub fallback_sprite_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lanes: LANES,

            voice_cooldown_ms: VOICE_COOLDOWN_MS,
            probability_threshold: PROBABILITY_THRESHOLD,

            spawn_interval: SPAWN_INTERVAL,
            score_per_frame: SCORE_PER_FRAME,

            normal_speed: NORMAL_SPEED,
            slowdown_speed: SLOWDOWN_SPEED,
            proximity_threshold: PROXIMITY_THRESHOLD,
            ease_factor: SPEED_EASE,
            ease_while_idle: true,

            spawn_y: SPAWN_Y,
            prune_margin: PRUNE_MARGIN,

            stripe_tile: STRIPE_TILE,
            stripe_dash: STRIPE_DASH,
            sprite_reference_size: SPRITE_REFERENCE_SIZE,
            player_bottom_margin: PLAYER_BOTTOM_MARGIN,
            fallback_sprite_height: FALLBACK_SPRITE_HEIGHT,
        }
    }
}

/// Smallest stripe period; shorter periods produce an unbounded dash count
const MIN_STRIPE_TILE: f32 = 1.0;

fn invalid(field: &'static str, reason: &'static str) -> SettingsError {
    SettingsError::Invalid { field, reason }
}

impl Settings {
    /// Check the value ranges the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.lanes == 0 {
            return Err(invalid("lanes", "must be at least 1"));
        }
        if self.spawn_interval == 0 {
            return Err(invalid("spawn_interval", "must be at least 1"));
        }
        if !(self.ease_factor > 0.0 && self.ease_factor <= 1.0) {
            return Err(invalid("ease_factor", "must be in (0, 1]"));
        }
        for (field, speed) in [
            ("normal_speed", self.normal_speed),
            ("slowdown_speed", self.slowdown_speed),
        ] {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(invalid(field, "must be finite and positive"));
            }
        }
        if !(self.voice_cooldown_ms >= 0.0) {
            return Err(invalid("voice_cooldown_ms", "must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.probability_threshold) {
            return Err(invalid("probability_threshold", "must be in [0, 1]"));
        }
        if !self.score_per_frame.is_finite() || self.score_per_frame < 0.0 {
            return Err(invalid("score_per_frame", "must be finite and non-negative"));
        }
        if !self.prune_margin.is_finite() || self.prune_margin < 0.0 {
            return Err(invalid("prune_margin", "must be finite and non-negative"));
        }
        if !self.spawn_y.is_finite() || !self.proximity_threshold.is_finite() {
            return Err(invalid("spawn_y", "positions must be finite"));
        }
        if !self.stripe_tile.is_finite() || self.stripe_tile < MIN_STRIPE_TILE {
            return Err(invalid("stripe_tile", "must be finite and at least 1px"));
        }
        if !(self.stripe_dash > 0.0 && self.stripe_dash <= self.stripe_tile) {
            return Err(invalid("stripe_dash", "must be in (0, stripe_tile]"));
        }
        if !(self.sprite_reference_size > 0.0) || !self.sprite_reference_size.is_finite() {
            return Err(invalid("sprite_reference_size", "must be finite and positive"));
        }
        if !(self.fallback_sprite_height > 0.0) {
            return Err(invalid("fallback_sprite_height", "must be positive"));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "lane_runner_settings";

    /// Environment variable naming a settings file (native only)
    #[allow(dead_code)]
    const PATH_ENV: &'static str = "LANE_RUNNER_SETTINGS";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Load settings from the file named by `LANE_RUNNER_SETTINGS`, if any
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(Self::PATH_ENV) else {
            log::info!("Using default settings");
            return Self::default();
        };

        match Self::load_from_path(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", Path::new(&path).display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", Path::new(&path).display(), e);
                Self::default()
            }
        }
    }
}
