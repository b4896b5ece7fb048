//! Per-frame layout derived from the surface size
//!
//! Nothing here is cached across frames: the canvas may be resized at any
//! time, so lane widths and sprite sizes are recomputed from the current
//! dimensions on every frame.

use glam::Vec2;

use super::Rect;
use crate::settings::Settings;
use crate::sim::VerticalSpan;
use crate::sprites::{SpriteCatalog, SpriteId};

/// Canvas size limits for responsive sizing
const MIN_CANVAS: Vec2 = Vec2::new(400.0, 600.0);
const MAX_CANVAS: Vec2 = Vec2::new(900.0, 1600.0);
/// Share of the viewport the canvas tries to take
const VIEWPORT_SHARE: Vec2 = Vec2::new(0.6, 0.8);

/// Canvas size for a given viewport (window inner size)
pub fn canvas_size_for_viewport(viewport: Vec2) -> Vec2 {
    (viewport * VIEWPORT_SHARE).clamp(MIN_CANVAS, MAX_CANVAS)
}

/// Geometry of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub size: Vec2,
    pub lanes: usize,
    pub lane_width: f32,
    /// Sprite scale relative to the reference canvas
    pub scale: Vec2,
    pub player_bottom_margin: f32,
    pub fallback_height: f32,
}

impl Layout {
    pub fn new(size: Vec2, settings: &Settings) -> Self {
        let lanes = settings.lanes.max(1);
        Self {
            size,
            lanes,
            lane_width: size.x / lanes as f32,
            scale: size / settings.sprite_reference_size,
            player_bottom_margin: settings.player_bottom_margin,
            fallback_height: settings.fallback_sprite_height,
        }
    }

    /// Visible height (obstacles are pruned relative to this)
    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Scaled draw size of a sprite, if its image is loaded
    pub fn sprite_size(&self, catalog: &SpriteCatalog, sprite: &SpriteId) -> Option<Vec2> {
        catalog.size(sprite).map(|s| s.as_vec2() * self.scale)
    }

    /// Scaled sprite height, or the fallback height while it is unknown
    pub fn sprite_height(&self, catalog: &SpriteCatalog, sprite: &SpriteId) -> f32 {
        self.sprite_size(catalog, sprite)
            .map(|s| s.y)
            .unwrap_or(self.fallback_height)
    }

    /// Horizontal position that centres `width` within `lane`
    pub fn lane_x(&self, lane: usize, width: f32) -> f32 {
        lane as f32 * self.lane_width + (self.lane_width - width) / 2.0
    }

    /// The player's vertical band, anchored to the bottom edge
    pub fn player_span(&self, catalog: &SpriteCatalog) -> VerticalSpan {
        let height = self.sprite_height(catalog, catalog.player());
        VerticalSpan::new(self.size.y - height - self.player_bottom_margin, height)
    }

    /// Player destination rect, if the player sprite is loaded
    pub fn player_rect(&self, catalog: &SpriteCatalog, lane: usize) -> Option<Rect> {
        let size = self.sprite_size(catalog, catalog.player())?;
        let top = self.size.y - size.y - self.player_bottom_margin;
        Some(Rect::new(self.lane_x(lane, size.x), top, size.x, size.y))
    }

    /// Obstacle destination rect, if its sprite is loaded
    pub fn obstacle_rect(
        &self,
        catalog: &SpriteCatalog,
        sprite: &SpriteId,
        lane: usize,
        y: f32,
    ) -> Option<Rect> {
        let size = self.sprite_size(catalog, sprite)?;
        Some(Rect::new(self.lane_x(lane, size.x), y, size.x, size.y))
    }
}
