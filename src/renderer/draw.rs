//! Frame drawing
//!
//! Draw order: background, scrolling lane stripes, player, obstacles, score.

use glam::Vec2;

use super::{Color, DrawSurface, Layout, Rect, SurfaceError};
use crate::settings::Settings;
use crate::sim::{GameState, Obstacle};
use crate::sprites::{SpriteCatalog, SpriteId};

/// Lane stripe line width
const STRIPE_WIDTH: f32 = 3.0;
/// Score text position and base font size (at a 600px wide canvas)
const SCORE_POS: Vec2 = Vec2::new(10.0, 20.0);
const SCORE_FONT_PX: f32 = 18.0;
const SCORE_FONT_REFERENCE_WIDTH: f32 = 600.0;

/// What a frame draw produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub sprites_drawn: usize,
    /// Entities skipped because their image is unavailable
    pub sprites_skipped: usize,
}

/// Draw one sprite; a missing image skips the entity instead of failing
fn draw_sprite<S: DrawSurface + ?Sized>(
    surface: &mut S,
    sprite: &SpriteId,
    dest: Option<Rect>,
    stats: &mut RenderStats,
) -> Result<(), SurfaceError> {
    let Some(dest) = dest else {
        log::debug!("Sprite {} not loaded yet, skipping", sprite);
        stats.sprites_skipped += 1;
        return Ok(());
    };
    match surface.draw_image(sprite, dest) {
        Ok(()) => {
            stats.sprites_drawn += 1;
            Ok(())
        }
        Err(SurfaceError::MissingImage(id)) => {
            log::warn!("Missing image for sprite {}, skipped this frame", id);
            stats.sprites_skipped += 1;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Dashed lane dividers shifted by the scroll offset
pub fn stripe_segments(
    layout: &Layout,
    scroll_offset: f32,
    settings: &Settings,
) -> Vec<(Vec2, Vec2)> {
    let tile = settings.stripe_tile;
    let dash = settings.stripe_dash;
    // Dashes start at -dash so one is always entering from the top
    let per_divider = ((layout.size.y + dash) / tile).ceil().max(0.0) as usize;
    let mut segments = Vec::with_capacity(per_divider * layout.lanes.saturating_sub(1));
    for divider in 1..layout.lanes {
        let x = divider as f32 * layout.lane_width;
        for i in 0..per_divider {
            let y = -dash + i as f32 * tile + scroll_offset;
            segments.push((Vec2::new(x, y), Vec2::new(x, y + dash)));
        }
    }
    segments
}

/// Draw the current state to `surface`
pub fn render_frame<S: DrawSurface + ?Sized>(
    surface: &mut S,
    layout: &Layout,
    state: &GameState,
    obstacles: &[Obstacle],
    catalog: &SpriteCatalog,
    settings: &Settings,
) -> Result<RenderStats, SurfaceError> {
    let mut stats = RenderStats::default();
    let canvas = Rect::from_size(layout.size);

    surface.clear_rect(canvas)?;
    surface.fill_rect(canvas, Color::ASPHALT)?;

    let stripes = stripe_segments(layout, state.scroll_offset, settings);
    if !stripes.is_empty() {
        surface.stroke_segments(&stripes, Color::WHITE, STRIPE_WIDTH)?;
    }

    draw_sprite(
        surface,
        catalog.player(),
        layout.player_rect(catalog, state.player.lane),
        &mut stats,
    )?;

    for o in obstacles {
        let dest = layout.obstacle_rect(catalog, &o.sprite, o.lane, o.y);
        draw_sprite(surface, &o.sprite, dest, &mut stats)?;
    }

    let font_px = SCORE_FONT_PX * (layout.size.x / SCORE_FONT_REFERENCE_WIDTH);
    let text = format!("Score: {}", state.session.score.floor() as i64);
    surface.draw_text(&text, SCORE_POS, font_px, Color::WHITE)?;

    Ok(stats)
}
