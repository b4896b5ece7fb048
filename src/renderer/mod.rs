//! Rendering to an abstract 2D drawing surface
//!
//! The game never talks to a pixel API directly. Platforms implement
//! [`DrawSurface`] (a browser canvas, an in-memory recorder) and the frame is
//! laid out from the surface's current size every time it is drawn.

pub mod draw;
pub mod layout;
pub mod recording;

pub use draw::render_frame;
pub use layout::{Layout, canvas_size_for_viewport};
pub use recording::{DrawCommand, RecordingSurface};

use glam::Vec2;
use thiserror::Error;

use crate::sprites::SpriteId;

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const ASPHALT: Color = Color::rgb(0x22, 0x22, 0x22);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex form, e.g. `#222222`
    pub fn to_css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Axis-aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn from_size(size: Vec2) -> Self {
        Self {
            pos: Vec2::ZERO,
            size,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    /// The image for a sprite is not available (yet)
    #[error("sprite image `{0}` is not loaded")]
    MissingImage(SpriteId),
    /// The underlying drawing backend failed
    #[error("drawing backend error: {0}")]
    Backend(String),
}

/// Minimal 2D drawing API the game renders through
pub trait DrawSurface {
    /// Current size in pixels; may change between frames
    fn size(&self) -> Vec2;

    fn clear_rect(&mut self, rect: Rect) -> Result<(), SurfaceError>;

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), SurfaceError>;

    /// Stroke a path made of disjoint line segments
    fn stroke_segments(
        &mut self,
        segments: &[(Vec2, Vec2)],
        color: Color,
        line_width: f32,
    ) -> Result<(), SurfaceError>;

    /// Draw a sprite image scaled into `dest`
    fn draw_image(&mut self, sprite: &SpriteId, dest: Rect) -> Result<(), SurfaceError>;

    fn draw_text(
        &mut self,
        text: &str,
        pos: Vec2,
        font_px: f32,
        color: Color,
    ) -> Result<(), SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_css() {
        assert_eq!(Color::ASPHALT.to_css(), "#222222");
        assert_eq!(Color::WHITE.to_css(), "#ffffff");
    }
}
