//! In-memory drawing surface
//!
//! Records every call instead of drawing. Used by the headless native build
//! and by tests.

use std::collections::HashSet;

use glam::Vec2;

use super::{Color, DrawSurface, Rect, SurfaceError};
use crate::sprites::SpriteId;

/// A recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rect),
    FillRect(Rect, Color),
    Stroke {
        segments: Vec<(Vec2, Vec2)>,
        color: Color,
        line_width: f32,
    },
    Image(SpriteId, Rect),
    Text {
        text: String,
        pos: Vec2,
        font_px: f32,
        color: Color,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Vec2,
    commands: Vec<DrawCommand>,
    missing: HashSet<SpriteId>,
    pending_failure: Option<String>,
}

impl RecordingSurface {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Simulate a canvas resize
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    /// Report `sprite` as having no image
    pub fn mark_missing(&mut self, sprite: SpriteId) {
        self.missing.insert(sprite);
    }

    /// Fail the next drawing call with a backend error
    pub fn fail_next(&mut self, reason: impl Into<String>) {
        self.pending_failure = Some(reason.into());
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain recorded commands (one frame's worth, typically)
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    fn record(&mut self, command: DrawCommand) -> Result<(), SurfaceError> {
        if let Some(reason) = self.pending_failure.take() {
            return Err(SurfaceError::Backend(reason));
        }
        log::trace!("draw {:?}", command);
        self.commands.push(command);
        Ok(())
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear_rect(&mut self, rect: Rect) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Clear(rect))
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), SurfaceError> {
        self.record(DrawCommand::FillRect(rect, color))
    }

    fn stroke_segments(
        &mut self,
        segments: &[(Vec2, Vec2)],
        color: Color,
        line_width: f32,
    ) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Stroke {
            segments: segments.to_vec(),
            color,
            line_width,
        })
    }

    fn draw_image(&mut self, sprite: &SpriteId, dest: Rect) -> Result<(), SurfaceError> {
        if self.missing.contains(sprite) {
            return Err(SurfaceError::MissingImage(sprite.clone()));
        }
        self.record(DrawCommand::Image(sprite.clone(), dest))
    }

    fn draw_text(
        &mut self,
        text: &str,
        pos: Vec2,
        font_px: f32,
        color: Color,
    ) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Text {
            text: text.to_string(),
            pos,
            font_px,
            color,
        })
    }
}
