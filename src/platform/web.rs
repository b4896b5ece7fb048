//! Browser platform: canvas 2D surface and sprite images

use std::collections::HashMap;

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::renderer::{Color, DrawSurface, Rect, SurfaceError};
use crate::sprites::{SpriteCatalog, SpriteId, SpriteSize};

fn backend(err: JsValue) -> SurfaceError {
    SurfaceError::Backend(format!("{:?}", err))
}

/// A `<canvas>` element drawn through its 2D context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<SpriteId, HtmlImageElement>,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SurfaceError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(backend)?
            .ok_or_else(|| SurfaceError::Backend("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| SurfaceError::Backend("not a 2d context".into()))?;
        Ok(Self {
            canvas,
            ctx,
            images: HashMap::new(),
        })
    }

    /// Resize the backing canvas (responsive layout)
    pub fn set_size(&self, size: Vec2) {
        self.canvas.set_width(size.x as u32);
        self.canvas.set_height(size.y as u32);
    }

    /// Start loading every catalog sprite from `base_url`
    pub fn load_images(
        &mut self,
        catalog: &SpriteCatalog,
        base_url: &str,
    ) -> Result<(), SurfaceError> {
        for id in catalog.all() {
            let img = HtmlImageElement::new().map_err(backend)?;
            img.set_src(&format!("{}/{}", base_url.trim_end_matches('/'), id));
            self.images.insert(id.clone(), img);
        }
        log::info!("Loading {} sprites from {}", self.images.len(), base_url);
        Ok(())
    }

    /// Copy natural sizes of images that finished loading into the catalog
    pub fn sync_sprite_sizes(&self, catalog: &mut SpriteCatalog) {
        for (id, img) in &self.images {
            if catalog.size(id).is_none() && img.complete() && img.natural_width() > 0 {
                let size = SpriteSize::new(img.natural_width() as f32, img.natural_height() as f32);
                catalog.set_size(id, size);
                log::info!("Sprite {} loaded ({}x{})", id, size.width, size.height);
            }
        }
    }
}

impl DrawSurface for CanvasSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn clear_rect(&mut self, rect: Rect) -> Result<(), SurfaceError> {
        self.ctx.clear_rect(
            rect.pos.x as f64,
            rect.pos.y as f64,
            rect.size.x as f64,
            rect.size.y as f64,
        );
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), SurfaceError> {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(
            rect.pos.x as f64,
            rect.pos.y as f64,
            rect.size.x as f64,
            rect.size.y as f64,
        );
        Ok(())
    }

    fn stroke_segments(
        &mut self,
        segments: &[(Vec2, Vec2)],
        color: Color,
        line_width: f32,
    ) -> Result<(), SurfaceError> {
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(line_width as f64);
        self.ctx.begin_path();
        for (from, to) in segments {
            self.ctx.move_to(from.x as f64, from.y as f64);
            self.ctx.line_to(to.x as f64, to.y as f64);
        }
        self.ctx.stroke();
        Ok(())
    }

    fn draw_image(&mut self, sprite: &SpriteId, dest: Rect) -> Result<(), SurfaceError> {
        let img = self
            .images
            .get(sprite)
            .filter(|img| img.complete() && img.natural_width() > 0)
            .ok_or_else(|| SurfaceError::MissingImage(sprite.clone()))?;
        self.ctx
            .draw_image_with_html_image_element_and_dw_and_dh(
                img,
                dest.pos.x as f64,
                dest.pos.y as f64,
                dest.size.x as f64,
                dest.size.y as f64,
            )
            .map_err(backend)
    }

    fn draw_text(
        &mut self,
        text: &str,
        pos: Vec2,
        font_px: f32,
        color: Color,
    ) -> Result<(), SurfaceError> {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.set_font(&format!("{}px sans-serif", font_px));
        self.ctx
            .fill_text(text, pos.x as f64, pos.y as f64)
            .map_err(backend)
    }
}
