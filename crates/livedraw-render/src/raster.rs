//! Raster target backed by tiny-skia.
//!
//! Shapes arrive as kurbo geometry in pixel space and are filled with the
//! non-zero rule, anti-aliased, composited source-over in paint order.

use kurbo::{PathEl, Shape as KurboShape};
use livedraw_core::render::{RenderError, RenderResult};
use peniko::Color;
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Transform};

/// Curve flattening tolerance in pixels when converting kurbo shapes.
const PATH_TOLERANCE: f64 = 0.1;

/// A pixel canvas that shapes are filled into.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// Create a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a));
    }

    /// Fill a pixel-space shape over the existing content.
    ///
    /// Degenerate shapes (zero area, non-finite coordinates) draw nothing.
    pub fn fill_shape(&mut self, shape: &impl KurboShape, color: Color) {
        let Some(path) = to_path(shape) else {
            return;
        };
        let rgba = color.to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, rgba.a);
        paint.anti_alias = true;
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Row-major RGBA8 with straight alpha, as PNG expects.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        data
    }
}

fn to_path(shape: &impl KurboShape) -> Option<Path> {
    let area = shape.bounding_box().area();
    if area.is_nan() || area <= 0.0 {
        return None;
    }

    let mut builder = PathBuilder::new();
    for el in shape.path_elements(PATH_TOLERANCE) {
        match el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}
