//! PNG implementation of the core `Renderer` trait.

use crate::raster::Canvas;
use livedraw_core::render::{RenderError, RenderResult, Renderer, validate_size};
use livedraw_core::shapes::Shape;
use peniko::Color;

/// Options shared by every frame a renderer produces.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Background color. Transparent by default so the page shows through.
    pub background_color: Color,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background_color: Color::from_rgba8(0, 0, 0, 0),
        }
    }
}

impl RenderOptions {
    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }
}

/// Rasterizes shape lists on the CPU and encodes them as PNG.
#[derive(Debug, Clone, Default)]
pub struct PngRenderer {
    options: RenderOptions,
}

impl PngRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Rasterize without encoding.
    pub fn rasterize(&self, shapes: &[Shape], width: u32, height: u32) -> RenderResult<Canvas> {
        validate_size(width, height)?;

        let mut canvas = Canvas::new(width, height)?;
        if self.options.background_color.to_rgba8().a > 0 {
            canvas.fill(self.options.background_color);
        }
        for shape in shapes {
            match shape {
                Shape::Circle(circle) => {
                    let ellipse = shape.to_pixels(width, height);
                    canvas.fill_shape(&ellipse, circle.color.into());
                }
            }
        }
        Ok(canvas)
    }
}

impl Renderer for PngRenderer {
    fn render(&self, shapes: &[Shape], width: u32, height: u32) -> RenderResult<Vec<u8>> {
        let canvas = self.rasterize(shapes, width, height)?;
        let png_data = encode_png(&canvas)?;
        log::trace!(
            "rendered {} shapes at {}x{} ({} bytes)",
            shapes.len(),
            width,
            height,
            png_data.len()
        );
        Ok(png_data)
    }
}

fn encode_png(canvas: &Canvas) -> RenderResult<Vec<u8>> {
    let encode_err = |e: png::EncodingError| RenderError::Encode(e.to_string());

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, canvas.width(), canvas.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(encode_err)?;
        writer.write_image_data(&canvas.to_rgba8()).map_err(encode_err)?;
        writer.finish().map_err(encode_err)?;
    }
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use livedraw_core::shapes::{Circle, SerializableColor};

    fn decode(png_data: &[u8]) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(std::io::Cursor::new(png_data));
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    fn red_dot() -> Shape {
        Circle::new(
            Point::new(0.25, 0.25),
            0.05,
            SerializableColor::from_hex("#ff0000").unwrap(),
        )
        .into()
    }

    #[test]
    fn test_empty_list_is_blank_canvas() {
        let png_data = PngRenderer::new().render(&[], 64, 32).unwrap();
        let (width, height, data) = decode(&png_data);
        assert_eq!((width, height), (64, 32));
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_background_color() {
        let renderer = PngRenderer::with_options(RenderOptions::default().with_background(Color::WHITE));
        let (width, _, data) = decode(&renderer.render(&[], 8, 8).unwrap());
        assert_eq!(pixel(&data, width, 3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn test_invalid_size_rejected() {
        let renderer = PngRenderer::new();
        assert!(matches!(
            renderer.render(&[], 0, 10),
            Err(RenderError::InvalidSize { .. })
        ));
        assert!(renderer.render(&[], 10, 100_000).is_err());
    }

    #[test]
    fn test_red_circle_scales_with_resolution() {
        let renderer = PngRenderer::new();
        let (width, _, data) = decode(&renderer.render(&[red_dot()], 800, 800).unwrap());

        // Center (200, 200), radius 40.
        assert_eq!(pixel(&data, width, 200, 200), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, width, 238, 200), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, width, 161, 200), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, width, 200, 238), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, width, 242, 200)[3], 0);
        assert_eq!(pixel(&data, width, 157, 200)[3], 0);
        assert_eq!(pixel(&data, width, 200, 157)[3], 0);
    }

    #[test]
    fn test_same_shape_at_editor_resolution() {
        let renderer = PngRenderer::new();
        let (width, _, data) = decode(&renderer.render(&[red_dot()], 400, 400).unwrap());

        // Center (100, 100), radius 20, as the editor clicked it.
        assert_eq!(pixel(&data, width, 100, 100), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, width, 118, 100), [255, 0, 0, 255]);
        assert_eq!(pixel(&data, width, 122, 100)[3], 0);
    }

    #[test]
    fn test_paint_order() {
        let blue: Shape = Circle::new(
            Point::new(0.25, 0.25),
            0.02,
            SerializableColor::new(0, 0, 255, 255),
        )
        .into();
        let renderer = PngRenderer::new();
        let (width, _, data) = decode(&renderer.render(&[red_dot(), blue.clone()], 100, 100).unwrap());
        assert_eq!(pixel(&data, width, 25, 25), [0, 0, 255, 255]);

        let (width, _, data) = decode(&renderer.render(&[blue, red_dot()], 100, 100).unwrap());
        assert_eq!(pixel(&data, width, 25, 25), [255, 0, 0, 255]);
    }

    #[test]
    fn test_deterministic() {
        let renderer = PngRenderer::new();
        let a = renderer.render(&[red_dot()], 120, 120).unwrap();
        let b = renderer.render(&[red_dot()], 120, 120).unwrap();
        assert_eq!(a, b);
    }
}
