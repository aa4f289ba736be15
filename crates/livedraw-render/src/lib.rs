//! LiveDraw Render Library
//!
//! CPU renderer for LiveDraw shape lists. Shapes are filled with tiny-skia
//! and the result is encoded as PNG.

mod raster;
mod renderer;

pub use raster::Canvas;
pub use renderer::{PngRenderer, RenderOptions};
