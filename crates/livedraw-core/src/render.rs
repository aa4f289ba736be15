//! Renderer seam between drawings and raster backends.

use crate::shapes::Shape;
use bytes::Bytes;
use thiserror::Error;

/// Largest width or height a renderer will accept.
pub const MAX_DIMENSION: u32 = 4096;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid render size {width}x{height} (each side must be 1..={max})", max = MAX_DIMENSION)]
    InvalidSize { width: u32, height: u32 },
    #[error("encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Reject sizes a renderer must not attempt.
pub fn validate_size(width: u32, height: u32) -> RenderResult<()> {
    let valid = |side: u32| (1..=MAX_DIMENSION).contains(&side);
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(RenderError::InvalidSize { width, height })
    }
}

/// Turns a shape list into encoded image bytes.
///
/// Implementations must be deterministic and free of side effects: the same
/// shapes at the same size always produce the same bytes. An empty slice
/// renders a blank canvas.
pub trait Renderer: Send + Sync {
    /// Render `shapes` (normalized space, paint order) at `width` x `height` pixels.
    fn render(&self, shapes: &[Shape], width: u32, height: u32) -> RenderResult<Vec<u8>>;

    /// MIME type of the bytes produced by [`Renderer::render`].
    fn content_type(&self) -> &'static str {
        "image/png"
    }
}

/// One rendered image of a drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Number of shapes the image was rendered from.
    pub generation: usize,
    /// Encoded image bytes.
    pub image: Bytes,
}

impl Frame {
    pub fn new(generation: usize, image: impl Into<Bytes>) -> Self {
        Self {
            generation,
            image: image.into(),
        }
    }

    /// Placeholder holding no image, used to seed an observer's slot.
    pub(crate) fn placeholder(generation: usize) -> Self {
        Self::new(generation, Bytes::new())
    }
}
