//! LiveDraw Core Library
//!
//! Shared drawing state for live multi-viewer canvases: shapes in normalized
//! space, per-drawing observers with single-slot frame delivery, and the
//! registry that maps drawing ids to drawings.

pub mod drawing;
pub mod edit;
pub mod registry;
pub mod render;
pub mod shape_list;
pub mod shapes;

pub use drawing::{DEFAULT_SESSION_WIDTH, Drawing, Observer, ObserverId};
pub use edit::{CircleEdit, EditError};
pub use registry::DrawingRegistry;
pub use render::{Frame, MAX_DIMENSION, RenderError, RenderResult, Renderer, validate_size};
pub use shape_list::ShapeList;
pub use shapes::{Circle, ColorParseError, SerializableColor, Shape};
