//! Edits submitted by viewers, in the viewer's pixel space.

use crate::shapes::{Circle, ColorParseError, SerializableColor, Shape};
use kurbo::Point;
use serde::Deserialize;
use thiserror::Error;

/// Reasons an edit is refused. Reported to the editor only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("radius must not be negative")]
    NegativeRadius,
    #[error("session width must be positive")]
    ZeroWidth,
    #[error("center ({x}, {y}) lies outside the {width}px canvas")]
    OutsideCanvas { x: f64, y: f64, width: u32 },
    #[error(transparent)]
    Color(#[from] ColorParseError),
}

/// A circle placed by a viewer, in pixels relative to the image that viewer sees.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CircleEdit {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
}

impl CircleEdit {
    pub fn new(x: f64, y: f64, radius: f64, color: impl Into<String>) -> Self {
        Self {
            x,
            y,
            radius,
            color: color.into(),
        }
    }

    /// Convert to a normalized shape using the editor's viewport width.
    ///
    /// Canvases are square, so one scale factor (`1 / width`) applies to
    /// x, y and radius alike. The center must land inside the canvas; the
    /// radius may reach past its edges.
    pub fn normalize(&self, width: u32) -> Result<Shape, EditError> {
        for (field, value) in [("x", self.x), ("y", self.y), ("radius", self.radius)] {
            if !value.is_finite() {
                return Err(EditError::NonFinite { field });
            }
        }
        if self.radius < 0.0 {
            return Err(EditError::NegativeRadius);
        }
        if width == 0 {
            return Err(EditError::ZeroWidth);
        }
        let color = SerializableColor::from_hex(&self.color)?;

        let scale = 1.0 / width as f64;
        let circle = Circle::new(Point::new(self.x, self.y), self.radius, color).scaled(scale);
        let on_canvas = |v: f64| (0.0..=1.0).contains(&v);
        if !on_canvas(circle.center.x) || !on_canvas(circle.center.y) {
            return Err(EditError::OutsideCanvas {
                x: self.x,
                y: self.y,
                width,
            });
        }
        Ok(Shape::Circle(circle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_by_editor_width() {
        let edit = CircleEdit::new(100.0, 100.0, 20.0, "#ff0000");
        let Shape::Circle(circle) = edit.normalize(400).unwrap();
        assert!((circle.center.x - 0.25).abs() < 1e-12);
        assert!((circle.center.y - 0.25).abs() < 1e-12);
        assert!((circle.radius - 0.05).abs() < 1e-12);
        assert_eq!(circle.color, SerializableColor::new(255, 0, 0, 255));
    }

    #[test]
    fn test_normalize_round_trip() {
        for width in [256_u32, 400, 777, 1920] {
            let edit = CircleEdit::new(33.0, 250.5, 17.0, "#123456");
            let shape = edit.normalize(width).unwrap();
            let ellipse = shape.to_pixels(width, width);
            assert!((ellipse.center().x - 33.0).abs() < 1e-9);
            assert!((ellipse.center().y - 250.5).abs() < 1e-9);
            let Shape::Circle(circle) = shape;
            assert!((circle.radius * width as f64 - 17.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_non_finite() {
        let edit = CircleEdit::new(f64::NAN, 0.0, 1.0, "#000");
        assert_eq!(
            edit.normalize(400),
            Err(EditError::NonFinite { field: "x" })
        );
        let edit = CircleEdit::new(0.0, 0.0, f64::INFINITY, "#000");
        assert_eq!(
            edit.normalize(400),
            Err(EditError::NonFinite { field: "radius" })
        );
    }

    #[test]
    fn test_rejects_negative_radius() {
        let edit = CircleEdit::new(0.0, 0.0, -1.0, "#000");
        assert_eq!(edit.normalize(400), Err(EditError::NegativeRadius));
    }

    #[test]
    fn test_rejects_bad_color() {
        let edit = CircleEdit::new(0.0, 0.0, 1.0, "blue");
        assert!(matches!(edit.normalize(400), Err(EditError::Color(_))));
    }

    #[test]
    fn test_rejects_center_outside_canvas() {
        let edit = CircleEdit::new(5000.0, 10.0, 5.0, "#000");
        assert_eq!(
            edit.normalize(400),
            Err(EditError::OutsideCanvas {
                x: 5000.0,
                y: 10.0,
                width: 400
            })
        );
        let edit = CircleEdit::new(10.0, -1.0, 5.0, "#000");
        assert!(matches!(
            edit.normalize(400),
            Err(EditError::OutsideCanvas { .. })
        ));
    }

    #[test]
    fn test_accepts_canvas_edges_and_large_radius() {
        let edit = CircleEdit::new(0.0, 400.0, 1000.0, "#000");
        let Shape::Circle(circle) = edit.normalize(400).unwrap();
        assert_eq!(circle.center, Point::new(0.0, 1.0));
        assert!((circle.radius - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_zero_width() {
        let edit = CircleEdit::new(0.0, 0.0, 1.0, "#000");
        assert_eq!(edit.normalize(0), Err(EditError::ZeroWidth));
    }
}
