//! Circle shape.

use super::SerializableColor;
use kurbo::{Ellipse, Point};
use serde::{Deserialize, Serialize};

/// A filled circle in normalized space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center point, as a fraction of the canvas size.
    pub center: Point,
    /// Radius, as a fraction of the canvas width.
    pub radius: f64,
    /// Fill color.
    pub color: SerializableColor,
}

impl Circle {
    /// Create a new circle.
    pub fn new(center: Point, radius: f64, color: SerializableColor) -> Self {
        Self {
            center,
            radius,
            color,
        }
    }

    /// Multiply position and radius by a single scale factor.
    ///
    /// Used to move pixel coordinates into normalized space (`scale = 1 / width`).
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            center: Point::new(self.center.x * scale, self.center.y * scale),
            radius: self.radius * scale,
            color: self.color,
        }
    }

    /// Pixel-space ellipse for a `width` x `height` target.
    pub fn to_pixels(&self, width: f64, height: f64) -> Ellipse {
        Ellipse::new(
            Point::new(self.center.x * width, self.center.y * height),
            (self.radius * width, self.radius * height),
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_creation() {
        let circle = Circle::new(Point::new(0.5, 0.5), 0.1, SerializableColor::black());
        assert!((circle.center.x - 0.5).abs() < f64::EPSILON);
        assert!((circle.radius - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scaled() {
        let circle = Circle::new(Point::new(100.0, 100.0), 20.0, SerializableColor::black());
        let normalized = circle.scaled(1.0 / 400.0);
        assert!((normalized.center.x - 0.25).abs() < 1e-12);
        assert!((normalized.center.y - 0.25).abs() < 1e-12);
        assert!((normalized.radius - 0.05).abs() < 1e-12);
        assert_eq!(normalized.color, circle.color);
    }

    #[test]
    fn test_to_pixels_stretches_non_square() {
        let circle = Circle::new(Point::new(0.5, 0.25), 0.1, SerializableColor::black());
        let ellipse = circle.to_pixels(200.0, 100.0);
        assert!((ellipse.center().x - 100.0).abs() < 1e-9);
        assert!((ellipse.center().y - 25.0).abs() < 1e-9);
        let radii = ellipse.radii();
        assert!((radii.x.max(radii.y) - 20.0).abs() < 1e-9);
        assert!((radii.x.min(radii.y) - 10.0).abs() < 1e-9);
    }
}
