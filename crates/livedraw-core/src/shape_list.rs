//! Append-only list of shapes in paint order.

use crate::shapes::Shape;
use serde::{Deserialize, Serialize};

/// Ordered shapes of one drawing, back to front.
///
/// Shapes are only ever appended. The length doubles as the drawing's
/// generation: a frame rendered from the first `n` shapes has generation `n`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeList {
    shapes: Vec<Shape>,
}

impl ShapeList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a shape on top of the others. Returns the new length.
    pub fn push(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn last(&self) -> Option<&Shape> {
        self.shapes.last()
    }

    /// Shapes in paint order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    pub fn as_slice(&self) -> &[Shape] {
        &self.shapes
    }
}

impl<'a> IntoIterator for &'a ShapeList {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, SerializableColor};
    use kurbo::Point;

    fn circle(x: f64) -> Shape {
        Circle::new(Point::new(x, 0.5), 0.1, SerializableColor::black()).into()
    }

    #[test]
    fn test_push_returns_length() {
        let mut list = ShapeList::new();
        assert!(list.is_empty());
        assert_eq!(list.push(circle(0.1)), 1);
        assert_eq!(list.push(circle(0.2)), 2);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_paint_order_is_insertion_order() {
        let mut list = ShapeList::new();
        list.push(circle(0.1));
        list.push(circle(0.2));
        list.push(circle(0.3));

        let xs: Vec<f64> = list
            .iter()
            .map(|Shape::Circle(circle)| circle.center.x)
            .collect();
        assert_eq!(xs.len(), 3);
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(list.last(), Some(&circle(0.3)));
    }
}
