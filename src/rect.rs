//! Rectangles.

use cgmath::{EuclideanSpace, Point2, Vector2, Zero};
use std::ops;

/// An axis-aligned rectangle in integer units.
///
/// Node bounds are always relative to the owning superview. Width and height are never negative;
/// the constructors clamp them to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Rectangle origin.
    pub origin: Point2<i32>,

    /// Rectangle size.
    pub size: Vector2<i32>,
}

impl Default for Rect {
    fn default() -> Self {
        Rect::zero()
    }
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(origin: Point2<i32>, size: Vector2<i32>) -> Rect {
        Rect {
            origin,
            size: Vector2::new(size.x.max(0), size.y.max(0)),
        }
    }

    /// Creates a new rectangle from its four components.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Rect {
        Rect::new(Point2::new(x, y), Vector2::new(width, height))
    }

    /// Returns a zero-sized rectangle at the origin.
    pub fn zero() -> Rect {
        Rect {
            origin: Point2::new(0, 0),
            size: Vector2::zero(),
        }
    }

    pub fn x(&self) -> i32 {
        self.origin.x
    }

    pub fn y(&self) -> i32 {
        self.origin.y
    }

    pub fn width(&self) -> i32 {
        self.size.x
    }

    pub fn height(&self) -> i32 {
        self.size.y
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i32 {
        self.origin.x + self.size.x
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.y
    }

    /// Returns true if the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    /// Returns true if the point is inside the rectangle.
    pub fn contains(&self, point: Point2<i32>) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.right()
            && point.y < self.bottom()
    }

    /// Returns a new rectangle with the given origin.
    pub fn with_origin(&self, origin: Point2<i32>) -> Rect {
        Rect {
            origin,
            size: self.size,
        }
    }

    /// Returns a new rectangle with the given size.
    pub fn with_size(&self, size: Vector2<i32>) -> Rect {
        Rect::new(self.origin, size)
    }

    /// Converts a point in the owner's coordinate system to this rectangle's local space.
    pub fn to_local(&self, point: Point2<i32>) -> Point2<i32> {
        point - self.origin.to_vec()
    }
}

/// Offsets a rectangle by a point; used to move owner-relative bounds into window space.
impl ops::Add<Point2<i32>> for Rect {
    type Output = Rect;
    fn add(self, point: Point2<i32>) -> Rect {
        Rect {
            origin: self.origin + point.to_vec(),
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_sizes_clamp_to_zero() {
        let rect = Rect::from_xywh(5, 5, -10, 3);
        assert_eq!(rect.width(), 0);
        assert_eq!(rect.height(), 3);
        assert!(rect.is_empty());
    }

    #[test]
    fn contains_is_half_open() {
        let rect = Rect::from_xywh(10, 20, 30, 40);
        assert!(rect.contains(Point2::new(10, 20)));
        assert!(rect.contains(Point2::new(39, 59)));
        assert!(!rect.contains(Point2::new(40, 20)));
        assert!(!rect.contains(Point2::new(10, 60)));
    }

    #[test]
    fn offset_and_local() {
        let rect = Rect::from_xywh(3, 4, 5, 6) + Point2::new(10, 20);
        assert_eq!(rect, Rect::from_xywh(13, 24, 5, 6));
        assert_eq!(rect.to_local(Point2::new(15, 30)), Point2::new(2, 6));
    }
}
