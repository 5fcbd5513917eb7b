//! Foundation types, constants, and rounding utilities.
//!
//! Points and rectangles that every other module depends on.

// ============================================================================
// Rounding
// ============================================================================

/// Floor a double to the nearest integer toward negative infinity,
/// saturating at the `i32` range.
#[inline]
pub fn ifloor(v: f64) -> i32 {
    let i = v as i32;
    i.saturating_sub((i as f64 > v) as i32)
}

// ============================================================================
// Coverage
// ============================================================================

/// Coverage this close to 0 or 1 is snapped to it.
pub const COVER_EPSILON: f64 = 1e-9;

// ============================================================================
// Point
// ============================================================================

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointBase<T: Copy> {
    pub x: T,
    pub y: T,
}

impl<T: Copy> PointBase<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

pub type PointI = PointBase<i32>;
pub type PointD = PointBase<f64>;

impl PointD {
    /// Reflect `self` through `center` (the smooth-tangent construction).
    #[inline]
    pub fn reflect_through(&self, center: &PointD) -> PointD {
        PointD::new(center.x + center.x - self.x, center.y + center.y - self.y)
    }

    #[inline]
    pub fn offset(&self, d: &PointD) -> PointD {
        PointD::new(self.x + d.x, self.y + d.y)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ============================================================================
// Rect
// ============================================================================

/// A rectangle defined by two corner points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect<T: Copy> {
    pub x1: T,
    pub y1: T,
    pub x2: T,
    pub y2: T,
}

impl<T: Copy + PartialOrd> Rect<T> {
    pub fn new(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Normalize so that x1 <= x2 and y1 <= y2, swapping if needed.
    pub fn normalize(&mut self) -> &Self {
        if self.x1 > self.x2 {
            core::mem::swap(&mut self.x1, &mut self.x2);
        }
        if self.y1 > self.y2 {
            core::mem::swap(&mut self.y1, &mut self.y2);
        }
        self
    }

    /// Clip this rectangle to the intersection with `r`.
    /// Returns `true` if the result is a valid (non-empty) rectangle.
    pub fn clip(&mut self, r: &Self) -> bool {
        if self.x2 > r.x2 {
            self.x2 = r.x2;
        }
        if self.y2 > r.y2 {
            self.y2 = r.y2;
        }
        if self.x1 < r.x1 {
            self.x1 = r.x1;
        }
        if self.y1 < r.y1 {
            self.y1 = r.y1;
        }
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Returns `true` if the rectangle is valid (x1 <= x2, y1 <= y2).
    pub fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Returns `true` if the point (x, y) is inside the rectangle (inclusive).
    pub fn hit_test(&self, x: T, y: T) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// Grow this rectangle to include the point (x, y).
    pub fn expand_to(&mut self, x: T, y: T) {
        if x < self.x1 {
            self.x1 = x;
        }
        if y < self.y1 {
            self.y1 = y;
        }
        if x > self.x2 {
            self.x2 = x;
        }
        if y > self.y2 {
            self.y2 = y;
        }
    }
}

/// Rectangle with `i32` coordinates.
///
/// Pixel rectangles are half-open: columns `x1..x2`, rows `y1..y2`.
pub type RectI = Rect<i32>;
/// Rectangle with `f64` coordinates.
pub type RectD = Rect<f64>;

impl RectI {
    #[inline]
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// A half-open pixel rectangle is empty when it has no columns or rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// The rectangle grown by `dx` columns and `dy` rows on every side.
    pub fn inflate(&self, dx: i32, dy: i32) -> RectI {
        RectI::new(self.x1 - dx, self.y1 - dy, self.x2 + dx, self.y2 + dy)
    }
}

impl RectD {
    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifloor_negative() {
        assert_eq!(ifloor(-0.5), -1);
        assert_eq!(ifloor(-1.0), -1);
        assert_eq!(ifloor(2.999), 2);
        assert_eq!(ifloor(3.0), 3);
    }

    #[test]
    fn test_ifloor_saturates() {
        assert_eq!(ifloor(-1e10), i32::MIN);
        assert_eq!(ifloor(-1e10 - 0.5), i32::MIN);
        assert_eq!(ifloor(1e10), i32::MAX);
    }

    #[test]
    fn test_reflect_through() {
        let c = PointD::new(10.0, 10.0);
        let p = PointD::new(8.0, 5.0);
        assert_eq!(p.reflect_through(&c), PointD::new(12.0, 15.0));
    }

    #[test]
    fn test_rect_clip() {
        let mut r = RectI::new(-5, -5, 20, 8);
        assert!(r.clip(&RectI::new(0, 0, 10, 10)));
        assert_eq!(r, RectI::new(0, 0, 10, 8));

        let mut outside = RectI::new(20, 20, 30, 30);
        outside.clip(&RectI::new(0, 0, 10, 10));
        assert!(outside.is_empty());
    }

    #[test]
    fn test_rect_expand_to() {
        let mut r = RectD::new(0.0, 0.0, 0.0, 0.0);
        r.expand_to(-3.0, 4.0);
        r.expand_to(2.0, -1.0);
        assert_eq!(r, RectD::new(-3.0, -1.0, 2.0, 4.0));
    }

    #[test]
    fn test_rect_inflate() {
        let r = RectI::new(2, 3, 5, 7).inflate(1, 2);
        assert_eq!(r, RectI::new(1, 1, 6, 9));
        assert_eq!(r.width(), 5);
        assert_eq!(r.height(), 8);
    }
}
