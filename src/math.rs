//! Geometric math utilities.
//!
//! Distances for the flattener and path recorder, and the shoelace polygon
//! area used to check rasterized coverage.

use crate::basics::PointD;

/// Coinciding points maximal distance (epsilon).
pub const VERTEX_DIST_EPSILON: f64 = 1e-14;

/// Euclidean distance between two points.
#[inline]
pub fn calc_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    calc_sq_distance(x1, y1, x2, y2).sqrt()
}

/// Squared Euclidean distance between two points.
#[inline]
pub fn calc_sq_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}

/// Returns `true` if two points are closer than [`VERTEX_DIST_EPSILON`].
#[inline]
pub fn points_coincide(a: &PointD, b: &PointD) -> bool {
    calc_distance(a.x, a.y, b.x, b.y) <= VERTEX_DIST_EPSILON
}

/// Signed area of a closed polygon (shoelace formula).
///
/// The polygon is implicitly closed from the last point back to the first.
/// Positive for counter-clockwise vertex order in a y-up frame.
pub fn calc_polygon_area(points: &[PointD]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut prev = points[points.len() - 1];
    for p in points {
        sum += prev.x * p.y - p.x * prev.y;
        prev = *p;
    }
    sum * 0.5
}
