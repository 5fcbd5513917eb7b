//! Bezier curve flattening (quadratic and cubic).
//!
//! Recursive de Casteljau subdivision: a curve is split at t = 0.5 until
//! each piece is flat enough to be replaced by a straight edge, with the
//! distance tolerance derived from the approximation scale (pixels per
//! world unit). Subdivision depth is capped at [`CURVE_RECURSION_LIMIT`].
//!
//! Both entry points append the points *after* the start point to `out`.
//! The last appended point is always exactly the curve's end point and no
//! two consecutive points coincide. A curve with a non-finite point is
//! replaced by its chord.

use crate::basics::PointD;
use crate::math::{calc_sq_distance, points_coincide};

// ============================================================================
// Constants
// ============================================================================

const CURVE_COLLINEARITY_EPSILON: f64 = 1e-30;

/// Maximum subdivision depth.
pub const CURVE_RECURSION_LIMIT: u32 = 32;

/// Flatten the quadratic Bezier `p0, p1, p2`.
pub fn flatten_conic(p0: PointD, p1: PointD, p2: PointD, scale: f64, out: &mut Vec<PointD>) {
    let mut f = Flattener::new(p0, scale, out);
    if !(p0.is_finite() && p1.is_finite() && p2.is_finite()) {
        f.finish(p2, "conic");
        return;
    }
    f.recursive_conic(p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, 0);
    f.finish(p2, "conic");
}

/// Flatten the cubic Bezier `p0, p1, p2, p3`.
pub fn flatten_cubic(
    p0: PointD,
    p1: PointD,
    p2: PointD,
    p3: PointD,
    scale: f64,
    out: &mut Vec<PointD>,
) {
    let mut f = Flattener::new(p0, scale, out);
    if !(p0.is_finite() && p1.is_finite() && p2.is_finite() && p3.is_finite()) {
        f.finish(p3, "cubic");
        return;
    }
    f.recursive_cubic(p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, p3.x, p3.y, 0);
    f.finish(p3, "cubic");
}

/// Squared distance tolerance for an approximation scale.
///
/// Non-positive or non-finite scales fall back to 1.
#[inline]
pub fn distance_tolerance_square(scale: f64) -> f64 {
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    let d = 0.5 / scale;
    d * d
}

// ============================================================================
// Flattener
// ============================================================================

struct Flattener<'a> {
    distance_tolerance_square: f64,
    limit: u32,
    out: &'a mut Vec<PointD>,
    last: PointD,
    emitted: usize,
    limit_hit: bool,
}

impl<'a> Flattener<'a> {
    fn new(start: PointD, scale: f64, out: &'a mut Vec<PointD>) -> Self {
        Self {
            distance_tolerance_square: distance_tolerance_square(scale),
            limit: CURVE_RECURSION_LIMIT,
            out,
            last: start,
            emitted: 0,
            limit_hit: false,
        }
    }

    #[inline]
    fn push(&mut self, x: f64, y: f64) {
        let p = PointD::new(x, y);
        if points_coincide(&p, &self.last) {
            return;
        }
        self.out.push(p);
        self.last = p;
        self.emitted += 1;
    }

    fn finish(self, end: PointD, kind: &str) {
        if points_coincide(&end, &self.last) {
            // Snap the final approximation point onto the exact end point.
            if self.emitted > 0 {
                if let Some(p) = self.out.last_mut() {
                    *p = end;
                }
            }
        } else {
            self.out.push(end);
        }
        if self.limit_hit {
            tracing::warn!(
                kind,
                limit = self.limit,
                "curve subdivision hit the recursion limit"
            );
        }
    }

    // ------------------------------------------------------------------------
    // Quadratic
    // ------------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn recursive_conic(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64, level: u32) {
        if level > self.limit {
            self.limit_hit = true;
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;

        let dx = x3 - x1;
        let dy = y3 - y1;
        let d = ((x2 - x3) * dy - (y2 - y3) * dx).abs();

        if d > CURVE_COLLINEARITY_EPSILON {
            if d * d <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                self.push(x123, y123);
                return;
            }
        } else {
            // Collinear
            let da = dx * dx + dy * dy;
            let d_val = if da == 0.0 {
                calc_sq_distance(x1, y1, x2, y2)
            } else {
                let t = ((x2 - x1) * dx + (y2 - y1) * dy) / da;
                if t > 0.0 && t < 1.0 {
                    // 1---2---3
                    return;
                }
                if t <= 0.0 {
                    calc_sq_distance(x2, y2, x1, y1)
                } else {
                    calc_sq_distance(x2, y2, x3, y3)
                }
            };
            if d_val < self.distance_tolerance_square {
                self.push(x2, y2);
                return;
            }
        }

        self.recursive_conic(x1, y1, x12, y12, x123, y123, level + 1);
        self.recursive_conic(x123, y123, x23, y23, x3, y3, level + 1);
    }

    // ------------------------------------------------------------------------
    // Cubic
    // ------------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn recursive_cubic(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
        x4: f64,
        y4: f64,
        level: u32,
    ) {
        if level > self.limit {
            self.limit_hit = true;
            return;
        }

        let x12 = (x1 + x2) / 2.0;
        let y12 = (y1 + y2) / 2.0;
        let x23 = (x2 + x3) / 2.0;
        let y23 = (y2 + y3) / 2.0;
        let x34 = (x3 + x4) / 2.0;
        let y34 = (y3 + y4) / 2.0;
        let x123 = (x12 + x23) / 2.0;
        let y123 = (y12 + y23) / 2.0;
        let x234 = (x23 + x34) / 2.0;
        let y234 = (y23 + y34) / 2.0;
        let x1234 = (x123 + x234) / 2.0;
        let y1234 = (y123 + y234) / 2.0;

        let dx = x4 - x1;
        let dy = y4 - y1;

        let mut d2 = ((x2 - x4) * dy - (y2 - y4) * dx).abs();
        let mut d3 = ((x3 - x4) * dy - (y3 - y4) * dx).abs();

        let case = ((d2 > CURVE_COLLINEARITY_EPSILON) as u32) << 1
            | (d3 > CURVE_COLLINEARITY_EPSILON) as u32;

        match case {
            0 => {
                // All collinear or p1 == p4
                let k = dx * dx + dy * dy;
                if k == 0.0 {
                    d2 = calc_sq_distance(x1, y1, x2, y2);
                    d3 = calc_sq_distance(x4, y4, x3, y3);
                } else {
                    let k = 1.0 / k;
                    d2 = k * ((x2 - x1) * dx + (y2 - y1) * dy);
                    d3 = k * ((x3 - x1) * dx + (y3 - y1) * dy);
                    if d2 > 0.0 && d2 < 1.0 && d3 > 0.0 && d3 < 1.0 {
                        // 1---2---3---4
                        return;
                    }
                    d2 = project_sq_distance(x2, y2, x1, y1, dx, dy, d2);
                    d3 = project_sq_distance(x3, y3, x1, y1, dx, dy, d3);
                }
                if d2 > d3 {
                    if d2 < self.distance_tolerance_square {
                        self.push(x2, y2);
                        return;
                    }
                } else if d3 < self.distance_tolerance_square {
                    self.push(x3, y3);
                    return;
                }
            }
            1 => {
                // p1, p2, p4 collinear; p3 significant
                if d3 * d3 <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    self.push(x23, y23);
                    return;
                }
            }
            2 => {
                // p1, p3, p4 collinear; p2 significant
                if d2 * d2 <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    self.push(x23, y23);
                    return;
                }
            }
            _ => {
                if (d2 + d3) * (d2 + d3) <= self.distance_tolerance_square * (dx * dx + dy * dy) {
                    self.push(x23, y23);
                    return;
                }
            }
        }

        self.recursive_cubic(x1, y1, x12, y12, x123, y123, x1234, y1234, level + 1);
        self.recursive_cubic(x1234, y1234, x234, y234, x34, y34, x4, y4, level + 1);
    }
}

/// Squared distance from (x, y) to the chord point at parameter `t`,
/// clamped to the chord's end points.
#[inline]
fn project_sq_distance(x: f64, y: f64, x1: f64, y1: f64, dx: f64, dy: f64, t: f64) -> f64 {
    if t <= 0.0 {
        calc_sq_distance(x, y, x1, y1)
    } else if t >= 1.0 {
        calc_sq_distance(x, y, x1 + dx, y1 + dy)
    } else {
        calc_sq_distance(x, y, x1 + t * dx, y1 + t * dy)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::calc_polygon_area;

    fn pt(x: f64, y: f64) -> PointD {
        PointD::new(x, y)
    }

    #[test]
    fn test_conic_endpoint_exact() {
        let mut out = Vec::new();
        flatten_conic(pt(0.0, 0.0), pt(50.0, 100.0), pt(100.0, 0.0), 1.0, &mut out);
        assert!(out.len() > 2);
        assert_eq!(*out.last().unwrap(), pt(100.0, 0.0));
    }

    #[test]
    fn test_conic_points_near_curve() {
        let (p0, p1, p2) = (pt(0.0, 0.0), pt(50.0, 100.0), pt(100.0, 0.0));
        let mut out = Vec::new();
        flatten_conic(p0, p1, p2, 1.0, &mut out);
        // Every emitted point lies on the parabola y = 2x - x^2/50 within tolerance
        for p in &out {
            let y = 2.0 * p.x - p.x * p.x / 50.0;
            assert!((p.y - y).abs() < 1.0, "{:?}", p);
        }
    }

    #[test]
    fn test_conic_more_points_at_higher_scale() {
        let mut coarse = Vec::new();
        let mut fine = Vec::new();
        flatten_conic(pt(0.0, 0.0), pt(50.0, 100.0), pt(100.0, 0.0), 1.0, &mut coarse);
        flatten_conic(pt(0.0, 0.0), pt(50.0, 100.0), pt(100.0, 0.0), 16.0, &mut fine);
        assert!(fine.len() > coarse.len());
    }

    #[test]
    fn test_degenerate_conic_is_line() {
        let mut out = Vec::new();
        flatten_conic(pt(0.0, 0.0), pt(10.0, 5.0), pt(10.0, 5.0), 4.0, &mut out);
        assert_eq!(out, vec![pt(10.0, 5.0)]);

        out.clear();
        flatten_conic(pt(0.0, 0.0), pt(0.0, 0.0), pt(10.0, 5.0), 4.0, &mut out);
        assert_eq!(out, vec![pt(10.0, 5.0)]);
    }

    #[test]
    fn test_zero_length_curves_emit_nothing() {
        let mut out = Vec::new();
        flatten_conic(pt(3.0, 3.0), pt(3.0, 3.0), pt(3.0, 3.0), 1.0, &mut out);
        flatten_cubic(pt(3.0, 3.0), pt(3.0, 3.0), pt(3.0, 3.0), pt(3.0, 3.0), 1.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_cubic_collinear_is_line() {
        let mut out = Vec::new();
        flatten_cubic(
            pt(0.0, 0.0),
            pt(3.0, 0.0),
            pt(6.0, 0.0),
            pt(9.0, 0.0),
            1.0,
            &mut out,
        );
        assert_eq!(out, vec![pt(9.0, 0.0)]);
    }

    #[test]
    fn test_no_consecutive_duplicates() {
        let mut out = vec![pt(0.0, 0.0)];
        flatten_cubic(
            pt(0.0, 0.0),
            pt(0.0, 50.0),
            pt(100.0, 50.0),
            pt(100.0, 0.0),
            8.0,
            &mut out,
        );
        for w in out.windows(2) {
            assert!(!points_coincide(&w[0], &w[1]));
        }
        assert_eq!(*out.last().unwrap(), pt(100.0, 0.0));
    }

    #[test]
    fn test_cubic_circle_quadrant_area() {
        // Quarter circle of radius 100 from cubic approximation
        let k = 0.552_284_749_831 * 100.0;
        let mut poly = vec![pt(0.0, 0.0), pt(100.0, 0.0)];
        flatten_cubic(
            pt(100.0, 0.0),
            pt(100.0, k),
            pt(k, 100.0),
            pt(0.0, 100.0),
            4.0,
            &mut poly,
        );
        let area = calc_polygon_area(&poly).abs();
        let exact = std::f64::consts::PI * 100.0 * 100.0 / 4.0;
        assert!((area - exact).abs() / exact < 0.01, "area {}", area);
    }

    #[test]
    fn test_recursion_limit_still_ends_on_endpoint() {
        let (p0, p1, p2, p3) = (pt(0.0, 0.0), pt(0.0, 1e6), pt(100.0, -1e6), pt(100.0, 0.0));
        let mut out = vec![p0];
        let mut f = Flattener::new(p0, 1e9, &mut out);
        f.limit = 3;
        f.recursive_cubic(p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, p3.x, p3.y, 0);
        assert!(f.limit_hit);
        f.finish(p3, "cubic");
        // At most one point per leaf of a depth-3 tree, plus the end point
        assert!(out.len() <= 1 + 16 + 1, "{}", out.len());
        assert_eq!(*out.last().unwrap(), p3);
        assert!(out.iter().all(|p| p.is_finite()));
        for w in out.windows(2) {
            assert!(!points_coincide(&w[0], &w[1]));
        }
    }

    #[test]
    fn test_conic_recursion_limit() {
        let (p0, p1, p2) = (pt(0.0, 0.0), pt(50.0, 1e6), pt(100.0, 0.0));
        let mut out = Vec::new();
        let mut f = Flattener::new(p0, 1e9, &mut out);
        f.limit = 2;
        f.recursive_conic(p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, 0);
        assert!(f.limit_hit);
        f.finish(p2, "conic");
        assert_eq!(out.last(), Some(&p2));
    }

    #[test]
    fn test_non_finite_curve_is_chord() {
        let mut out = Vec::new();
        flatten_cubic(
            pt(0.0, 0.0),
            pt(f64::NAN, 5.0),
            pt(10.0, f64::INFINITY),
            pt(10.0, 0.0),
            1e6,
            &mut out,
        );
        assert_eq!(out, vec![pt(10.0, 0.0)]);

        out.clear();
        flatten_conic(pt(0.0, 0.0), pt(5.0, f64::NAN), pt(10.0, 0.0), 1.0, &mut out);
        assert_eq!(out, vec![pt(10.0, 0.0)]);
    }

    #[test]
    fn test_bad_scale_falls_back() {
        assert_eq!(distance_tolerance_square(0.0), 0.25);
        assert_eq!(distance_tolerance_square(f64::NAN), 0.25);
        assert_eq!(distance_tolerance_square(2.0), 0.0625);
    }
}
