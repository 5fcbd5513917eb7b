//! Feather: soft-edge falloff applied to a coverage grid.
//!
//! Coverage for the render region grown by the feather radius is collected
//! into a [`CoverageGrid`] and filtered with one of the [`BlurType`]
//! kernels. Samples outside the grid clamp to the nearest edge value.
//!
//! - Box: flat window sums from prefix sums, one pass per axis
//! - FastGaussian: stack blur (tent kernel), one pass per axis
//! - Gaussian: recursive (IIR) gaussian, one pass per axis
//! - Cross: a horizontal and a vertical window sum combined
//! - Disc: one window sum per row of the elliptical footprint
//!
//! All but the disc cost a constant amount per pixel whatever the radius;
//! the disc costs one window sum per kernel row.

use crate::basics::RectI;
use crate::error::ShapeError;
use crate::polyspan::{RowCoverage, SpanRow};

/// Radii below this (in pixels) leave the axis unblurred.
const MIN_RADIUS: f64 = 1e-6;

/// Radii are clamped to this many pixels.
const MAX_RADIUS: f64 = 65536.0;

// ============================================================================
// BlurType
// ============================================================================

/// Feather kernel shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlurType {
    /// Flat square kernel.
    Box,
    /// Tent kernel, a cheap gaussian stand-in.
    #[default]
    FastGaussian,
    /// Horizontal plus vertical line through the centre.
    Cross,
    /// Gaussian with sigma = radius / 3.
    Gaussian,
    /// Flat circular kernel.
    Disc,
}

impl BlurType {
    pub const ALL: [BlurType; 5] = [
        BlurType::Box,
        BlurType::FastGaussian,
        BlurType::Cross,
        BlurType::Gaussian,
        BlurType::Disc,
    ];

    pub fn code(self) -> i32 {
        match self {
            BlurType::Box => 0,
            BlurType::FastGaussian => 1,
            BlurType::Cross => 2,
            BlurType::Gaussian => 3,
            BlurType::Disc => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlurType::Box => "box",
            BlurType::FastGaussian => "fast_gaussian",
            BlurType::Cross => "cross",
            BlurType::Gaussian => "gaussian",
            BlurType::Disc => "disc",
        }
    }

    /// True if the kernel factors into a horizontal and a vertical pass.
    pub fn is_separable(self) -> bool {
        matches!(
            self,
            BlurType::Box | BlurType::FastGaussian | BlurType::Gaussian
        )
    }

    /// Unnormalized kernel weight at offset (dx, dy) for `radius`.
    pub fn weight(self, dx: f64, dy: f64, radius: f64) -> f64 {
        if radius <= 0.0 {
            return if dx == 0.0 && dy == 0.0 { 1.0 } else { 0.0 };
        }
        match self {
            BlurType::Box => {
                if dx.abs() <= radius && dy.abs() <= radius {
                    1.0
                } else {
                    0.0
                }
            }
            BlurType::FastGaussian => {
                let r = radius + 1.0;
                (1.0 - dx.abs() / r).max(0.0) * (1.0 - dy.abs() / r).max(0.0)
            }
            BlurType::Gaussian => {
                if dx.abs() > radius || dy.abs() > radius {
                    return 0.0;
                }
                let sigma = radius / 3.0;
                (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp()
            }
            BlurType::Cross => {
                if (dx == 0.0 && dy.abs() <= radius) || (dy == 0.0 && dx.abs() <= radius) {
                    1.0
                } else {
                    0.0
                }
            }
            BlurType::Disc => {
                if dx * dx + dy * dy <= radius * radius {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl TryFrom<i32> for BlurType {
    type Error = ShapeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        BlurType::ALL
            .iter()
            .copied()
            .find(|b| b.code() == code)
            .ok_or(ShapeError::UnknownVariant {
                kind: "blur type",
                code,
            })
    }
}

impl std::fmt::Display for BlurType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Line filters
// ============================================================================
//
// Each filter reads one row or column of the grid and writes the filtered
// line, treating samples past either end as copies of the end sample.

/// Half-width in whole pixels of a flat kernel of `radius`.
#[inline]
fn half_width(radius: f64) -> usize {
    (radius + 1e-9).floor() as usize
}

/// `prefix[i]` is the sum of `src[..i]`.
fn prefix_sums(src: &[f64], prefix: &mut Vec<f64>) {
    prefix.clear();
    prefix.push(0.0);
    let mut acc = 0.0;
    for &v in src {
        acc += v;
        prefix.push(acc);
    }
}

/// Sum of `src[lo..=hi]`, indices past either end clamped to it.
fn window_sum(src: &[f64], prefix: &[f64], lo: i64, hi: i64) -> f64 {
    let n = src.len() as i64;
    let mut sum = 0.0;
    if lo < 0 {
        sum += src[0] * (hi.min(-1) - lo + 1) as f64;
    }
    if hi >= n {
        sum += src[src.len() - 1] * (hi - lo.max(n) + 1) as f64;
    }
    let a = lo.max(0);
    let b = hi.min(n - 1);
    if a <= b {
        sum += prefix[(b + 1) as usize] - prefix[a as usize];
    }
    sum
}

/// Unnormalized flat window of `2 * half + 1` samples.
fn window_line(src: &[f64], half: usize, prefix: &mut Vec<f64>, out: &mut [f64]) {
    prefix_sums(src, prefix);
    let h = half as i64;
    for (x, o) in out.iter_mut().enumerate() {
        let x = x as i64;
        *o = window_sum(src, prefix, x - h, x + h);
    }
}

/// Stack blur: tent weights `radius + 1 - |i|`, normalized.
fn stack_line(src: &[f64], radius: usize, stack: &mut Vec<f64>, out: &mut [f64]) {
    let wm = src.len() - 1;
    let div = radius * 2 + 1;
    let norm = 1.0 / ((radius + 1) * (radius + 1)) as f64;
    stack.clear();
    stack.resize(div, 0.0);

    let mut sum = 0.0;
    let mut sum_in = 0.0;
    let mut sum_out = 0.0;

    // Initialize with first pixel (edge extension)
    for (i, slot) in stack.iter_mut().take(radius + 1).enumerate() {
        *slot = src[0];
        sum += src[0] * (i + 1) as f64;
        sum_out += src[0];
    }
    for i in 1..=radius {
        let p = src[i.min(wm)];
        stack[i + radius] = p;
        sum += p * (radius + 1 - i) as f64;
        sum_in += p;
    }

    let mut stack_ptr = radius;
    let mut xp = radius.min(wm);
    for o in out.iter_mut() {
        *o = sum * norm;
        sum -= sum_out;

        let mut stack_start = stack_ptr + div - radius;
        if stack_start >= div {
            stack_start -= div;
        }
        sum_out -= stack[stack_start];

        if xp < wm {
            xp += 1;
        }
        let p = src[xp];
        stack[stack_start] = p;
        sum_in += p;
        sum += sum_in;

        stack_ptr += 1;
        if stack_ptr >= div {
            stack_ptr = 0;
        }
        let q = stack[stack_ptr];
        sum_out += q;
        sum_in -= q;
    }
}

/// Young-van Vliet recursive gaussian coefficients.
#[derive(Debug, Clone, Copy)]
struct RecursiveGaussian {
    b: f64,
    b1: f64,
    b2: f64,
    b3: f64,
}

impl RecursiveGaussian {
    /// Sigmas below this leave the line unchanged.
    const MIN_SIGMA: f64 = 0.31;

    fn new(sigma: f64) -> Option<Self> {
        if sigma < Self::MIN_SIGMA {
            return None;
        }
        let q = if sigma < 2.5 {
            3.97156 - 4.14554 * (1.0 - 0.26891 * sigma).sqrt()
        } else {
            0.98711 * sigma - 0.96330
        };
        let q2 = q * q;
        let q3 = q2 * q;

        let b0 = 1.0 / (1.578250 + 2.444130 * q + 1.428100 * q2 + 0.422205 * q3);
        let b1 = 2.44413 * q + 2.85619 * q2 + 1.26661 * q3;
        let b2 = -1.42810 * q2 - 1.26661 * q3;
        let b3 = 0.422205 * q3;
        Some(Self {
            b: 1.0 - (b1 + b2 + b3) * b0,
            b1: b1 * b0,
            b2: b2 * b0,
            b3: b3 * b0,
        })
    }

    /// Causal pass into `fwd`, then the anti-causal pass into `out`.
    fn apply(&self, src: &[f64], fwd: &mut Vec<f64>, out: &mut [f64]) {
        let w = src.len();
        let wm = w - 1;
        fwd.clear();
        fwd.resize(w, 0.0);

        fwd[0] = src[0];
        for x in 1..w {
            fwd[x] = self.b * src[x]
                + self.b1 * fwd[x - 1]
                + self.b2 * fwd[x.saturating_sub(2)]
                + self.b3 * fwd[x.saturating_sub(3)];
        }

        out[wm] = fwd[wm];
        for x in (0..wm).rev() {
            out[x] = self.b * fwd[x]
                + self.b1 * out[x + 1]
                + self.b2 * out[(x + 2).min(wm)]
                + self.b3 * out[(x + 3).min(wm)];
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

// ============================================================================
// CoverageGrid
// ============================================================================

/// Dense coverage values over a pixel rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageGrid {
    region: RectI,
    data: Vec<f64>,
}

impl CoverageGrid {
    /// Collect the coverage of every row of `region` from `source`.
    pub fn from_rows<R: RowCoverage + ?Sized>(source: &mut R, region: RectI) -> Self {
        let w = region.width().max(0) as usize;
        let h = region.height().max(0) as usize;
        let mut grid = Self {
            region,
            data: vec![0.0; w * h],
        };
        let mut row = SpanRow::new();
        for (j, y) in (region.y1..region.y2).enumerate() {
            source.row(y, &mut row);
            let line = &mut grid.data[j * w..(j + 1) * w];
            for s in row.spans() {
                let a = (s.x - region.x1).max(0) as usize;
                let b = ((s.x + s.len as i32 - region.x1).max(0) as usize).min(w);
                if a < b {
                    line[a..b].fill(s.cover);
                }
            }
        }
        grid
    }

    pub fn region(&self) -> RectI {
        self.region
    }

    #[inline]
    fn width(&self) -> usize {
        self.region.width().max(0) as usize
    }

    /// Value at pixel (x, y), clamped to the nearest grid position.
    pub fn get(&self, x: i32, y: i32) -> f64 {
        let w = self.width();
        if self.data.is_empty() {
            return 0.0;
        }
        let h = self.data.len() / w;
        let i = (x - self.region.x1).clamp(0, w as i32 - 1) as usize;
        let j = (y - self.region.y1).clamp(0, h as i32 - 1) as usize;
        self.data[j * w + i]
    }

    /// Convolve with `kind` using radii `rx` / `ry` in pixels.
    pub fn feather(&mut self, kind: BlurType, rx: f64, ry: f64) {
        if self.data.is_empty() {
            return;
        }
        let rx = if rx.is_finite() { rx.clamp(0.0, MAX_RADIUS) } else { 0.0 };
        let ry = if ry.is_finite() { ry.clamp(0.0, MAX_RADIUS) } else { 0.0 };
        if rx < MIN_RADIUS && ry < MIN_RADIUS {
            return;
        }
        match kind {
            BlurType::Box => self.box_blur(half_width(rx), half_width(ry)),
            BlurType::FastGaussian => {
                for (axis, r) in [(Axis::X, rx), (Axis::Y, ry)] {
                    if r >= MIN_RADIUS {
                        let radius = (r.round() as usize).max(1);
                        let mut stack = Vec::new();
                        self.for_each_line(axis, |src, out| stack_line(src, radius, &mut stack, out));
                    }
                }
            }
            BlurType::Gaussian => {
                for (axis, r) in [(Axis::X, rx), (Axis::Y, ry)] {
                    if let Some(g) = RecursiveGaussian::new(r / 3.0) {
                        let mut fwd = Vec::new();
                        self.for_each_line(axis, |src, out| g.apply(src, &mut fwd, out));
                    }
                }
            }
            BlurType::Cross => self.cross_blur(half_width(rx), half_width(ry)),
            BlurType::Disc => self.disc_blur(rx, ry),
        }
        for v in &mut self.data {
            *v = v.clamp(0.0, 1.0);
        }
    }

    /// Run `f(line, out)` over every row (`Axis::X`) or column (`Axis::Y`)
    /// and store `out` back in place of the line.
    fn for_each_line<F>(&mut self, axis: Axis, mut f: F)
    where
        F: FnMut(&[f64], &mut [f64]),
    {
        let w = self.width();
        let h = self.data.len() / w;
        let (count, len) = match axis {
            Axis::X => (h, w),
            Axis::Y => (w, h),
        };
        let index = |line: usize, k: usize| match axis {
            Axis::X => line * w + k,
            Axis::Y => k * w + line,
        };
        let mut src = vec![0.0; len];
        let mut out = vec![0.0; len];
        for line in 0..count {
            for (k, v) in src.iter_mut().enumerate() {
                *v = self.data[index(line, k)];
            }
            f(&src, &mut out);
            for (k, &v) in out.iter().enumerate() {
                self.data[index(line, k)] = v;
            }
        }
    }

    /// Unnormalized window sums along `axis`.
    fn window_sums(&mut self, axis: Axis, half: usize) {
        let mut prefix = Vec::new();
        self.for_each_line(axis, |src, out| window_line(src, half, &mut prefix, out));
    }

    fn box_blur(&mut self, hx: usize, hy: usize) {
        self.window_sums(Axis::X, hx);
        self.window_sums(Axis::Y, hy);
        let norm = 1.0 / ((2 * hx + 1) * (2 * hy + 1)) as f64;
        for v in &mut self.data {
            *v *= norm;
        }
    }

    /// Horizontal plus vertical window through each pixel, the centre
    /// counted once.
    fn cross_blur(&mut self, hx: usize, hy: usize) {
        let mut across = self.clone();
        across.window_sums(Axis::X, hx);
        let mut down = self.clone();
        down.window_sums(Axis::Y, hy);
        let norm = 1.0 / (2 * hx + 2 * hy + 1) as f64;
        for ((v, a), d) in self.data.iter_mut().zip(&across.data).zip(&down.data) {
            *v = (a + d - *v) * norm;
        }
    }

    /// Elliptical disc: one window sum per kernel row, from per-row prefix
    /// sums.
    fn disc_blur(&mut self, rx: f64, ry: f64) {
        let w = self.width();
        let h = self.data.len() / w;

        // Row offset and horizontal half-width of each kernel row
        let hy = half_width(ry) as i64;
        let rows: Vec<(i64, i64)> = (-hy..=hy)
            .map(|j| {
                let t = if ry >= MIN_RADIUS { j as f64 / ry } else { 0.0 };
                (j, half_width(rx * (1.0 - t * t).max(0.0).sqrt()) as i64)
            })
            .collect();
        let count: f64 = rows.iter().map(|&(_, hw)| (2 * hw + 1) as f64).sum();

        let src = self.data.clone();
        let mut prefix = Vec::with_capacity(h * (w + 1));
        let mut scratch = Vec::new();
        for line in src.chunks(w) {
            prefix_sums(line, &mut scratch);
            prefix.extend_from_slice(&scratch);
        }

        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for &(j, hw) in &rows {
                    let sy = (y as i64 + j).clamp(0, h as i64 - 1) as usize;
                    let line = &src[sy * w..(sy + 1) * w];
                    let pre = &prefix[sy * (w + 1)..(sy + 1) * (w + 1)];
                    acc += window_sum(line, pre, x as i64 - hw, x as i64 + hw);
                }
                self.data[y * w + x] = acc / count;
            }
        }
    }

    /// Emit the columns `x1..x2` of row `y` as spans.
    pub fn row_into(&self, y: i32, x1: i32, x2: i32, out: &mut SpanRow) {
        out.reset(y);
        for x in x1..x2 {
            out.push(x, 1, self.get(x, y));
        }
    }
}

impl RowCoverage for CoverageGrid {
    fn row(&mut self, y: i32, out: &mut SpanRow) {
        self.row_into(y, self.region.x1, self.region.x2, out);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Half-filled grid: columns < split are 1, others 0.
    struct Step {
        split: i32,
    }

    impl RowCoverage for Step {
        fn row(&mut self, y: i32, out: &mut SpanRow) {
            out.reset(y);
            out.push(0, self.split as u32, 1.0);
            out.push(self.split, (20 - self.split) as u32, 0.0);
        }
    }

    fn step_grid() -> CoverageGrid {
        CoverageGrid::from_rows(&mut Step { split: 10 }, RectI::new(0, 0, 20, 6))
    }

    #[test]
    fn test_codes() {
        for b in BlurType::ALL {
            assert_eq!(BlurType::try_from(b.code()), Ok(b));
        }
        assert!(BlurType::try_from(5).is_err());
        assert_eq!(BlurType::default(), BlurType::FastGaussian);
    }

    #[test]
    fn test_weight_shapes() {
        assert_eq!(BlurType::Disc.weight(3.0, 0.0, 3.0), 1.0);
        assert_eq!(BlurType::Disc.weight(3.0, 3.0, 3.0), 0.0);
        assert_eq!(BlurType::Box.weight(3.0, 3.0, 3.0), 1.0);
        assert_eq!(BlurType::Cross.weight(1.0, 1.0, 3.0), 0.0);
        assert_eq!(BlurType::Cross.weight(0.0, 2.0, 3.0), 1.0);
        assert!(BlurType::Gaussian.weight(0.0, 0.0, 3.0) > BlurType::Gaussian.weight(1.0, 0.0, 3.0));
    }

    #[test]
    fn test_from_rows() {
        let g = step_grid();
        assert_eq!(g.get(9, 3), 1.0);
        assert_eq!(g.get(10, 3), 0.0);
        // Clamped outside the grid
        assert_eq!(g.get(-4, -4), 1.0);
        assert_eq!(g.get(40, 40), 0.0);
    }

    #[test]
    fn test_feather_softens_edge_all_kernels() {
        for b in BlurType::ALL {
            let mut g = step_grid();
            g.feather(b, 3.0, 3.0);
            let left = g.get(8, 3);
            let right = g.get(11, 3);
            assert!(left < 1.0 && left > 0.5, "{}: {}", b, left);
            assert!(right > 0.0 && right < 0.5, "{}: {}", b, right);
            // Far from the edge nothing changes (the recursive gaussian
            // has an infinite but tiny tail)
            assert!((g.get(1, 3) - 1.0).abs() < 1e-4, "{}", b);
            assert!(g.get(18, 3).abs() < 1e-4, "{}", b);
        }
    }

    #[test]
    fn test_feather_zero_radius_noop() {
        let mut g = step_grid();
        let before = g.clone();
        g.feather(BlurType::Gaussian, 0.0, 0.0);
        assert_eq!(g, before);
    }

    /// Direct convolution with `BlurType::weight`, elliptical footprint.
    fn convolve_reference(g: &CoverageGrid, kind: BlurType, rx: f64, ry: f64) -> CoverageGrid {
        let radius = rx.max(ry);
        let (sx, sy) = (radius / rx, radius / ry);
        let (rxi, ryi) = (rx.ceil() as i32, ry.ceil() as i32);
        let mut taps = Vec::new();
        for j in -ryi..=ryi {
            for i in -rxi..=rxi {
                let wt = kind.weight(i as f64 * sx, j as f64 * sy, radius);
                if wt > 0.0 {
                    taps.push((i, j, wt));
                }
            }
        }
        let sum: f64 = taps.iter().map(|t| t.2).sum();
        let mut out = g.clone();
        let r = g.region();
        for y in r.y1..r.y2 {
            for x in r.x1..r.x2 {
                let acc: f64 = taps.iter().map(|&(i, j, wt)| g.get(x + i, y + j) * wt).sum();
                let k = ((y - r.y1) * r.width() + (x - r.x1)) as usize;
                out.data[k] = acc / sum;
            }
        }
        out
    }

    fn pattern_grid() -> CoverageGrid {
        let region = RectI::new(-3, 2, 14, 11);
        let data = (region.y1..region.y2)
            .flat_map(|y| (region.x1..region.x2).map(move |x| ((x * 7 + y * 13).rem_euclid(5)) as f64 / 4.0))
            .collect();
        CoverageGrid { region, data }
    }

    fn assert_grids_close(a: &CoverageGrid, b: &CoverageGrid, tol: f64, what: &str) {
        for (i, (x, y)) in a.data.iter().zip(&b.data).enumerate() {
            assert!((x - y).abs() < tol, "{} at {}: {} vs {}", what, i, x, y);
        }
    }

    #[test]
    fn test_flat_kernels_match_direct_convolution() {
        for (kind, rx, ry) in [
            (BlurType::Box, 2.0, 3.0),
            (BlurType::Box, 4.5, 1.0),
            (BlurType::Cross, 3.0, 2.0),
            (BlurType::Disc, 3.0, 3.0),
            (BlurType::Disc, 4.0, 2.5),
            (BlurType::FastGaussian, 2.0, 2.0),
            (BlurType::FastGaussian, 5.0, 5.0),
        ] {
            let g = pattern_grid();
            let expected = convolve_reference(&g, kind, rx, ry);
            let mut fast = g.clone();
            fast.feather(kind, rx, ry);
            assert_grids_close(&fast, &expected, 1e-9, kind.name());
        }
    }

    #[test]
    fn test_gaussian_symmetric_step() {
        let mut g = step_grid();
        g.feather(BlurType::Gaussian, 6.0, 6.0);
        for x in 0..20 {
            let s = g.get(x, 2) + g.get(19 - x, 2);
            assert!((s - 1.0).abs() < 1e-3, "x {}: {}", x, s);
            if x > 0 {
                assert!(g.get(x, 2) <= g.get(x - 1, 2) + 1e-12);
            }
        }
    }

    #[test]
    fn test_huge_radius_keeps_uniform_grid() {
        for b in BlurType::ALL {
            let region = RectI::new(0, 0, 24, 16);
            let mut g = CoverageGrid {
                region,
                data: vec![0.625; 24 * 16],
            };
            g.feather(b, 1000.0, 700.0);
            for v in &g.data {
                assert!((v - 0.625).abs() < 1e-6, "{}: {}", b, v);
            }
        }
    }

    #[test]
    fn test_huge_radius_step_stays_in_range() {
        for b in BlurType::ALL {
            let mut g = step_grid();
            g.feather(b, 1e4, 1e4);
            for v in &g.data {
                assert!((0.0..=1.0).contains(v), "{}: {}", b, v);
            }
        }
    }

    #[test]
    fn test_row_into() {
        let g = step_grid();
        let mut row = SpanRow::new();
        g.row_into(2, 8, 12, &mut row);
        assert_eq!(row.spans().len(), 2);
        assert_eq!(row.total_coverage(), 2.0);
    }
}
