//! Coverage rasterizers.
//!
//! Both rasterizers produce one [`SpanRow`] per pixel row through the
//! [`RowCoverage`] trait. The spans of a row cover the clip box's columns
//! exactly once, left to right.
//!
//! - [`PolySpan`] computes exact area coverage (antialiasing). Edges are
//!   split into per-cell pieces at pixel boundaries; each cell records the
//!   signed height of the edge pieces inside it (`cover`) and the part of
//!   that height lying right of the edge (`area`). Sweeping a row from left
//!   to right, the accumulated cover is the fractional winding of the pixels
//!   after a cell.
//! - [`PointSampler`] samples each pixel centre (no antialiasing).

use crate::basics::{ifloor, RectI};
use crate::intersector::{Crossing, Intersector};
use crate::render_desc::PixelTransform;
use crate::winding::{resolve, resolve_coverage, WindingStyle};

// ============================================================================
// CoverageSpan / SpanRow
// ============================================================================

/// `len` columns starting at `x` sharing one coverage value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageSpan {
    pub x: i32,
    pub len: u32,
    pub cover: f64,
}

/// The spans of one pixel row. Adjacent spans with equal coverage merge.
#[derive(Debug, Clone, Default)]
pub struct SpanRow {
    y: i32,
    spans: Vec<CoverageSpan>,
}

impl SpanRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, y: i32) {
        self.y = y;
        self.spans.clear();
    }

    pub fn push(&mut self, x: i32, len: u32, cover: f64) {
        if len == 0 {
            return;
        }
        if let Some(last) = self.spans.last_mut() {
            if last.cover == cover && last.x + last.len as i32 == x {
                last.len += len;
                return;
            }
        }
        self.spans.push(CoverageSpan { x, len, cover });
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn spans(&self) -> &[CoverageSpan] {
        &self.spans
    }

    /// Coverage summed over every column of the row.
    pub fn total_coverage(&self) -> f64 {
        self.spans.iter().map(|s| s.cover * s.len as f64).sum()
    }

    /// Coverage of column `x`, or `None` if no span covers it.
    pub fn cover_at(&self, x: i32) -> Option<f64> {
        self.spans
            .iter()
            .find(|s| x >= s.x && x < s.x + s.len as i32)
            .map(|s| s.cover)
    }
}

/// A source of per-row coverage.
pub trait RowCoverage {
    /// Fill `out` with the spans of pixel row `y`.
    fn row(&mut self, y: i32, out: &mut SpanRow);
}

// ============================================================================
// PolySpan
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    x: i32,
    y: i32,
    cover: f64,
    area: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct SortedRow {
    start: u32,
    num: u32,
}

/// Exact-area coverage accumulator.
pub struct PolySpan {
    clip: RectI,
    style: WindingStyle,
    invert: bool,
    cells: Vec<Cell>,
    curr_cell: Option<Cell>,
    sorted_cells: Vec<u32>,
    sorted_rows: Vec<SortedRow>,
    ts: Vec<f64>,
}

impl PolySpan {
    /// Rasterize every edge of `intersector` mapped through `transform`,
    /// keeping only what affects the pixels of `clip`.
    pub fn new(
        intersector: &Intersector,
        transform: &PixelTransform,
        clip: RectI,
        style: WindingStyle,
        invert: bool,
    ) -> Self {
        let mut ps = Self {
            clip,
            style,
            invert,
            cells: Vec::new(),
            curr_cell: None,
            sorted_cells: Vec::new(),
            sorted_rows: Vec::new(),
            ts: Vec::new(),
        };
        if !clip.is_empty() {
            for e in intersector.edges() {
                let (a, b) = e.segment();
                let a = transform.to_pixel(&a);
                let b = transform.to_pixel(&b);
                ps.line(a.x, a.y, b.x, b.y);
            }
        }
        ps.sort_cells();
        ps
    }

    pub fn clip(&self) -> RectI {
        self.clip
    }

    /// Number of distinct cells recorded.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Add a pixel-space segment, split at every row and column boundary.
    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        let dx = x1 - x0;
        let dy = y1 - y0;
        if dy == 0.0 || !(dx.is_finite() && dy.is_finite()) {
            return;
        }

        // Restrict to the clip rows
        let cy1 = self.clip.y1 as f64;
        let cy2 = self.clip.y2 as f64;
        let (mut t0, mut t1) = ((cy1 - y0) / dy, (cy2 - y0) / dy);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        let t0 = t0.max(0.0);
        let t1 = t1.min(1.0);
        if t0 >= t1 {
            return;
        }

        self.ts.clear();
        self.ts.push(t0);
        self.ts.push(t1);

        let ya = y0 + t0 * dy;
        let yb = y0 + t1 * dy;
        let (ylo, yhi) = if ya < yb { (ya, yb) } else { (yb, ya) };
        let mut k = ylo.floor() + 1.0;
        while k < yhi {
            self.ts.push((k - y0) / dy);
            k += 1.0;
        }

        if dx != 0.0 {
            let xa = x0 + t0 * dx;
            let xb = x0 + t1 * dx;
            let (xlo, xhi) = if xa < xb { (xa, xb) } else { (xb, xa) };
            let xlo = xlo.max(self.clip.x1 as f64 - 1.0);
            let xhi = xhi.min(self.clip.x2 as f64 + 1.0);
            let mut k = xlo.floor() + 1.0;
            while k < xhi {
                self.ts.push((k - x0) / dx);
                k += 1.0;
            }
        }

        self.ts.sort_unstable_by(f64::total_cmp);

        let cx1 = self.clip.x1;
        let cx2 = self.clip.x2;
        for i in 1..self.ts.len() {
            let ta = self.ts[i - 1];
            let tb = self.ts[i];
            if tb <= ta {
                continue;
            }
            let pya = y0 + ta * dy;
            let pyb = y0 + tb * dy;
            let piece_dy = pyb - pya;
            let mx = x0 + (ta + tb) * 0.5 * dx;
            let my = (pya + pyb) * 0.5;
            let cy = ifloor(my);
            if cy < self.clip.y1 || cy >= self.clip.y2 || mx >= cx2 as f64 {
                continue;
            }
            if mx < cx1 as f64 {
                // Left of the clip box: a vertical edge on its left border
                self.add_cell(cx1, cy, piece_dy, 0.0);
            } else {
                let cx = ifloor(mx);
                let frac = (mx - cx as f64).clamp(0.0, 1.0);
                self.add_cell(cx, cy, piece_dy, piece_dy * frac);
            }
        }
    }

    #[inline]
    fn add_cell(&mut self, x: i32, y: i32, cover: f64, area: f64) {
        match self.curr_cell {
            Some(ref mut c) if c.x == x && c.y == y => {
                c.cover += cover;
                c.area += area;
            }
            _ => {
                self.add_curr_cell();
                self.curr_cell = Some(Cell { x, y, cover, area });
            }
        }
    }

    #[inline]
    fn add_curr_cell(&mut self) {
        if let Some(c) = self.curr_cell.take() {
            if c.cover != 0.0 || c.area != 0.0 {
                self.cells.push(c);
            }
        }
    }

    /// Sort cells by row then column (histogram, prefix sum, fill; then a
    /// per-row sort by x).
    fn sort_cells(&mut self) {
        self.add_curr_cell();
        if self.cells.is_empty() {
            return;
        }

        let rows = self.clip.height() as usize;
        self.sorted_rows = vec![SortedRow::default(); rows];
        self.sorted_cells = vec![0; self.cells.len()];

        // Pass 1: count cells per row
        for cell in &self.cells {
            self.sorted_rows[(cell.y - self.clip.y1) as usize].start += 1;
        }

        // Convert counts to starting indices
        let mut start = 0u32;
        for sr in &mut self.sorted_rows {
            let count = sr.start;
            sr.start = start;
            start += count;
        }

        // Pass 2: fill
        for (i, cell) in self.cells.iter().enumerate() {
            let sr = &mut self.sorted_rows[(cell.y - self.clip.y1) as usize];
            self.sorted_cells[(sr.start + sr.num) as usize] = i as u32;
            sr.num += 1;
        }

        // Pass 3: sort each row by x
        let cells = &self.cells;
        for sr in &self.sorted_rows {
            if sr.num > 1 {
                let slice =
                    &mut self.sorted_cells[sr.start as usize..(sr.start + sr.num) as usize];
                slice.sort_by_key(|&idx| cells[idx as usize].x);
            }
        }
    }
}

impl RowCoverage for PolySpan {
    fn row(&mut self, y: i32, out: &mut SpanRow) {
        out.reset(y);
        let x1 = self.clip.x1;
        let x2 = self.clip.x2;
        if x1 >= x2 {
            return;
        }
        let empty = resolve_coverage(0.0, self.style, self.invert);
        if y < self.clip.y1 || y >= self.clip.y2 || self.sorted_rows.is_empty() {
            out.push(x1, (x2 - x1) as u32, empty);
            return;
        }

        let sr = self.sorted_rows[(y - self.clip.y1) as usize];
        let indices = &self.sorted_cells[sr.start as usize..(sr.start + sr.num) as usize];

        let mut acc = 0.0;
        let mut x = x1;
        let mut i = 0;
        while i < indices.len() {
            let cx = self.cells[indices[i] as usize].x;
            let mut cover = 0.0;
            let mut area = 0.0;
            while i < indices.len() && self.cells[indices[i] as usize].x == cx {
                let c = &self.cells[indices[i] as usize];
                cover += c.cover;
                area += c.area;
                i += 1;
            }
            if cx > x {
                out.push(x, (cx - x) as u32, resolve_coverage(acc, self.style, self.invert));
            }
            out.push(
                cx,
                1,
                resolve_coverage(acc + cover - area, self.style, self.invert),
            );
            acc += cover;
            x = cx + 1;
        }
        if x < x2 {
            out.push(x, (x2 - x) as u32, resolve_coverage(acc, self.style, self.invert));
        }
    }
}

// ============================================================================
// PointSampler
// ============================================================================

/// Pixel-centre sampler: every pixel is either fully inside or outside,
/// decided by the same crossing predicate as `Intersector::winding_at`.
pub struct PointSampler<'a> {
    intersector: &'a Intersector,
    transform: PixelTransform,
    clip: RectI,
    style: WindingStyle,
    invert: bool,
    crossings: Vec<Crossing>,
    inside: Vec<bool>,
}

impl<'a> PointSampler<'a> {
    pub fn new(
        intersector: &'a Intersector,
        transform: PixelTransform,
        clip: RectI,
        style: WindingStyle,
        invert: bool,
    ) -> Self {
        Self {
            intersector,
            transform,
            clip,
            style,
            invert,
            crossings: Vec::new(),
            inside: Vec::new(),
        }
    }
}

impl RowCoverage for PointSampler<'_> {
    fn row(&mut self, y: i32, out: &mut SpanRow) {
        out.reset(y);
        let x1 = self.clip.x1;
        let x2 = self.clip.x2;
        if x1 >= x2 {
            return;
        }
        let wy = self.transform.to_world(0.0, y as f64 + 0.5).y;
        self.intersector.crossings(wy, &mut self.crossings);

        let n = (x2 - x1) as usize;
        self.inside.clear();
        self.inside.resize(n, false);

        // Walk columns in increasing world x so the crossing cursor only
        // moves forward.
        let forward = self.transform.pw.x >= 0.0;
        let mut winding = 0;
        let mut ci = 0;
        for k in 0..n {
            let col = if forward { k } else { n - 1 - k };
            let wx = self.transform.to_world((x1 + col as i32) as f64 + 0.5, 0.0).x;
            while ci < self.crossings.len() && self.crossings[ci].x <= wx {
                winding += self.crossings[ci].dir;
                ci += 1;
            }
            self.inside[col] = resolve(winding, self.style, self.invert);
        }

        for (k, &inside) in self.inside.iter().enumerate() {
            out.push(x1 + k as i32, 1, if inside { 1.0 } else { 0.0 });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
