//! Edge table for winding queries.
//!
//! The `Intersector` is built once from a flattened path and then answers two
//! questions: which edges cross a horizontal scan position (sorted by x), and
//! what the winding count at a point is. Edges are bucketed into horizontal
//! bands so a query only visits edges overlapping the band of its y.
//!
//! Every non-horizontal edge is stored top to bottom with a direction of +1
//! when the recorded vertex order runs toward increasing y and -1 otherwise.
//! An edge crosses scan position y when `y_top <= y < y_bottom`; a crossing
//! at x contributes to the winding of every point with `x >= cx`. This is
//! the upper-left rule: points on left and top edges are inside, points on
//! right and bottom edges are outside.

use crate::basics::{PointD, RectD};
use crate::path_storage::ShapePath;

/// Upper bound on the number of y-bands.
const MAX_BANDS: usize = 1024;

// ============================================================================
// Edge / Crossing
// ============================================================================

/// A directed, non-horizontal edge stored top to bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub x_top: f64,
    pub y_top: f64,
    pub x_bottom: f64,
    pub y_bottom: f64,
    /// +1 if the recorded order runs toward increasing y, -1 otherwise.
    pub dir: i32,
    dxdy: f64,
}

impl Edge {
    fn new(a: PointD, b: PointD) -> Option<Edge> {
        if a.y == b.y {
            return None;
        }
        let (top, bottom, dir) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
        Some(Edge {
            x_top: top.x,
            y_top: top.y,
            x_bottom: bottom.x,
            y_bottom: bottom.y,
            dir,
            dxdy: (bottom.x - top.x) / (bottom.y - top.y),
        })
    }

    /// Whether the edge crosses scan position `y`.
    #[inline]
    pub fn spans(&self, y: f64) -> bool {
        self.y_top <= y && y < self.y_bottom
    }

    /// X coordinate of the edge at scan position `y`.
    #[inline]
    pub fn x_at(&self, y: f64) -> f64 {
        self.x_top + (y - self.y_top) * self.dxdy
    }

    /// End points in recorded order.
    #[inline]
    pub fn segment(&self) -> (PointD, PointD) {
        let top = PointD::new(self.x_top, self.y_top);
        let bottom = PointD::new(self.x_bottom, self.y_bottom);
        if self.dir > 0 {
            (top, bottom)
        } else {
            (bottom, top)
        }
    }
}

/// An edge crossing on one scan position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub x: f64,
    pub dir: i32,
}

/// The inputs an intersector was built from. A cached intersector is valid
/// while its key matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectorKey {
    pub version: u64,
    pub origin: PointD,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Band {
    start: u32,
    num: u32,
}

// ============================================================================
// Intersector
// ============================================================================

/// Immutable edge table with a y-band index.
#[derive(Debug, Clone)]
pub struct Intersector {
    key: IntersectorKey,
    edges: Vec<Edge>,
    bounds: Option<RectD>,
    band_min: f64,
    band_height: f64,
    bands: Vec<Band>,
    band_edges: Vec<u32>,
}

impl Intersector {
    /// Flatten `path` translated by `origin` with approximation `scale` and
    /// build the edge table.
    pub fn build(path: &ShapePath, origin: PointD, scale: f64) -> Self {
        let key = IntersectorKey {
            version: path.version(),
            origin,
            scale,
        };
        let it = Self::from_polylines(&path.flatten(origin, scale), key);
        tracing::debug!(
            edges = it.edges.len(),
            bands = it.bands.len(),
            scale,
            "built intersector"
        );
        it
    }

    /// Build from implicitly closed polylines. Non-finite vertices and the
    /// segments touching them are ignored.
    pub fn from_polylines(polys: &[Vec<PointD>], key: IntersectorKey) -> Self {
        let mut edges = Vec::new();
        let mut bounds: Option<RectD> = None;

        for poly in polys {
            for (i, a) in poly.iter().enumerate() {
                if !a.is_finite() {
                    continue;
                }
                match bounds {
                    Some(ref mut r) => r.expand_to(a.x, a.y),
                    None => bounds = Some(RectD::new(a.x, a.y, a.x, a.y)),
                }
                let b = poly[(i + 1) % poly.len()];
                if !b.is_finite() {
                    continue;
                }
                if let Some(e) = Edge::new(*a, b) {
                    edges.push(e);
                }
            }
        }

        let mut it = Self {
            key,
            edges,
            bounds,
            band_min: 0.0,
            band_height: 1.0,
            bands: Vec::new(),
            band_edges: Vec::new(),
        };
        it.build_bands();
        it
    }

    fn build_bands(&mut self) {
        if self.edges.is_empty() {
            return;
        }
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;
        for e in &self.edges {
            min_y = min_y.min(e.y_top);
            max_y = max_y.max(e.y_bottom);
        }

        let n = self.edges.len().clamp(1, MAX_BANDS);
        self.band_min = min_y;
        self.band_height = (max_y - min_y) / n as f64;
        self.bands = vec![Band::default(); n];

        // Pass 1: count edges per band
        for i in 0..self.edges.len() {
            let (b0, b1) = self.band_range(&self.edges[i]);
            for b in &mut self.bands[b0..=b1] {
                b.start += 1;
            }
        }

        // Convert counts to starting indices
        let mut start = 0u32;
        for b in &mut self.bands {
            let count = b.start;
            b.start = start;
            start += count;
        }

        // Pass 2: fill each band's slice with edge indices
        self.band_edges = vec![0; start as usize];
        for i in 0..self.edges.len() {
            let (b0, b1) = self.band_range(&self.edges[i]);
            for b in &mut self.bands[b0..=b1] {
                self.band_edges[(b.start + b.num) as usize] = i as u32;
                b.num += 1;
            }
        }
    }

    #[inline]
    fn band_of(&self, y: f64) -> usize {
        let n = self.bands.len();
        if self.band_height <= 0.0 {
            return 0;
        }
        let b = ((y - self.band_min) / self.band_height).floor();
        if b <= 0.0 {
            0
        } else {
            (b as usize).min(n - 1)
        }
    }

    #[inline]
    fn band_range(&self, e: &Edge) -> (usize, usize) {
        (self.band_of(e.y_top), self.band_of(e.y_bottom))
    }

    fn band_edges_at(&self, y: f64) -> impl Iterator<Item = &Edge> + '_ {
        let slice: &[u32] = match self.bands.get(self.band_of(y)) {
            Some(b) if !self.edges.is_empty() => {
                &self.band_edges[b.start as usize..(b.start + b.num) as usize]
            }
            _ => &[],
        };
        slice
            .iter()
            .map(move |&i| &self.edges[i as usize])
            .filter(move |e| e.spans(y))
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Fill `out` with the crossings at scan position `y`, sorted by x.
    pub fn crossings(&self, y: f64, out: &mut Vec<Crossing>) {
        out.clear();
        out.extend(self.band_edges_at(y).map(|e| Crossing {
            x: e.x_at(y),
            dir: e.dir,
        }));
        out.sort_unstable_by(|a, b| a.x.total_cmp(&b.x));
    }

    /// Signed winding count at (x, y).
    pub fn winding_at(&self, x: f64, y: f64) -> i32 {
        self.band_edges_at(y)
            .filter(|e| e.x_at(y) <= x)
            .map(|e| e.dir)
            .sum()
    }

    /// Exact extents of the flattened vertices, or `None` for no geometry.
    pub fn bounds(&self) -> Option<RectD> {
        self.bounds
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// True when there are no non-horizontal edges (nothing can be inside).
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn key(&self) -> IntersectorKey {
        self.key
    }
}

// ============================================================================
// Tests
// ============================================================================
