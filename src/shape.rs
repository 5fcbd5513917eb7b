//! The shape: parameters, path recorder and a lazily built edge table.
//!
//! Rendering runs `Idle -> Building -> Scanning -> Compositing -> Done`.
//! The edge table is rebuilt only when its key (path version, origin,
//! flattening scale) no longer matches; every path mutation and every origin
//! change drops it.

use std::sync::{Arc, Mutex, PoisonError};

use crate::basics::{PointD, RectD, RectI};
use crate::blend::BlendMethod;
use crate::blur::CoverageGrid;
use crate::color::Rgba;
use crate::compositor::composite_row;
use crate::error::Result;
use crate::intersector::Intersector;
use crate::params::{Invalidation, ParamValue, ShapeParams};
use crate::path_storage::ShapePath;
use crate::polyspan::{PointSampler, PolySpan, RowCoverage, SpanRow};
use crate::render_desc::{PixelTransform, Quality, RenderDesc};
use crate::surface::{CoverageMask, Surface};
use crate::winding::resolve;

/// Flattening scale for queries made before any render.
const DEFAULT_QUERY_SCALE: f64 = 64.0;

/// Feather radii are capped at this many pixels.
const MAX_FEATHER_PIXELS: f64 = 1024.0;

/// A filled vector shape.
#[derive(Debug, Default)]
pub struct Shape {
    params: ShapeParams,
    path: ShapePath,
    intersector: Mutex<Option<Arc<Intersector>>>,
}

impl Clone for Shape {
    fn clone(&self) -> Self {
        Self {
            params: self.params,
            path: self.path.clone(),
            intersector: Mutex::new(self.cached()),
        }
    }
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: ShapeParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &ShapeParams {
        &self.params
    }

    pub fn path(&self) -> &ShapePath {
        &self.path
    }

    // ---------------------------------------------------------------
    // Parameters
    // ---------------------------------------------------------------

    /// Set parameter `name`. The value is validated first; on error the
    /// shape is unchanged.
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<Invalidation> {
        match self.params.set(name, value) {
            Ok(Invalidation::Geometry) => {
                self.invalidate();
                Ok(Invalidation::Geometry)
            }
            Ok(inv) => Ok(inv),
            Err(e) => {
                tracing::debug!(param = name, error = %e, "rejected parameter");
                Err(e)
            }
        }
    }

    pub fn get_param(&self, name: &str) -> Result<ParamValue> {
        self.params.get(name)
    }

    // ---------------------------------------------------------------
    // Path construction
    // ---------------------------------------------------------------

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x, y);
        self.invalidate();
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(x, y);
        self.invalidate();
    }

    pub fn conic_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.path.conic_to(x1, y1, x, y);
        self.invalidate();
    }

    pub fn conic_to_smooth(&mut self, x: f64, y: f64) {
        self.path.conic_to_smooth(x, y);
        self.invalidate();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.path.curve_to(x1, y1, x2, y2, x, y);
        self.invalidate();
    }

    pub fn curve_to_smooth(&mut self, x2: f64, y2: f64, x: f64, y: f64) {
        self.path.curve_to_smooth(x2, y2, x, y);
        self.invalidate();
    }

    pub fn close(&mut self) {
        self.path.close();
        self.invalidate();
    }

    pub fn endpath(&mut self) {
        self.path.endpath();
        self.invalidate();
    }

    /// Discard the path and the cached edge table.
    pub fn clear(&mut self) {
        self.path.clear();
        self.invalidate();
    }

    // ---------------------------------------------------------------
    // Edge table cache
    // ---------------------------------------------------------------

    fn invalidate(&mut self) {
        *self
            .intersector
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached(&self) -> Option<Arc<Intersector>> {
        self.intersector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The edge table for flattening `scale`, built if the cached one does
    /// not match.
    pub fn intersector(&self, scale: f64) -> Arc<Intersector> {
        let mut guard = self
            .intersector
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(it) = guard.as_ref() {
            let key = it.key();
            if key.version == self.path.version()
                && key.origin == self.params.origin
                && key.scale == scale
            {
                return Arc::clone(it);
            }
        }
        let it = Arc::new(Intersector::build(&self.path, self.params.origin, scale));
        *guard = Some(Arc::clone(&it));
        it
    }

    /// The cached edge table at any scale, or one built at the default
    /// query scale.
    fn query_intersector(&self) -> Arc<Intersector> {
        if let Some(it) = self.cached() {
            let key = it.key();
            if key.version == self.path.version() && key.origin == self.params.origin {
                return it;
            }
        }
        self.intersector(DEFAULT_QUERY_SCALE)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Whether `p` (world coordinates) is inside the filled shape.
    ///
    /// Uses the edge table of the most recent render when it is still
    /// valid, so the answer matches what that render drew. For curved
    /// shapes this means the result near an edge depends on the flattening
    /// scale of that render; with no valid table the query flattens at a
    /// fixed scale of 64 per unit.
    pub fn hit_test(&self, p: PointD) -> bool {
        let it = self.query_intersector();
        resolve(
            it.winding_at(p.x, p.y),
            self.params.winding_style,
            self.params.invert,
        )
    }

    /// The shape color at `p`, transparent outside.
    pub fn color_at(&self, p: PointD) -> Rgba {
        if self.hit_test(p) {
            self.params.color
        } else {
            Rgba::transparent()
        }
    }

    /// Exact extents of the flattened geometry after the origin offset.
    /// Empty shapes give the zero-area rectangle at (0, 0).
    ///
    /// Like [`Shape::hit_test`], this reads the edge table of the most
    /// recent valid render, so curved extents follow that render's
    /// flattening scale.
    pub fn bounding_rect(&self) -> RectD {
        self.query_intersector()
            .bounds()
            .unwrap_or(RectD::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Extents of the pixels a render can touch: the bounding rectangle
    /// grown by the feather radius, or `None` when inverted (unbounded).
    pub fn render_bounds(&self) -> Option<RectD> {
        if self.params.invert {
            return None;
        }
        let r = self.bounding_rect();
        let f = self.params.feather;
        Some(RectD::new(r.x1 - f, r.y1 - f, r.x2 + f, r.y2 + f))
    }

    // ---------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------

    /// Composite the shape into `surface`. Returns `false` for a degenerate
    /// render request.
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        desc: &RenderDesc,
        quality: Quality,
    ) -> bool {
        self.render_with_progress(surface, desc, quality, |_, _| true)
    }

    /// Like [`Shape::render`], calling `progress(rows_done, rows_total)`
    /// before each row. Returning `false` cancels the render, which then
    /// returns `false` with the rows already written left in place.
    pub fn render_with_progress<S, F>(
        &self,
        surface: &mut S,
        desc: &RenderDesc,
        quality: Quality,
        progress: F,
    ) -> bool
    where
        S: Surface + ?Sized,
        F: FnMut(u32, u32) -> bool,
    {
        let p = &self.params;
        self.render_impl(
            surface,
            desc,
            quality,
            &p.color,
            p.amount,
            p.blend_method,
            progress,
        )
    }

    /// Write plain coverage into `mask`: a zeroed mask ends up holding the
    /// coverage of every pixel.
    pub fn render_coverage(&self, mask: &mut CoverageMask, desc: &RenderDesc, quality: Quality) -> bool {
        self.render_impl(
            mask,
            desc,
            quality,
            &Rgba::white(),
            1.0,
            BlendMethod::Straight,
            |_, _| true,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn render_impl<S, F>(
        &self,
        surface: &mut S,
        desc: &RenderDesc,
        quality: Quality,
        color: &Rgba,
        opacity: f64,
        method: BlendMethod,
        mut progress: F,
    ) -> bool
    where
        S: Surface + ?Sized,
        F: FnMut(u32, u32) -> bool,
    {
        if desc.is_degenerate() {
            tracing::warn!(?desc, "degenerate render descriptor");
            return false;
        }
        let region = desc.pixel_region(surface.width(), surface.height());
        if region.is_empty() {
            return true;
        }

        let p = &self.params;
        let scale = desc.pixels_per_unit() * quality.curve_factor();
        let it = self.intersector(scale);
        if it.is_empty() && !p.invert {
            return true;
        }

        let transform = desc.transform();
        let antialias = p.antialias && quality.antialias();
        let feather = if p.feather > 0.0 {
            quality.feather_kernel(p.blur_type)
        } else {
            None
        };
        tracing::trace!(
            ?region,
            antialias,
            feather = ?feather,
            quality = quality.level(),
            "rendering shape"
        );

        let total = region.height() as u32;
        let mut row = SpanRow::new();

        match feather {
            Some(kind) => {
                let rx = (p.feather / transform.pw.x.abs()).min(MAX_FEATHER_PIXELS);
                let ry = (p.feather / transform.pw.y.abs()).min(MAX_FEATHER_PIXELS);
                let grown = region.inflate(rx.ceil() as i32, ry.ceil() as i32);
                let extent = feather_extent(region, grown, it.bounds(), &transform);
                let mut source = self.row_source(&it, transform, extent, antialias);
                let mut grid = CoverageGrid::from_rows(source.as_mut(), extent);
                grid.feather(kind, rx, ry);
                for (done, y) in (region.y1..region.y2).enumerate() {
                    if !progress(done as u32, total) {
                        return false;
                    }
                    grid.row_into(y, region.x1, region.x2, &mut row);
                    composite_row(surface, &row, color, opacity, method);
                }
            }
            None => {
                let mut source = self.row_source(&it, transform, region, antialias);
                for (done, y) in (region.y1..region.y2).enumerate() {
                    if !progress(done as u32, total) {
                        return false;
                    }
                    source.row(y, &mut row);
                    composite_row(surface, &row, color, opacity, method);
                }
            }
        }
        true
    }

    fn row_source<'a>(
        &self,
        it: &'a Intersector,
        transform: PixelTransform,
        clip: RectI,
        antialias: bool,
    ) -> Box<dyn RowCoverage + 'a> {
        let style = self.params.winding_style;
        let invert = self.params.invert;
        if antialias {
            Box::new(PolySpan::new(it, &transform, clip, style, invert))
        } else {
            Box::new(PointSampler::new(it, transform, clip, style, invert))
        }
    }
}

/// The pixels a feather grid must hold: `region` plus the part of `grown`
/// covered by the geometry (one pixel of margin). Past the geometry,
/// coverage is constant along each row and column, so the grid's clamped
/// edge samples reproduce the rest of `grown`.
fn feather_extent(
    region: RectI,
    grown: RectI,
    bounds: Option<RectD>,
    transform: &PixelTransform,
) -> RectI {
    let b = match bounds {
        Some(b) => b,
        None => return region,
    };
    let a = transform.to_pixel(&PointD::new(b.x1, b.y1));
    let c = transform.to_pixel(&PointD::new(b.x2, b.y2));
    let cx = |v: f64| v.clamp(grown.x1 as f64, grown.x2 as f64) as i32;
    let cy = |v: f64| v.clamp(grown.y1 as f64, grown.y2 as f64) as i32;
    let mut extent = RectI::new(
        cx(a.x.min(c.x).floor() - 1.0),
        cy(a.y.min(c.y).floor() - 1.0),
        cx(a.x.max(c.x).ceil() + 1.0),
        cy(a.y.max(c.y).ceil() + 1.0),
    );
    extent.expand_to(region.x1, region.y1);
    extent.expand_to(region.x2, region.y2);
    extent
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blur::BlurType;
    use crate::surface::RgbaSurface;

    fn square(s: &mut Shape, x1: f64, y1: f64, x2: f64, y2: f64) {
        s.move_to(x1, y1);
        s.line_to(x2, y1);
        s.line_to(x2, y2);
        s.line_to(x1, y2);
        s.close();
    }

    #[test]
    fn test_empty_shape() {
        let s = Shape::new();
        assert_eq!(s.bounding_rect(), RectD::new(0.0, 0.0, 0.0, 0.0));
        assert!(!s.hit_test(PointD::new(0.0, 0.0)));
        let mut surf = RgbaSurface::new(4, 4);
        assert!(s.render(&mut surf, &RenderDesc::unit(4, 4), Quality::default()));
        assert!(surf.pixels().iter().all(|p| *p == Rgba::transparent()));
    }

    #[test]
    fn test_intersector_cached_until_mutation() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 4.0, 4.0);
        let a = s.intersector(2.0);
        let b = s.intersector(2.0);
        assert!(Arc::ptr_eq(&a, &b));
        let c = s.intersector(3.0);
        assert!(!Arc::ptr_eq(&a, &c));

        s.line_to(9.0, 9.0);
        assert!(s.cached().is_none());
        let d = s.intersector(3.0);
        assert_eq!(d.key().version, s.path().version());
    }

    #[test]
    fn test_origin_invalidates() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 4.0, 4.0);
        assert!(s.hit_test(PointD::new(1.0, 1.0)));
        let inv = s.set_param("origin", PointD::new(10.0, 0.0).into()).unwrap();
        assert_eq!(inv, Invalidation::Geometry);
        assert!(s.cached().is_none());
        assert!(!s.hit_test(PointD::new(1.0, 1.0)));
        assert!(s.hit_test(PointD::new(11.0, 1.0)));
        assert_eq!(s.bounding_rect(), RectD::new(10.0, 0.0, 14.0, 4.0));
    }

    #[test]
    fn test_rejected_param_keeps_shape() {
        let mut s = Shape::new();
        assert!(s.set_param("feather", (-2.0).into()).is_err());
        assert_eq!(s.get_param("feather"), Ok(ParamValue::Real(0.0)));
    }

    #[test]
    fn test_color_at() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 4.0, 4.0);
        s.set_param("color", Rgba::new(1.0, 0.0, 0.0, 1.0).into())
            .unwrap();
        assert_eq!(s.color_at(PointD::new(2.0, 2.0)), Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(s.color_at(PointD::new(5.0, 2.0)), Rgba::transparent());
    }

    #[test]
    fn test_render_bounds() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 4.0, 4.0);
        s.set_param("feather", 1.5.into()).unwrap();
        assert_eq!(s.render_bounds(), Some(RectD::new(-1.5, -1.5, 5.5, 5.5)));
        s.set_param("invert", true.into()).unwrap();
        assert_eq!(s.render_bounds(), None);
    }

    #[test]
    fn test_degenerate_desc_fails() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 4.0, 4.0);
        let mut surf = RgbaSurface::new(4, 4);
        let desc = RenderDesc::new(PointD::new(0.0, 0.0), PointD::new(0.0, 4.0), 4, 4);
        assert!(!s.render(&mut surf, &desc, Quality::default()));
    }

    #[test]
    fn test_render_opacity_and_blend() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 2.0, 2.0);
        s.set_param("color", Rgba::white().into()).unwrap();
        s.set_param("amount", 0.5.into()).unwrap();
        let mut surf = RgbaSurface::filled(4, 4, Rgba::black());
        assert!(s.render(&mut surf, &RenderDesc::unit(4, 4), Quality::BEST));
        let inside = surf.pixel(1, 1).unwrap();
        assert!((inside.r - 0.5).abs() < 1e-12);
        assert_eq!(surf.pixel(3, 3), Some(Rgba::black()));
    }

    #[test]
    fn test_region_restricts_output() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 4.0, 4.0);
        let mut mask = CoverageMask::new(4, 4);
        let desc = RenderDesc::unit(4, 4).with_region(RectI::new(2, 0, 4, 4));
        assert!(s.render_coverage(&mut mask, &desc, Quality::BEST));
        assert_eq!(mask.pixel(1, 1), Some(0.0));
        assert_eq!(mask.pixel(2, 1), Some(1.0));
    }

    #[test]
    fn test_progress_cancels() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 4.0, 4.0);
        let mut mask = CoverageMask::new(4, 4);
        s.set_param("color", Rgba::white().into()).unwrap();
        s.set_param("blend_method", BlendMethod::Straight.into())
            .unwrap();
        let ok = s.render_with_progress(
            &mut mask,
            &RenderDesc::unit(4, 4),
            Quality::BEST,
            |done, total| {
                assert_eq!(total, 4);
                done < 2
            },
        );
        assert!(!ok);
        assert_eq!(mask.pixel(0, 1), Some(1.0));
        assert_eq!(mask.pixel(0, 2), Some(0.0));
    }

    #[test]
    fn test_feather_spreads_beyond_edge() {
        let mut s = Shape::new();
        square(&mut s, 4.0, 4.0, 12.0, 12.0);
        s.set_param("feather", 2.0.into()).unwrap();
        let mut mask = CoverageMask::new(16, 16);
        assert!(s.render_coverage(&mut mask, &RenderDesc::unit(16, 16), Quality::BEST));
        let outside = mask.pixel(3, 8).unwrap_or(0.0);
        let inside = mask.pixel(4, 8).unwrap_or(0.0);
        assert!(outside > 0.0 && outside < 0.5, "{}", outside);
        assert!(inside > 0.5 && inside < 1.0, "{}", inside);
        assert_eq!(mask.pixel(8, 8), Some(1.0));

        // Fastest quality drops feather
        let mut fast = CoverageMask::new(16, 16);
        assert!(s.render_coverage(&mut fast, &RenderDesc::unit(16, 16), Quality::FASTEST));
        assert_eq!(fast.pixel(3, 8), Some(0.0));
    }

    #[test]
    fn test_feather_region_matches_full_render() {
        let mut s = Shape::new();
        square(&mut s, 6.0, 5.0, 22.0, 19.0);
        // Spills off the left edge of the surface
        square(&mut s, -6.0, 20.0, 3.5, 28.0);
        s.set_param("feather", 3.0.into()).unwrap();
        let desc = RenderDesc::unit(32, 32);
        for kind in BlurType::ALL {
            s.set_param("blur_type", kind.into()).unwrap();
            let mut full = CoverageMask::new(32, 32);
            assert!(s.render_coverage(&mut full, &desc, Quality::BEST));
            for region in [RectI::new(10, 8, 20, 16), RectI::new(0, 18, 6, 30)] {
                let mut part = CoverageMask::new(32, 32);
                assert!(s.render_coverage(&mut part, &desc.with_region(region), Quality::BEST));
                let tol = if kind == BlurType::Gaussian { 2e-2 } else { 1e-6 };
                for y in region.y1..region.y2 {
                    for x in region.x1..region.x2 {
                        let a = full.pixel(x, y).unwrap_or(-1.0);
                        let b = part.pixel(x, y).unwrap_or(-1.0);
                        assert!((a - b).abs() < tol, "{} ({}, {}): {} vs {}", kind, x, y, a, b);
                    }
                }
            }
        }
    }

    #[test]
    fn test_large_feather_on_small_shape() {
        let mut s = Shape::new();
        square(&mut s, 1.0, 1.0, 3.0, 3.0);
        for (kind, radius) in [(BlurType::Disc, 80.0), (BlurType::Gaussian, 400.0), (BlurType::Box, 1e6)] {
            s.set_param("blur_type", kind.into()).unwrap();
            s.set_param("feather", radius.into()).unwrap();
            let mut mask = CoverageMask::new(4, 4);
            assert!(s.render_coverage(&mut mask, &RenderDesc::unit(4, 4), Quality::BEST));
            let c = mask.pixel(2, 2).unwrap_or(-1.0);
            assert!(c > 0.0 && c < 0.5, "{}: {}", kind, c);
        }
    }

    #[test]
    fn test_queries_use_last_render_scale() {
        let mut s = Shape::new();
        s.move_to(0.0, 0.0);
        s.conic_to(5.0, 10.0, 10.0, 0.0);
        s.close();
        assert_eq!(s.cached().map(|it| it.key().scale), None);
        let before = s.bounding_rect();
        assert_eq!(s.cached().map(|it| it.key().scale), Some(DEFAULT_QUERY_SCALE));

        let mut mask = CoverageMask::new(12, 12);
        assert!(s.render_coverage(&mut mask, &RenderDesc::unit(12, 12), Quality::default()));
        let it = s.intersector(1.0);
        assert_eq!(s.bounding_rect(), it.bounds().unwrap_or(before));
        assert_eq!(s.cached().map(|it| it.key().scale), Some(1.0));
    }

    #[test]
    fn test_clone_shares_geometry() {
        let mut s = Shape::new();
        square(&mut s, 0.0, 0.0, 4.0, 4.0);
        let _ = s.intersector(1.0);
        let t = s.clone();
        assert_eq!(t.path().commands(), s.path().commands());
        assert!(t.hit_test(PointD::new(1.0, 1.0)));
    }
}
