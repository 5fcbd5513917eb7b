//! Render request description and quality levels.

use crate::basics::{PointD, RectI};
use crate::blur::BlurType;

// ============================================================================
// RenderDesc
// ============================================================================

/// Maps the world rectangle `tl..br` onto a `width x height` pixel grid.
///
/// `tl` is the world position of the top-left corner of pixel (0, 0) and
/// `br` the bottom-right corner of the last pixel; either axis may run
/// backwards (e.g. y-up worlds). `region` optionally restricts output to a
/// pixel rectangle of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderDesc {
    pub tl: PointD,
    pub br: PointD,
    pub width: u32,
    pub height: u32,
    pub region: Option<RectI>,
}

impl RenderDesc {
    pub fn new(tl: PointD, br: PointD, width: u32, height: u32) -> Self {
        Self {
            tl,
            br,
            width,
            height,
            region: None,
        }
    }

    /// One world unit per pixel, world origin at pixel (0, 0).
    pub fn unit(width: u32, height: u32) -> Self {
        Self::new(
            PointD::new(0.0, 0.0),
            PointD::new(width as f64, height as f64),
            width,
            height,
        )
    }

    pub fn with_region(mut self, region: RectI) -> Self {
        self.region = Some(region);
        self
    }

    /// True when the grid has no pixels or the world rectangle has no area.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0
            || self.height == 0
            || !self.tl.is_finite()
            || !self.br.is_finite()
            || self.tl.x == self.br.x
            || self.tl.y == self.br.y
    }

    /// World size of one pixel (signed per axis).
    pub fn pixel_size(&self) -> PointD {
        PointD::new(
            (self.br.x - self.tl.x) / self.width as f64,
            (self.br.y - self.tl.y) / self.height as f64,
        )
    }

    /// Pixels per world unit along the denser axis.
    pub fn pixels_per_unit(&self) -> f64 {
        let pw = self.pixel_size();
        (1.0 / pw.x.abs()).max(1.0 / pw.y.abs())
    }

    pub fn transform(&self) -> PixelTransform {
        PixelTransform {
            tl: self.tl,
            pw: self.pixel_size(),
        }
    }

    /// The pixel rectangle to write: the grid, clipped to the surface, then
    /// to `region` if set. May be empty.
    pub fn pixel_region(&self, surface_width: u32, surface_height: u32) -> RectI {
        let mut r = RectI::new(
            0,
            0,
            self.width.min(surface_width).min(i32::MAX as u32) as i32,
            self.height.min(surface_height).min(i32::MAX as u32) as i32,
        );
        if let Some(region) = self.region {
            let mut region = region;
            region.normalize();
            r.clip(&region);
        }
        r
    }
}

// ============================================================================
// PixelTransform
// ============================================================================

/// Axis-aligned world <-> pixel mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTransform {
    pub tl: PointD,
    /// World size of one pixel.
    pub pw: PointD,
}

impl PixelTransform {
    #[inline]
    pub fn to_pixel(&self, p: &PointD) -> PointD {
        PointD::new((p.x - self.tl.x) / self.pw.x, (p.y - self.tl.y) / self.pw.y)
    }

    /// World position of pixel coordinate (x, y); pixel centres are at .5.
    #[inline]
    pub fn to_world(&self, x: f64, y: f64) -> PointD {
        PointD::new(self.tl.x + x * self.pw.x, self.tl.y + y * self.pw.y)
    }
}

// ============================================================================
// Quality
// ============================================================================

/// Render quality level, 0 (best) to 10 (fastest).
///
/// - `0..=7`: full antialiasing and the requested feather kernel
/// - `8..=9`: feather approximated with the box kernel
/// - `10`: no antialiasing, no feather
///
/// Curve flattening precision also drops as the level rises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quality(u8);

impl Quality {
    pub const BEST: Quality = Quality(0);
    pub const FASTEST: Quality = Quality(10);

    /// Levels above 10 clamp to 10.
    pub fn new(level: u8) -> Self {
        Quality(level.min(10))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn antialias(self) -> bool {
        self.0 < 10
    }

    /// The kernel to feather with at this level, or `None` to skip feather.
    pub fn feather_kernel(self, requested: BlurType) -> Option<BlurType> {
        match self.0 {
            0..=7 => Some(requested),
            8..=9 => Some(BlurType::Box),
            _ => None,
        }
    }

    /// Multiplier on pixels-per-unit for the flattening scale.
    pub fn curve_factor(self) -> f64 {
        match self.0 {
            0..=2 => 4.0,
            3..=6 => 1.0,
            _ => 0.5,
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality(3)
    }
}
