//! Destination surfaces.
//!
//! The rasterizer writes through the [`Surface`] trait only, one blend call
//! per pixel or horizontal run. [`ImageSurface`] is the owned, row-major
//! implementation, generic over the pixel representation through
//! [`PixelBlend`].

use crate::blend::BlendMethod;
use crate::color::{Rgba, Rgba8};

// ============================================================================
// PixelBlend
// ============================================================================

/// A pixel representation that can absorb a blended color.
pub trait PixelBlend: Copy {
    /// The fully transparent / empty pixel.
    const CLEAR: Self;

    /// Blend `c` onto `self` with weight `amount` using `method`.
    fn blend_with(&self, c: &Rgba, amount: f64, method: BlendMethod) -> Self;
}

impl PixelBlend for Rgba {
    const CLEAR: Self = Rgba::transparent();

    #[inline]
    fn blend_with(&self, c: &Rgba, amount: f64, method: BlendMethod) -> Self {
        method.blend(c, self, amount)
    }
}

impl PixelBlend for Rgba8 {
    const CLEAR: Self = Rgba8::new(0, 0, 0, 0);

    #[inline]
    fn blend_with(&self, c: &Rgba, amount: f64, method: BlendMethod) -> Self {
        Rgba8::from_rgba(&method.blend(c, &self.to_rgba(), amount))
    }
}

/// Single-channel coverage or alpha mask. Only the alpha channel of the
/// source color takes part in the blend.
impl PixelBlend for f32 {
    const CLEAR: Self = 0.0;

    #[inline]
    fn blend_with(&self, c: &Rgba, amount: f64, method: BlendMethod) -> Self {
        let src = Rgba::with_opacity(&Rgba::white(), c.a);
        let dst = Rgba::with_opacity(&Rgba::white(), *self as f64);
        method.blend(&src, &dst, amount).a as f32
    }
}

// ============================================================================
// Surface trait
// ============================================================================

/// A mutable 2D pixel grid that a shape can be composited into.
///
/// Coordinates outside `0..width` / `0..height` must be ignored.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Blend a single pixel at (x, y).
    fn blend_pixel(&mut self, x: i32, y: i32, c: &Rgba, amount: f64, method: BlendMethod);

    /// Blend `len` pixels starting at (x, y) with the same color and amount.
    fn blend_hline(
        &mut self,
        x: i32,
        y: i32,
        len: u32,
        c: &Rgba,
        amount: f64,
        method: BlendMethod,
    ) {
        for i in 0..len as i32 {
            self.blend_pixel(x + i, y, c, amount, method);
        }
    }
}

// ============================================================================
// ImageSurface
// ============================================================================

/// Owned row-major image with pixels of type `P`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSurface<P: PixelBlend> {
    width: u32,
    height: u32,
    data: Vec<P>,
}

/// Float RGBA surface (f64 channels, straight alpha).
pub type RgbaSurface = ImageSurface<Rgba>;
/// 8-bit RGBA surface.
pub type Rgba8Surface = ImageSurface<Rgba8>;
/// Single-channel coverage mask.
pub type CoverageMask = ImageSurface<f32>;

impl<P: PixelBlend> ImageSurface<P> {
    /// A `width x height` surface filled with `P::CLEAR`.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, P::CLEAR)
    }

    pub fn filled(width: u32, height: u32, fill: P) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width as usize * height as usize],
        }
    }

    pub fn clear(&mut self, fill: P) {
        self.data.fill(fill);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Pixel at (x, y), or `None` outside the surface.
    pub fn pixel(&self, x: i32, y: i32) -> Option<P> {
        self.index(x, y).map(|i| self.data[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, p: P) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = p;
        }
    }

    /// The pixels of row `y`. Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[P] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    pub fn pixels(&self) -> &[P] {
        &self.data
    }
}

impl<P: PixelBlend> Surface for ImageSurface<P> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn blend_pixel(&mut self, x: i32, y: i32, c: &Rgba, amount: f64, method: BlendMethod) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = self.data[i].blend_with(c, amount, method);
        }
    }

    fn blend_hline(
        &mut self,
        x: i32,
        y: i32,
        len: u32,
        c: &Rgba,
        amount: f64,
        method: BlendMethod,
    ) {
        if y < 0 || y as u32 >= self.height || len == 0 {
            return;
        }
        let x1 = x.max(0) as i64;
        let x2 = (x as i64 + len as i64).min(self.width as i64);
        if x1 >= x2 {
            return;
        }
        let start = y as usize * self.width as usize;
        for p in &mut self.data[start + x1 as usize..start + x2 as usize] {
            *p = p.blend_with(c, amount, method);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
