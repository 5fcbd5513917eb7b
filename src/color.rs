//! Color types.
//!
//! - `Rgba`: f64 straight-alpha components, the working space for blending
//!   and the shape color parameter
//! - `Rgba8`: u8 components (8-bit per channel) for integer surfaces

// ============================================================================
// Rgba (f64 precision color)
// ============================================================================

/// RGBA color with f64 components, nominally in range [0, 1].
///
/// Channels are straight (not premultiplied). Values outside [0, 1] are
/// allowed on float surfaces; `Rgba8` conversion clamps them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn new_rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    pub fn with_opacity(c: &Rgba, a: f64) -> Self {
        Self { a, ..*c }
    }

    pub fn opacity(&self) -> f64 {
        self.a
    }

    /// Returns `true` if every channel is a finite number.
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Apply `f` to the three color channels, keeping alpha.
    #[inline]
    pub fn map_rgb<F: Fn(f64) -> f64>(&self, f: F) -> Rgba {
        Rgba::new(f(self.r), f(self.g), f(self.b), self.a)
    }

    /// Combine the color channels of `self` and `other` with `f`, keeping
    /// the alpha of `self`.
    #[inline]
    pub fn zip_rgb<F: Fn(f64, f64) -> f64>(&self, other: &Rgba, f: F) -> Rgba {
        Rgba::new(
            f(self.r, other.r),
            f(self.g, other.g),
            f(self.b, other.b),
            self.a,
        )
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::black()
    }
}

// ============================================================================
// Rgba8 (8-bit per channel)
// ============================================================================

/// RGBA color with u8 components, straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BASE_MASK: u32 = 255;

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn new_opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert from `Rgba` (f64), clamping to [0, 1] and rounding.
    pub fn from_rgba(c: &Rgba) -> Self {
        Self {
            r: Self::from_double(c.r),
            g: Self::from_double(c.g),
            b: Self::from_double(c.b),
            a: Self::from_double(c.a),
        }
    }

    /// Convert to `Rgba` (f64).
    pub fn to_rgba(&self) -> Rgba {
        Rgba {
            r: Self::to_double(self.r),
            g: Self::to_double(self.g),
            b: Self::to_double(self.b),
            a: Self::to_double(self.a),
        }
    }

    pub fn to_double(a: u8) -> f64 {
        a as f64 / Self::BASE_MASK as f64
    }

    pub fn from_double(a: f64) -> u8 {
        // NaN maps to 0 through the saturating float-to-int cast
        (a.clamp(0.0, 1.0) * Self::BASE_MASK as f64 + 0.5) as u8
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}

impl From<Rgba8> for Rgba {
    fn from(c: Rgba8) -> Self {
        c.to_rgba()
    }
}

impl From<Rgba> for Rgba8 {
    fn from(c: Rgba) -> Self {
        Rgba8::from_rgba(&c)
    }
}

// ============================================================================
// Tests
// ============================================================================
