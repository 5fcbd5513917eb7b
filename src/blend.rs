//! Blend methods for compositing shape color onto a destination.
//!
//! A closed set of compositing operators working on straight-alpha `Rgba`
//! in f64. Every operator takes the source color, the destination color and
//! an `amount` (coverage times opacity) and returns the new destination.
//!
//! Color-modifying operators (screen, multiply, ...) compute a modified
//! source and then lay it *onto* the destination, which preserves the
//! destination alpha.

use crate::color::Rgba;
use crate::error::ShapeError;

/// Alpha below this is treated as fully transparent when un-premultiplying.
const ALPHA_EPSILON: f64 = 1e-12;

/// Divisors smaller than this leave the destination channel unchanged.
const DIVIDE_EPSILON: f64 = 1e-6;

// ============================================================================
// BlendMethod
// ============================================================================

/// Compositing operator.
///
/// Each variant has a stable integer code (see [`BlendMethod::code`]) used
/// when the method arrives as a plain integer from a parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMethod {
    /// Source over destination (standard alpha compositing).
    #[default]
    Composite,
    /// Linear interpolation from destination to source, alpha included.
    Straight,
    /// Per-channel maximum, laid onto the destination.
    Brighten,
    /// Per-channel minimum, laid onto the destination.
    Darken,
    /// Adds the alpha-weighted source color; destination alpha kept.
    Add,
    /// Subtracts the alpha-weighted source color; destination alpha kept.
    Subtract,
    Multiply,
    Divide,
    /// Destination over source.
    Behind,
    /// Source over destination, destination alpha kept.
    Onto,
    Screen,
    HardLight,
    /// Absolute difference with the alpha-weighted source color.
    Difference,
    /// Erases destination alpha where the source is opaque.
    AlphaOver,
    Overlay,
    /// Straight blend with the source alpha masked by the destination alpha.
    StraightOnto,
}

impl BlendMethod {
    /// Every blend method, in code order.
    pub const ALL: [BlendMethod; 16] = [
        BlendMethod::Composite,
        BlendMethod::Straight,
        BlendMethod::Brighten,
        BlendMethod::Darken,
        BlendMethod::Add,
        BlendMethod::Subtract,
        BlendMethod::Multiply,
        BlendMethod::Divide,
        BlendMethod::Behind,
        BlendMethod::Onto,
        BlendMethod::Screen,
        BlendMethod::HardLight,
        BlendMethod::Difference,
        BlendMethod::AlphaOver,
        BlendMethod::Overlay,
        BlendMethod::StraightOnto,
    ];

    /// Stable integer code of this method.
    pub fn code(self) -> i32 {
        match self {
            BlendMethod::Composite => 0,
            BlendMethod::Straight => 1,
            BlendMethod::Brighten => 2,
            BlendMethod::Darken => 3,
            BlendMethod::Add => 4,
            BlendMethod::Subtract => 5,
            BlendMethod::Multiply => 6,
            BlendMethod::Divide => 7,
            BlendMethod::Behind => 12,
            BlendMethod::Onto => 13,
            BlendMethod::Screen => 16,
            BlendMethod::HardLight => 17,
            BlendMethod::Difference => 18,
            BlendMethod::AlphaOver => 19,
            BlendMethod::Overlay => 20,
            BlendMethod::StraightOnto => 21,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlendMethod::Composite => "composite",
            BlendMethod::Straight => "straight",
            BlendMethod::Brighten => "brighten",
            BlendMethod::Darken => "darken",
            BlendMethod::Add => "add",
            BlendMethod::Subtract => "subtract",
            BlendMethod::Multiply => "multiply",
            BlendMethod::Divide => "divide",
            BlendMethod::Behind => "behind",
            BlendMethod::Onto => "onto",
            BlendMethod::Screen => "screen",
            BlendMethod::HardLight => "hard_light",
            BlendMethod::Difference => "difference",
            BlendMethod::AlphaOver => "alpha_over",
            BlendMethod::Overlay => "overlay",
            BlendMethod::StraightOnto => "straight_onto",
        }
    }

    /// Blend `src` into `dst` with weight `amount` and return the result.
    ///
    /// `amount <= 0` returns `dst` unchanged for every method.
    pub fn blend(self, src: &Rgba, dst: &Rgba, amount: f64) -> Rgba {
        if amount <= 0.0 {
            return *dst;
        }
        match self {
            BlendMethod::Composite => blend_composite(src, dst, amount),
            BlendMethod::Straight => blend_straight(src, dst, amount),
            BlendMethod::Onto => blend_onto(src, dst, amount),
            BlendMethod::StraightOnto => blend_straight_onto(src, dst, amount),
            BlendMethod::Behind => blend_behind(src, dst, amount),
            BlendMethod::Screen => {
                let s = src.zip_rgb(dst, |s, d| 1.0 - (1.0 - s) * (1.0 - d));
                blend_onto(&s, dst, amount)
            }
            BlendMethod::Multiply => blend_onto(&src.zip_rgb(dst, |s, d| s * d), dst, amount),
            BlendMethod::Divide => {
                let s = src.zip_rgb(dst, |s, d| if s.abs() > DIVIDE_EPSILON { d / s } else { d });
                blend_onto(&s, dst, amount)
            }
            BlendMethod::Brighten => blend_onto(&src.zip_rgb(dst, f64::max), dst, amount),
            BlendMethod::Darken => blend_onto(&src.zip_rgb(dst, f64::min), dst, amount),
            BlendMethod::Overlay => {
                let s = src.zip_rgb(dst, |s, d| hard_light_calc(d, s));
                blend_onto(&s, dst, amount)
            }
            BlendMethod::HardLight => {
                let s = src.zip_rgb(dst, hard_light_calc);
                blend_onto(&s, dst, amount)
            }
            BlendMethod::Add => blend_additive(src, dst, amount, |d, s| d + s),
            BlendMethod::Subtract => blend_additive(src, dst, amount, |d, s| d - s),
            BlendMethod::Difference => blend_additive(src, dst, amount, |d, s| (d - s).abs()),
            BlendMethod::AlphaOver => {
                Rgba::with_opacity(dst, dst.a * (1.0 - (src.a * amount).min(1.0)))
            }
        }
    }
}

impl TryFrom<i32> for BlendMethod {
    type Error = ShapeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        BlendMethod::ALL
            .iter()
            .copied()
            .find(|m| m.code() == code)
            .ok_or(ShapeError::UnknownVariant {
                kind: "blend method",
                code,
            })
    }
}

impl std::fmt::Display for BlendMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Per-operation blend functions
// ============================================================================

// ---- Composite: Da' = Sa + Da.(1 - Sa), Dc' = (Sc.Sa + Dc.Da.(1 - Sa)) / Da'
#[inline]
fn blend_composite(s: &Rgba, d: &Rgba, amount: f64) -> Rgba {
    let sa = s.a * amount;
    if sa <= 0.0 {
        return *d;
    }
    let keep = d.a * (1.0 - sa);
    let a = sa + keep;
    if a <= ALPHA_EPSILON {
        return Rgba::transparent();
    }
    Rgba::new(
        (s.r * sa + d.r * keep) / a,
        (s.g * sa + d.g * keep) / a,
        (s.b * sa + d.b * keep) / a,
        a,
    )
}

// ---- Straight: premultiplied lerp from D to S by amount
#[inline]
fn blend_straight(s: &Rgba, d: &Rgba, amount: f64) -> Rgba {
    if amount >= 1.0 {
        return *s;
    }
    let a = (s.a - d.a) * amount + d.a;
    if a <= ALPHA_EPSILON {
        let mut c = s.zip_rgb(d, |s, d| (s - d) * amount + d);
        c.a = 0.0;
        return c;
    }
    let mix = |sc: f64, dc: f64| ((sc * s.a - dc * d.a) * amount + dc * d.a) / a;
    Rgba::new(mix(s.r, d.r), mix(s.g, d.g), mix(s.b, d.b), a)
}

// ---- Onto: Composite, then Da' = Da
#[inline]
fn blend_onto(s: &Rgba, d: &Rgba, amount: f64) -> Rgba {
    let c = blend_composite(s, d, amount);
    Rgba::with_opacity(&c, d.a)
}

// ---- StraightOnto: Straight with Sa' = Sa.Da
#[inline]
fn blend_straight_onto(s: &Rgba, d: &Rgba, amount: f64) -> Rgba {
    let masked = Rgba::with_opacity(s, s.a * d.a);
    blend_straight(&masked, d, amount)
}

// ---- Behind: D over S
#[inline]
fn blend_behind(s: &Rgba, d: &Rgba, amount: f64) -> Rgba {
    let under = Rgba::with_opacity(s, s.a * amount);
    blend_composite(d, &under, 1.0)
}

// ---- Add / Subtract / Difference: Dc' = f(Dc, Sc.Sa.amount), Da' = Da
#[inline]
fn blend_additive<F: Fn(f64, f64) -> f64>(s: &Rgba, d: &Rgba, amount: f64, f: F) -> Rgba {
    let k = s.a * amount;
    Rgba::new(f(d.r, s.r * k), f(d.g, s.g * k), f(d.b, s.b * k), d.a)
}

// ---- HardLight: Sc < 0.5 ? 2.Sc.Dc : 1 - 2.(1 - Sc).(1 - Dc)
#[inline]
fn hard_light_calc(s: f64, d: f64) -> f64 {
    if s < 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

// ============================================================================
// Tests
// ============================================================================
