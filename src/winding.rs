//! Winding rules.
//!
//! Turns a signed winding count (integral, from crossing counts) or an
//! accumulated fractional coverage (from the area rasterizer) into an
//! inside/outside decision or a coverage value in [0, 1]. The invert flag is
//! applied after the rule.

use crate::basics::COVER_EPSILON;
use crate::error::ShapeError;

/// Fill rule for self-intersecting and multi-subpath geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindingStyle {
    /// Inside where the winding count is non-zero.
    #[default]
    NonZero,
    /// Inside where the winding count is odd.
    EvenOdd,
}

impl WindingStyle {
    pub fn code(self) -> i32 {
        match self {
            WindingStyle::NonZero => 0,
            WindingStyle::EvenOdd => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WindingStyle::NonZero => "non_zero",
            WindingStyle::EvenOdd => "even_odd",
        }
    }

    /// Inside test for an integral winding count.
    #[inline]
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            WindingStyle::NonZero => winding != 0,
            WindingStyle::EvenOdd => winding.rem_euclid(2) != 0,
        }
    }

    /// Coverage in [0, 1] for an accumulated (possibly fractional) winding.
    ///
    /// Non-zero saturates the magnitude at 1. Even-odd folds it into a
    /// triangle wave of period 2, so 1 and 3 are inside and 2 is outside.
    #[inline]
    pub fn coverage(self, area: f64) -> f64 {
        let a = area.abs();
        match self {
            WindingStyle::NonZero => a.min(1.0),
            WindingStyle::EvenOdd => {
                let a = a % 2.0;
                if a > 1.0 {
                    2.0 - a
                } else {
                    a
                }
            }
        }
    }
}

impl TryFrom<i32> for WindingStyle {
    type Error = ShapeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(WindingStyle::NonZero),
            1 => Ok(WindingStyle::EvenOdd),
            _ => Err(ShapeError::UnknownVariant {
                kind: "winding style",
                code,
            }),
        }
    }
}

impl std::fmt::Display for WindingStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inside test for an integral winding count, with invert applied.
#[inline]
pub fn resolve(winding: i32, style: WindingStyle, invert: bool) -> bool {
    style.is_inside(winding) != invert
}

/// Coverage for an accumulated winding, with invert applied.
///
/// Results within [`COVER_EPSILON`] of 0 or 1 are snapped to them, so
/// integral input agrees exactly with [`resolve`].
#[inline]
pub fn resolve_coverage(area: f64, style: WindingStyle, invert: bool) -> f64 {
    let mut c = style.coverage(area);
    if invert {
        c = 1.0 - c;
    }
    if c < COVER_EPSILON {
        0.0
    } else if c > 1.0 - COVER_EPSILON {
        1.0
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero() {
        let s = WindingStyle::NonZero;
        assert!(!s.is_inside(0));
        assert!(s.is_inside(1));
        assert!(s.is_inside(-1));
        assert!(s.is_inside(2));
    }

    #[test]
    fn test_even_odd_negative_counts() {
        let s = WindingStyle::EvenOdd;
        assert!(!s.is_inside(0));
        assert!(s.is_inside(1));
        assert!(s.is_inside(-1));
        assert!(!s.is_inside(-2));
        assert!(s.is_inside(-3));
    }

    #[test]
    fn test_resolve_with_invert() {
        assert!(resolve(1, WindingStyle::NonZero, false));
        assert!(!resolve(1, WindingStyle::NonZero, true));
        assert!(resolve(2, WindingStyle::EvenOdd, true));
        assert!(!resolve(0, WindingStyle::EvenOdd, false));
    }

    #[test]
    fn test_coverage_agrees_on_integers() {
        for style in [WindingStyle::NonZero, WindingStyle::EvenOdd] {
            for invert in [false, true] {
                for w in -4..=4 {
                    let expected = if resolve(w, style, invert) { 1.0 } else { 0.0 };
                    assert_eq!(resolve_coverage(w as f64, style, invert), expected);
                }
            }
        }
    }

    #[test]
    fn test_fractional_coverage() {
        assert_eq!(resolve_coverage(0.25, WindingStyle::NonZero, false), 0.25);
        assert_eq!(resolve_coverage(-1.5, WindingStyle::NonZero, false), 1.0);
        assert_eq!(resolve_coverage(1.5, WindingStyle::EvenOdd, false), 0.5);
        assert_eq!(resolve_coverage(0.25, WindingStyle::EvenOdd, true), 0.75);
    }

    #[test]
    fn test_snap_near_boundaries() {
        assert_eq!(resolve_coverage(1e-12, WindingStyle::NonZero, false), 0.0);
        assert_eq!(resolve_coverage(1.0 - 1e-12, WindingStyle::NonZero, false), 1.0);
    }

    #[test]
    fn test_try_from_codes() {
        assert_eq!(WindingStyle::try_from(0), Ok(WindingStyle::NonZero));
        assert_eq!(WindingStyle::try_from(1), Ok(WindingStyle::EvenOdd));
        assert!(WindingStyle::try_from(2).is_err());
    }
}
