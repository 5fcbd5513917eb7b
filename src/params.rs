//! Shape parameters and the typed parameter table.
//!
//! `ShapeParams` is plain data with public fields. The string-keyed table
//! interface (`get` / `set`) is what a host document model drives; `set`
//! validates the value completely before assigning it, so a rejected value
//! leaves the parameters unchanged.

use crate::basics::PointD;
use crate::blend::BlendMethod;
use crate::blur::BlurType;
use crate::color::Rgba;
use crate::error::{Result, ShapeError};
use crate::winding::WindingStyle;

// ============================================================================
// ParamValue
// ============================================================================

/// A tagged parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    Color(Rgba),
    Point(PointD),
    Bool(bool),
    Real(f64),
    Integer(i32),
    BlendMethod(BlendMethod),
    WindingStyle(WindingStyle),
    BlurType(BlurType),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Color(_) => "color",
            ParamValue::Point(_) => "point",
            ParamValue::Bool(_) => "bool",
            ParamValue::Real(_) => "real",
            ParamValue::Integer(_) => "integer",
            ParamValue::BlendMethod(_) => "blend method",
            ParamValue::WindingStyle(_) => "winding style",
            ParamValue::BlurType(_) => "blur type",
        }
    }
}

impl From<Rgba> for ParamValue {
    fn from(v: Rgba) -> Self {
        ParamValue::Color(v)
    }
}

impl From<PointD> for ParamValue {
    fn from(v: PointD) -> Self {
        ParamValue::Point(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Real(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<BlendMethod> for ParamValue {
    fn from(v: BlendMethod) -> Self {
        ParamValue::BlendMethod(v)
    }
}

impl From<WindingStyle> for ParamValue {
    fn from(v: WindingStyle) -> Self {
        ParamValue::WindingStyle(v)
    }
}

impl From<BlurType> for ParamValue {
    fn from(v: BlurType) -> Self {
        ParamValue::BlurType(v)
    }
}

/// What a successful parameter change invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Only the appearance of rendered pixels changes.
    Appearance,
    /// The cached edge table must be rebuilt.
    Geometry,
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Description of one parameter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: &'static str,
    pub type_name: &'static str,
    pub description: &'static str,
}

const VOCAB: [ParamInfo; 9] = [
    ParamInfo {
        name: "color",
        type_name: "color",
        description: "Fill color of the shape",
    },
    ParamInfo {
        name: "origin",
        type_name: "point",
        description: "Offset applied to every path point",
    },
    ParamInfo {
        name: "invert",
        type_name: "bool",
        description: "Fill the outside of the shape instead of the inside",
    },
    ParamInfo {
        name: "antialias",
        type_name: "bool",
        description: "Compute fractional edge coverage",
    },
    ParamInfo {
        name: "blend_method",
        type_name: "blend method",
        description: "How the shape color is composited onto the surface",
    },
    ParamInfo {
        name: "amount",
        type_name: "real",
        description: "Opacity multiplier for the composite",
    },
    ParamInfo {
        name: "winding_style",
        type_name: "winding style",
        description: "Fill rule for overlapping and self-intersecting paths",
    },
    ParamInfo {
        name: "blur_type",
        type_name: "blur type",
        description: "Kernel used to feather the edges",
    },
    ParamInfo {
        name: "feather",
        type_name: "real",
        description: "Feather radius in world units (non-negative)",
    },
];

/// Every parameter key a shape accepts.
pub fn param_vocab() -> &'static [ParamInfo] {
    &VOCAB
}

// ============================================================================
// ShapeParams
// ============================================================================

/// Appearance and fill-rule parameters of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShapeParams {
    pub color: Rgba,
    pub origin: PointD,
    pub invert: bool,
    pub antialias: bool,
    pub winding_style: WindingStyle,
    pub blur_type: BlurType,
    pub feather: f64,
    pub blend_method: BlendMethod,
    pub amount: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            color: Rgba::black(),
            origin: PointD::new(0.0, 0.0),
            invert: false,
            antialias: true,
            winding_style: WindingStyle::NonZero,
            blur_type: BlurType::FastGaussian,
            feather: 0.0,
            blend_method: BlendMethod::Composite,
            amount: 1.0,
        }
    }
}

impl ShapeParams {
    /// Current value of parameter `name`.
    pub fn get(&self, name: &str) -> Result<ParamValue> {
        Ok(match name {
            "color" => ParamValue::Color(self.color),
            "origin" => ParamValue::Point(self.origin),
            "invert" => ParamValue::Bool(self.invert),
            "antialias" => ParamValue::Bool(self.antialias),
            "blend_method" => ParamValue::BlendMethod(self.blend_method),
            "amount" => ParamValue::Real(self.amount),
            "winding_style" => ParamValue::WindingStyle(self.winding_style),
            "blur_type" => ParamValue::BlurType(self.blur_type),
            "feather" => ParamValue::Real(self.feather),
            _ => return Err(ShapeError::UnknownParam(name.to_string())),
        })
    }

    /// Validate and assign parameter `name`. Nothing changes on error.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<Invalidation> {
        match name {
            "color" => {
                let c = expect_color("color", value)?;
                if !c.is_finite() {
                    return Err(invalid("color", "channels must be finite"));
                }
                self.color = c;
            }
            "origin" => {
                let p = match value {
                    ParamValue::Point(p) => p,
                    other => return Err(mismatch("origin", "point", &other)),
                };
                if !p.is_finite() {
                    return Err(invalid("origin", "coordinates must be finite"));
                }
                self.origin = p;
                return Ok(Invalidation::Geometry);
            }
            "invert" => self.invert = expect_bool("invert", value)?,
            "antialias" => self.antialias = expect_bool("antialias", value)?,
            "blend_method" => {
                self.blend_method = match value {
                    ParamValue::BlendMethod(m) => m,
                    ParamValue::Integer(code) => BlendMethod::try_from(code)?,
                    other => return Err(mismatch("blend_method", "blend method", &other)),
                };
            }
            "amount" => self.amount = expect_finite_real("amount", value)?,
            "winding_style" => {
                self.winding_style = match value {
                    ParamValue::WindingStyle(w) => w,
                    ParamValue::Integer(code) => WindingStyle::try_from(code)?,
                    other => return Err(mismatch("winding_style", "winding style", &other)),
                };
            }
            "blur_type" => {
                self.blur_type = match value {
                    ParamValue::BlurType(b) => b,
                    ParamValue::Integer(code) => BlurType::try_from(code)?,
                    other => return Err(mismatch("blur_type", "blur type", &other)),
                };
            }
            "feather" => {
                let f = expect_finite_real("feather", value)?;
                if f < 0.0 {
                    return Err(invalid("feather", "must be non-negative"));
                }
                self.feather = f;
            }
            _ => return Err(ShapeError::UnknownParam(name.to_string())),
        }
        Ok(Invalidation::Appearance)
    }
}

fn mismatch(name: &'static str, expected: &'static str, found: &ParamValue) -> ShapeError {
    ShapeError::TypeMismatch {
        name,
        expected,
        found: found.type_name(),
    }
}

fn invalid(name: &'static str, reason: &str) -> ShapeError {
    ShapeError::InvalidValue {
        name,
        reason: reason.to_string(),
    }
}

fn expect_color(name: &'static str, value: ParamValue) -> Result<Rgba> {
    match value {
        ParamValue::Color(c) => Ok(c),
        other => Err(mismatch(name, "color", &other)),
    }
}

fn expect_bool(name: &'static str, value: ParamValue) -> Result<bool> {
    match value {
        ParamValue::Bool(b) => Ok(b),
        other => Err(mismatch(name, "bool", &other)),
    }
}

fn expect_finite_real(name: &'static str, value: ParamValue) -> Result<f64> {
    let v = match value {
        ParamValue::Real(v) => v,
        ParamValue::Integer(i) => i as f64,
        other => return Err(mismatch(name, "real", &other)),
    };
    if !v.is_finite() {
        return Err(invalid(name, "must be finite"));
    }
    Ok(v)
}
