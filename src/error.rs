//! Error types for parameter handling.
//!
//! Geometry problems never surface as errors: degenerate paths render
//! nothing and oversized or misplaced render regions are clipped. Only the
//! parameter boundary reports failures.

use thiserror::Error;

/// Errors reported when setting shape parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// The parameter name is not part of the shape's vocabulary
    #[error("unknown parameter `{0}`")]
    UnknownParam(String),

    /// The value has the wrong type for the parameter
    #[error("parameter `{name}` expects {expected}, got {found}")]
    TypeMismatch {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// The value has the right type but is out of range
    #[error("parameter `{name}` rejected: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    /// An integer code does not name a variant of the enum
    #[error("unknown {kind} code {code}")]
    UnknownVariant { kind: &'static str, code: i32 },
}

/// Result type for shape operations
pub type Result<T> = std::result::Result<T, ShapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = ShapeError::UnknownParam("radius".into());
        assert_eq!(e.to_string(), "unknown parameter `radius`");

        let e = ShapeError::TypeMismatch {
            name: "feather",
            expected: "real",
            found: "bool",
        };
        assert_eq!(e.to_string(), "parameter `feather` expects real, got bool");

        let e = ShapeError::UnknownVariant {
            kind: "winding style",
            code: 7,
        };
        assert_eq!(e.to_string(), "unknown winding style code 7");
    }
}
