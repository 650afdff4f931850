//! # Error Module - Custom *LargeArray* Error Type
//!
//! Defines the unified error type for the crate.
//!
//! ## Features
//! - Covers invalid arguments, out-of-range indices, kind mismatches between
//! arrays, and failed raw allocations.
//! - Every variant is reported synchronously by the operation that detects it.
//! Unchecked accessors never produce one of these; their contract is `unsafe`.

use thiserror::Error;

use crate::enums::element_kind::ElementKind;

/// Catch all error type for `largearray`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LargeArrayError {
    /// Non-positive length, out-of-domain threshold, zero step,
    /// unsupported conversion, unrecognised kind, over-long string.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A checked accessor or a bulk operation received an index outside `[0, len)`.
    #[error("Index out of range: index {index} is not within [0, {len}).")]
    IndexOutOfRange { index: u64, len: u64 },

    /// A bulk operation or accessor was applied across differing element kinds.
    #[error("Type mismatch: expected '{expected}', found '{found}'.")]
    TypeMismatch {
        expected: ElementKind,
        found: ElementKind,
    },

    /// The system allocator refused a raw block, or its size is not representable.
    #[error("Allocation failed: could not allocate {bytes} bytes.")]
    AllocationFailed { bytes: u64 },
}

impl LargeArrayError {
    #[inline]
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        LargeArrayError::InvalidArgument(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LargeArrayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = LargeArrayError::IndexOutOfRange { index: 5, len: 5 };
        assert_eq!(e.to_string(), "Index out of range: index 5 is not within [0, 5).");

        let e = LargeArrayError::TypeMismatch {
            expected: ElementKind::Double,
            found: ElementKind::Int,
        };
        assert_eq!(e.to_string(), "Type mismatch: expected 'double', found 'int'.");

        let e = LargeArrayError::invalid("length must be positive");
        assert_eq!(e.to_string(), "Invalid argument: length must be positive");
    }
}
