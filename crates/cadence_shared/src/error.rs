//! Protocol decode errors.

use thiserror::Error;

/// Errors raised while decoding a record payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The kind tag is not one this build knows.
    #[error("unknown command kind {0}")]
    UnknownKind(u32),

    /// The payload is shorter than the fixed part of its kind.
    #[error("truncated {kind} payload: need {expected} bytes, got {actual}")]
    Truncated {
        /// Kind name.
        kind: &'static str,
        /// Bytes required.
        expected: usize,
        /// Bytes present.
        actual: usize,
    },

    /// Trailing data is not a whole number of elements.
    #[error("{kind} trailing data of {len} bytes is not a multiple of {element}")]
    Misaligned {
        /// Kind name.
        kind: &'static str,
        /// Trailing length.
        len: usize,
        /// Element size.
        element: usize,
    },

    /// A name or source string is not UTF-8.
    #[error("{kind} carries invalid UTF-8 text")]
    InvalidUtf8 {
        /// Kind name.
        kind: &'static str,
    },
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
