//! Error types for key handling and derivation

use thiserror::Error;

/// Errors from DEK derivation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// HKDF rejected the requested output length.
    ///
    /// Unreachable for the fixed 32-byte output used here; surfaced instead of
    /// panicking so callers can map it to a request-scoped failure.
    #[error("DEK derivation failed: {reason}")]
    DerivationFailed {
        /// Reason reported by the HKDF construction
        reason: String,
    },
}

/// Errors from constructing key material
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Invalid key material length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },
}
