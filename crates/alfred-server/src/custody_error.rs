//! Errors from key custody operations.
//!
//! One taxonomy shared by the key registry, tenant bindings, the secret vault
//! and key delivery. Every variant is request-scoped: none of them stops the
//! process, and the HTTP boundary maps each to a status category.

use alfred_crypto::DerivationError;
use thiserror::Error;

use crate::storage::StorageError;

/// Failure of a single custody request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// No master key configured for the requested version.
    #[error("no master key configured for version {version}")]
    KeyNotFound {
        /// Requested key version
        version: u64,
    },

    /// Configured master key does not decode to exactly 32 bytes.
    ///
    /// `reason` describes the decoding problem and never includes key text.
    #[error("master key for version {version} is malformed: {reason}")]
    KeyMalformed {
        /// Key version whose entry is malformed
        version: u64,
        /// What was wrong with it
        reason: String,
    },

    /// A new tenant needs a binding but no active version is configured.
    #[error("no active master key version configured")]
    ActiveVersionUndefined,

    /// HKDF rejected its parameters. Unreachable with validated keys.
    #[error(transparent)]
    DerivationFailed(#[from] DerivationError),

    /// Request parameters could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persistence layer failed; the caller owns retry policy.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

impl CustodyError {
    /// Whether the caller sent something unusable, as opposed to the server
    /// failing to serve a well-formed request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
