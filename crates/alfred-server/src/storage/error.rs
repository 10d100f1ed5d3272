//! Storage error types.
//!
//! Defines errors that can occur during storage operations:
//! - `AlreadyExists`: Tenant id uniqueness violated on insert
//! - `Serialization`: Failed to encode/decode a record
//! - `Io`: Underlying storage system errors

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Tenant already registered
    ///
    /// Returned by `insert_tenant` when another writer registered the same
    /// tenant first. Callers re-read the existing row instead of failing.
    #[error("tenant already exists: {tenant_id}")]
    AlreadyExists {
        /// Tenant id that was already taken
        tenant_id: i64,
    },

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
