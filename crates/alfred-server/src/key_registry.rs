//! Master key registry.
//!
//! Resolves a key version to its 32-byte master key from the immutable
//! [`KeyConfig`]. Nothing is cached: each call decodes the configured text, so
//! concurrent resolution needs no shared mutable state.

use std::sync::Arc;

use alfred_crypto::MasterKey;
use base64::{Engine, engine::general_purpose::STANDARD};
use zeroize::Zeroizing;

use crate::{config::KeyConfig, custody_error::CustodyError};

/// Read-only view of the configured master keys.
#[derive(Debug, Clone)]
pub struct MasterKeyRegistry {
    config: Arc<KeyConfig>,
}

impl MasterKeyRegistry {
    /// Create a registry over shared configuration.
    pub fn new(config: Arc<KeyConfig>) -> Self {
        Self { config }
    }

    /// Resolve `version` to its master key.
    ///
    /// # Errors
    ///
    /// - `KeyNotFound` if no key is configured for `version`
    /// - `KeyMalformed` if the configured text is not base64 or does not
    ///   decode to exactly 32 bytes
    pub fn resolve(&self, version: u64) -> Result<MasterKey, CustodyError> {
        let encoded =
            self.config.master_key_encoded(version).ok_or(CustodyError::KeyNotFound { version })?;

        let decoded = STANDARD.decode(encoded.trim()).map(Zeroizing::new).map_err(|e| {
            CustodyError::KeyMalformed { version, reason: format!("invalid base64: {e}") }
        })?;

        MasterKey::from_slice(version, &decoded)
            .map_err(|e| CustodyError::KeyMalformed { version, reason: e.to_string() })
    }
}
