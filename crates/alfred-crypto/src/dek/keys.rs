//! Key material types.
//!
//! Both types wipe their bytes on drop and redact them from `Debug` output, so
//! a stray `{:?}` in a log line cannot leak key material.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{
    derivation::derive_dek,
    error::{DerivationError, KeyError},
};

/// Size in bytes of master keys and derived DEKs (256 bits).
pub const KEY_SIZE: usize = 32;

/// A versioned root secret from which tenant DEKs are derived.
///
/// Immutable once constructed. Multiple versions coexist; retiring one makes
/// every secret bound to it undecryptable, which is an operational decision
/// outside this crate.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    version: u64,
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Wrap exactly 32 bytes of key material for `version`.
    pub fn new(version: u64, bytes: [u8; KEY_SIZE]) -> Self {
        Self { version, bytes }
    }

    /// Build a master key from a slice, rejecting any length other than 32.
    pub fn from_slice(version: u64, bytes: &[u8]) -> Result<Self, KeyError> {
        let Ok(array) = <[u8; KEY_SIZE]>::try_from(bytes) else {
            return Err(KeyError::InvalidLength { expected: KEY_SIZE, actual: bytes.len() });
        };
        Ok(Self::new(version, array))
    }

    /// Version this key was provisioned under.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Derive the DEK for `tenant_id` under this key's own version.
    pub fn derive_for_tenant(&self, tenant_id: i64) -> Result<DataKey, DerivationError> {
        derive_dek(&self.bytes, tenant_id, self.version)
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("version", &self.version)
            .field("bytes", &"<redacted>")
            .finish()
    }
}

/// A derived 256-bit data-encryption key for one tenant and one version.
///
/// Never persisted server-side; lives only for the request that derived it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey([u8; KEY_SIZE]);

impl DataKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_accepts_32_bytes() {
        let key = MasterKey::from_slice(3, &[7u8; 32]).unwrap();
        assert_eq!(key.version(), 3);
        assert_eq!(key.as_bytes(), &[7u8; 32]);
    }

    #[test]
    fn from_slice_rejects_short_and_long_keys() {
        assert_eq!(
            MasterKey::from_slice(1, &[0u8; 16]).unwrap_err(),
            KeyError::InvalidLength { expected: 32, actual: 16 }
        );
        assert_eq!(
            MasterKey::from_slice(1, &[0u8; 33]).unwrap_err(),
            KeyError::InvalidLength { expected: 32, actual: 33 }
        );
        assert!(MasterKey::from_slice(1, &[]).is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let master = MasterKey::new(9, [0xAB; 32]);
        let rendered = format!("{master:?}");
        assert!(rendered.contains("version: 9"));
        assert!(!rendered.contains("171"), "key bytes leaked: {rendered}");

        let dek = master.derive_for_tenant(1).unwrap();
        assert_eq!(format!("{dek:?}"), "DataKey(<redacted>)");
    }

    #[test]
    fn derive_for_tenant_uses_own_version() {
        let master = MasterKey::new(5, [1u8; 32]);
        let via_method = master.derive_for_tenant(77).unwrap();
        let via_fn = derive_dek(&[1u8; 32], 77, 5).unwrap();
        assert_eq!(via_method.as_bytes(), via_fn.as_bytes());
    }
}
