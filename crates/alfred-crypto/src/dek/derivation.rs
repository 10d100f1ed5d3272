//! DEK derivation using HKDF-SHA256

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::{
    error::DerivationError,
    keys::{DataKey, KEY_SIZE},
};

/// Leading part of the HKDF info string, before the version.
pub const DEK_INFO_PREFIX: &str = "Alfred-DEK|AES-256-GCM|v=";

/// Trailing part of the HKDF info string, after the version.
pub const DEK_INFO_SCOPE: &str = "|scope=telegram-chat";

/// Salt for a tenant: SHA-256 of the id as 8 big-endian two's-complement bytes.
pub fn tenant_salt(tenant_id: i64) -> [u8; 32] {
    Sha256::digest(tenant_id.to_be_bytes()).into()
}

/// HKDF info string binding the DEK to a key version.
///
/// `Alfred-DEK|AES-256-GCM|v=<version>|scope=telegram-chat`, version in decimal.
pub fn dek_info(key_version: u64) -> String {
    format!("{DEK_INFO_PREFIX}{key_version}{DEK_INFO_SCOPE}")
}

/// Derive the data-encryption key for a tenant.
///
/// HKDF-SHA256 with `master_key` as input keying material, [`tenant_salt`] as
/// salt and [`dek_info`] as context, expanded to exactly 32 bytes.
///
/// # Security
///
/// - Deterministic: same inputs always produce the same DEK, on any process
/// - Different tenants produce different DEKs (tenant isolation)
/// - Different versions produce different DEKs (version isolation)
///
/// # Errors
///
/// `DerivationFailed` if HKDF rejects the output length. Cannot happen for the
/// fixed 32-byte output.
pub fn derive_dek(
    master_key: &[u8; KEY_SIZE],
    tenant_id: i64,
    key_version: u64,
) -> Result<DataKey, DerivationError> {
    let salt = tenant_salt(tenant_id);
    let info = dek_info(key_version);
    let hkdf = Hkdf::<Sha256>::new(Some(&salt), master_key);

    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(info.as_bytes(), &mut okm)
        .map_err(|e| DerivationError::DerivationFailed { reason: e.to_string() })?;

    let dek = DataKey::from_bytes(okm);
    okm.zeroize();
    Ok(dek)
}
