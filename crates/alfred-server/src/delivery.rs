//! Key delivery.
//!
//! Hands a tenant's DEK for an explicit key version to an authorized client.
//! No binding check happens here: callers ask for historical versions to read
//! legacy secrets. Authorizing the requester for the tenant belongs to the
//! gateway in front of this server.

use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use zeroize::Zeroizing;

use crate::{custody_error::CustodyError, key_registry::MasterKeyRegistry};

/// Derives and encodes tenant DEKs on demand. Nothing is cached.
#[derive(Debug, Clone)]
pub struct KeyDelivery {
    registry: MasterKeyRegistry,
}

impl KeyDelivery {
    /// Create over a master key registry.
    pub fn new(registry: MasterKeyRegistry) -> Self {
        Self { registry }
    }

    /// Base64 DEK for `tenant_id` under `key_version`.
    ///
    /// # Errors
    ///
    /// Registry and derivation failures propagate unchanged (`KeyNotFound`,
    /// `KeyMalformed`, `DerivationFailed`).
    pub fn deliver(&self, tenant_id: i64, key_version: u64) -> Result<Zeroizing<String>, CustodyError> {
        let master = self.registry.resolve(key_version)?;
        let dek = master.derive_for_tenant(tenant_id)?;

        tracing::debug!(tenant_id, key_version, "delivering tenant key");

        Ok(Zeroizing::new(STANDARD.encode(dek.as_bytes())))
    }

    /// Parse raw request parameters, then [`deliver`](Self::deliver).
    ///
    /// # Errors
    ///
    /// `InvalidInput` if either parameter is missing or unparsable, otherwise
    /// as [`deliver`](Self::deliver).
    pub fn deliver_raw(
        &self,
        tenant_id: Option<&str>,
        key_version: Option<&str>,
    ) -> Result<Zeroizing<String>, CustodyError> {
        let key_version: u64 = parse_param("keyVersion", key_version)?;
        let tenant_id: i64 = parse_param("chatId", tenant_id)?;

        self.deliver(tenant_id, key_version)
    }
}

/// Parse a named request parameter, mapping absence and garbage to
/// `InvalidInput`.
///
/// The text is taken as is: surrounding whitespace and an explicit `+` sign
/// are rejected.
pub fn parse_param<T: FromStr>(name: &str, raw: Option<&str>) -> Result<T, CustodyError> {
    let raw = raw.ok_or_else(|| CustodyError::InvalidInput(format!("missing {name}")))?;
    let invalid = || CustodyError::InvalidInput(format!("{name} is not a valid number: {raw:?}"));

    if raw.starts_with('+') {
        return Err(invalid());
    }

    raw.parse().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::KeyConfig;

    const ZERO_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
    const TENANT_42_V1: &str = "BESG8o0Jmls4sSwSgxUZ9T6N+64r2QKWOpt7F8hwQG4=";

    fn delivery() -> KeyDelivery {
        let config = KeyConfig::new().with_master_key(1, ZERO_KEY).with_master_key(2, ZERO_KEY);
        KeyDelivery::new(MasterKeyRegistry::new(Arc::new(config)))
    }

    #[test]
    fn golden_vector() {
        assert_eq!(delivery().deliver(42, 1).unwrap().as_str(), TENANT_42_V1);
    }

    #[test]
    fn version_and_tenant_change_output() {
        let delivery = delivery();
        let base = delivery.deliver(42, 1).unwrap();

        assert_ne!(delivery.deliver(42, 2).unwrap().as_str(), base.as_str());
        assert_ne!(delivery.deliver(43, 1).unwrap().as_str(), base.as_str());
    }

    #[test]
    fn unknown_version_propagates() {
        assert_eq!(delivery().deliver(42, 9).unwrap_err(), CustodyError::KeyNotFound { version: 9 });
    }

    #[test]
    fn raw_parameters_are_parsed() {
        let delivery = delivery();

        assert_eq!(delivery.deliver_raw(Some("42"), Some("1")).unwrap().as_str(), TENANT_42_V1);
        assert!(delivery.deliver_raw(Some("-1001234567890"), Some("1")).is_ok());
    }

    #[test]
    fn bad_parameters_are_invalid_input() {
        let delivery = delivery();

        for (tenant, version) in [
            (Some("abc"), Some("1")),
            (Some("42"), Some("-1")),
            (Some("42"), Some("1.5")),
            (None, Some("1")),
            (Some("42"), None),
            (Some("99999999999999999999"), Some("1")),
            (Some("42"), Some(" 1")),
            (Some("42 "), Some("1")),
            (Some("42"), Some("+1")),
            (Some("+42"), Some("1")),
            (Some(""), Some("1")),
        ] {
            let err = delivery.deliver_raw(tenant, version).unwrap_err();
            assert!(err.is_client_error(), "{tenant:?}/{version:?} gave {err:?}");
        }
    }
}
