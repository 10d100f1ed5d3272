//! Process configuration.
//!
//! [`KeyConfig`] holds the versioned master keys and the active version. It is
//! read once at startup, never mutated, and shared by `Arc` with every
//! component that needs it. [`ServerRuntimeConfig`] covers the listener,
//! storage location and page limits.

use std::{collections::BTreeMap, fmt, path::PathBuf};

use thiserror::Error;
use zeroize::Zeroizing;

/// Prefix of variables carrying a base64 master key, followed by the decimal
/// version (`MASTER_KEY_V1`, `MASTER_KEY_V2`, ...).
pub const MASTER_KEY_PREFIX: &str = "MASTER_KEY_V";

/// Variable holding the version new tenants are bound to.
pub const ACTIVE_VERSION_VAR: &str = "MASTER_KEY_VERSION";

/// Default number of secrets returned by one listing call.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 500;

/// Errors detected while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `MASTER_KEY_VERSION` is set but is not an unsigned integer.
    #[error("MASTER_KEY_VERSION is not an unsigned integer: {value:?}")]
    InvalidActiveVersion {
        /// Raw value found
        value: String,
    },
}

/// Versioned master keys plus the currently active version.
///
/// Key values are kept exactly as configured (base64 text). Decoding happens
/// on resolve, so a malformed entry only fails the requests that need it.
#[derive(Clone, Default)]
pub struct KeyConfig {
    master_keys: BTreeMap<u64, Zeroizing<String>>,
    active_version: Option<u64>,
}

impl KeyConfig {
    /// Empty configuration: no keys, no active version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the process environment.
    ///
    /// Variables that are not valid Unicode are skipped.
    ///
    /// # Errors
    ///
    /// See [`KeyConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?))),
        )
    }

    /// Build from any name/value source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidActiveVersion` if `MASTER_KEY_VERSION` is
    /// present but does not parse as `u64`. A missing active version is not an
    /// error here; it surfaces when a new tenant needs binding.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::new();

        for (name, value) in vars {
            let name = name.as_ref();

            if name == ACTIVE_VERSION_VAR {
                let value: String = value.into();
                let version = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidActiveVersion { value: value.clone() })?;
                config.active_version = Some(version);
                continue;
            }

            let Some(suffix) = name.strip_prefix(MASTER_KEY_PREFIX) else {
                continue;
            };

            match parse_version_suffix(suffix) {
                Some(version) => {
                    config.master_keys.insert(version, Zeroizing::new(value.into()));
                },
                None => {
                    tracing::warn!(variable = name, "ignoring master key variable without canonical version");
                },
            }
        }

        tracing::debug!(
            versions = ?config.versions().collect::<Vec<_>>(),
            active_version = ?config.active_version,
            "key configuration loaded"
        );

        Ok(config)
    }

    /// Register a base64 master key for `version`, replacing any previous one.
    #[must_use]
    pub fn with_master_key(mut self, version: u64, encoded: impl Into<String>) -> Self {
        self.master_keys.insert(version, Zeroizing::new(encoded.into()));
        self
    }

    /// Set the version new tenants are bound to.
    #[must_use]
    pub fn with_active_version(mut self, version: u64) -> Self {
        self.active_version = Some(version);
        self
    }

    /// Configured base64 text for `version`, if any.
    pub fn master_key_encoded(&self, version: u64) -> Option<&str> {
        self.master_keys.get(&version).map(|encoded| encoded.as_str())
    }

    /// Version new tenants are bound to, if configured.
    pub fn active_version(&self) -> Option<u64> {
        self.active_version
    }

    /// All configured key versions, ascending.
    pub fn versions(&self) -> impl Iterator<Item = u64> + '_ {
        self.master_keys.keys().copied()
    }
}

/// Version from a `MASTER_KEY_V` suffix, only in canonical decimal form.
///
/// `01`, `+1` and ` 1` would alias version 1, so anything but plain digits
/// without a leading zero is rejected.
fn parse_version_suffix(suffix: &str) -> Option<u64> {
    let canonical = !suffix.is_empty()
        && suffix.bytes().all(|b| b.is_ascii_digit())
        && (suffix == "0" || !suffix.starts_with('0'));

    if canonical { suffix.parse().ok() } else { None }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("versions", &self.master_keys.keys().collect::<Vec<_>>())
            .field("active_version", &self.active_version)
            .finish_non_exhaustive()
    }
}

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// Redb database file. `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    /// Page size used when a listing request gives no `limit`
    pub default_page_size: usize,
    /// Largest `limit` honored; larger requests are clamped
    pub max_page_size: usize,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            database_path: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test]
    fn test_from_vars_collects_versions_and_active() {
        let config = KeyConfig::from_vars([
            ("MASTER_KEY_V1", ZERO_KEY),
            ("MASTER_KEY_V2", "second"),
            ("MASTER_KEY_VERSION", "2"),
            ("PATH", "/usr/bin"),
        ])
        .unwrap();

        assert_eq!(config.versions().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(config.master_key_encoded(1), Some(ZERO_KEY));
        assert_eq!(config.master_key_encoded(2), Some("second"));
        assert_eq!(config.master_key_encoded(3), None);
        assert_eq!(config.active_version(), Some(2));
    }

    #[test]
    fn test_active_version_var_is_not_a_key() {
        let config = KeyConfig::from_vars([("MASTER_KEY_VERSION", "7")]).unwrap();

        assert_eq!(config.versions().count(), 0);
        assert_eq!(config.active_version(), Some(7));
    }

    #[test]
    fn test_missing_active_version_is_none() {
        let config = KeyConfig::from_vars([("MASTER_KEY_V1", ZERO_KEY)]).unwrap();
        assert_eq!(config.active_version(), None);
    }

    #[test]
    fn test_invalid_active_version_rejected() {
        let result = KeyConfig::from_vars([("MASTER_KEY_VERSION", "two")]);
        assert_eq!(result.unwrap_err(), ConfigError::InvalidActiveVersion { value: "two".to_string() });

        let result = KeyConfig::from_vars([("MASTER_KEY_VERSION", "-1")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_suffix_ignored() {
        let config =
            KeyConfig::from_vars([("MASTER_KEY_VX", ZERO_KEY), ("MASTER_KEY_V", ZERO_KEY)]).unwrap();
        assert_eq!(config.versions().count(), 0);
    }

    #[test]
    fn test_aliased_suffixes_ignored() {
        let config = KeyConfig::from_vars([
            ("MASTER_KEY_V1", ZERO_KEY),
            ("MASTER_KEY_V01", "stale"),
            ("MASTER_KEY_V+1", "stale"),
            ("MASTER_KEY_V+2", "stale"),
            ("MASTER_KEY_V 3", "stale"),
            ("MASTER_KEY_V0", "zero"),
        ])
        .unwrap();

        assert_eq!(config.versions().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(config.master_key_encoded(1), Some(ZERO_KEY));
        assert_eq!(config.master_key_encoded(0), Some("zero"));
    }

    #[test]
    fn test_version_suffix_overflow_ignored() {
        let config = KeyConfig::from_vars([("MASTER_KEY_V99999999999999999999", ZERO_KEY)]).unwrap();
        assert_eq!(config.versions().count(), 0);
    }

    #[test]
    fn test_builder() {
        let config = KeyConfig::new().with_master_key(3, ZERO_KEY).with_active_version(3);

        assert_eq!(config.master_key_encoded(3), Some(ZERO_KEY));
        assert_eq!(config.active_version(), Some(3));
    }

    #[test]
    fn test_debug_does_not_print_keys() {
        let config = KeyConfig::new().with_master_key(1, ZERO_KEY);
        let debug = format!("{config:?}");

        assert!(!debug.contains(ZERO_KEY));
        assert!(debug.contains("versions"));
    }

    #[test]
    fn test_runtime_defaults() {
        let config = ServerRuntimeConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert!(config.database_path.is_none());
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.max_page_size, 500);
    }
}
