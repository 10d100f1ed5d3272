//! Records owned by the tenant registry and the secret vault.
//!
//! Serde names follow the persisted schema (`chat_id`, `iv_b64`); the HTTP
//! layer has its own camelCase DTOs.

use serde::{Deserialize, Serialize};

/// Tenant kind recorded when no metadata is supplied on first contact.
pub const DEFAULT_TENANT_KIND: &str = "private";

/// A client-produced string the server stores and returns byte-for-byte.
///
/// Used for ciphertext and IVs. There is no parsing or validation
/// API: the server never learns what the bytes mean.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opaque(String);

impl Opaque {
    /// Wrap a client-supplied string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The stored string, exactly as received.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Metadata supplied on a tenant's first contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMetadata {
    /// Tenant kind (chat type in the messaging front-end).
    pub kind: String,
}

impl Default for TenantMetadata {
    fn default() -> Self {
        Self { kind: DEFAULT_TENANT_KIND.to_string() }
    }
}

/// A registered tenant and the key version pinned at its first contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Tenant id (the chat id).
    pub id: i64,
    /// Tenant kind.
    pub kind: String,
    /// Key version bound for the tenant's lifetime.
    pub key_version: u64,
}

/// A secret as submitted by a client, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSecret {
    /// Client-chosen label.
    pub key: String,
    /// Ciphertext, never interpreted server-side.
    pub value: Opaque,
    /// Owning tenant.
    #[serde(rename = "chat_id")]
    pub tenant_id: i64,
    /// Key version the client encrypted under.
    pub key_version: u64,
    /// Initialization vector (base64 by client convention, not checked).
    #[serde(rename = "iv_b64")]
    pub iv: Opaque,
}

/// A persisted secret.
///
/// `key_version` and `iv` are fixed at creation; there is no update path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Store-assigned id, unique and never reused.
    pub id: i64,
    /// Client-chosen label.
    pub key: String,
    /// Ciphertext, never interpreted server-side.
    pub value: Opaque,
    /// Owning tenant.
    #[serde(rename = "chat_id")]
    pub tenant_id: i64,
    /// Key version the client encrypted under.
    pub key_version: u64,
    /// Initialization vector.
    #[serde(rename = "iv_b64")]
    pub iv: Opaque,
}

impl SecretRecord {
    /// Attach a store-assigned id to a submitted secret.
    pub fn from_new(id: i64, secret: NewSecret) -> Self {
        Self {
            id,
            key: secret.key,
            value: secret.value,
            tenant_id: secret.tenant_id,
            key_version: secret.key_version,
            iv: secret.iv,
        }
    }
}
