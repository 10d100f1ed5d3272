//! Wire shapes for the HTTP surface.
//!
//! Field names are camelCase on the wire (`chatId`, `keyVersion`, `ivB64`) and
//! map onto the snake_case model types.

use serde::{Deserialize, Serialize};

use crate::{
    binding::TenantBinding,
    model::{NewSecret, Opaque, SecretRecord},
};

/// Query of `GET /encryption/key`. Kept as text so parse failures become 400s.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyQuery {
    /// Key version to derive under
    pub key_version: Option<String>,
    /// Tenant to derive for
    pub chat_id: Option<String>,
}

/// Pagination query of `GET /secrets/{chatId}`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Maximum records to return
    pub limit: Option<String>,
    /// Records to skip
    pub offset: Option<String>,
}

/// Body of `POST /secrets`.
///
/// A client-supplied `id` is not part of the shape and is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecretRequest {
    /// Client-chosen label
    pub key: String,
    /// Ciphertext
    pub value: Opaque,
    /// Owning tenant
    pub chat_id: i64,
    /// Key version used to encrypt
    pub key_version: u64,
    /// Initialization vector
    pub iv_b64: Opaque,
}

impl From<CreateSecretRequest> for NewSecret {
    fn from(req: CreateSecretRequest) -> Self {
        Self {
            key: req.key,
            value: req.value,
            tenant_id: req.chat_id,
            key_version: req.key_version,
            iv: req.iv_b64,
        }
    }
}

/// Response of `POST /secrets`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedSecretResponse {
    /// Assigned id
    pub id: i64,
}

/// One element of the `GET /secrets/{chatId}` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretResponse {
    /// Secret id
    pub id: i64,
    /// Client-chosen label
    pub key: String,
    /// Ciphertext as stored
    pub value: Opaque,
    /// Owning tenant
    pub chat_id: i64,
    /// Key version used to encrypt
    pub key_version: u64,
    /// Initialization vector as stored
    pub iv_b64: Opaque,
}

impl From<SecretRecord> for SecretResponse {
    fn from(record: SecretRecord) -> Self {
        Self {
            id: record.id,
            key: record.key,
            value: record.value,
            chat_id: record.tenant_id,
            key_version: record.key_version,
            iv_b64: record.iv,
        }
    }
}

/// Optional body of `POST /tenants/{chatId}`.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterTenantRequest {
    /// Tenant kind; defaults to "private"
    pub kind: Option<String>,
}

/// Response of `POST /tenants/{chatId}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantResponse {
    /// Tenant id
    pub chat_id: i64,
    /// Tenant kind
    pub kind: String,
    /// Pinned key version
    pub key_version: u64,
    /// Whether this request created the binding
    pub created: bool,
}

impl From<TenantBinding> for TenantResponse {
    fn from(binding: TenantBinding) -> Self {
        Self {
            chat_id: binding.tenant_id,
            kind: binding.kind,
            key_version: binding.key_version,
            created: binding.created,
        }
    }
}
