//! Secret vault.
//!
//! Stores client-encrypted secrets as opaque records. The vault never decodes
//! `value` or `iv` and has no update path: a record's key version and IV stay
//! paired for its whole life, and rotation is insert-new then delete-old.

use crate::{
    custody_error::CustodyError,
    model::{NewSecret, SecretRecord},
    storage::Storage,
};

/// Tenant-scoped CRUD over opaque secret records.
#[derive(Debug, Clone)]
pub struct SecretVault<S: Storage> {
    storage: S,
}

impl<S: Storage> SecretVault<S> {
    /// Create a vault over a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// A page of `tenant_id`'s secrets in ascending id order.
    ///
    /// An unknown tenant, an offset past the end, or `limit == 0` all give an
    /// empty page.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` on storage failure.
    pub fn list(
        &self,
        tenant_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SecretRecord>, CustodyError> {
        let secrets = self.storage.list_secrets(tenant_id, limit, offset)?;

        tracing::debug!(tenant_id, limit, offset, count = secrets.len(), "listed secrets");

        Ok(secrets)
    }

    /// Store a secret exactly as submitted and return its assigned id.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` on storage failure.
    pub fn insert(&self, secret: &NewSecret) -> Result<i64, CustodyError> {
        let id = self.storage.insert_secret(secret)?;

        tracing::info!(
            secret_id = id,
            tenant_id = secret.tenant_id,
            key_version = secret.key_version,
            "secret stored"
        );

        Ok(id)
    }

    /// Delete a secret by id.
    ///
    /// Idempotent: succeeds whether or not the row existed.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` on storage failure.
    pub fn delete(&self, secret_id: i64) -> Result<(), CustodyError> {
        let removed = self.storage.delete_secret(secret_id)?;

        tracing::debug!(secret_id, removed, "secret delete");

        Ok(())
    }
}
