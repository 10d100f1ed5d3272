//! Tenant key-version binding.
//!
//! Each tenant is pinned to the key version that was active at its first
//! contact. The pin is written once and never changed, so rotating the active
//! version only affects tenants created afterwards.
//!
//! Concurrent first contacts are settled by the storage uniqueness constraint:
//! the loser of the insert sees `StorageError::AlreadyExists` and re-reads the
//! winner's row. There is no in-process lock, so several server instances can
//! share one store.

use std::sync::Arc;

use crate::{
    config::KeyConfig,
    custody_error::CustodyError,
    model::{TenantMetadata, TenantRecord},
    storage::{Storage, StorageError},
};

/// Outcome of resolving a tenant's binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantBinding {
    /// Tenant id
    pub tenant_id: i64,
    /// Tenant kind recorded at creation
    pub kind: String,
    /// Pinned key version
    pub key_version: u64,
    /// Whether this call created the binding
    pub created: bool,
}

impl TenantBinding {
    fn existing(record: TenantRecord) -> Self {
        Self { tenant_id: record.id, kind: record.kind, key_version: record.key_version, created: false }
    }
}

/// Tenant registry with create-if-absent key-version binding.
#[derive(Debug, Clone)]
pub struct TenantBindings<S: Storage> {
    storage: S,
    config: Arc<KeyConfig>,
}

impl<S: Storage> TenantBindings<S> {
    /// Create over a storage backend and the shared key configuration.
    pub fn new(storage: S, config: Arc<KeyConfig>) -> Self {
        Self { storage, config }
    }

    /// Pinned key version for `tenant_id`, creating the binding with default
    /// metadata on first contact.
    ///
    /// # Errors
    ///
    /// - `ActiveVersionUndefined` if the tenant is new and no active version
    ///   is configured
    /// - `StorageUnavailable` on storage failure
    pub fn get_or_create_binding(&self, tenant_id: i64) -> Result<u64, CustodyError> {
        self.get_or_create_binding_with(tenant_id, &TenantMetadata::default())
            .map(|binding| binding.key_version)
    }

    /// Like [`get_or_create_binding`](Self::get_or_create_binding), recording
    /// `metadata` if this call creates the tenant.
    ///
    /// Metadata is ignored for tenants that already exist.
    ///
    /// # Errors
    ///
    /// Same as [`get_or_create_binding`](Self::get_or_create_binding).
    pub fn get_or_create_binding_with(
        &self,
        tenant_id: i64,
        metadata: &TenantMetadata,
    ) -> Result<TenantBinding, CustodyError> {
        if let Some(existing) = self.storage.load_tenant(tenant_id)? {
            return Ok(TenantBinding::existing(existing));
        }

        let key_version = self.config.active_version().ok_or(CustodyError::ActiveVersionUndefined)?;

        let record = TenantRecord { id: tenant_id, kind: metadata.kind.clone(), key_version };

        match self.storage.insert_tenant(&record) {
            Ok(()) => {
                tracing::info!(tenant_id, key_version, kind = %record.kind, "tenant bound to key version");
                Ok(TenantBinding { tenant_id, kind: record.kind, key_version, created: true })
            },
            Err(conflict @ StorageError::AlreadyExists { .. }) => {
                tracing::debug!(tenant_id, "lost first-contact race, re-reading binding");

                match self.storage.load_tenant(tenant_id)? {
                    Some(winner) => Ok(TenantBinding::existing(winner)),
                    // Row reported as present but unreadable; surface the conflict
                    None => Err(CustodyError::StorageUnavailable(conflict)),
                }
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Registry lookup; `None` if the tenant has never been seen.
    ///
    /// # Errors
    ///
    /// `StorageUnavailable` on storage failure.
    pub fn lookup(&self, tenant_id: i64) -> Result<Option<TenantRecord>, CustodyError> {
        Ok(self.storage.load_tenant(tenant_id)?)
    }
}
