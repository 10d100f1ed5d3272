//! Storage abstraction for tenants and secrets
//!
//! Trait-based abstraction over the relational store behind the tenant
//! registry and the secret vault. The trait is synchronous (no async): every
//! operation is a single independent transaction.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;

pub use self::redb::RedbStorage;
use crate::model::{NewSecret, SecretRecord, TenantRecord};

/// Storage abstraction for tenant bindings and secret records
///
/// Must be Clone (shared by every request handler), Send + Sync
/// (thread-safe), and synchronous. Implementations share internal state via
/// Arc, so clones access the same underlying storage.
///
/// # Panics
///
/// Implementations may panic if internal synchronization primitives are
/// poisoned (a thread panicked while holding a lock). Acceptable for
/// test/simulation code, but production implementations should handle poisoned
/// mutexes gracefully.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Load a tenant by id.
    ///
    /// Returns `None` if the tenant has never been registered.
    fn load_tenant(&self, tenant_id: i64) -> Result<Option<TenantRecord>, StorageError>;

    /// Register a tenant.
    ///
    /// # Invariants
    ///
    /// - Tenant id is unique: if a row already exists this fails with
    ///   `StorageError::AlreadyExists` and leaves the existing row untouched
    /// - Post: a later `load_tenant` returns the row that won
    fn insert_tenant(&self, tenant: &TenantRecord) -> Result<(), StorageError>;

    /// List a tenant's secrets in ascending id order.
    ///
    /// Skips `offset` records, then returns at most `limit`. An unknown tenant
    /// or an offset past the end yields an empty vector.
    fn list_secrets(
        &self,
        tenant_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SecretRecord>, StorageError>;

    /// Persist a secret and return its newly assigned id.
    ///
    /// # Invariants
    ///
    /// - Ids are unique, strictly increasing, and never reused after delete
    /// - `value` and `iv` are stored byte-for-byte
    fn insert_secret(&self, secret: &NewSecret) -> Result<i64, StorageError>;

    /// Delete a secret by id.
    ///
    /// Returns whether a row was removed. Deleting an unknown id is not an
    /// error.
    fn delete_secret(&self, secret_id: i64) -> Result<bool, StorageError>;
}
