#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::{BTreeMap, HashMap, hash_map::Entry},
    sync::{Arc, Mutex, MutexGuard},
};

use super::{Storage, StorageError};
use crate::model::{NewSecret, SecretRecord, TenantRecord};

/// In-memory storage implementation for testing and ephemeral runs
///
/// Tenants live in a `HashMap`; secrets in a `BTreeMap` keyed by id so listing
/// is naturally in ascending id order. All state is wrapped in Arc<Mutex<>> to
/// allow Clone and concurrent access. Uses `lock().expect()`, which panics if
/// the mutex is poisoned - acceptable for test code.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

struct MemoryStorageInner {
    /// Registered tenants with their pinned key version
    tenants: HashMap<i64, TenantRecord>,

    /// Secrets by id, across all tenants
    secrets: BTreeMap<i64, SecretRecord>,

    /// Last id handed out; ids are never reused
    last_secret_id: i64,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStorageInner {
                tenants: HashMap::new(),
                secrets: BTreeMap::new(),
                last_secret_id: 0,
            })),
        }
    }

    /// Number of registered tenants.
    ///
    /// Useful for debugging and testing.
    pub fn tenant_count(&self) -> usize {
        self.lock().tenants.len()
    }

    /// Total number of secrets across all tenants.
    ///
    /// Useful for debugging and testing.
    pub fn secret_count(&self) -> usize {
        self.lock().secrets.len()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned (a thread panicked while
    /// holding the lock). This is acceptable for test/simulation code.
    #[allow(clippy::expect_used)]
    fn lock(&self) -> MutexGuard<'_, MemoryStorageInner> {
        self.inner.lock().expect("Mutex poisoned")
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn load_tenant(&self, tenant_id: i64) -> Result<Option<TenantRecord>, StorageError> {
        Ok(self.lock().tenants.get(&tenant_id).cloned())
    }

    fn insert_tenant(&self, tenant: &TenantRecord) -> Result<(), StorageError> {
        match self.lock().tenants.entry(tenant.id) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists { tenant_id: tenant.id }),
            Entry::Vacant(slot) => {
                slot.insert(tenant.clone());
                Ok(())
            },
        }
    }

    fn list_secrets(
        &self,
        tenant_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SecretRecord>, StorageError> {
        let inner = self.lock();

        Ok(inner
            .secrets
            .values()
            .filter(|secret| secret.tenant_id == tenant_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn insert_secret(&self, secret: &NewSecret) -> Result<i64, StorageError> {
        let mut inner = self.lock();

        let id = inner.last_secret_id + 1;
        inner.last_secret_id = id;
        inner.secrets.insert(id, SecretRecord::from_new(id, secret.clone()));

        debug_assert!(inner.secrets.keys().all(|&existing| existing <= id));

        Ok(id)
    }

    fn delete_secret(&self, secret_id: i64) -> Result<bool, StorageError> {
        Ok(self.lock().secrets.remove(&secret_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Opaque;

    fn new_secret(tenant_id: i64, key: &str) -> NewSecret {
        NewSecret {
            key: key.to_string(),
            value: Opaque::new(format!("ciphertext-{key}")),
            tenant_id,
            key_version: 1,
            iv: Opaque::new("AAAAAAAAAAAAAAAA"),
        }
    }

    #[test]
    fn test_new_storage_is_empty() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.tenant_count(), 0);
        assert_eq!(storage.secret_count(), 0);
        assert!(storage.list_secrets(1, 100, 0).unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_load_tenant() {
        let storage = MemoryStorage::new();
        let tenant = TenantRecord { id: -100, kind: "group".to_string(), key_version: 3 };

        storage.insert_tenant(&tenant).unwrap();

        assert_eq!(storage.load_tenant(-100).unwrap(), Some(tenant));
        assert_eq!(storage.load_tenant(100).unwrap(), None);
    }

    #[test]
    fn test_insert_tenant_rejects_duplicate() {
        let storage = MemoryStorage::new();
        let first = TenantRecord { id: 7, kind: "private".to_string(), key_version: 1 };
        let second = TenantRecord { id: 7, kind: "group".to_string(), key_version: 2 };

        storage.insert_tenant(&first).unwrap();
        let result = storage.insert_tenant(&second);

        assert_eq!(result, Err(StorageError::AlreadyExists { tenant_id: 7 }));
        // Original row preserved
        assert_eq!(storage.load_tenant(7).unwrap(), Some(first));
    }

    #[test]
    fn test_secret_ids_are_sequential() {
        let storage = MemoryStorage::new();

        let ids: Vec<i64> =
            (0..5).map(|i| storage.insert_secret(&new_secret(1, &format!("k{i}"))).unwrap()).collect();

        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_secret_ids_not_reused_after_delete() {
        let storage = MemoryStorage::new();

        let first = storage.insert_secret(&new_secret(1, "a")).unwrap();
        let second = storage.insert_secret(&new_secret(1, "b")).unwrap();
        assert!(storage.delete_secret(second).unwrap());

        let third = storage.insert_secret(&new_secret(1, "c")).unwrap();
        assert!(third > second);
        assert!(second > first);
    }

    #[test]
    fn test_list_is_tenant_scoped_and_ordered() {
        let storage = MemoryStorage::new();

        storage.insert_secret(&new_secret(1, "a")).unwrap();
        storage.insert_secret(&new_secret(2, "other")).unwrap();
        storage.insert_secret(&new_secret(1, "b")).unwrap();

        let secrets = storage.list_secrets(1, 100, 0).unwrap();
        let keys: Vec<&str> = secrets.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(secrets.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[test]
    fn test_list_pagination() {
        let storage = MemoryStorage::new();
        for i in 0..20 {
            storage.insert_secret(&new_secret(1, &format!("k{i:02}"))).unwrap();
        }

        let page1 = storage.list_secrets(1, 10, 0).unwrap();
        let page2 = storage.list_secrets(1, 10, 10).unwrap();
        let beyond = storage.list_secrets(1, 10, 20).unwrap();

        assert_eq!(page1.len(), 10);
        assert_eq!(page1[0].key, "k00");
        assert_eq!(page2.len(), 10);
        assert_eq!(page2[9].key, "k19");
        assert!(beyond.is_empty());
        assert!(storage.list_secrets(1, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_delete_unknown_id_reports_nothing_removed() {
        let storage = MemoryStorage::new();
        assert!(!storage.delete_secret(999).unwrap());

        let id = storage.insert_secret(&new_secret(1, "a")).unwrap();
        assert!(storage.delete_secret(id).unwrap());
        assert!(!storage.delete_secret(id).unwrap());
        assert_eq!(storage.secret_count(), 0);
    }
}
