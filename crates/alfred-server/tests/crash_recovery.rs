//! Crash recovery tests for `RedbStorage`.
//!
//! These tests verify that bindings and secrets persist across database
//! close/reopen cycles, simulating server restarts.

use std::sync::Arc;

use alfred_server::{
    KeyConfig, NewSecret, Opaque, TenantBindings, TenantRecord,
    storage::{RedbStorage, Storage, StorageError},
};
use tempfile::tempdir;

fn new_secret(tenant_id: i64, key: &str) -> NewSecret {
    NewSecret {
        key: key.to_string(),
        value: Opaque::new(format!("{key}-ciphertext")),
        tenant_id,
        key_version: 1,
        iv: Opaque::new("AAECAwQFBgcICQoL"),
    }
}

#[test]
fn test_secrets_survive_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.redb");

    let tenant_id = -1_001_234_567_890i64;
    let count = 10;

    let mut ids = Vec::new();
    {
        let storage = RedbStorage::open(&db_path).unwrap();

        for i in 0..count {
            ids.push(storage.insert_secret(&new_secret(tenant_id, &format!("k{i}"))).unwrap());
        }

        // Database dropped
    }

    {
        let storage = RedbStorage::open(&db_path).unwrap();

        let secrets = storage.list_secrets(tenant_id, count + 10, 0).unwrap();
        assert_eq!(secrets.len(), count);

        for (i, secret) in secrets.iter().enumerate() {
            assert_eq!(secret.id, ids[i]);
            assert_eq!(secret.key, format!("k{i}"));
            assert_eq!(secret.value, Opaque::new(format!("k{i}-ciphertext")));
            assert_eq!(secret.tenant_id, tenant_id);
        }
    }
}

#[test]
fn test_binding_survives_restart_and_rotation() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.redb");

    {
        let storage = RedbStorage::open(&db_path).unwrap();
        let bindings =
            TenantBindings::new(storage, Arc::new(KeyConfig::new().with_active_version(1)));

        assert_eq!(bindings.get_or_create_binding(42).unwrap(), 1);
    }

    // Restart with the active version rotated
    {
        let storage = RedbStorage::open(&db_path).unwrap();
        let bindings =
            TenantBindings::new(storage.clone(), Arc::new(KeyConfig::new().with_active_version(2)));

        assert_eq!(bindings.get_or_create_binding(42).unwrap(), 1);
        assert_eq!(bindings.get_or_create_binding(43).unwrap(), 2);

        assert_eq!(
            storage.load_tenant(42).unwrap(),
            Some(TenantRecord { id: 42, kind: "private".to_string(), key_version: 1 })
        );
    }
}

#[test]
fn test_tenant_uniqueness_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.redb");

    let tenant = TenantRecord { id: 5, kind: "group".to_string(), key_version: 3 };
    {
        let storage = RedbStorage::open(&db_path).unwrap();
        storage.insert_tenant(&tenant).unwrap();
    }

    {
        let storage = RedbStorage::open(&db_path).unwrap();
        let rival = TenantRecord { key_version: 4, ..tenant.clone() };

        assert_eq!(storage.insert_tenant(&rival), Err(StorageError::AlreadyExists { tenant_id: 5 }));
        assert_eq!(storage.load_tenant(5).unwrap(), Some(tenant));
    }
}

#[test]
fn test_ids_not_reused_across_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.redb");

    let last = {
        let storage = RedbStorage::open(&db_path).unwrap();
        storage.insert_secret(&new_secret(1, "a")).unwrap();
        let last = storage.insert_secret(&new_secret(1, "b")).unwrap();
        assert!(storage.delete_secret(last).unwrap());
        last
    };

    {
        let storage = RedbStorage::open(&db_path).unwrap();
        let next = storage.insert_secret(&new_secret(1, "c")).unwrap();
        assert!(next > last, "id {next} reused after restart (last was {last})");
    }
}

#[test]
fn test_deletes_survive_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.redb");

    let kept = {
        let storage = RedbStorage::open(&db_path).unwrap();
        let gone = storage.insert_secret(&new_secret(2, "gone")).unwrap();
        let kept = storage.insert_secret(&new_secret(2, "kept")).unwrap();
        storage.delete_secret(gone).unwrap();
        kept
    };

    {
        let storage = RedbStorage::open(&db_path).unwrap();
        let secrets = storage.list_secrets(2, 100, 0).unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].id, kept);
    }
}

#[test]
fn test_multiple_restarts() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.redb");

    for round in 0..5 {
        let storage = RedbStorage::open(&db_path).unwrap();
        storage.insert_secret(&new_secret(7, &format!("round{round}"))).unwrap();

        let secrets = storage.list_secrets(7, 100, 0).unwrap();
        assert_eq!(secrets.len(), round + 1);
    }
}
