//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Write
//! transactions are serialized by Redb, which is what makes the tenant
//! uniqueness check and the id sequence race-free. All state survives server
//! restarts.

use std::{fmt::Display, path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{Storage, StorageError};
use crate::model::{NewSecret, SecretRecord, TenantRecord};

/// Table: tenants
/// Key: tenant_id as big-endian bytes [8 bytes]
/// Value: CBOR-encoded TenantRecord
const TENANTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tenants");

/// Table: secrets
/// Key: (tenant_id, secret_id) as big-endian bytes [16 bytes]
/// Value: CBOR-encoded SecretRecord
const SECRETS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("secrets");

/// Table: secret_index
/// Key: secret_id as big-endian bytes [8 bytes]
/// Value: owning tenant_id as big-endian bytes [8 bytes]
const SECRET_INDEX: TableDefinition<&[u8], &[u8]> = TableDefinition::new("secret_index");

/// Table: sequences
/// Key: sequence name
/// Value: last value handed out
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Sequence backing secret ids.
const SECRET_ID_SEQUENCE: &str = "secret_id";

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist (TENANTS, SECRETS, SECRET_INDEX,
    /// SEQUENCES).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        let txn = db.begin_write().map_err(io_error)?;
        {
            let _ = txn.open_table(TENANTS).map_err(io_error)?;
            let _ = txn.open_table(SECRETS).map_err(io_error)?;
            let _ = txn.open_table(SECRET_INDEX).map_err(io_error)?;
            let _ = txn.open_table(SEQUENCES).map_err(io_error)?;
        }
        txn.commit().map_err(io_error)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl Storage for RedbStorage {
    fn load_tenant(&self, tenant_id: i64) -> Result<Option<TenantRecord>, StorageError> {
        let txn = self.db.begin_read().map_err(io_error)?;
        let table = txn.open_table(TENANTS).map_err(io_error)?;

        let key = encode_id_key(tenant_id);

        match table.get(key.as_slice()).map_err(io_error)? {
            Some(value) => {
                let tenant: TenantRecord = ciborium::from_reader(value.value())
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(tenant))
            },
            None => Ok(None),
        }
    }

    fn insert_tenant(&self, tenant: &TenantRecord) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io_error)?;

        {
            let mut table = txn.open_table(TENANTS).map_err(io_error)?;

            let key = encode_id_key(tenant.id);

            if table.get(key.as_slice()).map_err(io_error)?.is_some() {
                // Dropping the transaction aborts it; the existing row wins
                return Err(StorageError::AlreadyExists { tenant_id: tenant.id });
            }

            let mut bytes = Vec::new();
            ciborium::into_writer(tenant, &mut bytes)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            table.insert(key.as_slice(), bytes.as_slice()).map_err(io_error)?;
        }

        txn.commit().map_err(io_error)?;

        Ok(())
    }

    fn list_secrets(
        &self,
        tenant_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SecretRecord>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let txn = self.db.begin_read().map_err(io_error)?;
        let table = txn.open_table(SECRETS).map_err(io_error)?;

        let start_key = encode_secret_key(tenant_id, 0);
        let end_key = encode_secret_key(tenant_id, i64::MAX);

        let mut results =
            table.range(start_key.as_slice()..=end_key.as_slice()).map_err(io_error)?;

        // Skipped rows are still read so their errors surface
        for result in results.by_ref().take(offset) {
            result.map_err(io_error)?;
        }

        let mut secrets = Vec::with_capacity(limit.min(64));
        for result in results {
            if secrets.len() >= limit {
                break;
            }

            let (_, value) = result.map_err(io_error)?;
            let secret: SecretRecord = ciborium::from_reader(value.value())
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            secrets.push(secret);
        }

        Ok(secrets)
    }

    fn insert_secret(&self, secret: &NewSecret) -> Result<i64, StorageError> {
        let txn = self.db.begin_write().map_err(io_error)?;

        let id = {
            let mut sequences = txn.open_table(SEQUENCES).map_err(io_error)?;
            let last = sequences.get(SECRET_ID_SEQUENCE).map_err(io_error)?.map(|v| v.value());
            let next = last.unwrap_or(0) + 1;
            sequences.insert(SECRET_ID_SEQUENCE, next).map_err(io_error)?;

            i64::try_from(next)
                .map_err(|_| StorageError::Io("secret id sequence exhausted".to_string()))?
        };

        {
            let mut secrets = txn.open_table(SECRETS).map_err(io_error)?;
            let mut index = txn.open_table(SECRET_INDEX).map_err(io_error)?;

            let record = SecretRecord::from_new(id, secret.clone());
            let mut bytes = Vec::new();
            ciborium::into_writer(&record, &mut bytes)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;

            let key = encode_secret_key(secret.tenant_id, id);
            secrets.insert(key.as_slice(), bytes.as_slice()).map_err(io_error)?;

            let index_key = encode_id_key(id);
            let owner = encode_id_key(secret.tenant_id);
            index.insert(index_key.as_slice(), owner.as_slice()).map_err(io_error)?;
        }

        txn.commit().map_err(io_error)?;

        Ok(id)
    }

    fn delete_secret(&self, secret_id: i64) -> Result<bool, StorageError> {
        let txn = self.db.begin_write().map_err(io_error)?;

        {
            let mut index = txn.open_table(SECRET_INDEX).map_err(io_error)?;

            let index_key = encode_id_key(secret_id);
            let owner = index
                .remove(index_key.as_slice())
                .map_err(io_error)?
                .map(|value| decode_id_key(value.value()))
                .transpose()?;

            let Some(tenant_id) = owner else {
                return Ok(false);
            };

            let mut secrets = txn.open_table(SECRETS).map_err(io_error)?;
            let key = encode_secret_key(tenant_id, secret_id);
            secrets.remove(key.as_slice()).map_err(io_error)?;
        }

        txn.commit().map_err(io_error)?;

        Ok(true)
    }
}

fn io_error(err: impl Display) -> StorageError {
    StorageError::Io(err.to_string())
}

/// Encode a tenant or secret id as 8-byte big-endian key.
fn encode_id_key(id: i64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decode an 8-byte big-endian id.
fn decode_id_key(bytes: &[u8]) -> Result<i64, StorageError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StorageError::Serialization(format!("id key has {} bytes", bytes.len())))?;
    Ok(i64::from_be_bytes(array))
}

/// Encode (tenant_id, secret_id) as 16-byte big-endian key.
///
/// Layout: [tenant_id: 8 bytes BE][secret_id: 8 bytes BE]
/// All of a tenant's secrets share the prefix, and since secret ids are
/// positive their lexicographic order matches numeric order.
fn encode_secret_key(tenant_id: i64, secret_id: i64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&tenant_id.to_be_bytes());
    key[8..].copy_from_slice(&secret_id.to_be_bytes());
    key
}
