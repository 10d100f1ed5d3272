//! Alfred Cryptographic Primitives
//!
//! Key derivation for Alfred's envelope encryption. Pure functions with
//! deterministic outputs: no randomness, no persisted state, no I/O.
//!
//! # Key Hierarchy
//!
//! A small set of long-lived master keys, one per key version, is provisioned
//! outside the server. Every tenant (a chat) gets its own data-encryption key
//! (DEK) derived from the master key of a given version. Clients use the DEK to
//! encrypt secret values with AES-256-GCM; the server only ever stores the
//! resulting ciphertext.
//!
//! ```text
//! Master Key (per version)
//!        │
//!        ▼
//! HKDF-SHA256(salt = SHA-256(tenant_id BE), info = label|v=<version>|scope)
//!        │
//!        ▼
//! DEK (per tenant, per version) → client-side AES-256-GCM
//! ```
//!
//! # Security
//!
//! Determinism:
//! - Identical (master key, tenant, version) always yields the identical DEK
//! - Any process can rebuild a tenant's key without a key exchange
//!
//! Isolation:
//! - Different tenants produce different salts, so different DEKs
//! - Different versions produce different info strings, so different DEKs
//!
//! Hygiene:
//! - [`MasterKey`] and [`DataKey`] are zeroized on drop
//! - `Debug` output never contains key bytes

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod dek;

pub use dek::{
    DEK_INFO_PREFIX, DEK_INFO_SCOPE, DataKey, DerivationError, KEY_SIZE, KeyError, MasterKey,
    dek_info, derive_dek, tenant_salt,
};
