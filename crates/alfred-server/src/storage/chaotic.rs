//! Chaotic storage wrapper for fault injection testing
//!
//! Wraps another backend and fails a seeded fraction of calls with
//! `StorageError::Io`. Used to check that custody operations surface storage
//! outages as errors and never as partial or invented results.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex};

use super::{Storage, StorageError};
use crate::model::{NewSecret, SecretRecord, TenantRecord};

/// Message carried by every injected failure.
const INJECTED_FAILURE: &str = "chaotic failure injection";

/// Storage wrapper that randomly injects failures
///
/// A failed call never reaches the inner backend, so an injected error leaves
/// no side effects behind. RNG state and the operation counter are shared
/// between clones.
#[derive(Clone)]
pub struct ChaoticStorage<S: Storage> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<Mutex<usize>>,
}

/// Linear congruential generator, reproducible from its seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: Storage> ChaoticStorage<S> {
    /// Wrap `inner` with a fixed default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Wrap `inner` with an explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Underlying storage (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of storage calls attempted, failed ones included.
    pub fn operation_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        *self.operation_count.lock().expect("operation_count mutex poisoned")
    }

    /// Count the call and roll for a failure.
    fn inject(&self) -> Result<(), StorageError> {
        #[allow(clippy::expect_used)]
        let mut count = self.operation_count.lock().expect("operation_count mutex poisoned");
        *count += 1;
        drop(count);

        #[allow(clippy::expect_used)]
        let roll = self.rng.lock().expect("ChaoticRng mutex poisoned").next();

        if roll < self.failure_rate {
            return Err(StorageError::Io(INJECTED_FAILURE.to_string()));
        }
        Ok(())
    }
}

impl<S: Storage> Storage for ChaoticStorage<S> {
    fn load_tenant(&self, tenant_id: i64) -> Result<Option<TenantRecord>, StorageError> {
        self.inject()?;
        self.inner.load_tenant(tenant_id)
    }

    fn insert_tenant(&self, tenant: &TenantRecord) -> Result<(), StorageError> {
        self.inject()?;
        self.inner.insert_tenant(tenant)
    }

    fn list_secrets(
        &self,
        tenant_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SecretRecord>, StorageError> {
        self.inject()?;
        self.inner.list_secrets(tenant_id, limit, offset)
    }

    fn insert_secret(&self, secret: &NewSecret) -> Result<i64, StorageError> {
        self.inject()?;
        self.inner.insert_secret(secret)
    }

    fn delete_secret(&self, secret_id: i64) -> Result<bool, StorageError> {
        self.inject()?;
        self.inner.delete_secret(secret_id)
    }
}
