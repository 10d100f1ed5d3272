//! Alfred key custody server.
//!
//! Derives per-tenant data-encryption keys from versioned master keys and
//! keeps client-encrypted secrets it cannot read. Clients fetch a DEK, encrypt
//! locally with AES-256-GCM, and store only ciphertext and IV here.
//!
//! # Components
//!
//! - [`MasterKeyRegistry`]: key version to master key, from [`KeyConfig`]
//! - [`TenantBindings`]: pins each tenant to the version active at first contact
//! - [`SecretVault`]: opaque secret records, listed per tenant
//! - [`KeyDelivery`]: DEK derivation and encoding for clients
//! - [`Server`]: HTTP runtime over Tokio and axum
//!
//! Key derivation itself lives in [`alfred_crypto`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod binding;
pub mod config;
pub mod custody_error;
pub mod delivery;
mod error;
pub mod http;
pub mod key_registry;
pub mod model;
pub mod storage;
pub mod vault;

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
pub use binding::{TenantBinding, TenantBindings};
pub use config::{ConfigError, KeyConfig, ServerRuntimeConfig};
pub use custody_error::CustodyError;
pub use delivery::KeyDelivery;
pub use error::ServerError;
pub use http::{AppState, create_router};
pub use key_registry::MasterKeyRegistry;
pub use model::{NewSecret, Opaque, SecretRecord, TenantMetadata, TenantRecord};
pub use storage::{ChaoticStorage, MemoryStorage, RedbStorage, Storage, StorageError};
use tokio::net::TcpListener;
pub use vault::SecretVault;

/// Production Alfred server.
///
/// Owns the bound listener and the fully wired router.
pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    /// Open storage, wire components and bind the listener.
    ///
    /// Uses Redb when `config.database_path` is set, in-memory storage
    /// otherwise.
    pub async fn bind(config: ServerRuntimeConfig, keys: KeyConfig) -> Result<Self, ServerError> {
        let keys = Arc::new(keys);

        if keys.active_version().is_none() {
            tracing::warn!("MASTER_KEY_VERSION not set - new tenants cannot be bound");
        }

        let router = match &config.database_path {
            Some(path) => {
                tracing::info!("Opening database at {}", path.display());
                let storage = RedbStorage::open(path)?;
                create_router(AppState::new(storage, keys, &config))
            },
            None => {
                tracing::warn!("No database configured - bindings and secrets are kept in memory");
                tracing::warn!("This is NOT suitable for production use!");
                create_router(AppState::new(MemoryStorage::new(), keys, &config))
            },
        };

        let listener = TcpListener::bind(&config.bind_address).await.map_err(|e| {
            ServerError::Transport(format!("failed to bind {}: {e}", config.bind_address))
        })?;

        Ok(Self { listener, router })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until Ctrl-C or a listener error.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.local_addr()?);

        axum::serve(self.listener, self.router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
