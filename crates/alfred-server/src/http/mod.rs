//! HTTP surface.
//!
//! All routes are mounted under `/api`:
//!
//! | Method | Path                              | Handler                          |
//! |--------|-----------------------------------|----------------------------------|
//! | GET    | `/api/ping`                       | liveness                         |
//! | GET    | `/api/encryption/key`             | key delivery                     |
//! | GET    | `/api/secrets/{chatId}`           | vault listing                    |
//! | POST   | `/api/secrets`                    | vault insert                     |
//! | DELETE | `/api/secrets/{id}`               | vault delete (idempotent)        |
//! | POST   | `/api/tenants/{chatId}`           | first contact / binding          |

pub mod dto;
mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
pub use error::{ApiError, ApiResult, ErrorResponse};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    binding::TenantBindings,
    config::{KeyConfig, ServerRuntimeConfig},
    delivery::KeyDelivery,
    key_registry::MasterKeyRegistry,
    storage::Storage,
    vault::SecretVault,
};

/// Components shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState<S: Storage> {
    /// Tenant registry and key-version binding
    pub bindings: TenantBindings<S>,
    /// Opaque secret storage
    pub vault: SecretVault<S>,
    /// DEK derivation for clients
    pub delivery: KeyDelivery,
    /// Listing page size when none is requested
    pub default_page_size: usize,
    /// Largest listing page size honored
    pub max_page_size: usize,
}

impl<S: Storage> AppState<S> {
    /// Wire the custody components over one storage backend and one key
    /// configuration.
    pub fn new(storage: S, keys: Arc<KeyConfig>, config: &ServerRuntimeConfig) -> Self {
        Self {
            bindings: TenantBindings::new(storage.clone(), Arc::clone(&keys)),
            vault: SecretVault::new(storage),
            delivery: KeyDelivery::new(MasterKeyRegistry::new(keys)),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

/// Build the full application router.
pub fn create_router<S: Storage>(state: AppState<S>) -> Router {
    let api = Router::new()
        .route("/ping", get(handlers::ping))
        .route("/encryption/key", get(handlers::get_encryption_key::<S>))
        .route("/secrets", post(handlers::insert_secret::<S>))
        // One path shape: chat id for GET, secret id for DELETE
        .route("/secrets/{id}", get(handlers::list_secrets::<S>).delete(handlers::delete_secret::<S>))
        .route("/tenants/{id}", post(handlers::register_tenant::<S>))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
