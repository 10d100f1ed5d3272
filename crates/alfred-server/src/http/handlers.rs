//! Route handlers.
//!
//! Path and query values arrive as text and are parsed here, so that every
//! malformed request becomes `InvalidInput` with the JSON error body instead
//! of an extractor's default rejection.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};

use super::{
    AppState,
    dto::{
        CreateSecretRequest, CreatedSecretResponse, KeyQuery, PageQuery, RegisterTenantRequest,
        SecretResponse, TenantResponse,
    },
    error::ApiResult,
};
use crate::{
    custody_error::CustodyError,
    delivery::parse_param,
    model::{NewSecret, TenantMetadata},
    storage::Storage,
};

/// `GET /ping`
pub async fn ping() -> StatusCode {
    StatusCode::OK
}

/// `GET /encryption/key?keyVersion=&chatId=`: base64 DEK as plain text.
pub async fn get_encryption_key<S: Storage>(
    State(state): State<AppState<S>>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> ApiResult<String> {
    let Query(query) = query.map_err(|e| CustodyError::InvalidInput(e.body_text()))?;

    let mut dek =
        state.delivery.deliver_raw(query.chat_id.as_deref(), query.key_version.as_deref())?;

    // Hand the buffer to the response; the emptied wrapper is wiped on drop
    Ok(std::mem::take(&mut *dek))
}

/// `GET /secrets/{chatId}?limit=&offset=`
pub async fn list_secrets<S: Storage>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SecretResponse>>> {
    let Path(raw_tenant) = path.map_err(|e| CustodyError::InvalidInput(e.body_text()))?;
    let Query(page) = query.map_err(|e| CustodyError::InvalidInput(e.body_text()))?;

    let tenant_id: i64 = parse_param("chatId", Some(&raw_tenant))?;

    let limit = match page.limit.as_deref() {
        Some(raw) => parse_param::<usize>("limit", Some(raw))?.min(state.max_page_size),
        None => state.default_page_size,
    };
    let offset = match page.offset.as_deref() {
        Some(raw) => parse_param("offset", Some(raw))?,
        None => 0,
    };

    let secrets = state.vault.list(tenant_id, limit, offset)?;

    Ok(Json(secrets.into_iter().map(SecretResponse::from).collect()))
}

/// `POST /secrets`
pub async fn insert_secret<S: Storage>(
    State(state): State<AppState<S>>,
    body: Result<Json<CreateSecretRequest>, JsonRejection>,
) -> ApiResult<Json<CreatedSecretResponse>> {
    let Json(request) = body.map_err(|e| CustodyError::InvalidInput(e.body_text()))?;

    let id = state.vault.insert(&NewSecret::from(request))?;

    Ok(Json(CreatedSecretResponse { id }))
}

/// `DELETE /secrets/{id}`: 200 whether or not the secret existed.
pub async fn delete_secret<S: Storage>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(raw_id) = path.map_err(|e| CustodyError::InvalidInput(e.body_text()))?;
    let secret_id: i64 = parse_param("id", Some(&raw_id))?;

    state.vault.delete(secret_id)?;

    Ok(StatusCode::OK)
}

/// `POST /tenants/{chatId}`: first contact, binding the tenant to the active
/// key version if it is new. The JSON body is optional.
pub async fn register_tenant<S: Storage>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> ApiResult<Json<TenantResponse>> {
    let Path(raw_tenant) = path.map_err(|e| CustodyError::InvalidInput(e.body_text()))?;
    let tenant_id: i64 = parse_param("chatId", Some(&raw_tenant))?;

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RegisterTenantRequest::default()
    } else {
        serde_json::from_slice::<RegisterTenantRequest>(&body)
            .map_err(|e| CustodyError::InvalidInput(format!("invalid tenant body: {e}")))?
    };

    let metadata = request.kind.map(|kind| TenantMetadata { kind }).unwrap_or_default();

    let binding = state.bindings.get_or_create_binding_with(tenant_id, &metadata)?;

    Ok(Json(TenantResponse::from(binding)))
}
