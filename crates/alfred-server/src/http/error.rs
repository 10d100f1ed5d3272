//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::custody_error::CustodyError;

/// A custody failure on its way out as an HTTP response.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] pub CustodyError);

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-readable code
    pub code: String,
}

impl ApiError {
    /// Machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match &self.0 {
            CustodyError::KeyNotFound { .. } => "KEY_NOT_FOUND",
            CustodyError::KeyMalformed { .. } => "KEY_MALFORMED",
            CustodyError::ActiveVersionUndefined => "ACTIVE_VERSION_UNDEFINED",
            CustodyError::DerivationFailed(_) => "DERIVATION_FAILED",
            CustodyError::InvalidInput(_) => "INVALID_INPUT",
            CustodyError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
        }
    }

    /// 400 for client errors, 500 for everything else.
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "request failed");
        } else {
            tracing::warn!(code, error = %self.0, "request rejected");
        }

        let body = ErrorResponse { error: self.0.to_string(), code: code.to_string() };

        (status, Json(body)).into_response()
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn status_mapping() {
        let cases = [
            (CustodyError::InvalidInput("chatId".to_string()), StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            (CustodyError::KeyNotFound { version: 2 }, StatusCode::INTERNAL_SERVER_ERROR, "KEY_NOT_FOUND"),
            (
                CustodyError::KeyMalformed { version: 2, reason: "short".to_string() },
                StatusCode::INTERNAL_SERVER_ERROR,
                "KEY_MALFORMED",
            ),
            (
                CustodyError::ActiveVersionUndefined,
                StatusCode::INTERNAL_SERVER_ERROR,
                "ACTIVE_VERSION_UNDEFINED",
            ),
            (
                CustodyError::StorageUnavailable(StorageError::Io("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_UNAVAILABLE",
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }
}
