//! API error types and responses.
//!
//! Every failed request gets the same body:
//! `{"error": {"code": "...", "message": "..."}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use publog_service::ServiceError;
use serde::Serialize;
use thiserror::Error;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested record or relation was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
        }
    }

    /// A 404 for a lookup that returned nothing.
    #[must_use]
    pub fn missing(kind: &str, key: &str) -> Self {
        Self::NotFound(format!("{kind} {key}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err.http_status_code() {
            400 => Self::BadRequest(err.to_string()),
            404 => Self::NotFound(err.to_string()),
            409 => Self::Conflict(err.to_string()),
            _ => {
                tracing::error!(error = %err, retriable = err.is_retriable(), "Service error");
                match err {
                    ServiceError::Store(_) => Self::Internal("storage error".to_string()),
                    other => Self::Internal(other.to_string()),
                }
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!(error = %err, "Blocking task failed");
        Self::Internal("task failed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use publog_store::StoreError;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::BadRequest("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::missing("CAGE", "1ABC2").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn service_errors_map_to_status() {
        let bad = ApiError::from(ServiceError::InvalidArgument("limit".into()));
        assert_eq!(bad.code(), "bad_request");

        let missing = ApiError::from(ServiceError::Store(StoreError::NotFound("X".into())));
        assert_eq!(missing.code(), "not_found");

        let query = ApiError::from(ServiceError::Store(StoreError::Query("boom".into())));
        assert_eq!(query.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(query.to_string(), "internal error: storage error");
    }
}
