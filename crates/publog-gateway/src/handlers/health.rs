//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use publog_store::Store;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
    /// Relations currently in the store.
    pub indexed_tables: usize,
}

/// Health check handler.
///
/// ```text
/// GET /api/v1/health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2024-01-01T00:00:00Z",
///   "indexed_tables": 12
/// }
/// ```
///
/// # Errors
///
/// Returns `ApiError::Internal` if the store cannot be reached.
pub async fn health<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let indexed_tables = state
        .run(|service| Ok(service.indexer().list_tables().len()))
        .await?;

    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        indexed_tables,
    };

    Ok((StatusCode::OK, Json(response)))
}
