//! Store administration endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use publog_store::Store;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::GatewayState;

/// Query parameters for initialization.
#[derive(Debug, Default, Deserialize)]
pub struct InitializeQuery {
    /// Reload relations that are already loaded.
    #[serde(default)]
    pub force: bool,
    /// Load only the priority tier.
    #[serde(default)]
    pub priority_only: bool,
}

/// Response for the table list.
#[derive(Debug, Serialize)]
pub struct TablesResponse {
    /// Relation names.
    pub tables: Vec<String>,
    /// Number of relations.
    pub count: usize,
}

/// Load datasets and build indexes.
///
/// Blocks until the sweep finishes. A second call made meanwhile waits for
/// the first and then finds the relations loaded.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the blocking task fails.
pub async fn initialize<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<InitializeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .run(move |service| {
            Ok(service
                .indexer()
                .initialize(query.force, query.priority_only))
        })
        .await?;
    Ok(Json(report))
}

/// Row counts for every relation.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the blocking task fails.
pub async fn stats<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state
        .run(|service| Ok(service.indexer().database_stats()))
        .await?;
    Ok(Json(stats))
}

/// Names of every relation.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the blocking task fails.
pub async fn list_tables<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let tables = state
        .run(|service| Ok(service.indexer().list_tables()))
        .await?;
    Ok(Json(TablesResponse {
        count: tables.len(),
        tables,
    }))
}

/// Columns and row count of one relation.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the relation does not exist.
pub async fn table_info<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let info = state
        .run(move |service| service.indexer().describe(&name))
        .await?;
    Ok(Json(info))
}
