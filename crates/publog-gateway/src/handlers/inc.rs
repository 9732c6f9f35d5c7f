//! Item Name Code (INC) endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use publog_store::Store;
use serde::Deserialize;

use super::{ListResponse, TermQuery};
use crate::error::ApiError;
use crate::state::GatewayState;

/// Query parameters for listing item names.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Results to return.
    #[serde(default = "default_list_limit")]
    pub limit: i64,
}

const fn default_list_limit() -> i64 {
    100
}

/// The first item names by title.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for an out-of-range limit.
pub async fn list_all<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let names = state
        .run(move |service| service.item_name().list_all(query.limit))
        .await?;
    Ok(Json(ListResponse::new(names)))
}

/// Search item names by title, definition, or code.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for a blank term or out-of-range limit.
pub async fn search<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<TermQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.term()?;
    let limit = query.page(&state.service.config().limits()).limit;
    let names = state
        .run(move |service| service.item_name().search(&term, limit))
        .await?;
    Ok(Json(ListResponse::new(names)))
}

/// Look up one item name.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if there is no such code.
pub async fn get_by_code<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let key = code.clone();
    state
        .run(move |service| service.item_name().get_by_code(&key))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::missing("INC", &code))
}
