//! Stock number (NSN/NIIN) endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use publog_store::Store;
use serde::Deserialize;

use super::{ListResponse, PageQuery};
use crate::error::ApiError;
use crate::state::GatewayState;

/// Query parameters for a stock number search.
#[derive(Debug, Deserialize)]
pub struct NsnSearchQuery {
    /// NIIN or item name text.
    pub q: String,
    /// Restrict to one supply class.
    pub fsc: Option<String>,
    /// Results to return.
    pub limit: Option<i64>,
    /// Results to skip.
    #[serde(default)]
    pub offset: i64,
}

/// Look up one stock number by NIIN or NSN.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for a malformed key, or
/// `ApiError::NotFound` if neither stock number relation has it.
pub async fn get_by_key<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(niin): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let key = niin.clone();
    state
        .run(move |service| service.stock_number().get_by_key(&key))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::missing("NIIN", &niin))
}

/// Search stock numbers by NIIN or item name, optionally within a class.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for an out-of-range page.
pub async fn search<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<NsnSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .page(&state.service.config().limits());
    let results = state
        .run(move |service| {
            service
                .stock_number()
                .search(&query.q, query.fsc.as_deref(), page)
        })
        .await?;
    Ok(Json(ListResponse::paged(results, page)))
}

/// Stock numbers within one class.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for an out-of-range page.
pub async fn by_classification<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(fsc): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page(&state.service.config().limits());
    let results = state
        .run(move |service| service.stock_number().by_classification(&fsc, page))
        .await?;
    Ok(Json(ListResponse::paged(results, page)))
}

/// Management records for a stock number.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for a malformed key.
pub async fn management<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(niin): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .run(move |service| service.stock_number().management_data(&niin))
        .await?;
    Ok(Json(ListResponse::new(rows)))
}

/// Characteristic records for a stock number.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for a malformed key.
pub async fn characteristics<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(niin): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .run(move |service| service.stock_number().characteristics(&niin))
        .await?;
    Ok(Json(ListResponse::new(rows)))
}
