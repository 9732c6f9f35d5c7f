//! Contractor (CAGE) endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use publog_service::{LocationFilter, Page};
use publog_store::Store;
use serde::Deserialize;

use super::{ListResponse, TermQuery};
use crate::error::ApiError;
use crate::state::GatewayState;

/// Query parameters for a location search.
#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    /// State or province code.
    pub state: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Results to return.
    pub limit: Option<i64>,
}

/// Search contractors by company name, city, or code.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for a blank term or out-of-range page.
pub async fn search<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<TermQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.term()?;
    let page = query.page(&state.service.config().limits());
    let results = state
        .run(move |service| service.cage().search(&term, page))
        .await?;
    Ok(Json(ListResponse::paged(results, page)))
}

/// Search contractors by state, city, and country.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` if no location is given.
pub async fn search_by_location<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<LocationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.service.config().default_page_size);
    let filter = LocationFilter {
        state: query.state,
        city: query.city,
        country: query.country,
    };
    let results = state
        .run(move |service| service.cage().search_by_location(&filter, limit))
        .await?;
    Ok(Json(ListResponse::paged(results, Page::first(limit))))
}

/// Contractor totals by status and top countries.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the blocking task fails.
pub async fn stats<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.run(|service| Ok(service.cage().stats())).await?;
    Ok(Json(stats))
}

/// Look up one contractor.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for a malformed code, or
/// `ApiError::NotFound` if there is no such contractor.
pub async fn get_by_code<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let key = code.clone();
    state
        .run(move |service| service.cage().get_by_code(&key))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::missing("CAGE code", &code))
}
