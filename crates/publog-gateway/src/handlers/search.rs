//! Unified search endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use publog_service::SearchResults;
use publog_store::Store;
use serde::Serialize;

use super::TermQuery;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Response for a unified search.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// The search text.
    pub query: String,
    /// Results per category.
    pub results: SearchResults,
    /// Results across all categories.
    pub total_results: usize,
}

/// Search every domain at once.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for a blank term or out-of-range limit.
/// A failing domain yields an empty category, not an error.
pub async fn search_all<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<TermQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.term()?;
    let limit = query.page(&state.service.config().limits()).limit;
    let search_term = term.clone();
    let results = state
        .run(move |service| service.search().search_all(&search_term, limit))
        .await?;
    Ok(Json(SearchResponse {
        query: term,
        total_results: results.total(),
        results,
    }))
}
