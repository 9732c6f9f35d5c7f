//! Supply class (FSC) and group (FSG) endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use publog_store::Store;

use super::{ListResponse, TermQuery};
use crate::error::ApiError;
use crate::state::GatewayState;

/// List every supply group.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the group relation is not loaded.
pub async fn list_groups<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = state
        .run(|service| service.classification().list_groups())
        .await?;
    Ok(Json(ListResponse::new(groups)))
}

/// List every supply class.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the class relation is not loaded.
pub async fn list_classes<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let classes = state
        .run(|service| service.classification().list_classes())
        .await?;
    Ok(Json(ListResponse::new(classes)))
}

/// Search classes by code or title.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for a blank term.
pub async fn search<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<TermQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let term = query.term()?;
    let classes = state
        .run(move |service| service.classification().search(&term))
        .await?;
    Ok(Json(ListResponse::new(classes)))
}

/// Classes within one group.
///
/// # Errors
///
/// Returns `ApiError::Internal` if the class relation is not loaded.
pub async fn classes_in_group<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(group): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let classes = state
        .run(move |service| service.classification().classes_in_group(&group))
        .await?;
    Ok(Json(ListResponse::new(classes)))
}

/// Look up one class.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if there is no such class.
pub async fn get_class<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let key = code.clone();
    state
        .run(move |service| service.classification().get_class_str(&key))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::missing("FSC", &code))
}
