//! History routes: list, search, detail, favorites, deletion.

use super::error_response;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use companion_core::CompanionError;
use companion_types::{HistoryFilter, Interaction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub favorites_only: bool,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    /// Interactions passing the filter, newest first.
    pub interactions: Vec<Interaction>,
    /// Number of stored interactions before filtering.
    pub total_count: usize,
}

#[derive(Deserialize)]
pub struct LookupQuery {
    pub question: String,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub deleted: usize,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, (StatusCode, String)> {
    let all = state.interactions.list_all().map_err(error_response)?;
    let filter = HistoryFilter::new(query.search.unwrap_or_default(), query.favorites_only);

    Ok(Json(HistoryResponse {
        interactions: filter.apply(&all),
        total_count: all.len(),
    }))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Interaction>, (StatusCode, String)> {
    state
        .interactions
        .get(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| error_response(CompanionError::InteractionNotFound(id)))
}

/// Most recent interaction for a question, compared after trimming the way
/// questions are stored.
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Interaction>, (StatusCode, String)> {
    state
        .interactions
        .find_last(query.question.trim())
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                "No interaction for that question".to_string(),
            )
        })
}

pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Interaction>, (StatusCode, String)> {
    let interaction = state.interactions.toggle_favorite(id).map_err(error_response)?;
    Ok(Json(interaction))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.interactions.delete(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(CompanionError::InteractionNotFound(id)))
    }
}

pub async fn clear(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearResponse>, (StatusCode, String)> {
    let deleted = state.interactions.delete_all().map_err(error_response)?;
    Ok(Json(ClearResponse { deleted }))
}
