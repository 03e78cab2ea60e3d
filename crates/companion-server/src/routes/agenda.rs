//! Personal agenda routes.

use super::error_response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use companion_core::CompanionError;
use companion_types::{AgendaEntry, NewAgendaEntry};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Serialize)]
pub struct AgendaResponse {
    pub entries: Vec<AgendaEntry>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AgendaResponse>, (StatusCode, String)> {
    let entries = state.agenda.list().map_err(error_response)?;
    Ok(Json(AgendaResponse { entries }))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<NewAgendaEntry>,
) -> Result<(StatusCode, Json<AgendaEntry>), (StatusCode, String)> {
    let entry = state.agenda.add(entry).map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.agenda.remove(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(CompanionError::AgendaEntryNotFound(id)))
    }
}
