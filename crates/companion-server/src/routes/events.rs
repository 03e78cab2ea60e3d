//! Event catalog routes.

use super::error_response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use companion_core::CompanionError;
use companion_types::Event;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<Event>,
}

#[derive(Serialize)]
pub struct EventDetailResponse {
    pub event: Event,
    pub reminder_subscribed: bool,
}

/// Current catalog, fetching it first if nothing has loaded yet.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EventsResponse>, (StatusCode, String)> {
    let events = state.catalog.ensure_loaded().await.map_err(error_response)?;
    Ok(Json(EventsResponse { events }))
}

/// Refetch the catalog. On failure the previous events stay available.
pub async fn reload(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EventsResponse>, (StatusCode, String)> {
    let events = state.catalog.load().await.map_err(error_response)?;
    Ok(Json(EventsResponse { events }))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EventDetailResponse>, (StatusCode, String)> {
    let event = state
        .catalog
        .find_by_id(&id)
        .ok_or_else(|| error_response(CompanionError::EventNotFound(id)))?;
    let reminder_subscribed = state.reminders.is_subscribed(&event.title);

    Ok(Json(EventDetailResponse {
        event,
        reminder_subscribed,
    }))
}
