//! Event reminder opt-in routes. Scheduling the notification itself is up
//! to the client.

use super::error_response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ReminderRequest {
    pub subscribed: bool,
}

#[derive(Serialize)]
pub struct ReminderResponse {
    pub title: String,
    pub subscribed: bool,
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Json<ReminderResponse> {
    let subscribed = state.reminders.is_subscribed(&title);
    Json(ReminderResponse { title, subscribed })
}

pub async fn set(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
    Json(req): Json<ReminderRequest>,
) -> Result<Json<ReminderResponse>, (StatusCode, String)> {
    state
        .reminders
        .set_subscribed(&title, req.subscribed)
        .map_err(error_response)?;
    Ok(Json(ReminderResponse {
        title,
        subscribed: req.subscribed,
    }))
}
