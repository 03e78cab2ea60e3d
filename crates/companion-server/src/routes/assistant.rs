//! Assistant routes.

use super::error_response;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use companion_types::Interaction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<&'static str>,
}

/// Answer a question and record it in the history.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Interaction>, (StatusCode, String)> {
    let interaction = state.assistant.ask(&req.question).await.map_err(error_response)?;
    tracing::info!(target: "companion::api", "Answered question as interaction {}", interaction.id);
    Ok(Json(interaction))
}

pub async fn suggestions(State(state): State<Arc<AppState>>) -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        suggestions: state.assistant.suggestions().to_vec(),
    })
}
