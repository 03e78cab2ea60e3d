//! HTTP route handlers.

pub mod agenda;
pub mod assistant;
pub mod events;
pub mod history;
pub mod reminders;
pub mod ws;

use crate::state::AppState;
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use companion_core::{CompanionError, ErrorKind};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Map a core error to a status code and user-facing message.
pub fn error_response(e: CompanionError) -> (StatusCode, String) {
    let status = match e.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::EmptyInput => StatusCode::BAD_REQUEST,
        ErrorKind::Network => StatusCode::BAD_GATEWAY,
        ErrorKind::Storage => {
            tracing::error!(target: "companion::api", "Storage error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

/// All API and WebSocket routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Assistant
        .route("/assistant/ask", post(assistant::ask))
        .route("/assistant/suggestions", get(assistant::suggestions))
        // History
        .route("/history", get(history::list).delete(history::clear))
        .route("/history/lookup", get(history::lookup))
        .route("/history/{id}", get(history::get).delete(history::delete))
        .route("/history/{id}/favorite", post(history::toggle_favorite))
        // Event catalog
        .route("/events", get(events::list))
        .route("/events/reload", post(events::reload))
        .route("/events/{id}", get(events::get))
        // Agenda and reminders
        .route("/agenda", get(agenda::list).post(agenda::add))
        .route("/agenda/{id}", axum::routing::delete(agenda::remove))
        .route("/reminders/{title}", get(reminders::get).put(reminders::set))
        .route("/health", get(health));

    let ws_routes = Router::new().route("/history", get(ws::upgrade));

    Router::new()
        .nest("/api", api_routes)
        .nest("/ws", ws_routes)
        .with_state(state)
}
