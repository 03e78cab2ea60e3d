//! Integration tests for the HTTP API.
//!
//! These drive the full router with a scripted completion client and either
//! a scripted event source or a real HTTP feed served on a local port.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use companion_core::{
    CompanionError, CompletionClient, EventSource, HttpEventSource, Result as CoreResult,
};
use companion_server::{config::Config, routes, state::AppState};
use companion_types::Event;
use futures::StreamExt;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tower::ServiceExt;

/// Answers every prompt by echoing it back.
struct EchoCompletion;

#[async_trait]
impl CompletionClient for EchoCompletion {
    async fn complete(&self, prompt: &str) -> CoreResult<Option<String>> {
        Ok(Some(format!("You asked: {}", prompt)))
    }
}

/// Replays queued fetch results; fails once the queue is empty.
struct ScriptedEvents {
    results: Mutex<VecDeque<CoreResult<Vec<Event>>>>,
}

impl ScriptedEvents {
    fn new(results: Vec<CoreResult<Vec<Event>>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
        })
    }
}

#[async_trait]
impl EventSource for ScriptedEvents {
    async fn fetch(&self) -> CoreResult<Vec<Event>> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompanionError::EventFeed("feed unreachable".into())))
    }
}

fn sample_events() -> Vec<Event> {
    vec![
        Event {
            id: "gala-2025".into(),
            title: "Gala".into(),
            description: "Annual gala".into(),
            date: "15 mars 2025".into(),
            location: "Grand hall".into(),
            category: "Soirée".into(),
        },
        Event {
            id: "hack-2025".into(),
            title: "Hackathon".into(),
            description: "24h coding".into(),
            date: "2 avril 2025".into(),
            location: "Lab 3".into(),
            category: "Tech".into(),
        },
    ]
}

fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        port: 0,
        host: "127.0.0.1".to_string(),
        db_path: temp_dir.path().join("interactions.db"),
        prefs_path: temp_dir.path().join("preferences.json"),
        ..Config::default()
    }
}

fn create_test_app(events: Arc<dyn EventSource>) -> (Router, Arc<AppState>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let state = Arc::new(
        AppState::with_services(test_config(&temp_dir), Arc::new(EchoCompletion), events)
            .expect("Failed to create AppState"),
    );
    (routes::router(state.clone()), state, temp_dir)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn ask(app: &Router, question: &str) -> Value {
    let (status, body) = send(app, "POST", "/api/assistant/ask", Some(json!({ "question": question }))).await;
    assert_eq!(status, StatusCode::OK, "ask failed: {}", body);
    body
}

// =============================================================================
// Assistant and history
// =============================================================================

#[tokio::test]
async fn test_ask_then_list_history() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));

    let first = ask(&app, "Where is the library?").await;
    assert_eq!(first["answer"], "You asked: Where is the library?");
    assert_eq!(first["is_favorite"], false);
    ask(&app, "When does the cafeteria open?").await;

    let (status, body) = send(&app, "GET", "/api/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["interactions"][0]["question"], "When does the cafeteria open?");
}

#[tokio::test]
async fn test_blank_question_is_bad_request() {
    let (app, state, _dir) = create_test_app(ScriptedEvents::new(vec![]));

    let (status, _) = send(&app, "POST", "/api/assistant/ask", Some(json!({ "question": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.interactions.count().unwrap(), 0);
}

#[tokio::test]
async fn test_history_search_and_favorites_filter() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    let library = ask(&app, "Library hours?").await;
    ask(&app, "Gym hours?").await;
    ask(&app, "library wifi password?").await;

    let id = library["id"].as_i64().unwrap();
    let (status, toggled) = send(&app, "POST", &format!("/api/history/{}/favorite", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_favorite"], true);

    let (_, body) = send(&app, "GET", "/api/history?search=LIBRARY", None).await;
    assert_eq!(body["interactions"].as_array().unwrap().len(), 2);
    assert_eq!(body["total_count"], 3);

    let (_, body) = send(&app, "GET", "/api/history?search=library&favorites_only=true", None).await;
    let items = body["interactions"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id);
}

#[tokio::test]
async fn test_history_detail_delete_and_not_found() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    let kept = ask(&app, "keep me").await;
    let removed = ask(&app, "remove me").await;
    let removed_id = removed["id"].as_i64().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/api/history/{}", removed_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &format!("/api/history/{}", removed_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", &format!("/api/history/{}", removed_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, detail) = send(&app, "GET", &format!("/api/history/{}", kept["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail, kept);
}

#[tokio::test]
async fn test_history_lookup_by_question() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    ask(&app, "Same question").await;
    let latest = ask(&app, "Same question").await;

    let (status, found) = send(&app, "GET", "/api/history/lookup?question=Same%20question", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], latest["id"]);

    let (status, _) = send(&app, "GET", "/api/history/lookup?question=Other", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_lookup_trims_question() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    let stored = ask(&app, "  Hi  ").await;
    assert_eq!(stored["question"], "Hi");

    let (status, found) = send(&app, "GET", "/api/history/lookup?question=%20Hi%20", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], stored["id"]);
}

#[tokio::test]
async fn test_clear_history() {
    let (app, state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    ask(&app, "one").await;
    ask(&app, "two").await;

    let (status, body) = send(&app, "DELETE", "/api/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
    assert!(state.interactions.list_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_subscription_sees_api_writes() {
    let (app, state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    let mut rx = state.interactions.subscribe();

    ask(&app, "observed?").await;

    tokio::time::timeout(Duration::from_secs(1), rx.changed())
        .await
        .expect("no snapshot published")
        .unwrap();
    assert_eq!(rx.borrow()[0].question, "observed?");
}

/// Next text frame from the socket as JSON, skipping control frames.
async fn next_json<S>(ws: &mut S) -> Value
where
    S: futures::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_history_websocket_pushes_snapshots() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    ask(&app, "before connect").await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, server).await.unwrap();
    });

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/history", addr))
        .await
        .unwrap();

    let initial = next_json(&mut ws).await;
    assert_eq!(initial["type"], "history_snapshot");
    assert_eq!(initial["interactions"].as_array().unwrap().len(), 1);
    assert_eq!(initial["interactions"][0]["question"], "before connect");

    ask(&app, "after connect").await;

    let updated = next_json(&mut ws).await;
    assert_eq!(updated["type"], "history_snapshot");
    let interactions = updated["interactions"].as_array().unwrap();
    assert_eq!(interactions.len(), 2);
    assert_eq!(interactions[0]["question"], "after connect");
}

#[tokio::test]
async fn test_suggestions() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    let (status, body) = send(&app, "GET", "/api/assistant/suggestions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);
}

// =============================================================================
// Event catalog
// =============================================================================

#[tokio::test]
async fn test_events_load_lazily_and_lookup() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![Ok(sample_events())]));

    let (status, body) = send(&app, "GET", "/api/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "GET", "/api/events/hack-2025", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["title"], "Hackathon");
    assert_eq!(body["reminder_subscribed"], false);

    let (status, _) = send(&app, "GET", "/api/events/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_reload_keeps_snapshot() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![Ok(sample_events())]));
    let (status, _) = send(&app, "POST", "/api/events/reload", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, message) = send(&app, "POST", "/api/events/reload", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(message.as_str().unwrap().contains("feed unreachable"));

    let (status, body) = send(&app, "GET", "/api/events/gala-2025", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["location"], "Grand hall");
}

#[tokio::test]
async fn test_events_unreachable_on_first_load() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    let (status, _) = send(&app, "GET", "/api/events", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_http_event_source_against_local_feed() {
    let feed = Router::new().route("/events.json", get(|| async { axum::Json(sample_events()) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, feed).await.unwrap();
    });

    let source = HttpEventSource::new(
        format!("http://{}/events.json", addr),
        Duration::from_secs(5),
    )
    .unwrap();
    let (app, state, _dir) = create_test_app(Arc::new(source));

    let (status, body) = send(&app, "POST", "/api/events/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"][0]["id"], "gala-2025");
    assert_eq!(state.catalog.find_by_id("hack-2025").unwrap().category, "Tech");
}

#[tokio::test]
async fn test_http_event_source_rejects_bad_payload() {
    let feed = Router::new()
        .route("/events.json", get(|| async { "<html>maintenance</html>" }))
        .route("/missing.json", get(|| async { (StatusCode::NOT_FOUND, "gone") }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, feed).await.unwrap();
    });

    for path in ["events.json", "missing.json"] {
        let source =
            HttpEventSource::new(format!("http://{}/{}", addr, path), Duration::from_secs(5)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, CompanionError::EventFeed(_)), "{}: {}", path, err);
    }
}

// =============================================================================
// Agenda and reminders
// =============================================================================

#[tokio::test]
async fn test_agenda_lifecycle() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));

    let (status, entry) = send(
        &app,
        "POST",
        "/api/agenda",
        Some(json!({ "title": "Project meeting", "date": "10 mai 2025", "time": "09:30" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["time"], "09:30");

    let (_, body) = send(&app, "GET", "/api/agenda", None).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);

    let id = entry["id"].as_str().unwrap();
    let (status, _) = send(&app, "DELETE", &format!("/api/agenda/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/api/agenda/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/api/agenda", Some(json!({ "title": "", "date": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reminder_subscription_shows_on_event_detail() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![Ok(sample_events())]));
    send(&app, "POST", "/api/events/reload", None).await;

    let (status, body) = send(&app, "PUT", "/api/reminders/Gala", Some(json!({ "subscribed": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscribed"], true);

    let (_, body) = send(&app, "GET", "/api/reminders/Gala", None).await;
    assert_eq!(body["subscribed"], true);

    let (_, body) = send(&app, "GET", "/api/events/gala-2025", None).await;
    assert_eq!(body["reminder_subscribed"], true);
}

#[tokio::test]
async fn test_health() {
    let (app, _state, _dir) = create_test_app(ScriptedEvents::new(vec![]));
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
