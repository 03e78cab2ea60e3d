//! In-memory catalog of campus events fetched from a remote feed.
//!
//! The catalog owns one snapshot: the events from the last successful
//! [`EventCatalog::load`]. A failed load leaves that snapshot untouched.
//! [`EventCatalog::clear`] drops it, after which lookups find nothing until
//! the next successful load.

use crate::{CompanionError, Result};
use async_trait::async_trait;
use companion_types::Event;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Where the catalog gets its events from.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch the full list of events.
    async fn fetch(&self) -> Result<Vec<Event>>;
}

/// Fetches the event list as a JSON array over HTTP GET.
pub struct HttpEventSource {
    client: reqwest::Client,
    url: String,
}

impl HttpEventSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompanionError::EventFeed(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch(&self) -> Result<Vec<Event>> {
        tracing::debug!(target: "companion::catalog", "Fetching events from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CompanionError::EventFeed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompanionError::EventFeed(format!(
                "feed returned HTTP {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CompanionError::EventFeed(e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| CompanionError::EventFeed(format!("invalid feed payload: {}", e)))
    }
}

/// Holds the last successfully loaded snapshot of events.
pub struct EventCatalog {
    source: Arc<dyn EventSource>,
    snapshot: RwLock<Option<Arc<Vec<Event>>>>,
    // Held while a first load is in flight
    first_load: tokio::sync::Mutex<()>,
}

impl EventCatalog {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(None),
            first_load: tokio::sync::Mutex::new(()),
        }
    }

    /// Fetch the catalog and replace the snapshot.
    ///
    /// On failure the previous snapshot is kept and the error is returned.
    pub async fn load(&self) -> Result<Vec<Event>> {
        let fetched = match self.source.fetch().await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(target: "companion::catalog", "Event catalog load failed: {}", e);
                return Err(e);
            }
        };

        let events = dedupe_by_id(fetched);
        tracing::info!(target: "companion::catalog", "Loaded {} events", events.len());

        *self.snapshot.write().unwrap() = Some(Arc::new(events.clone()));
        Ok(events)
    }

    /// Current events, fetching them first if nothing has loaded yet.
    ///
    /// Concurrent callers waiting on the first load share one fetch.
    pub async fn ensure_loaded(&self) -> Result<Vec<Event>> {
        if self.is_loaded() {
            return Ok(self.events());
        }
        let _guard = self.first_load.lock().await;
        if self.is_loaded() {
            return Ok(self.events());
        }
        self.load().await
    }

    /// Look up an event in the current snapshot.
    pub fn find_by_id(&self, id: &str) -> Option<Event> {
        self.snapshot
            .read()
            .unwrap()
            .as_ref()
            .and_then(|events| events.iter().find(|e| e.id == id).cloned())
    }

    /// Events in the current snapshot, in feed order. Empty before the first load.
    pub fn events(&self) -> Vec<Event> {
        self.snapshot
            .read()
            .unwrap()
            .as_ref()
            .map(|events| events.as_ref().clone())
            .unwrap_or_default()
    }

    /// Whether a load has succeeded since creation or the last clear.
    pub fn is_loaded(&self) -> bool {
        self.snapshot.read().unwrap().is_some()
    }

    /// Drop the snapshot.
    pub fn clear(&self) {
        *self.snapshot.write().unwrap() = None;
    }
}

/// Keep the first event for each identifier.
fn dedupe_by_id(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    let total = events.len();
    let unique: Vec<Event> = events
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    if unique.len() != total {
        tracing::warn!(
            target: "companion::catalog",
            "Dropped {} events with duplicate ids",
            total - unique.len()
        );
    }
    unique
}
