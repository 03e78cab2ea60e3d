//! Shared application state.

use crate::config::Config;
use async_trait::async_trait;
use companion_core::{
    AgendaStore, Assistant, CompanionError, CompletionClient, EventCatalog, EventSource,
    GeminiClient, GeminiConfig, HttpEventSource, InteractionStore, PreferenceStore,
    ReminderPreferences,
};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
///
/// Each component owns its own resource: one SQLite connection for the
/// history, one HTTP client for the event feed, one preference file.
pub struct AppState {
    pub interactions: Arc<InteractionStore>,
    pub assistant: Assistant,
    pub catalog: EventCatalog,
    pub agenda: AgendaStore,
    pub reminders: ReminderPreferences,
    pub config: Config,
}

impl AppState {
    /// Build state with the real Gemini client and HTTP event feed.
    pub fn new(config: Config) -> companion_core::Result<Self> {
        let completion: Arc<dyn CompletionClient> = match config.completion.resolve_api_key() {
            Some(api_key) => {
                let gemini = GeminiConfig::new(api_key)
                    .with_base_url(config.completion.base_url.clone())
                    .with_model(config.completion.model.clone())
                    .with_timeout(Duration::from_secs(config.completion.timeout_secs));
                Arc::new(GeminiClient::new(gemini)?)
            }
            None => {
                tracing::warn!(
                    target: "companion::startup",
                    "No completion API key configured (set {}); questions will be rejected",
                    crate::config::API_KEY_ENV
                );
                Arc::new(UnconfiguredCompletion)
            }
        };

        let events = Arc::new(HttpEventSource::new(
            config.events_url.clone(),
            Duration::from_secs(config.events_timeout_secs),
        )?);

        Self::with_services(config, completion, events)
    }

    /// Build state around the given external collaborators.
    pub fn with_services(
        config: Config,
        completion: Arc<dyn CompletionClient>,
        events: Arc<dyn EventSource>,
    ) -> companion_core::Result<Self> {
        let interactions = Arc::new(InteractionStore::open(&config.db_path)?);
        let prefs = Arc::new(PreferenceStore::open(&config.prefs_path)?);

        Ok(Self {
            assistant: Assistant::new(completion, interactions.clone()),
            interactions,
            catalog: EventCatalog::new(events),
            agenda: AgendaStore::new(prefs.clone()),
            reminders: ReminderPreferences::new(prefs),
            config,
        })
    }
}

/// Stand-in used when no API key is available.
struct UnconfiguredCompletion;

#[async_trait]
impl CompletionClient for UnconfiguredCompletion {
    async fn complete(&self, _prompt: &str) -> companion_core::Result<Option<String>> {
        Err(CompanionError::Completion(format!(
            "no API key configured; set {} or completion.api_key",
            crate::config::API_KEY_ENV
        )))
    }
}
