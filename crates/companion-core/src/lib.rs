//! Core data layer for the campus companion: interaction history, event
//! catalog, assistant, and local preferences.

mod assistant;
mod error;
mod event_catalog;
mod interaction_store;
mod preferences;

pub use assistant::{
    Assistant, CompletionClient, GeminiClient, GeminiConfig, mask_api_key,
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, EMPTY_COMPLETION_ANSWER, SUGGESTIONS,
};
pub use error::{CompanionError, ErrorKind};
pub use event_catalog::{EventCatalog, EventSource, HttpEventSource};
pub use interaction_store::InteractionStore;
pub use preferences::{AgendaStore, PreferenceStore, ReminderPreferences};

/// Result type for companion operations.
pub type Result<T> = std::result::Result<T, CompanionError>;
