//! Question/answer history types.
//!
//! An interaction is one exchange with the assistant: the question the
//! student typed and the answer the completion service produced.

use serde::{Deserialize, Serialize};

/// A recorded question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Store-assigned identifier. Never reused after deletion.
    pub id: i64,
    /// The question as submitted.
    pub question: String,
    /// The answer returned by the completion service.
    pub answer: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub date: i64,
    /// Whether the student starred this exchange.
    #[serde(default)]
    pub is_favorite: bool,
}

/// Search and favorites filter for the history list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Case-insensitive substring the question must contain, taken as typed.
    /// Empty matches all.
    #[serde(default)]
    pub search: String,
    /// Only keep starred interactions.
    #[serde(default)]
    pub favorites_only: bool,
}

impl HistoryFilter {
    pub fn new(search: impl Into<String>, favorites_only: bool) -> Self {
        Self {
            search: search.into(),
            favorites_only,
        }
    }

    /// Whether the interaction passes this filter.
    pub fn matches(&self, interaction: &Interaction) -> bool {
        if self.favorites_only && !interaction.is_favorite {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        interaction
            .question
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    /// Filter a snapshot, keeping its order.
    pub fn apply<'a, I>(&self, interactions: I) -> Vec<Interaction>
    where
        I: IntoIterator<Item = &'a Interaction>,
    {
        interactions
            .into_iter()
            .filter(|i| self.matches(i))
            .cloned()
            .collect()
    }
}
