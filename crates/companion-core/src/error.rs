//! Error types for the companion core.

use thiserror::Error;
use uuid::Uuid;

/// Broad classification used to decide how a failure is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local database or preference file failed.
    Storage,
    /// Remote feed or completion service failed.
    Network,
    /// Lookup by identifier found nothing.
    NotFound,
    /// Blank input rejected before any work was done.
    EmptyInput,
}

#[derive(Error, Debug)]
pub enum CompanionError {
    #[error("Interaction not found: {0}")]
    InteractionNotFound(i64),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Agenda entry not found: {0}")]
    AgendaEntryNotFound(Uuid),

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Event feed error: {0}")]
    EventFeed(String),

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CompanionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InteractionNotFound(_) | Self::EventNotFound(_) | Self::AgendaEntryNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::EmptyQuestion | Self::EmptyTitle => ErrorKind::EmptyInput,
            Self::EventFeed(_) | Self::Completion(_) => ErrorKind::Network,
            Self::DatabaseError(_) | Self::IoError(_) | Self::JsonError(_) => ErrorKind::Storage,
        }
    }
}
