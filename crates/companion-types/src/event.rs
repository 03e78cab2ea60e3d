//! Campus event catalog types.

use serde::{Deserialize, Serialize};

/// An event published by the remote feed.
///
/// All fields are plain strings as delivered; `date` is display text and is
/// not parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub category: String,
}
