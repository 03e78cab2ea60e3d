//! Personal agenda types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An entry the student added to their own agenda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaEntry {
    pub id: Uuid,
    pub title: String,
    /// Display date chosen by the student.
    pub date: String,
    /// Optional `HH:MM` start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fields supplied when adding an agenda entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAgendaEntry {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewAgendaEntry {
    /// Assign an identifier, dropping blank optional fields.
    pub fn into_entry(self) -> AgendaEntry {
        AgendaEntry {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            date: self.date,
            time: self.time.filter(|t| !t.trim().is_empty()),
            description: self.description.filter(|d| !d.trim().is_empty()),
        }
    }
}
