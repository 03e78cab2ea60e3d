//! File-backed key-value preference area, plus the agenda and reminder
//! settings stored in it.
//!
//! The whole area is one JSON document of `namespace -> key -> value`.
//! Writes go to a temporary file that is renamed over the original. The
//! in-memory copy only changes once that write has succeeded.

use crate::{CompanionError, Result};
use companion_types::{AgendaEntry, NewAgendaEntry};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Namespaces = BTreeMap<String, BTreeMap<String, String>>;

/// Namespaced string preferences persisted to a JSON file.
pub struct PreferenceStore {
    path: PathBuf,
    data: Mutex<Namespaces>,
}

impl PreferenceStore {
    /// Open the preference file, starting empty if it does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Namespaces::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Namespaces::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data: Mutex::new(data),
        })
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.data
            .lock()
            .unwrap()
            .get(namespace)
            .and_then(|ns| ns.get(key))
            .cloned()
    }

    pub fn put(&self, namespace: &str, key: &str, value: impl Into<String>) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        let mut updated = data.clone();
        updated
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self.persist(&updated)?;
        *data = updated;
        Ok(())
    }

    /// Remove a key. Returns whether it was present.
    pub fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        let mut data = self.data.lock().unwrap();
        if !data.get(namespace).is_some_and(|ns| ns.contains_key(key)) {
            return Ok(false);
        }

        let mut updated = data.clone();
        if let Some(ns) = updated.get_mut(namespace) {
            ns.remove(key);
            if ns.is_empty() {
                updated.remove(namespace);
            }
        }
        self.persist(&updated)?;
        *data = updated;
        Ok(true)
    }

    fn persist(&self, data: &Namespaces) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::trace!(target: "companion::prefs", "Saved preferences to {:?}", self.path);
        Ok(())
    }
}

const AGENDA_NAMESPACE: &str = "events_prefs";
const AGENDA_KEY: &str = "events_list";

/// The student's own agenda, stored as one JSON list in the preference area.
pub struct AgendaStore {
    prefs: Arc<PreferenceStore>,
    // Serializes read-modify-write of the list
    lock: Mutex<()>,
}

impl AgendaStore {
    pub fn new(prefs: Arc<PreferenceStore>) -> Self {
        Self {
            prefs,
            lock: Mutex::new(()),
        }
    }

    /// Entries in the order they were added.
    pub fn list(&self) -> Result<Vec<AgendaEntry>> {
        match self.prefs.get(AGENDA_NAMESPACE, AGENDA_KEY) {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn add(&self, new_entry: NewAgendaEntry) -> Result<AgendaEntry> {
        if new_entry.title.trim().is_empty() {
            return Err(CompanionError::EmptyTitle);
        }

        let _guard = self.lock.lock().unwrap();
        let entry = new_entry.into_entry();
        let mut entries = self.list()?;
        entries.push(entry.clone());
        self.save(&entries)?;

        tracing::debug!(target: "companion::prefs", "Added agenda entry {}", entry.id);
        Ok(entry)
    }

    /// Remove an entry. Returns false if no entry had that id.
    pub fn remove(&self, id: Uuid) -> Result<bool> {
        let _guard = self.lock.lock().unwrap();
        let mut entries = self.list()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.save(&entries)?;
        Ok(true)
    }

    fn save(&self, entries: &[AgendaEntry]) -> Result<()> {
        self.prefs
            .put(AGENDA_NAMESPACE, AGENDA_KEY, serde_json::to_string(entries)?)
    }
}

const REMINDER_NAMESPACE: &str = "notification_prefs";

/// Per-event reminder opt-ins, keyed by event title.
pub struct ReminderPreferences {
    prefs: Arc<PreferenceStore>,
}

impl ReminderPreferences {
    pub fn new(prefs: Arc<PreferenceStore>) -> Self {
        Self { prefs }
    }

    pub fn is_subscribed(&self, event_title: &str) -> bool {
        self.prefs
            .get(REMINDER_NAMESPACE, event_title)
            .is_some_and(|v| v == "true")
    }

    pub fn set_subscribed(&self, event_title: &str, subscribed: bool) -> Result<()> {
        if subscribed {
            self.prefs.put(REMINDER_NAMESPACE, event_title, "true")
        } else {
            self.prefs.remove(REMINDER_NAMESPACE, event_title).map(|_| ())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_prefs(dir: &TempDir) -> Arc<PreferenceStore> {
        Arc::new(PreferenceStore::open(&dir.path().join("prefs.json")).unwrap())
    }

    fn new_entry(title: &str) -> NewAgendaEntry {
        NewAgendaEntry {
            title: title.to_string(),
            date: "14 février 2025".to_string(),
            time: Some("18:00".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_preferences_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let prefs = open_prefs(&dir);
        prefs.put("ui", "theme", "dark").unwrap();
        drop(prefs);

        let reopened = open_prefs(&dir);
        assert_eq!(reopened.get("ui", "theme").as_deref(), Some("dark"));
        assert_eq!(reopened.get("ui", "missing"), None);
        assert_eq!(reopened.get("other", "theme"), None);
    }

    #[test]
    fn test_preferences_remove() {
        let dir = TempDir::new().unwrap();
        let prefs = open_prefs(&dir);
        prefs.put("ui", "theme", "dark").unwrap();

        assert!(prefs.remove("ui", "theme").unwrap());
        assert!(!prefs.remove("ui", "theme").unwrap());
        assert_eq!(prefs.get("ui", "theme"), None);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = PreferenceStore::open(&path).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::Storage);
    }

    #[test]
    fn test_failed_write_leaves_values_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let prefs = Arc::new(PreferenceStore::open(&blocker.join("prefs.json")).unwrap());

        let err = prefs.put("ns", "k", "v").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Storage);
        assert_eq!(prefs.get("ns", "k"), None);

        let agenda = AgendaStore::new(prefs.clone());
        assert!(agenda.add(new_entry("Career fair")).is_err());
        assert!(agenda.list().unwrap().is_empty());

        let reminders = ReminderPreferences::new(prefs);
        assert!(reminders.set_subscribed("Gala", true).is_err());
        assert!(!reminders.is_subscribed("Gala"));
    }

    #[test]
    fn test_failed_remove_keeps_value() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        let prefs = PreferenceStore::open(&sub.join("prefs.json")).unwrap();
        prefs.put("ui", "theme", "dark").unwrap();

        std::fs::remove_dir_all(&sub).unwrap();
        std::fs::write(&sub, "").unwrap();

        assert!(prefs.remove("ui", "theme").is_err());
        assert_eq!(prefs.get("ui", "theme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_agenda_add_list_remove() {
        let dir = TempDir::new().unwrap();
        let agenda = AgendaStore::new(open_prefs(&dir));

        let first = agenda.add(new_entry("Career fair")).unwrap();
        let second = agenda.add(new_entry("Robotics club")).unwrap();

        let titles: Vec<String> = agenda.list().unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["Career fair", "Robotics club"]);

        assert!(agenda.remove(first.id).unwrap());
        assert!(!agenda.remove(first.id).unwrap());
        assert_eq!(agenda.list().unwrap(), vec![second]);
    }

    #[test]
    fn test_agenda_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let added = AgendaStore::new(open_prefs(&dir))
            .add(new_entry("Exam review"))
            .unwrap();

        let agenda = AgendaStore::new(open_prefs(&dir));
        assert_eq!(agenda.list().unwrap(), vec![added]);
    }

    #[test]
    fn test_agenda_rejects_blank_title() {
        let dir = TempDir::new().unwrap();
        let agenda = AgendaStore::new(open_prefs(&dir));
        let err = agenda.add(new_entry("  ")).unwrap_err();
        assert!(matches!(err, CompanionError::EmptyTitle));
        assert!(agenda.list().unwrap().is_empty());
    }

    #[test]
    fn test_reminder_subscriptions() {
        let dir = TempDir::new().unwrap();
        let reminders = ReminderPreferences::new(open_prefs(&dir));
        assert!(!reminders.is_subscribed("Gala"));

        reminders.set_subscribed("Gala", true).unwrap();
        assert!(reminders.is_subscribed("Gala"));
        assert!(!reminders.is_subscribed("BDE party"));

        reminders.set_subscribed("Gala", false).unwrap();
        assert!(!reminders.is_subscribed("Gala"));
    }
}
