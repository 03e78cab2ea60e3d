//! SQLite persistence for question/answer interactions.
//!
//! Every successful mutation republishes the full history (newest first) on a
//! watch channel, so presentation code can observe the list instead of
//! polling it.

use crate::{CompanionError, Result};
use chrono::Utc;
use companion_types::Interaction;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::watch;

const SELECT_COLUMNS: &str = "SELECT id, question, answer, date, is_favorite FROM interactions";

/// SQLite-based store for assistant interactions.
pub struct InteractionStore {
    conn: Mutex<Connection>,
    snapshot_tx: watch::Sender<Vec<Interaction>>,
}

impl InteractionStore {
    /// Open or create the interaction store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Create an InteractionStore from an existing connection.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        let store = Self {
            conn: Mutex::new(conn),
            snapshot_tx,
        };
        store.init_schema()?;
        store.migrate()?;

        let conn = store.conn.lock().unwrap();
        store.publish(&conn)?;
        drop(conn);

        Ok(store)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                date INTEGER NOT NULL,
                is_favorite INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_interactions_date ON interactions(date);
            CREATE INDEX IF NOT EXISTS idx_interactions_question ON interactions(question);
            "#,
        )?;
        Ok(())
    }

    /// Run migrations for schema updates.
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        // Early databases predate favorites
        let has_is_favorite: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('interactions') WHERE name = 'is_favorite'",
            [],
            |row| row.get(0),
        )?;

        if !has_is_favorite {
            tracing::info!(target: "companion::db", "Adding is_favorite column to interactions");
            conn.execute_batch(
                "ALTER TABLE interactions ADD COLUMN is_favorite INTEGER NOT NULL DEFAULT 0;",
            )?;
        }

        Ok(())
    }

    /// Subscribe to history snapshots.
    ///
    /// The receiver starts with the current history and is notified after
    /// every insert, delete, and favorite toggle.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Interaction>> {
        self.snapshot_tx.subscribe()
    }

    /// Record a new exchange, stamped with the current time.
    pub fn insert(&self, question: &str, answer: &str) -> Result<Interaction> {
        let conn = self.conn.lock().unwrap();
        let date = Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO interactions (question, answer, date, is_favorite) VALUES (?1, ?2, ?3, 0)",
            params![question, answer, date],
        )?;
        let interaction = Interaction {
            id: conn.last_insert_rowid(),
            question: question.to_string(),
            answer: answer.to_string(),
            date,
            is_favorite: false,
        };
        tracing::debug!(target: "companion::db", "Inserted interaction {}", interaction.id);

        self.publish(&conn)?;
        Ok(interaction)
    }

    /// List all interactions, most recent first.
    pub fn list_all(&self) -> Result<Vec<Interaction>> {
        let conn = self.conn.lock().unwrap();
        Self::query_all(&conn)
    }

    /// Get an interaction by ID.
    pub fn get(&self, id: i64) -> Result<Option<Interaction>> {
        let conn = self.conn.lock().unwrap();
        let interaction = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_interaction,
            )
            .optional()?;
        Ok(interaction)
    }

    /// Most recent interaction whose question matches exactly.
    pub fn find_last(&self, question: &str) -> Result<Option<Interaction>> {
        let conn = self.conn.lock().unwrap();
        let interaction = conn
            .query_row(
                &format!(
                    "{} WHERE question = ?1 ORDER BY date DESC, id DESC LIMIT 1",
                    SELECT_COLUMNS
                ),
                params![question],
                Self::row_to_interaction,
            )
            .optional()?;
        Ok(interaction)
    }

    /// Number of stored interactions.
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM interactions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete one interaction. Returns false if it was already gone.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM interactions WHERE id = ?1", params![id])?;
        if removed == 0 {
            tracing::debug!(target: "companion::db", "Interaction {} already absent", id);
            return Ok(false);
        }

        self.publish(&conn)?;
        Ok(true)
    }

    /// Delete every interaction. Returns how many were removed.
    pub fn delete_all(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM interactions", [])?;
        tracing::info!(target: "companion::db", "Cleared history ({} interactions)", removed);

        self.publish(&conn)?;
        Ok(removed)
    }

    /// Flip the favorite flag and return the updated interaction.
    pub fn toggle_favorite(&self, id: i64) -> Result<Interaction> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE interactions SET is_favorite = NOT is_favorite WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Err(CompanionError::InteractionNotFound(id));
        }

        let interaction = conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            params![id],
            Self::row_to_interaction,
        )?;

        self.publish(&conn)?;
        Ok(interaction)
    }

    fn publish(&self, conn: &Connection) -> Result<()> {
        let snapshot = Self::query_all(conn)?;
        self.snapshot_tx.send_replace(snapshot);
        Ok(())
    }

    fn query_all(conn: &Connection) -> Result<Vec<Interaction>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY date DESC, id DESC", SELECT_COLUMNS))?;
        let interactions = stmt
            .query_map([], Self::row_to_interaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(interactions)
    }

    fn row_to_interaction(row: &rusqlite::Row) -> rusqlite::Result<Interaction> {
        Ok(Interaction {
            id: row.get("id")?,
            question: row.get("question")?,
            answer: row.get("answer")?,
            date: row.get("date")?,
            is_favorite: row.get("is_favorite")?,
        })
    }
}
