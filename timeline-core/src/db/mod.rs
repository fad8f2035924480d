//! Local write-through storage.
//!
//! The whole state tree is kept as one JSON blob under [`STATE_KEY`] in a
//! small SQLite key/value table. Every save replaces the blob.

mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::AppState;
use crate::normalize::parse_state;

/// Fixed key the state blob is stored under.
pub const STATE_KEY: &str = "timeline-state-v1";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "timeline")
            .ok_or_else(|| anyhow!("Could not determine a data directory"))?;
        Ok(dirs.data_dir().join("timeline.db"))
    }

    pub fn migrate(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch(schema::SCHEMA)?;
            Ok(())
        })
    }

    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Database lock poisoned"))?;
        f(&conn)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    /// Load and normalize the stored state. Nothing stored, or a blob that
    /// does not parse, yields the empty state.
    pub fn load_state(&self) -> Result<AppState> {
        Ok(match self.get(STATE_KEY)? {
            Some(raw) => parse_state(&raw),
            None => AppState::default(),
        })
    }

    pub fn save_state(&self, state: &AppState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.set(STATE_KEY, &json)?;
        tracing::debug!("Saved state ({} projects)", state.projects.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreatePhaseInput, CreateProjectInput};
    use tempfile::TempDir;

    fn memory_db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn load_without_saved_state_is_empty() {
        let db = memory_db();
        assert_eq!(db.load_state().unwrap(), AppState::default());
    }

    #[test]
    fn save_then_load_returns_same_tree() {
        let db = memory_db();
        let mut state = AppState::default();
        state
            .add_project(CreateProjectInput {
                name: "Rocket".into(),
                ..Default::default()
            })
            .unwrap()
            .add_phase(CreatePhaseInput::default());
        state.ensure_selections();

        db.save_state(&state).unwrap();

        assert_eq!(db.load_state().unwrap(), state);
    }

    #[test]
    fn corrupted_blob_recovers_to_empty_state() {
        let db = memory_db();
        db.set(STATE_KEY, "{\"projects\": [").unwrap();

        assert_eq!(db.load_state().unwrap(), AppState::default());
    }

    #[test]
    fn save_overwrites_previous_blob() {
        let db = memory_db();
        db.set(STATE_KEY, "first").unwrap();
        db.set(STATE_KEY, "second").unwrap();

        assert_eq!(db.get(STATE_KEY).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("timeline.db");

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();

        assert!(path.exists());
    }
}
