//! Server-side state file.
//!
//! The server treats the state as an opaque JSON blob: it only coerces the
//! top-level shape before writing, and every save overwrites the whole file.
//! Concurrent saves are not coordinated; the last write wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::id::new_id;
use crate::models::AppState;

/// The posted state was not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("state must be a JSON object")]
pub struct NotAnObject;

/// Minimal shape coercion for a posted state blob: `projects` becomes an
/// array of objects that all carry an id, `preferences` an object, and the
/// selection ids strings or null. Other keys pass through.
pub fn coerce_state_blob(blob: Value) -> Result<Value, NotAnObject> {
    let Value::Object(mut root) = blob else {
        return Err(NotAnObject);
    };

    let projects = match root.remove("projects") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(mut project) => {
                    let has_id = project
                        .get("id")
                        .and_then(Value::as_str)
                        .is_some_and(|id| !id.is_empty());
                    if !has_id {
                        project.insert("id".into(), Value::String(new_id()));
                    }
                    Some(Value::Object(project))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    root.insert("projects".into(), Value::Array(projects));

    if !root.get("preferences").is_some_and(Value::is_object) {
        root.insert("preferences".into(), Value::Object(Map::new()));
    }
    for key in ["selectedProjectId", "selectedPhaseId"] {
        if !root.get(key).is_some_and(Value::is_string) {
            root.insert(key.into(), Value::Null);
        }
    }
    Ok(Value::Object(root))
}

/// A single JSON file holding the shared state.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored blob, writing the default state on first access.
    /// An unreadable file is reported as the default state and left alone.
    pub fn load_or_create(&self) -> Result<Value> {
        if !self.path.exists() {
            let blob = serde_json::to_value(AppState::default())?;
            self.save(&blob)?;
            tracing::info!("Created state file at {}", self.path.display());
            return Ok(blob);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        match serde_json::from_str(&raw) {
            Ok(blob) => Ok(blob),
            Err(e) => {
                tracing::warn!(
                    "State file {} is not valid JSON, serving empty state: {}",
                    self.path.display(),
                    e
                );
                Ok(serde_json::to_value(AppState::default())?)
            }
        }
    }

    /// Replace the file in one step: readers see the old or the new state,
    /// never a partial write.
    pub fn save(&self, blob: &Value) -> Result<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
                parent
            }
            None => Path::new("."),
        };
        let json = serde_json::to_string_pretty(blob)?;
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to stage a write in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
