use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::new_id;

/// A snapshot of earlier content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

/// Append-only list of snapshots, most recent first.
///
/// There is no eviction: every saved version is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionHistory(Vec<Version>);

impl VersionHistory {
    pub(crate) fn from_versions(versions: Vec<Version>) -> Self {
        Self(versions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.0.iter()
    }

    fn record(&mut self, content: String) {
        self.0.insert(
            0,
            Version {
                timestamp: Utc::now(),
                content,
            },
        );
    }
}

/// Snapshot `current` into `history`, then replace it with `next`.
/// Returns false when nothing changed.
fn save_version(current: &mut String, history: &mut VersionHistory, next: String) -> bool {
    if *current == next {
        return false;
    }
    let previous = std::mem::replace(current, next);
    history.record(previous);
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub phase_id: Option<String>,
    pub versions: VersionHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.into(),
            content: content.into(),
            phase_id: None,
            versions: VersionHistory::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn save_version(&mut self, content: impl Into<String>) -> bool {
        let changed = save_version(&mut self.content, &mut self.versions, content.into());
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// A file or reference attached to a project or phase. `content` holds
/// inline data (text or a data URL); `link` points elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub note: String,
    pub content: String,
    pub phase_id: Option<String>,
    pub versions: VersionHistory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileEntry {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.into(),
            link: String::new(),
            note: String::new(),
            content: String::new(),
            phase_id: None,
            versions: VersionHistory::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn save_version(&mut self, content: impl Into<String>) -> bool {
        let changed = save_version(&mut self.content, &mut self.versions, content.into());
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub phase_id: Option<String>,
}

impl CreateNoteInput {
    pub(crate) fn into_note(self) -> Option<Note> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() && content.is_empty() {
            return None;
        }
        let mut note = Note::new(title, content);
        note.phase_id = self.phase_id;
        Some(note)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub phase_id: Option<String>,
}

impl CreateFileInput {
    pub(crate) fn into_file(self) -> Option<FileEntry> {
        let title = self.title.trim();
        let link = self.link.trim();
        let note = self.note.trim();
        if title.is_empty() && link.is_empty() && note.is_empty() && self.content.is_empty() {
            return None;
        }
        let mut file = FileEntry::new(title);
        file.link = link.to_string();
        file.note = note.to_string();
        file.content = self.content;
        file.phase_id = self.phase_id;
        Some(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_version_snapshots_previous_content() {
        let mut note = Note::new("Log", "first");

        assert!(note.save_version("second"));
        assert!(note.save_version("third"));

        assert_eq!(note.content, "third");
        let history: Vec<_> = note.versions.iter().map(|v| v.content.as_str()).collect();
        assert_eq!(history, ["second", "first"]);
    }

    #[test]
    fn saving_identical_content_records_nothing() {
        let mut file = FileEntry::new("schema.svg");
        file.content = "data:image/svg+xml;base64,AAA".into();

        assert!(!file.save_version("data:image/svg+xml;base64,AAA"));
        assert!(file.versions.is_empty());
    }

    #[test]
    fn blank_note_input_is_rejected() {
        let input = CreateNoteInput {
            title: "  ".into(),
            content: "\n".into(),
            phase_id: None,
        };
        assert!(input.into_note().is_none());
    }

    #[test]
    fn file_input_with_only_a_link_is_accepted() {
        let input = CreateFileInput {
            link: "https://example.com/render.png".into(),
            ..Default::default()
        };
        let file = input.into_file().unwrap();
        assert_eq!(file.link, "https://example.com/render.png");
        assert!(file.title.is_empty());
    }
}
