use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::checklist::ChecklistItem;
use super::note::{CreateFileInput, CreateNoteInput, FileEntry, Note};
use super::task::{CreateTaskInput, Priority, Task};
use super::remove_by_id;
use crate::id::new_id;

/// Default phase colors, assigned by position in the project.
pub const COLOR_PALETTE: [&str; 6] = [
    "#38bdf8", "#818cf8", "#f472b6", "#22d3ee", "#f97316", "#a855f7",
];

pub fn palette_color(index: usize) -> &'static str {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Manual override; `None` means progress is derived from the tasks.
    pub progress: Option<u8>,
    pub color: String,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
    pub files: Vec<FileEntry>,
    pub checklist: Vec<ChecklistItem>,
    pub created_at: DateTime<Utc>,
}

impl Phase {
    /// A blank phase named after its position (`index` is zero based).
    pub fn new(index: usize) -> Self {
        Self {
            id: new_id(),
            name: default_phase_name(index),
            description: String::new(),
            start_date: None,
            end_date: None,
            progress: None,
            color: palette_color(index).to_string(),
            priority: Priority::default(),
            deadline: None,
            tasks: Vec::new(),
            notes: Vec::new(),
            files: Vec::new(),
            checklist: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn add_task(&mut self, input: CreateTaskInput) -> Option<&mut Task> {
        let title = input.title.trim();
        if title.is_empty() {
            return None;
        }
        let mut task = Task::new(title);
        task.label = input.label.unwrap_or_default().trim().to_string();
        task.priority = input.priority.unwrap_or_default();
        task.due_date = input.due_date;
        task.notes = input.notes.unwrap_or_default();
        self.tasks.push(task);
        self.tasks.last_mut()
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn remove_task(&mut self, task_id: &str) -> bool {
        remove_by_id(&mut self.tasks, task_id)
    }

    /// Newest notes go first.
    pub fn add_note(&mut self, input: CreateNoteInput) -> Option<&Note> {
        let mut note = input.into_note()?;
        note.phase_id = Some(self.id.clone());
        self.notes.insert(0, note);
        self.notes.first()
    }

    pub fn remove_note(&mut self, note_id: &str) -> bool {
        remove_by_id(&mut self.notes, note_id)
    }

    /// Newest files go first.
    pub fn add_file(&mut self, input: CreateFileInput) -> Option<&FileEntry> {
        let mut file = input.into_file()?;
        file.phase_id = Some(self.id.clone());
        self.files.insert(0, file);
        self.files.first()
    }

    pub fn remove_file(&mut self, file_id: &str) -> bool {
        remove_by_id(&mut self.files, file_id)
    }

    pub fn add_checklist_item(&mut self, text: &str) -> Option<&ChecklistItem> {
        let item = ChecklistItem::new(text)?;
        self.checklist.push(item);
        self.checklist.last()
    }

    pub fn set_checklist_done(&mut self, item_id: &str, done: bool) -> bool {
        match self.checklist.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.done = done;
                true
            }
            None => false,
        }
    }

    pub fn remove_checklist_item(&mut self, item_id: &str) -> bool {
        remove_by_id(&mut self.checklist, item_id)
    }

    pub fn clear_checklist(&mut self) {
        self.checklist.clear();
    }

    /// Set or clear the manual progress override, clamped to 0..=100.
    pub fn set_manual_progress(&mut self, progress: Option<i64>) {
        self.progress = progress.map(|p| p.clamp(0, 100) as u8);
    }

    pub fn update(&mut self, input: UpdatePhaseInput) {
        if let Some(name) = input.name.map(|n| n.trim().to_string()) {
            if !name.is_empty() {
                self.name = name;
            }
        }
        if let Some(description) = input.description {
            self.description = description.trim().to_string();
        }
        if let Some(start_date) = input.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = input.end_date {
            self.end_date = end_date;
        }
        if let Some(deadline) = input.deadline {
            self.deadline = deadline;
        }
        if let Some(color) = input.color.filter(|c| !c.trim().is_empty()) {
            self.color = color;
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        if let Some(progress) = input.progress {
            self.set_manual_progress(progress);
        }
    }
}

pub(crate) fn default_phase_name(index: usize) -> String {
    format!("New phase {}", index + 1)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhaseInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub color: Option<String>,
}

/// Partial phase edit. Double options clear the field with `Some(None)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhaseInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub deadline: Option<Option<NaiveDate>>,
    pub color: Option<String>,
    pub priority: Option<Priority>,
    pub progress: Option<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_phase_uses_palette_by_position() {
        let first = Phase::new(0);
        let seventh = Phase::new(6);

        assert_eq!(first.name, "New phase 1");
        assert_eq!(first.color, "#38bdf8");
        assert_eq!(seventh.color, "#38bdf8");
        assert!(first.progress.is_none());
    }

    #[test]
    fn add_task_rejects_blank_title() {
        let mut phase = Phase::new(0);

        let added = phase.add_task(CreateTaskInput {
            title: "   ".into(),
            ..Default::default()
        });

        assert!(added.is_none());
        assert!(phase.tasks.is_empty());
    }

    #[test]
    fn notes_are_prepended_and_linked_to_the_phase() {
        let mut phase = Phase::new(0);
        phase.add_note(CreateNoteInput {
            title: "first".into(),
            ..Default::default()
        });
        phase.add_note(CreateNoteInput {
            title: "second".into(),
            ..Default::default()
        });

        assert_eq!(phase.notes[0].title, "second");
        assert_eq!(phase.notes[1].phase_id.as_deref(), Some(phase.id.as_str()));
    }

    #[test]
    fn checklist_items_can_be_toggled_and_removed() {
        let mut phase = Phase::new(0);
        let id = phase.add_checklist_item("Check cables").unwrap().id.clone();
        assert!(phase.add_checklist_item("").is_none());

        assert!(phase.set_checklist_done(&id, true));
        assert!(phase.checklist[0].done);

        assert!(phase.remove_checklist_item(&id));
        assert!(!phase.remove_checklist_item(&id));
    }

    #[test]
    fn manual_progress_is_clamped() {
        let mut phase = Phase::new(0);

        phase.set_manual_progress(Some(140));
        assert_eq!(phase.progress, Some(100));

        phase.update(UpdatePhaseInput {
            progress: Some(None),
            ..Default::default()
        });
        assert_eq!(phase.progress, None);
    }
}
