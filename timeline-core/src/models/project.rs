use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::checklist::ChecklistItem;
use super::note::{CreateFileInput, CreateNoteInput, FileEntry, Note};
use super::phase::{CreatePhaseInput, Phase};
use super::remove_by_id;
use super::task::Task;
use crate::id::new_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProjectType,
    pub description: String,
    pub github: Option<String>,
    pub share: Option<Share>,
    pub phases: Vec<Phase>,
    pub notes: Vec<Note>,
    pub files: Vec<FileEntry>,
    pub checklist: Vec<ChecklistItem>,
    pub bom: Vec<BomLine>,
    pub logbook: Vec<LogEntry>,
    pub releases: Vec<Release>,
    pub issues: Vec<Issue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[default]
    Digital,
    Physical,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "digital",
            Self::Physical => "physical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "digital" => Some(Self::Digital),
            "physical" => Some(Self::Physical),
            _ => None,
        }
    }
}

/// Share descriptor. Informational only: nothing enforces access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub enabled: bool,
    pub slug: String,
}

/// A bill-of-materials line for physical builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub id: String,
    pub item: String,
    pub quantity: u32,
    pub supplier: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: String,
    pub version: String,
    pub date: Option<NaiveDate>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Open,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl Project {
    pub fn new(name: impl Into<String>, kind: ProjectType) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            kind,
            description: String::new(),
            github: None,
            share: None,
            phases: Vec::new(),
            notes: Vec::new(),
            files: Vec::new(),
            checklist: Vec::new(),
            bom: Vec::new(),
            logbook: Vec::new(),
            releases: Vec::new(),
            issues: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn phase(&self, phase_id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == phase_id)
    }

    pub fn phase_mut(&mut self, phase_id: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.id == phase_id)
    }

    /// Append a phase. Unset fields fall back to the positional defaults.
    pub fn add_phase(&mut self, input: CreatePhaseInput) -> &mut Phase {
        let mut phase = Phase::new(self.phases.len());
        if let Some(name) = input.name.map(|n| n.trim().to_string()) {
            if !name.is_empty() {
                phase.name = name;
            }
        }
        if let Some(description) = input.description {
            phase.description = description.trim().to_string();
        }
        if let Some(color) = input.color.filter(|c| !c.trim().is_empty()) {
            phase.color = color;
        }
        phase.priority = input.priority.unwrap_or_default();
        phase.start_date = input.start_date;
        phase.end_date = input.end_date;
        phase.deadline = input.deadline;
        self.touch();
        self.phases.push(phase);
        let last = self.phases.len() - 1;
        &mut self.phases[last]
    }

    pub fn remove_phase(&mut self, phase_id: &str) -> bool {
        let removed = remove_by_id(&mut self.phases, phase_id);
        if removed {
            self.touch();
        }
        removed
    }

    /// Locate a task in any phase.
    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.phases
            .iter_mut()
            .find_map(|phase| phase.task_mut(task_id))
    }

    /// Remove a task from whichever phase holds it.
    pub fn remove_task(&mut self, task_id: &str) -> bool {
        let removed = self.phases.iter_mut().any(|phase| phase.remove_task(task_id));
        if removed {
            self.touch();
        }
        removed
    }

    /// A project-level or phase note.
    pub fn note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.notes
            .iter_mut()
            .chain(self.phases.iter_mut().flat_map(|phase| phase.notes.iter_mut()))
            .find(|note| note.id == note_id)
    }

    pub fn remove_note(&mut self, note_id: &str) -> bool {
        let removed = remove_by_id(&mut self.notes, note_id)
            || self.phases.iter_mut().any(|phase| phase.remove_note(note_id));
        if removed {
            self.touch();
        }
        removed
    }

    /// A project-level or phase file.
    pub fn file_mut(&mut self, file_id: &str) -> Option<&mut FileEntry> {
        self.files
            .iter_mut()
            .chain(self.phases.iter_mut().flat_map(|phase| phase.files.iter_mut()))
            .find(|file| file.id == file_id)
    }

    pub fn remove_file(&mut self, file_id: &str) -> bool {
        let removed = remove_by_id(&mut self.files, file_id)
            || self.phases.iter_mut().any(|phase| phase.remove_file(file_id));
        if removed {
            self.touch();
        }
        removed
    }

    /// A project-level or phase checklist item.
    pub fn checklist_item_mut(&mut self, item_id: &str) -> Option<&mut ChecklistItem> {
        self.checklist
            .iter_mut()
            .chain(self.phases.iter_mut().flat_map(|phase| phase.checklist.iter_mut()))
            .find(|item| item.id == item_id)
    }

    pub fn remove_checklist_item(&mut self, item_id: &str) -> bool {
        let removed = remove_by_id(&mut self.checklist, item_id)
            || self
                .phases
                .iter_mut()
                .any(|phase| phase.remove_checklist_item(item_id));
        if removed {
            self.touch();
        }
        removed
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.phases.iter().flat_map(|phase| phase.tasks.iter())
    }

    pub fn add_note(&mut self, input: CreateNoteInput) -> Option<&Note> {
        let note = input.into_note()?;
        self.notes.insert(0, note);
        self.touch();
        self.notes.first()
    }

    pub fn add_file(&mut self, input: CreateFileInput) -> Option<&FileEntry> {
        let file = input.into_file()?;
        self.files.insert(0, file);
        self.touch();
        self.files.first()
    }

    pub fn add_checklist_item(&mut self, text: &str) -> Option<&ChecklistItem> {
        let item = ChecklistItem::new(text)?;
        self.checklist.push(item);
        self.touch();
        self.checklist.last()
    }

    pub fn add_bom_line(&mut self, item: &str, quantity: u32, supplier: &str) -> Option<&BomLine> {
        let item = item.trim();
        if item.is_empty() {
            return None;
        }
        self.bom.push(BomLine {
            id: new_id(),
            item: item.to_string(),
            quantity: quantity.max(1),
            supplier: supplier.trim().to_string(),
            done: false,
        });
        self.touch();
        self.bom.last()
    }

    /// Logbook entries are kept newest first.
    pub fn add_log_entry(&mut self, date: Option<NaiveDate>, text: &str) -> Option<&LogEntry> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.logbook.insert(
            0,
            LogEntry {
                id: new_id(),
                date,
                text: text.to_string(),
                created_at: Utc::now(),
            },
        );
        self.touch();
        self.logbook.first()
    }

    pub fn add_release(&mut self, version: &str, date: Option<NaiveDate>, notes: &str) -> Option<&Release> {
        let version = version.trim();
        if version.is_empty() {
            return None;
        }
        self.releases.insert(
            0,
            Release {
                id: new_id(),
                version: version.to_string(),
                date,
                notes: notes.trim().to_string(),
            },
        );
        self.touch();
        self.releases.first()
    }

    pub fn add_issue(&mut self, title: &str, description: &str) -> Option<&Issue> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        self.issues.push(Issue {
            id: new_id(),
            title: title.to_string(),
            description: description.trim().to_string(),
            status: IssueStatus::Open,
            created_at: Utc::now(),
        });
        self.touch();
        self.issues.last()
    }

    pub fn set_issue_status(&mut self, issue_id: &str, status: IssueStatus) -> bool {
        match self.issues.iter_mut().find(|i| i.id == issue_id) {
            Some(issue) => {
                issue.status = status;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Turn sharing on, deriving the slug from the project name.
    pub fn enable_sharing(&mut self) -> &Share {
        let slug = match self.share.take() {
            Some(share) if !share.slug.is_empty() => share.slug,
            _ => slugify(&self.name).unwrap_or_else(|| self.id.clone()),
        };
        self.touch();
        self.share.insert(Share {
            enabled: true,
            slug,
        })
    }

    pub fn disable_sharing(&mut self) {
        if let Some(share) = self.share.as_mut() {
            share.enabled = false;
            self.updated_at = Utc::now();
        }
    }

    pub fn update(&mut self, input: UpdateProjectInput) {
        if let Some(name) = input.name.map(|n| n.trim().to_string()) {
            if !name.is_empty() {
                self.name = name;
            }
        }
        if let Some(description) = input.description {
            self.description = description.trim().to_string();
        }
        if let Some(kind) = input.kind {
            self.kind = kind;
        }
        if let Some(github) = input.github {
            self.github = github.map(|g| g.trim().to_string()).filter(|g| !g.is_empty());
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Lowercase ASCII slug; `None` when nothing usable remains.
pub fn slugify(name: &str) -> Option<String> {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    (!slug.is_empty()).then_some(slug)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<ProjectType>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ProjectType>,
    /// `Some(None)` removes the link.
    pub github: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{checklist_stats, CreateTaskInput};

    #[test]
    fn add_phase_falls_back_to_positional_defaults() {
        let mut project = Project::new("Rocket", ProjectType::Physical);
        project.add_phase(CreatePhaseInput::default());

        let second = project.add_phase(CreatePhaseInput {
            name: Some("Build".into()),
            ..Default::default()
        });

        assert_eq!(second.name, "Build");
        assert_eq!(second.color, "#818cf8");
        assert_eq!(project.phases[0].name, "New phase 1");
    }

    #[test]
    fn sharing_keeps_slug_between_toggles() {
        let mut project = Project::new("My Rocket  v2!", ProjectType::Physical);

        assert_eq!(project.enable_sharing().slug, "my-rocket-v2");
        project.disable_sharing();
        assert!(!project.share.as_ref().unwrap().enabled);

        let share = project.enable_sharing();
        assert!(share.enabled);
        assert_eq!(share.slug, "my-rocket-v2");
    }

    #[test]
    fn slugify_rejects_symbol_only_names() {
        assert_eq!(slugify("!!!"), None);
        assert_eq!(slugify("  Hello World "), Some("hello-world".into()));
    }

    #[test]
    fn logbook_is_newest_first() {
        let mut project = Project::new("Rocket", ProjectType::Physical);
        project.add_log_entry(None, "first");
        project.add_log_entry(None, "second");
        assert!(project.add_log_entry(None, " ").is_none());

        assert_eq!(project.logbook[0].text, "second");
    }

    #[test]
    fn issues_can_be_closed() {
        let mut project = Project::new("App", ProjectType::Digital);
        let id = project.add_issue("Crash on start", "").unwrap().id.clone();

        assert!(project.set_issue_status(&id, IssueStatus::Closed));
        assert_eq!(project.issues[0].status, IssueStatus::Closed);
        assert!(!project.set_issue_status("missing", IssueStatus::Open));
    }

    #[test]
    fn update_clears_github_link() {
        let mut project = Project::new("App", ProjectType::Digital);
        project.github = Some("https://github.com/acme/app".into());

        project.update(UpdateProjectInput {
            github: Some(None),
            ..Default::default()
        });

        assert!(project.github.is_none());
    }

    #[test]
    fn notes_and_files_are_found_at_any_level() {
        let mut project = Project::new("Rocket", ProjectType::Physical);
        let top = project
            .add_note(CreateNoteInput {
                title: "Budget".into(),
                ..Default::default()
            })
            .unwrap()
            .id
            .clone();
        let phase = project.add_phase(CreatePhaseInput::default());
        let nested = phase
            .add_file(CreateFileInput {
                link: "https://example.com/fins.step".into(),
                ..Default::default()
            })
            .unwrap()
            .id
            .clone();

        assert!(project.note_mut(&top).is_some());
        assert!(project.file_mut(&nested).unwrap().save_version("v2"));

        assert!(project.remove_file(&nested));
        assert!(project.phases[0].files.is_empty());
        assert!(project.remove_note(&top));
        assert!(!project.remove_note(&top));
    }

    #[test]
    fn removing_a_phase_drops_its_tasks() {
        let mut project = Project::new("Rocket", ProjectType::Physical);
        let phase = project.add_phase(CreatePhaseInput::default());
        phase.add_task(CreateTaskInput {
            title: "Wire".into(),
            ..Default::default()
        });
        let phase_id = phase.id.clone();

        assert!(project.remove_phase(&phase_id));
        assert_eq!(project.tasks().count(), 0);
        assert!(!project.remove_phase(&phase_id));
    }

    #[test]
    fn checklist_items_resolve_across_phases() {
        let mut project = Project::new("Rocket", ProjectType::Physical);
        let phase = project.add_phase(CreatePhaseInput::default());
        let id = phase.add_checklist_item("Torque bolts").unwrap().id.clone();
        phase.add_checklist_item("Check fuel");

        project.checklist_item_mut(&id).unwrap().done = true;
        assert_eq!(checklist_stats(&project.phases[0].checklist), (1, 2));

        assert!(project.remove_checklist_item(&id));
        project.phases[0].clear_checklist();
        assert!(project.phases[0].checklist.is_empty());
    }

    #[test]
    fn bom_lines_and_releases_reject_blank_input() {
        let mut project = Project::new("Rocket", ProjectType::Physical);

        assert_eq!(project.add_bom_line("Fin", 0, " Acme ").unwrap().quantity, 1);
        assert!(project.add_bom_line("  ", 2, "").is_none());
        project.add_release("0.1.0", None, "");
        project.add_release("0.2.0", None, "faster");
        assert!(project.add_release("", None, "").is_none());

        assert_eq!(project.bom[0].supplier, "Acme");
        assert_eq!(project.releases[0].version, "0.2.0");
    }
}
