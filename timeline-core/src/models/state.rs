use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::phase::Phase;
use super::project::{CreateProjectInput, Project};

/// The whole persisted tree: every project plus UI preferences and selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub projects: Vec<Project>,
    pub preferences: Preferences,
    pub selected_project_id: Option<String>,
    pub selected_phase_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub show_notes: bool,
    pub show_files: bool,
    pub show_checklist: bool,
    pub theme: Theme,
    /// Preference keys this crate does not interpret, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            show_notes: true,
            show_files: true,
            show_checklist: true,
            theme: Theme::Dark,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl AppState {
    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.selected_project_id
            .as_deref()
            .and_then(|id| self.project(id))
    }

    pub fn selected_phase(&self) -> Option<&Phase> {
        let phase_id = self.selected_phase_id.as_deref()?;
        self.selected_project()?.phase(phase_id)
    }

    /// Create a project and select it. Blank names are rejected.
    pub fn add_project(&mut self, input: CreateProjectInput) -> Option<&mut Project> {
        let name = input.name.trim();
        if name.is_empty() {
            return None;
        }
        let mut project = Project::new(name, input.kind.unwrap_or_default());
        project.description = input.description.unwrap_or_default().trim().to_string();
        project.github = input
            .github
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        self.selected_project_id = Some(project.id.clone());
        self.selected_phase_id = None;
        self.projects.push(project);
        self.projects.last_mut()
    }

    /// Select a project; the phase selection is reset to its first phase.
    pub fn select_project(&mut self, project_id: &str) -> bool {
        if self.project(project_id).is_none() {
            return false;
        }
        self.selected_project_id = Some(project_id.to_string());
        self.selected_phase_id = None;
        self.ensure_selections();
        true
    }

    pub fn select_phase(&mut self, phase_id: &str) -> bool {
        let exists = self
            .selected_project()
            .is_some_and(|project| project.phase(phase_id).is_some());
        if exists {
            self.selected_phase_id = Some(phase_id.to_string());
        }
        exists
    }

    /// Point dangling selections at the first project and its first phase.
    pub fn ensure_selections(&mut self) {
        let Some(first) = self.projects.first() else {
            self.selected_project_id = None;
            self.selected_phase_id = None;
            return;
        };
        if self.selected_project().is_none() {
            self.selected_project_id = Some(first.id.clone());
        }

        if self.selected_phase().is_none() {
            self.selected_phase_id = self
                .selected_project()
                .and_then(|project| project.phases.first())
                .map(|phase| phase.id.clone());
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.preferences.theme = self.preferences.theme.toggled();
        self.preferences.theme
    }

    /// Set a boolean view preference by its JSON key. Unknown keys are kept
    /// in the pass-through map; `theme` is not a flag and is refused.
    pub fn set_preference(&mut self, key: &str, enabled: bool) -> bool {
        let prefs = &mut self.preferences;
        match key {
            "showNotes" => prefs.show_notes = enabled,
            "showFiles" => prefs.show_files = enabled,
            "showChecklist" => prefs.show_checklist = enabled,
            "theme" | "" => return false,
            _ => {
                prefs.extra.insert(key.to_string(), Value::Bool(enabled));
            }
        }
        true
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.preferences.theme = theme;
    }
}
