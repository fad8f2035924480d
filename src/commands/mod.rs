//! CLI operations over an in-memory state tree, plus their text output.
//!
//! Each operation mutates the tree it is given; the caller loads and saves.

mod attachments;
mod output;
mod records;
mod structure;
mod tasks;

pub use attachments::*;
pub use output::*;
pub use records::*;
pub use structure::*;
pub use tasks::*;

use anyhow::{anyhow, Result};

use timeline_core::models::{
    AppState, IssueStatus, Phase, Priority, Project, ProjectType, TaskStatus, Theme,
};

pub fn parse_project_type(s: &str) -> Result<ProjectType, String> {
    ProjectType::from_str(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("expected digital or physical, got '{s}'"))
}

pub fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_str(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("expected todo, progress, blocked or done, got '{s}'"))
}

pub fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_str(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("expected high, medium or low, got '{s}'"))
}

pub fn parse_issue_status(s: &str) -> Result<IssueStatus, String> {
    IssueStatus::from_str(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("expected open or closed, got '{s}'"))
}

pub fn parse_theme(s: &str) -> Result<Theme, String> {
    Theme::from_str(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("expected dark or light, got '{s}'"))
}

pub fn parse_switch(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("expected on or off, got '{s}'")),
    }
}

/// Where a note, file or checklist item is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Project(Option<&'a str>),
    Phase {
        project: Option<&'a str>,
        phase: Option<&'a str>,
    },
}

/// The named project, else the selected one.
pub(crate) fn project_mut<'a>(
    state: &'a mut AppState,
    project_id: Option<&str>,
) -> Result<&'a mut Project> {
    let id = project_id
        .map(str::to_string)
        .or_else(|| state.selected_project_id.clone())
        .ok_or_else(|| anyhow!("No project selected; pass --project"))?;
    state
        .project_mut(&id)
        .ok_or_else(|| anyhow!("Project not found: {}", id))
}

/// A phase of the named (or selected) project. Without an explicit phase
/// this is the selected phase when it belongs to that project, else the
/// project's first phase.
pub(crate) fn phase_mut<'a>(
    state: &'a mut AppState,
    project_id: Option<&str>,
    phase_id: Option<&str>,
) -> Result<&'a mut Phase> {
    let selected = state.selected_phase_id.clone();
    let project = project_mut(state, project_id)?;
    let id = match phase_id {
        Some(id) => id.to_string(),
        None => selected
            .filter(|id| project.phase(id).is_some())
            .or_else(|| project.phases.first().map(|phase| phase.id.clone()))
            .ok_or_else(|| anyhow!("Project has no phases; add one first"))?,
    };
    project
        .phase_mut(&id)
        .ok_or_else(|| anyhow!("Phase not found: {}", id))
}

#[cfg(test)]
pub(crate) fn sample_state() -> (AppState, String) {
    use timeline_core::models::{CreatePhaseInput, CreateProjectInput, CreateTaskInput};

    let mut state = AppState::default();
    add_project(
        &mut state,
        CreateProjectInput {
            name: "Rocket".into(),
            ..Default::default()
        },
    )
    .unwrap();
    add_phase(&mut state, None, CreatePhaseInput::default()).unwrap();
    let task_id = add_task(
        &mut state,
        None,
        None,
        CreateTaskInput {
            title: "Solder board".into(),
            ..Default::default()
        },
    )
    .unwrap();
    (state, task_id)
}
