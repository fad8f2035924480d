use anyhow::{anyhow, bail, Result};

use timeline_core::models::{
    AppState, CreatePhaseInput, CreateProjectInput, UpdatePhaseInput, UpdateProjectInput,
};

use super::project_mut;

pub fn add_project(state: &mut AppState, input: CreateProjectInput) -> Result<String> {
    let project = state
        .add_project(input)
        .ok_or_else(|| anyhow!("Project name is required"))?;
    Ok(project.id.clone())
}

pub fn update_project(
    state: &mut AppState,
    project_id: Option<&str>,
    input: UpdateProjectInput,
) -> Result<()> {
    project_mut(state, project_id)?.update(input);
    Ok(())
}

/// Select a project and, optionally, one of its phases.
pub fn select(state: &mut AppState, project_id: &str, phase_id: Option<&str>) -> Result<()> {
    if !state.select_project(project_id) {
        bail!("Project not found: {}", project_id);
    }
    if let Some(phase_id) = phase_id {
        if !state.select_phase(phase_id) {
            bail!("Phase {} is not part of project {}", phase_id, project_id);
        }
    }
    Ok(())
}

/// Add a phase and select it.
pub fn add_phase(
    state: &mut AppState,
    project_id: Option<&str>,
    input: CreatePhaseInput,
) -> Result<String> {
    let project = project_mut(state, project_id)?;
    let project_id = project.id.clone();
    let phase_id = project.add_phase(input).id.clone();
    state.selected_project_id = Some(project_id);
    state.selected_phase_id = Some(phase_id.clone());
    Ok(phase_id)
}

pub fn update_phase(state: &mut AppState, phase_id: &str, input: UpdatePhaseInput) -> Result<()> {
    let phase = state
        .projects
        .iter_mut()
        .find_map(|project| project.phase_mut(phase_id))
        .ok_or_else(|| anyhow!("Phase not found: {}", phase_id))?;
    phase.update(input);
    Ok(())
}

/// Delete a phase with its tasks, notes, files and checklist.
pub fn delete_phase(state: &mut AppState, phase_id: &str) -> Result<()> {
    if !state
        .projects
        .iter_mut()
        .any(|project| project.remove_phase(phase_id))
    {
        bail!("Phase not found: {}", phase_id);
    }
    state.ensure_selections();
    Ok(())
}
