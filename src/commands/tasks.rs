use anyhow::{anyhow, bail, Result};

use timeline_core::models::{AppState, CreateTaskInput, Task, TaskStatus, UpdateTaskInput};

use super::phase_mut;

/// Add a task to the named phase, else the selected phase of the target
/// project, else that project's first phase.
pub fn add_task(
    state: &mut AppState,
    project_id: Option<&str>,
    phase_id: Option<&str>,
    input: CreateTaskInput,
) -> Result<String> {
    let task = phase_mut(state, project_id, phase_id)?
        .add_task(input)
        .ok_or_else(|| anyhow!("Task title is required"))?;
    Ok(task.id.clone())
}

pub fn find_task_mut<'a>(state: &'a mut AppState, task_id: &str) -> Option<&'a mut Task> {
    state
        .projects
        .iter_mut()
        .find_map(|project| project.task_mut(task_id))
}

fn task_mut<'a>(state: &'a mut AppState, task_id: &str) -> Result<&'a mut Task> {
    find_task_mut(state, task_id).ok_or_else(|| anyhow!("Task not found: {}", task_id))
}

pub fn edit_task(state: &mut AppState, task_id: &str, input: UpdateTaskInput) -> Result<()> {
    task_mut(state, task_id)?.update(input);
    Ok(())
}

pub fn set_status(state: &mut AppState, task_id: &str, status: TaskStatus) -> Result<()> {
    task_mut(state, task_id)?.set_status(status);
    Ok(())
}

pub fn set_percent(state: &mut AppState, task_id: &str, percent: i64) -> Result<TaskStatus> {
    let task = task_mut(state, task_id)?;
    task.set_percent_complete(percent);
    Ok(task.status())
}

/// Flip the pinned flag; returns the new value.
pub fn toggle_pin(state: &mut AppState, task_id: &str) -> Result<bool> {
    Ok(task_mut(state, task_id)?.toggle_focus())
}

pub fn delete_task(state: &mut AppState, task_id: &str) -> Result<()> {
    if !state
        .projects
        .iter_mut()
        .any(|project| project.remove_task(task_id))
    {
        bail!("Task not found: {}", task_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{add_phase, add_project, sample_state};
    use timeline_core::models::{CreatePhaseInput, CreateProjectInput};

    #[test]
    fn add_task_uses_the_selected_phase() {
        let (state, task_id) = sample_state();
        let phase = state.selected_phase().unwrap();
        assert_eq!(phase.tasks[0].id, task_id);
    }

    #[test]
    fn add_task_to_another_project_uses_its_first_phase() {
        let (mut state, _) = sample_state();
        let rocket = state.projects[0].id.clone();
        let bike = add_project(
            &mut state,
            CreateProjectInput {
                name: "Bike".into(),
                ..Default::default()
            },
        )
        .unwrap();
        let bike_phase =
            add_phase(&mut state, Some(bike.as_str()), CreatePhaseInput::default()).unwrap();
        state.select_project(&rocket);

        let task_id = add_task(
            &mut state,
            Some(bike.as_str()),
            None,
            CreateTaskInput {
                title: "True the wheel".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let bike = state.project(&bike).unwrap();
        assert_eq!(bike.phase(&bike_phase).unwrap().tasks[0].id, task_id);
        assert_eq!(state.projects[0].tasks().count(), 1);
    }

    #[test]
    fn add_task_needs_a_phase() {
        let mut state = AppState::default();
        add_project(
            &mut state,
            CreateProjectInput {
                name: "Empty".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let err = add_task(
            &mut state,
            None,
            None,
            CreateTaskInput {
                title: "t".into(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("no phases"));
    }

    #[test]
    fn set_percent_reports_resulting_status() {
        let (mut state, task_id) = sample_state();
        assert_eq!(set_percent(&mut state, &task_id, 100).unwrap(), TaskStatus::Done);
        assert!(set_status(&mut state, "missing", TaskStatus::Done).is_err());
    }

    #[test]
    fn edit_task_clears_the_due_date() {
        let (mut state, task_id) = sample_state();
        let due = chrono::NaiveDate::from_ymd_opt(2025, 6, 1);
        edit_task(
            &mut state,
            &task_id,
            UpdateTaskInput {
                due_date: Some(due),
                label: Some("electronics".into()),
                ..Default::default()
            },
        )
        .unwrap();
        edit_task(
            &mut state,
            &task_id,
            UpdateTaskInput {
                due_date: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

        let task = find_task_mut(&mut state, &task_id).unwrap();
        assert_eq!(task.label, "electronics");
        assert!(task.due_date.is_none());
    }

    #[test]
    fn delete_task_removes_it_once() {
        let (mut state, task_id) = sample_state();

        delete_task(&mut state, &task_id).unwrap();

        assert!(find_task_mut(&mut state, &task_id).is_none());
        assert!(delete_task(&mut state, &task_id).is_err());
    }
}
