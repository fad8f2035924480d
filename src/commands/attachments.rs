//! Notes, files and checklist items on a project or one of its phases.

use anyhow::{anyhow, bail, Result};

use timeline_core::models::{AppState, CreateFileInput, CreateNoteInput, VersionHistory};

use super::{phase_mut, project_mut, Target};

pub fn add_note(
    state: &mut AppState,
    target: Target<'_>,
    input: CreateNoteInput,
) -> Result<String> {
    let note = match target {
        Target::Project(project) => project_mut(state, project)?.add_note(input),
        Target::Phase { project, phase } => phase_mut(state, project, phase)?.add_note(input),
    };
    note.map(|note| note.id.clone())
        .ok_or_else(|| anyhow!("A note needs a title or some content"))
}

/// Replace a note's content, keeping the previous text in its history.
/// Returns false when the content did not change.
pub fn edit_note(state: &mut AppState, note_id: &str, content: &str) -> Result<bool> {
    let note = state
        .projects
        .iter_mut()
        .find_map(|project| project.note_mut(note_id))
        .ok_or_else(|| anyhow!("Note not found: {}", note_id))?;
    Ok(note.save_version(content))
}

pub fn delete_note(state: &mut AppState, note_id: &str) -> Result<()> {
    if !state
        .projects
        .iter_mut()
        .any(|project| project.remove_note(note_id))
    {
        bail!("Note not found: {}", note_id);
    }
    Ok(())
}

pub fn add_file(
    state: &mut AppState,
    target: Target<'_>,
    input: CreateFileInput,
) -> Result<String> {
    let file = match target {
        Target::Project(project) => project_mut(state, project)?.add_file(input),
        Target::Phase { project, phase } => phase_mut(state, project, phase)?.add_file(input),
    };
    file.map(|file| file.id.clone())
        .ok_or_else(|| anyhow!("A file needs a title, link, note or content"))
}

pub fn edit_file(state: &mut AppState, file_id: &str, content: &str) -> Result<bool> {
    let file = state
        .projects
        .iter_mut()
        .find_map(|project| project.file_mut(file_id))
        .ok_or_else(|| anyhow!("File not found: {}", file_id))?;
    Ok(file.save_version(content))
}

pub fn delete_file(state: &mut AppState, file_id: &str) -> Result<()> {
    if !state
        .projects
        .iter_mut()
        .any(|project| project.remove_file(file_id))
    {
        bail!("File not found: {}", file_id);
    }
    Ok(())
}

/// Title and saved versions of a note or file.
pub fn history<'a>(state: &'a AppState, id: &str) -> Result<(&'a str, &'a VersionHistory)> {
    for project in &state.projects {
        let phases = project.phases.iter();
        let mut notes = project
            .notes
            .iter()
            .chain(phases.clone().flat_map(|phase| phase.notes.iter()));
        if let Some(note) = notes.find(|note| note.id == id) {
            return Ok((note.title.as_str(), &note.versions));
        }
        let mut files = project
            .files
            .iter()
            .chain(phases.flat_map(|phase| phase.files.iter()));
        if let Some(file) = files.find(|file| file.id == id) {
            return Ok((file.title.as_str(), &file.versions));
        }
    }
    bail!("No note or file with id {}", id)
}

pub fn add_check(state: &mut AppState, target: Target<'_>, text: &str) -> Result<String> {
    let item = match target {
        Target::Project(project) => project_mut(state, project)?.add_checklist_item(text),
        Target::Phase { project, phase } => {
            phase_mut(state, project, phase)?.add_checklist_item(text)
        }
    };
    item.map(|item| item.id.clone())
        .ok_or_else(|| anyhow!("Checklist text is required"))
}

pub fn set_check(state: &mut AppState, item_id: &str, done: bool) -> Result<()> {
    let item = state
        .projects
        .iter_mut()
        .find_map(|project| project.checklist_item_mut(item_id))
        .ok_or_else(|| anyhow!("Checklist item not found: {}", item_id))?;
    item.done = done;
    Ok(())
}

pub fn delete_check(state: &mut AppState, item_id: &str) -> Result<()> {
    if !state
        .projects
        .iter_mut()
        .any(|project| project.remove_checklist_item(item_id))
    {
        bail!("Checklist item not found: {}", item_id);
    }
    Ok(())
}

/// Empty a checklist; returns how many items were removed.
pub fn clear_checklist(state: &mut AppState, target: Target<'_>) -> Result<usize> {
    let removed = match target {
        Target::Project(project) => {
            let project = project_mut(state, project)?;
            let removed = project.checklist.len();
            project.checklist.clear();
            removed
        }
        Target::Phase { project, phase } => {
            let phase = phase_mut(state, project, phase)?;
            let removed = phase.checklist.len();
            phase.clear_checklist();
            removed
        }
    };
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sample_state;
    use timeline_core::models::checklist_stats;

    const PHASE: Target<'static> = Target::Phase {
        project: None,
        phase: None,
    };

    fn note(title: &str, content: &str) -> CreateNoteInput {
        CreateNoteInput {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[test]
    fn notes_go_to_the_selected_phase_or_the_project() {
        let (mut state, _) = sample_state();

        let on_phase = add_note(&mut state, PHASE, note("Wiring", "red to red")).unwrap();
        let on_project = add_note(&mut state, Target::Project(None), note("Budget", "")).unwrap();

        let project = &state.projects[0];
        assert_eq!(project.notes[0].id, on_project);
        assert_eq!(project.phases[0].notes[0].id, on_phase);
        assert_eq!(
            project.phases[0].notes[0].phase_id.as_deref(),
            Some(project.phases[0].id.as_str())
        );
        assert!(add_note(&mut state, PHASE, note(" ", "")).is_err());
    }

    #[test]
    fn editing_a_note_keeps_its_history() {
        let (mut state, _) = sample_state();
        let id = add_note(&mut state, PHASE, note("Wiring", "v1")).unwrap();

        assert!(edit_note(&mut state, &id, "v2").unwrap());
        assert!(!edit_note(&mut state, &id, "v2").unwrap());

        let (title, versions) = history(&state, &id).unwrap();
        assert_eq!(title, "Wiring");
        let contents: Vec<_> = versions.iter().map(|v| v.content.as_str()).collect();
        assert_eq!(contents, ["v1"]);
    }

    #[test]
    fn files_can_be_added_edited_and_deleted() {
        let (mut state, _) = sample_state();
        let id = add_file(
            &mut state,
            PHASE,
            CreateFileInput {
                title: "render.png".into(),
                link: "/uploads/render-1-2.png".into(),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(edit_file(&mut state, &id, "data:image/png;base64,AA").unwrap());
        assert_eq!(history(&state, &id).unwrap().1.len(), 1);

        delete_file(&mut state, &id).unwrap();
        assert!(state.projects[0].phases[0].files.is_empty());
        assert!(delete_file(&mut state, &id).is_err());
        assert!(history(&state, &id).is_err());
    }

    #[test]
    fn checklist_items_are_checked_and_cleared() {
        let (mut state, _) = sample_state();
        let first = add_check(&mut state, PHASE, "Torque bolts").unwrap();
        let second = add_check(&mut state, PHASE, "Check fuel").unwrap();
        assert!(add_check(&mut state, PHASE, "   ").is_err());

        set_check(&mut state, &first, true).unwrap();
        assert_eq!(checklist_stats(&state.projects[0].phases[0].checklist), (1, 2));

        delete_check(&mut state, &second).unwrap();
        assert_eq!(clear_checklist(&mut state, PHASE).unwrap(), 1);
        assert!(state.projects[0].phases[0].checklist.is_empty());
        assert!(set_check(&mut state, &first, false).is_err());
    }

    #[test]
    fn deleting_a_note_searches_every_level() {
        let (mut state, _) = sample_state();
        let id = add_note(&mut state, PHASE, note("Wiring", "")).unwrap();

        delete_note(&mut state, &id).unwrap();

        assert!(state.projects[0].phases[0].notes.is_empty());
        assert!(delete_note(&mut state, &id).is_err());
    }
}
