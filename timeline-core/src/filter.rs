//! Filter predicates over projects and tasks.
//!
//! Four independent axes composed with AND. An axis set to `None` ("all")
//! lets everything through.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Project, ProjectType, Task, TaskStatus};
use crate::views::{classify_deadline, DeadlineBucket};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Case-insensitive substring; empty matches everything.
    pub search: String,
    pub project_type: Option<ProjectType>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<DeadlineBucket>,
}

/// A filter value that names no known option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter value: {0}")]
pub struct UnknownFilterValue(pub String);

/// Parse one axis value where `all` (or nothing) means no filtering.
pub fn parse_axis<T>(
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, UnknownFilterValue> {
    match raw.map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(s) if s.is_empty() || s == "all" => Ok(None),
        Some(s) => parse(&s).map(Some).ok_or(UnknownFilterValue(s)),
    }
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.project_type.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
    }
}

/// The lowercase text searched for a project.
pub fn search_haystack(project: &Project) -> String {
    let mut parts: Vec<&str> = vec![project.name.as_str(), project.description.as_str()];
    if let Some(github) = &project.github {
        parts.push(github);
    }
    for phase in &project.phases {
        parts.push(&phase.name);
        for task in &phase.tasks {
            parts.push(&task.title);
            parts.push(&task.label);
        }
        for note in &phase.notes {
            parts.push(&note.title);
            parts.push(&note.content);
        }
    }
    for note in &project.notes {
        parts.push(&note.title);
        parts.push(&note.content);
    }
    parts.join(" ").to_lowercase()
}

pub fn project_matches(project: &Project, filters: &Filters) -> bool {
    let type_ok = filters.project_type.is_none_or(|kind| project.kind == kind);
    let needle = filters.search.trim().to_lowercase();
    type_ok && (needle.is_empty() || search_haystack(project).contains(&needle))
}

pub fn task_matches(task: &Task, filters: &Filters, today: NaiveDate) -> bool {
    let status_ok = filters.status.is_none_or(|status| task.status() == status);
    let deadline_ok = filters
        .deadline
        .is_none_or(|bucket| classify_deadline(task.due_date, today) == bucket);
    status_ok && deadline_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateNoteInput, CreatePhaseInput, CreateTaskInput};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn rocket() -> Project {
        let mut project = Project::new("Rocket", ProjectType::Physical);
        project.github = Some("https://github.com/acme/launchpad".into());
        let phase = project.add_phase(CreatePhaseInput {
            name: Some("Build".into()),
            ..Default::default()
        });
        phase.add_task(CreateTaskInput {
            title: "Solder board".into(),
            label: Some("electronics".into()),
            ..Default::default()
        });
        phase.add_note(CreateNoteInput {
            title: "Supplier".into(),
            content: "Order fins from Hobbyking".into(),
            ..Default::default()
        });
        project
    }

    #[test]
    fn default_filters_match_everything() {
        let project = rocket();
        let filters = Filters::default();
        assert!(filters.is_empty());
        assert!(project_matches(&project, &filters));
        assert!(project.tasks().all(|t| task_matches(t, &filters, today())));
    }

    #[test]
    fn search_is_case_insensitive_across_nested_text() {
        let project = rocket();
        for needle in ["ROCKET", "launchpad", "build", "solder", "ELECTRONICS", "hobbyking"] {
            let filters = Filters {
                search: needle.into(),
                ..Default::default()
            };
            assert!(project_matches(&project, &filters), "{needle}");
        }
        let miss = Filters {
            search: "submarine".into(),
            ..Default::default()
        };
        assert!(!project_matches(&project, &miss));
    }

    #[test]
    fn type_filter_and_search_compose() {
        let project = rocket();
        let filters = Filters {
            search: "rocket".into(),
            project_type: Some(ProjectType::Digital),
            ..Default::default()
        };
        assert!(!project_matches(&project, &filters));
    }

    #[test]
    fn task_filters_apply_independently() {
        let mut task = Task::new("Paint fins");
        task.due_date = today().succ_opt();

        let upcoming_todo = Filters {
            status: Some(TaskStatus::Todo),
            deadline: Some(DeadlineBucket::Upcoming),
            ..Default::default()
        };
        assert!(task_matches(&task, &upcoming_todo, today()));

        task.set_status(TaskStatus::Done);
        assert!(!task_matches(&task, &upcoming_todo, today()));
    }

    #[test]
    fn parse_axis_treats_all_as_no_filter() {
        assert_eq!(parse_axis(Some("all"), TaskStatus::from_str), Ok(None));
        assert_eq!(parse_axis(None, TaskStatus::from_str), Ok(None));
        assert_eq!(
            parse_axis(Some("Done"), TaskStatus::from_str),
            Ok(Some(TaskStatus::Done))
        );
        assert_eq!(
            parse_axis(Some("later"), DeadlineBucket::from_str),
            Err(UnknownFilterValue("later".to_string()))
        );
    }
}
