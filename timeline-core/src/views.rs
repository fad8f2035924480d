//! Derived views: progress aggregation, deadline buckets, focus ranking and
//! the view models built from them.
//!
//! Every function takes `today` explicitly so results are deterministic.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::filter::{self, Filters};
use crate::models::{checklist_stats, AppState, Phase, Project, ProjectType, Task, TaskStatus};

/// How many focus items the dashboard shows.
pub const FOCUS_LIMIT: usize = 3;

/// Days ahead (inclusive) that still count as upcoming.
pub const UPCOMING_DAYS: i64 = 7;

/// The current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Integer division rounding halves up.
fn round_div(numerator: usize, denominator: usize) -> u8 {
    ((2 * numerator + denominator) / (2 * denominator)) as u8
}

/// Share of done tasks, 0 for a phase without tasks.
pub fn auto_progress(phase: &Phase) -> u8 {
    let total = phase.tasks.len();
    if total == 0 {
        return 0;
    }
    let done = phase.tasks.iter().filter(|t| t.is_done()).count();
    round_div(100 * done, total)
}

/// The manual override when set, else the derived value.
pub fn display_progress(phase: &Phase) -> u8 {
    phase.progress.unwrap_or_else(|| auto_progress(phase))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    pub progress: u8,
    pub total_tasks: usize,
    pub open_tasks: usize,
}

pub fn project_progress(project: &Project) -> ProjectProgress {
    let phase_sum: usize = project
        .phases
        .iter()
        .map(|phase| display_progress(phase) as usize)
        .sum();
    let progress = match project.phases.len() {
        0 => 0,
        n => round_div(phase_sum, n),
    };
    let total_tasks = project.tasks().count();
    let open_tasks = project.tasks().filter(|t| !t.is_done()).count();
    ProjectProgress {
        progress,
        total_tasks,
        open_tasks,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineBucket {
    None,
    Overdue,
    Today,
    Upcoming,
    Future,
}

impl DeadlineBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::Upcoming => "upcoming",
            Self::Future => "future",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "overdue" => Some(Self::Overdue),
            "today" => Some(Self::Today),
            "upcoming" => Some(Self::Upcoming),
            "future" => Some(Self::Future),
            _ => None,
        }
    }
}

pub fn classify_deadline(date: Option<NaiveDate>, today: NaiveDate) -> DeadlineBucket {
    let Some(date) = date else {
        return DeadlineBucket::None;
    };
    match (date - today).num_days() {
        d if d < 0 => DeadlineBucket::Overdue,
        0 => DeadlineBucket::Today,
        d if d <= UPCOMING_DAYS => DeadlineBucket::Upcoming,
        _ => DeadlineBucket::Future,
    }
}

pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.status() != TaskStatus::Done
        && classify_deadline(task.due_date, today) == DeadlineBucket::Overdue
}

/// Why a task made the focus list. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusReason {
    Pinned,
    Overdue,
    DueToday,
    Upcoming,
}

impl FocusReason {
    fn for_task(task: &Task, today: NaiveDate) -> Option<Self> {
        if task.focus {
            return Some(Self::Pinned);
        }
        if task.is_done() {
            return None;
        }
        match classify_deadline(task.due_date, today) {
            DeadlineBucket::Overdue => Some(Self::Overdue),
            DeadlineBucket::Today => Some(Self::DueToday),
            DeadlineBucket::Upcoming => Some(Self::Upcoming),
            DeadlineBucket::None | DeadlineBucket::Future => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusItem {
    pub project_id: String,
    pub project_name: String,
    pub phase_id: String,
    pub phase_name: String,
    pub task_id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub reason: FocusReason,
}

/// Every focus-worthy task, ranked. Ties keep discovery order.
pub fn compute_focus_items(projects: &[Project], today: NaiveDate) -> Vec<FocusItem> {
    let mut items = Vec::new();
    for project in projects {
        for phase in &project.phases {
            for task in &phase.tasks {
                let Some(reason) = FocusReason::for_task(task, today) else {
                    continue;
                };
                items.push(FocusItem {
                    project_id: project.id.clone(),
                    project_name: project.name.clone(),
                    phase_id: phase.id.clone(),
                    phase_name: phase.name.clone(),
                    task_id: task.id.clone(),
                    title: task.title.clone(),
                    due_date: task.due_date,
                    reason,
                });
            }
        }
    }
    // sort_by_key is stable
    items.sort_by_key(|item| item.reason);
    items
}

pub fn top_focus_items(projects: &[Project], today: NaiveDate) -> Vec<FocusItem> {
    let mut items = compute_focus_items(projects, today);
    items.truncate(FOCUS_LIMIT);
    items
}

// --- View models ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProjectType,
    pub phase_count: usize,
    #[serde(flatten)]
    pub progress: ProjectProgress,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCard {
    pub id: String,
    pub name: String,
    pub color: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress: u8,
    pub auto_progress: u8,
    pub manual: bool,
    pub deadline: DeadlineBucket,
    pub checklist_done: usize,
    pub checklist_total: usize,
    pub note_count: usize,
    pub file_count: usize,
    pub tasks: Vec<TaskRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub label: String,
    pub status: TaskStatus,
    pub percent_complete: u8,
    pub due: DeadlineBucket,
    pub overdue: bool,
    pub focus: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub projects: Vec<ProjectCard>,
    /// Phases of the selected project, with tasks narrowed by the filters.
    pub phases: Vec<PhaseCard>,
    pub focus: Vec<FocusItem>,
}

pub fn project_card(project: &Project, selected: bool) -> ProjectCard {
    ProjectCard {
        id: project.id.clone(),
        name: project.name.clone(),
        kind: project.kind,
        phase_count: project.phases.len(),
        progress: project_progress(project),
        selected,
    }
}

pub fn task_row(task: &Task, today: NaiveDate) -> TaskRow {
    TaskRow {
        id: task.id.clone(),
        title: task.title.clone(),
        label: task.label.clone(),
        status: task.status(),
        percent_complete: task.percent_complete(),
        due: classify_deadline(task.due_date, today),
        overdue: is_overdue(task, today),
        focus: task.focus,
    }
}

pub fn phase_card(phase: &Phase, filters: &Filters, today: NaiveDate) -> PhaseCard {
    let (checklist_done, checklist_total) = checklist_stats(&phase.checklist);
    PhaseCard {
        id: phase.id.clone(),
        name: phase.name.clone(),
        color: phase.color.clone(),
        start_date: phase.start_date,
        end_date: phase.end_date,
        progress: display_progress(phase),
        auto_progress: auto_progress(phase),
        manual: phase.progress.is_some(),
        deadline: classify_deadline(phase.deadline.or(phase.end_date), today),
        checklist_done,
        checklist_total,
        note_count: phase.notes.len(),
        file_count: phase.files.len(),
        tasks: phase
            .tasks
            .iter()
            .filter(|task| filter::task_matches(task, filters, today))
            .map(|task| task_row(task, today))
            .collect(),
    }
}

/// Everything the main screen shows, computed from state and filters.
pub fn dashboard(state: &AppState, filters: &Filters, today: NaiveDate) -> Dashboard {
    let selected = state.selected_project_id.as_deref();
    Dashboard {
        projects: state
            .projects
            .iter()
            .filter(|project| filter::project_matches(project, filters))
            .map(|project| project_card(project, Some(project.id.as_str()) == selected))
            .collect(),
        phases: state
            .selected_project()
            .map(|project| {
                project
                    .phases
                    .iter()
                    .map(|phase| phase_card(phase, filters, today))
                    .collect()
            })
            .unwrap_or_default(),
        focus: top_focus_items(&state.projects, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreatePhaseInput, CreateTaskInput};
    use chrono::Days;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn phase_with(statuses: &[TaskStatus]) -> Phase {
        let mut phase = Phase::new(0);
        for (i, status) in statuses.iter().enumerate() {
            let task = phase
                .add_task(CreateTaskInput {
                    title: format!("task {i}"),
                    ..Default::default()
                })
                .unwrap();
            task.set_status(*status);
        }
        phase
    }

    #[test]
    fn auto_progress_is_zero_without_tasks() {
        assert_eq!(auto_progress(&Phase::new(0)), 0);
    }

    #[test]
    fn auto_progress_rounds_done_ratio() {
        use TaskStatus::*;
        assert_eq!(auto_progress(&phase_with(&[Done, Todo, Todo])), 33);
        assert_eq!(auto_progress(&phase_with(&[Done, Done, Todo])), 67);
        assert_eq!(auto_progress(&phase_with(&[Done, Blocked])), 50);
    }

    #[test]
    fn manual_progress_wins_for_display() {
        let mut phase = phase_with(&[TaskStatus::Done]);
        phase.progress = Some(20);
        assert_eq!(display_progress(&phase), 20);
        assert_eq!(auto_progress(&phase), 100);
    }

    #[test]
    fn project_progress_averages_phases() {
        let mut project = Project::new("Rocket", ProjectType::Physical);
        project.phases.push(phase_with(&[TaskStatus::Done]));
        project.phases.push(phase_with(&[TaskStatus::Todo, TaskStatus::Progress]));
        project.add_phase(CreatePhaseInput::default()).progress = Some(25);

        let progress = project_progress(&project);

        // (100 + 0 + 25) / 3 = 41.67
        assert_eq!(progress.progress, 42);
        assert_eq!(progress.total_tasks, 3);
        assert_eq!(progress.open_tasks, 2);
    }

    #[test]
    fn project_without_phases_has_zero_progress() {
        let project = Project::new("Empty", ProjectType::Digital);
        assert_eq!(project_progress(&project).progress, 0);
    }

    #[test]
    fn deadline_buckets() {
        let today = day(2024, 6, 10);
        assert_eq!(classify_deadline(None, today), DeadlineBucket::None);
        assert_eq!(classify_deadline(Some(today), today), DeadlineBucket::Today);
        assert_eq!(
            classify_deadline(today.checked_sub_days(Days::new(1)), today),
            DeadlineBucket::Overdue
        );
        assert_eq!(
            classify_deadline(today.checked_add_days(Days::new(7)), today),
            DeadlineBucket::Upcoming
        );
        assert_eq!(
            classify_deadline(today.checked_add_days(Days::new(8)), today),
            DeadlineBucket::Future
        );
    }

    #[test]
    fn done_tasks_are_never_overdue() {
        let today = day(2024, 6, 10);
        let mut task = Task::new("Solder board");
        task.due_date = Some(day(2024, 6, 9));
        assert!(is_overdue(&task, today));

        task.set_status(TaskStatus::Done);
        assert!(!is_overdue(&task, today));
    }

    #[test]
    fn focus_ranks_pinned_then_overdue_then_today_then_upcoming() {
        let today = day(2024, 6, 10);
        let mut project = Project::new("Rocket", ProjectType::Physical);
        let phase = project.add_phase(CreatePhaseInput::default());
        for (title, due, pinned) in [
            ("upcoming", Some(day(2024, 6, 12)), false),
            ("today", Some(today), false),
            ("far", Some(day(2024, 9, 1)), false),
            ("overdue", Some(day(2024, 6, 1)), false),
            ("pinned", None, true),
            ("undated", None, false),
        ] {
            let task = phase
                .add_task(CreateTaskInput {
                    title: title.into(),
                    due_date: due,
                    ..Default::default()
                })
                .unwrap();
            task.focus = pinned;
        }

        let titles: Vec<_> = compute_focus_items(&[project.clone()], today)
            .into_iter()
            .map(|item| item.title)
            .collect();
        assert_eq!(titles, ["pinned", "overdue", "today", "upcoming"]);

        assert_eq!(top_focus_items(&[project], today).len(), FOCUS_LIMIT);
    }

    #[test]
    fn focus_skips_done_unpinned_tasks_and_keeps_discovery_order() {
        let today = day(2024, 6, 10);
        let mut project = Project::new("Rocket", ProjectType::Physical);
        let phase = project.add_phase(CreatePhaseInput::default());
        for title in ["first", "second", "finished"] {
            phase
                .add_task(CreateTaskInput {
                    title: title.into(),
                    due_date: Some(day(2024, 6, 1)),
                    ..Default::default()
                })
                .unwrap();
        }
        phase.tasks[2].set_status(TaskStatus::Done);

        let items = compute_focus_items(&[project], today);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["first", "second"]);
        assert!(items.iter().all(|i| i.reason == FocusReason::Overdue));
    }

    #[test]
    fn dashboard_marks_selection_and_lists_selected_phases() {
        let today = day(2024, 6, 10);
        let mut state = AppState::default();
        let project = state
            .add_project(crate::models::CreateProjectInput {
                name: "Rocket".into(),
                ..Default::default()
            })
            .unwrap();
        let phase = project.add_phase(CreatePhaseInput::default());
        phase.add_checklist_item("Check cables");
        state.ensure_selections();

        let dash = dashboard(&state, &Filters::default(), today);

        assert_eq!(dash.projects.len(), 1);
        assert!(dash.projects[0].selected);
        assert_eq!(dash.phases.len(), 1);
        assert_eq!(dash.phases[0].checklist_total, 1);
        assert!(!dash.phases[0].manual);
    }
}
