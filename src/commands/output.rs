use std::fmt::Write;

use timeline_core::models::VersionHistory;
use timeline_core::views::{Dashboard, FocusItem, FocusReason};

pub fn format_dashboard(dashboard: &Dashboard) -> String {
    if dashboard.projects.is_empty() {
        return "No projects match.\n".to_string();
    }
    let mut out = String::new();
    for card in &dashboard.projects {
        let marker = if card.selected { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {}  [{}]  {}%  {} phases, {}/{} tasks open  ({})",
            marker,
            card.name,
            card.kind.as_str(),
            card.progress.progress,
            card.phase_count,
            card.progress.open_tasks,
            card.progress.total_tasks,
            card.id
        );
    }
    for phase in &dashboard.phases {
        let source = if phase.manual { "manual" } else { "auto" };
        let _ = writeln!(
            out,
            "\n  {} {}% ({})  ({})",
            phase.name, phase.progress, source, phase.id
        );
        if phase.checklist_total > 0 {
            let _ = writeln!(
                out,
                "    checklist {}/{}",
                phase.checklist_done, phase.checklist_total
            );
        }
        for task in &phase.tasks {
            let pin = if task.focus { "^" } else { "-" };
            let flag = if task.overdue { " OVERDUE" } else { "" };
            let _ = writeln!(
                out,
                "    {} {} [{} {}%]{}  ({})",
                pin,
                task.title,
                task.status.as_str(),
                task.percent_complete,
                flag,
                task.id
            );
        }
    }
    out
}

pub fn format_focus(items: &[FocusItem]) -> String {
    if items.is_empty() {
        return "Nothing needs attention.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let reason = match item.reason {
            FocusReason::Pinned => "pinned",
            FocusReason::Overdue => "overdue",
            FocusReason::DueToday => "due today",
            FocusReason::Upcoming => "upcoming",
        };
        let due = item
            .due_date
            .map(|d| format!(" due {}", d))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<10} {}  ({} / {}){}",
            reason, item.title, item.project_name, item.phase_name, due
        );
    }
    out
}

/// Saved versions, most recent first.
pub fn format_history(title: &str, versions: &VersionHistory) -> String {
    let mut out = format!("{}: {} saved versions\n", title, versions.len());
    for version in versions.iter() {
        let first_line = version.content.lines().next().unwrap_or_default();
        let _ = writeln!(
            out,
            "  {}  {}",
            version.timestamp.format("%Y-%m-%d %H:%M"),
            first_line
        );
    }
    out
}
