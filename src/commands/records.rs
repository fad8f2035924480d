//! Project records (bill of materials, releases, logbook, issues), sharing
//! and view preferences.

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;

use timeline_core::models::{AppState, IssueStatus, Theme};

use super::project_mut;

pub fn add_bom_line(
    state: &mut AppState,
    project_id: Option<&str>,
    item: &str,
    quantity: u32,
    supplier: &str,
) -> Result<String> {
    let line = project_mut(state, project_id)?
        .add_bom_line(item, quantity, supplier)
        .ok_or_else(|| anyhow!("BOM item name is required"))?;
    Ok(line.id.clone())
}

pub fn add_release(
    state: &mut AppState,
    project_id: Option<&str>,
    version: &str,
    date: Option<NaiveDate>,
    notes: &str,
) -> Result<String> {
    let release = project_mut(state, project_id)?
        .add_release(version, date, notes)
        .ok_or_else(|| anyhow!("Release version is required"))?;
    Ok(release.id.clone())
}

pub fn add_log_entry(
    state: &mut AppState,
    project_id: Option<&str>,
    date: Option<NaiveDate>,
    text: &str,
) -> Result<String> {
    let entry = project_mut(state, project_id)?
        .add_log_entry(date, text)
        .ok_or_else(|| anyhow!("Logbook text is required"))?;
    Ok(entry.id.clone())
}

pub fn add_issue(
    state: &mut AppState,
    project_id: Option<&str>,
    title: &str,
    description: &str,
) -> Result<String> {
    let issue = project_mut(state, project_id)?
        .add_issue(title, description)
        .ok_or_else(|| anyhow!("Issue title is required"))?;
    Ok(issue.id.clone())
}

pub fn set_issue_status(state: &mut AppState, issue_id: &str, status: IssueStatus) -> Result<()> {
    if !state
        .projects
        .iter_mut()
        .any(|project| project.set_issue_status(issue_id, status))
    {
        bail!("Issue not found: {}", issue_id);
    }
    Ok(())
}

/// Turn sharing on (returning the slug) or off.
pub fn share(
    state: &mut AppState,
    project_id: Option<&str>,
    enabled: bool,
) -> Result<Option<String>> {
    let project = project_mut(state, project_id)?;
    if enabled {
        Ok(Some(project.enable_sharing().slug.clone()))
    } else {
        project.disable_sharing();
        Ok(None)
    }
}

/// Set the theme, or flip it when none is given.
pub fn set_theme(state: &mut AppState, theme: Option<Theme>) -> Theme {
    match theme {
        Some(theme) => {
            state.set_theme(theme);
            theme
        }
        None => state.toggle_theme(),
    }
}

pub fn set_preference(state: &mut AppState, key: &str, enabled: bool) -> Result<()> {
    if !state.set_preference(key, enabled) {
        bail!("'{}' is not an on/off preference", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sample_state;

    #[test]
    fn records_land_on_the_selected_project() {
        let (mut state, _) = sample_state();

        add_bom_line(&mut state, None, "Fin", 4, "Acme").unwrap();
        add_release(&mut state, None, "1.0.0", NaiveDate::from_ymd_opt(2025, 5, 1), "").unwrap();
        add_log_entry(&mut state, None, None, "First static fire").unwrap();
        assert!(add_bom_line(&mut state, None, "", 1, "").is_err());

        let project = &state.projects[0];
        assert_eq!(project.bom[0].quantity, 4);
        assert_eq!(project.releases[0].version, "1.0.0");
        assert_eq!(project.logbook[0].text, "First static fire");
    }

    #[test]
    fn issues_open_and_close() {
        let (mut state, _) = sample_state();
        let id = add_issue(&mut state, None, "Fin flutter", "above 80 m/s").unwrap();

        set_issue_status(&mut state, &id, IssueStatus::Closed).unwrap();

        assert_eq!(state.projects[0].issues[0].status, IssueStatus::Closed);
        assert!(set_issue_status(&mut state, "missing", IssueStatus::Open).is_err());
    }

    #[test]
    fn sharing_keeps_its_slug() {
        let (mut state, _) = sample_state();

        assert_eq!(share(&mut state, None, true).unwrap().as_deref(), Some("rocket"));
        share(&mut state, None, false).unwrap();
        assert!(!state.projects[0].share.as_ref().unwrap().enabled);
        assert_eq!(share(&mut state, None, true).unwrap().as_deref(), Some("rocket"));
    }

    #[test]
    fn theme_toggles_or_is_set() {
        let mut state = AppState::default();

        assert_eq!(set_theme(&mut state, None), Theme::Light);
        assert_eq!(set_theme(&mut state, Some(Theme::Light)), Theme::Light);
        assert_eq!(state.preferences.theme, Theme::Light);
    }

    #[test]
    fn preferences_refuse_the_theme_key() {
        let mut state = AppState::default();

        set_preference(&mut state, "showChecklist", false).unwrap();

        assert!(!state.preferences.show_checklist);
        assert!(set_preference(&mut state, "theme", true).is_err());
    }
}
