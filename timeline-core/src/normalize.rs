//! Repairs a loaded state tree into canonical shape.
//!
//! Works on the raw [`serde_json::Value`] so that nothing a store hands back
//! can make loading fail: wrong types degrade to defaults, missing ids are
//! minted, and numbers are clamped. Running it over its own output changes
//! nothing.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::id::IdSet;
use crate::models::*;

/// Parse and normalize a stored JSON blob, falling back to the empty state.
pub fn parse_state(raw: &str) -> AppState {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize_value(&value),
        Err(e) => {
            tracing::warn!("Stored state is not valid JSON, starting fresh: {}", e);
            AppState::default()
        }
    }
}

/// Normalize an already-typed state (a no-op for canonical input).
pub fn normalize(state: AppState) -> AppState {
    match serde_json::to_value(&state) {
        Ok(value) => normalize_value(&value),
        Err(e) => {
            tracing::warn!("Could not serialize state for normalization: {}", e);
            state
        }
    }
}

pub fn normalize_value(raw: &Value) -> AppState {
    let Some(root) = raw.as_object() else {
        if !raw.is_null() {
            tracing::warn!("Stored state is not an object, starting fresh");
        }
        return AppState::default();
    };
    let now = Utc::now();

    let mut ids = IdSet::new();
    let projects = array(root, "projects")
        .iter()
        .enumerate()
        .map(|(index, raw)| project(object(raw), index, &mut ids, now))
        .collect();

    let mut state = AppState {
        projects,
        preferences: preferences(root.get("preferences")),
        selected_project_id: opt_string(root, "selectedProjectId"),
        selected_phase_id: opt_string(root, "selectedPhaseId"),
    };
    state.ensure_selections();
    state
}

fn preferences(raw: Option<&Value>) -> Preferences {
    let defaults = Preferences::default();
    let Some(raw) = raw.and_then(Value::as_object) else {
        return defaults;
    };
    let mut extra = raw.clone();
    let mut take_bool = |key: &str, default: bool| {
        extra.remove(key);
        raw.get(key).map(truthy).unwrap_or(default)
    };
    let show_notes = take_bool("showNotes", defaults.show_notes);
    let show_files = take_bool("showFiles", defaults.show_files);
    let show_checklist = take_bool("showChecklist", defaults.show_checklist);
    extra.remove("theme");
    Preferences {
        show_notes,
        show_files,
        show_checklist,
        theme: raw
            .get("theme")
            .and_then(Value::as_str)
            .and_then(Theme::from_str)
            .unwrap_or_default(),
        extra,
    }
}

fn project(raw: &Map<String, Value>, index: usize, ids: &mut IdSet, now: DateTime<Utc>) -> Project {
    let created_at = timestamp(raw, "createdAt", now);
    let name = non_empty(string(raw, "name")).unwrap_or_else(|| format!("Project {}", index + 1));
    // Anything that is not explicitly physical is a digital project.
    let kind = match string(raw, "type").trim().to_ascii_lowercase().as_str() {
        "physical" => ProjectType::Physical,
        _ => ProjectType::Digital,
    };

    let mut phase_ids = IdSet::new();
    let phases = array(raw, "phases")
        .iter()
        .enumerate()
        .map(|(i, p)| phase(object(p), i, &mut phase_ids, now))
        .collect();

    Project {
        id: claim_id(raw, ids),
        name,
        kind,
        description: string(raw, "description"),
        github: opt_string(raw, "github"),
        share: raw.get("share").and_then(Value::as_object).map(|share| Share {
            enabled: share.get("enabled").map(truthy).unwrap_or(false),
            slug: string(share, "slug"),
        }),
        phases,
        notes: collect(raw, "notes", |r, ids| note(r, ids, now)),
        files: collect(raw, "files", |r, ids| file(r, ids, now)),
        checklist: collect(raw, "checklist", checklist_item),
        bom: collect(raw, "bom", bom_line),
        logbook: collect(raw, "logbook", |r, ids| log_entry(r, ids, now)),
        releases: collect(raw, "releases", release),
        issues: collect(raw, "issues", |r, ids| issue(r, ids, now)),
        created_at,
        updated_at: timestamp(raw, "updatedAt", created_at),
    }
}

fn phase(raw: &Map<String, Value>, index: usize, ids: &mut IdSet, now: DateTime<Utc>) -> Phase {
    let mut defaults = Phase::new(index);
    defaults.id = claim_id(raw, ids);
    if let Some(name) = non_empty(string(raw, "name")) {
        defaults.name = name;
    }
    if let Some(color) = non_empty(string(raw, "color")) {
        defaults.color = color;
    }
    Phase {
        description: string(raw, "description"),
        start_date: date(raw, "startDate"),
        end_date: date(raw, "endDate"),
        progress: number(raw, "progress").map(clamp_percent),
        priority: enumerated(raw, "priority", Priority::from_str),
        deadline: date(raw, "deadline"),
        tasks: collect(raw, "tasks", |r, ids| task(r, ids, now)),
        notes: collect(raw, "notes", |r, ids| note(r, ids, now)),
        files: collect(raw, "files", |r, ids| file(r, ids, now)),
        checklist: collect(raw, "checklist", checklist_item),
        created_at: timestamp(raw, "createdAt", now),
        ..defaults
    }
}

fn task(raw: &Map<String, Value>, ids: &mut IdSet, now: DateTime<Utc>) -> Task {
    let mut task = Task::new(string(raw, "title"));
    task.id = claim_id(raw, ids);
    task.label = string(raw, "label");
    task.priority = enumerated(raw, "priority", Priority::from_str);
    task.due_date = date(raw, "dueDate");
    task.focus = raw.get("focus").map(truthy).unwrap_or(false);
    task.notes = string(raw, "notes");
    task.created_at = timestamp(raw, "createdAt", now);
    task.updated_at = timestamp(raw, "updatedAt", task.created_at);
    task.restore_progress(
        enumerated(raw, "status", TaskStatus::from_str),
        number(raw, "percentComplete").map(clamp_percent).unwrap_or(0).into(),
    );
    task
}

fn note(raw: &Map<String, Value>, ids: &mut IdSet, now: DateTime<Utc>) -> Note {
    let created_at = timestamp(raw, "createdAt", now);
    Note {
        id: claim_id(raw, ids),
        title: string(raw, "title"),
        content: string(raw, "content"),
        phase_id: opt_string(raw, "phaseId"),
        versions: versions(raw, now),
        created_at,
        updated_at: timestamp(raw, "updatedAt", created_at),
    }
}

fn file(raw: &Map<String, Value>, ids: &mut IdSet, now: DateTime<Utc>) -> FileEntry {
    let created_at = timestamp(raw, "createdAt", now);
    // Older files were stored with `name` instead of `title`.
    let title = non_empty(string(raw, "title")).unwrap_or_else(|| string(raw, "name"));
    FileEntry {
        id: claim_id(raw, ids),
        title,
        link: string(raw, "link"),
        note: string(raw, "note"),
        content: string(raw, "content"),
        phase_id: opt_string(raw, "phaseId"),
        versions: versions(raw, now),
        created_at,
        updated_at: timestamp(raw, "updatedAt", created_at),
    }
}

fn versions(raw: &Map<String, Value>, now: DateTime<Utc>) -> VersionHistory {
    let versions = array(raw, "versions")
        .iter()
        .map(object)
        .map(|v| Version {
            timestamp: timestamp(v, "timestamp", now),
            content: string(v, "content"),
        })
        .collect();
    VersionHistory::from_versions(versions)
}

fn checklist_item(raw: &Map<String, Value>, ids: &mut IdSet) -> ChecklistItem {
    ChecklistItem {
        id: claim_id(raw, ids),
        text: string(raw, "text"),
        done: raw.get("done").map(truthy).unwrap_or(false),
    }
}

fn bom_line(raw: &Map<String, Value>, ids: &mut IdSet) -> BomLine {
    BomLine {
        id: claim_id(raw, ids),
        item: string(raw, "item"),
        quantity: number(raw, "quantity")
            .map(|q| q.max(0.0).min(u32::MAX as f64).round() as u32)
            .unwrap_or(1),
        supplier: string(raw, "supplier"),
        done: raw.get("done").map(truthy).unwrap_or(false),
    }
}

fn log_entry(raw: &Map<String, Value>, ids: &mut IdSet, now: DateTime<Utc>) -> LogEntry {
    LogEntry {
        id: claim_id(raw, ids),
        date: date(raw, "date"),
        text: string(raw, "text"),
        created_at: timestamp(raw, "createdAt", now),
    }
}

fn release(raw: &Map<String, Value>, ids: &mut IdSet) -> Release {
    Release {
        id: claim_id(raw, ids),
        version: string(raw, "version"),
        date: date(raw, "date"),
        notes: string(raw, "notes"),
    }
}

fn issue(raw: &Map<String, Value>, ids: &mut IdSet, now: DateTime<Utc>) -> Issue {
    Issue {
        id: claim_id(raw, ids),
        title: string(raw, "title"),
        description: string(raw, "description"),
        status: enumerated(raw, "status", IssueStatus::from_str),
        created_at: timestamp(raw, "createdAt", now),
    }
}

// --- Field coercion helpers ---

static EMPTY_OBJECT: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);

/// Normalize every element of an array field with a fresh id scope.
fn collect<T>(
    raw: &Map<String, Value>,
    key: &str,
    mut build: impl FnMut(&Map<String, Value>, &mut IdSet) -> T,
) -> Vec<T> {
    let mut ids = IdSet::new();
    array(raw, key)
        .iter()
        .map(|item| build(object(item), &mut ids))
        .collect()
}

/// Numeric ids are kept in their string form.
fn claim_id(raw: &Map<String, Value>, ids: &mut IdSet) -> String {
    ids.claim(Some(string(raw, "id").as_str()))
}

fn object(value: &Value) -> &Map<String, Value> {
    value.as_object().unwrap_or(&EMPTY_OBJECT)
}

fn array<'a>(raw: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string(raw: &Map<String, Value>, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.trim().is_empty()).then_some(s)
}

fn opt_string(raw: &Map<String, Value>, key: &str) -> Option<String> {
    non_empty(string(raw, key))
}

fn number(raw: &Map<String, Value>, key: &str) -> Option<f64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn clamp_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

fn enumerated<T: Default>(raw: &Map<String, Value>, key: &str, parse: fn(&str) -> Option<T>) -> T {
    raw.get(key)
        .and_then(Value::as_str)
        .and_then(|s| parse(&s.trim().to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (truncated to its day).
fn date(raw: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    let s = raw.get(key)?.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn timestamp(raw: &Map<String, Value>, key: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    raw.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fallback)
}
