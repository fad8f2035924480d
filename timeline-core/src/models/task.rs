use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::id::new_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub label: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    status: TaskStatus,
    percent_complete: u8,
    pub focus: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.into(),
            label: String::new(),
            priority: Priority::default(),
            due_date: None,
            status: TaskStatus::Todo,
            percent_complete: 0,
            focus: false,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn percent_complete(&self) -> u8 {
        self.percent_complete
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Set the status; `done` forces 100%, leaving `done` drops a full bar to 0.
    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        if status == TaskStatus::Done {
            self.percent_complete = 100;
        } else if self.percent_complete == 100 {
            self.percent_complete = 0;
        }
        self.touch();
    }

    /// Set the completion percentage, clamped to 0..=100. Reaching 100 marks
    /// the task done; dropping below 100 reopens a done task as in progress.
    pub fn set_percent_complete(&mut self, value: i64) {
        let percent = value.clamp(0, 100) as u8;
        self.percent_complete = percent;
        if percent == 100 {
            self.status = TaskStatus::Done;
        } else if self.status == TaskStatus::Done {
            self.status = TaskStatus::Progress;
        }
        self.touch();
    }

    /// Restore a stored status/percentage pair, repairing any disagreement.
    pub(crate) fn restore_progress(&mut self, status: TaskStatus, percent: i64) {
        let percent = percent.clamp(0, 100) as u8;
        if status == TaskStatus::Done || percent == 100 {
            self.status = TaskStatus::Done;
            self.percent_complete = 100;
        } else {
            self.status = status;
            self.percent_complete = percent;
        }
    }

    pub fn toggle_focus(&mut self) -> bool {
        self.focus = !self.focus;
        self.touch();
        self.focus
    }

    pub fn update(&mut self, input: UpdateTaskInput) {
        if let Some(title) = input.title.map(|t| t.trim().to_string()) {
            if !title.is_empty() {
                self.title = title;
            }
        }
        if let Some(label) = input.label {
            self.label = label.trim().to_string();
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        if let Some(due_date) = input.due_date {
            self.due_date = due_date;
        }
        if let Some(notes) = input.notes {
            self.notes = notes;
        }
        if let Some(focus) = input.focus {
            self.focus = focus;
        }
        // An explicit status wins over a percentage sent alongside it.
        if let Some(percent) = input.percent_complete {
            self.set_percent_complete(percent);
        }
        if let Some(status) = input.status {
            self.set_status(status);
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    Progress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Progress => "progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "progress" => Some(Self::Progress),
            "blocked" => Some(Self::Blocked),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub label: Option<String>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
    pub focus: Option<bool>,
    pub status: Option<TaskStatus>,
    pub percent_complete: Option<i64>,
}
