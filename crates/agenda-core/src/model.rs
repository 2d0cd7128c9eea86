use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::rows::{CalendarRow, ProjectRow, TaskRow};
use crate::progress;

pub type UserId = Uuid;
pub type CalendarId = Uuid;
pub type TaskId = Uuid;
pub type ProjectId = Uuid;

/// Shown when a task row carries no assignee.
pub const UNASSIGNED_NAME: &str = "Sin asignar";
pub const PLACEHOLDER_AVATAR: &str = "/placeholder.svg?height=32&width=32";
/// Label used when a task row carries no project label.
pub const DEFAULT_PROJECT_LABEL: &str = "General";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            other => Err(anyhow!("unknown priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    InProgress,
    NearCompletion,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::NearCompletion => "near-completion",
            ProjectStatus::Completed => "completed",
        }
    }
}

/// A name + avatar pair. Assignees and team members are not user references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub avatar: String,
}

impl Person {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: PLACEHOLDER_AVATAR.to_string(),
        }
    }

    pub fn unassigned() -> Self {
        Self::named(UNASSIGNED_NAME)
    }

    /// Up to two uppercase initials, used where an avatar image cannot be shown.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        rename = "dueDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
}

impl Milestone {
    pub fn new(name: impl Into<String>, due_date: Option<NaiveDate>) -> Self {
        Self {
            name: name.into(),
            completed: false,
            due_date,
        }
    }
}

/// Sidebar entry for one calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarItem {
    pub id: CalendarId,
    pub name: String,
    pub description: String,
    pub color: String,
    pub is_default: bool,
    pub tasks: usize,
}

impl From<CalendarRow> for CalendarItem {
    fn from(row: CalendarRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description.unwrap_or_default(),
            color: row.color,
            is_default: row.is_default,
            tasks: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub assignee: Person,
    /// Free-text label; not a reference to a [`Project`].
    pub project: String,
    pub tags: Vec<String>,
    pub calendar: CalendarId,
}

impl Task {
    pub fn from_row(row: TaskRow, today: NaiveDate) -> Self {
        let assignee = Person {
            name: row
                .assignee_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_NAME.to_string()),
            avatar: row
                .assignee_avatar
                .filter(|avatar| !avatar.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
        };

        Self {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            completed: row.completed,
            priority: row.priority,
            due_date: row.due_date.unwrap_or(today),
            assignee,
            project: row
                .project_name
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROJECT_LABEL.to_string()),
            tags: row.tags,
            calendar: row.calendar_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub progress: u8,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: ProjectStatus,
    pub team: Vec<Person>,
    pub milestones: Vec<Milestone>,
    pub calendar: Option<CalendarId>,
}

impl Project {
    pub fn from_row(row: ProjectRow, today: NaiveDate) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            progress: row.progress.min(100),
            due_date: row.due_date.unwrap_or(today),
            priority: row.priority,
            status: row.status,
            team: row.team_members,
            milestones: row.milestones,
            calendar: Some(row.calendar_id),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }

    pub fn completed_milestones(&self) -> usize {
        self.milestones.iter().filter(|m| m.completed).count()
    }

    /// Recomputes `progress` and `status` from the milestone list.
    pub fn recompute_progress(&mut self) {
        self.progress = progress::progress_for(&self.milestones);
        self.status = progress::status_for(self.progress);
    }
}
