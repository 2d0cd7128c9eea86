//! Derived, presentation-ready slices of the controller state.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::i18n::Key;
use crate::model::{CalendarId, CalendarItem, Project, Task};

/// The three screens reachable from the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    #[default]
    Calendar,
    Projects,
    Tasks,
}

impl AppView {
    pub fn as_str(self) -> &'static str {
        match self {
            AppView::Calendar => "calendar",
            AppView::Projects => "projects",
            AppView::Tasks => "tasks",
        }
    }

    pub fn label_key(self) -> Key {
        match self {
            AppView::Calendar => Key::Calendar,
            AppView::Projects => Key::Projects,
            AppView::Tasks => Key::Tasks,
        }
    }
}

impl fmt::Display for AppView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppView {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(AppView::Calendar),
            "projects" => Ok(AppView::Projects),
            "tasks" => Ok(AppView::Tasks),
            other => Err(anyhow!("unknown view: {other}")),
        }
    }
}

/// What the header "new" button opens for a given view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewIntent {
    Task,
    Project,
}

impl NewIntent {
    pub fn for_view(view: AppView) -> Self {
        match view {
            AppView::Projects => NewIntent::Project,
            AppView::Calendar | AppView::Tasks => NewIntent::Task,
        }
    }

    pub fn label_key(self) -> Key {
        match self {
            NewIntent::Task => Key::NewTask,
            NewIntent::Project => Key::NewProject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }

    pub fn label_key(self) -> Key {
        match self {
            TaskFilter::All => Key::AllTasks,
            TaskFilter::Pending => Key::Pending,
            TaskFilter::Completed => Key::Completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "pending" => Ok(TaskFilter::Pending),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(anyhow!("unknown task filter: {other}")),
        }
    }
}

pub fn tasks_in(tasks: &[Task], calendar: Option<CalendarId>) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| Some(task.calendar) == calendar)
        .cloned()
        .collect()
}

pub fn projects_in(projects: &[Project], calendar: Option<CalendarId>) -> Vec<Project> {
    projects
        .iter()
        .filter(|project| project.calendar.is_some() && project.calendar == calendar)
        .cloned()
        .collect()
}

/// Tasks of one calendar narrowed by the status filter, plus the
/// unfiltered total shown in the header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    pub total: usize,
    pub shown: Vec<Task>,
    pub filter: TaskFilter,
}

pub fn task_list(tasks: &[Task], calendar: Option<CalendarId>, filter: TaskFilter) -> TaskList {
    let mine = tasks_in(tasks, calendar);
    let total = mine.len();
    TaskList {
        total,
        shown: mine.into_iter().filter(|task| filter.matches(task)).collect(),
        filter,
    }
}

/// Sets every calendar's counter to the number of tasks filed under it.
pub fn recount(calendars: &mut [CalendarItem], tasks: &[Task]) {
    for calendar in calendars.iter_mut() {
        calendar.tasks = tasks.iter().filter(|t| t.calendar == calendar.id).count();
    }
}
