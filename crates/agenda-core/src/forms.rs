//! Input validation for the calendar, task, project and invitation forms.
//!
//! Validation never touches the backend: a draft either becomes the payload
//! the controller sends, or a set of per-field localized messages.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::anyhow;
use chrono::NaiveDate;
use regex::Regex;

use crate::backend::rows::{ProjectFields, TaskFields};
use crate::i18n::{I18n, Key};
use crate::model::{
    CalendarId, DEFAULT_PROJECT_LABEL, Milestone, PLACEHOLDER_AVATAR, Person, Priority, Project,
    ProjectId, ProjectStatus, Task,
};

pub const DEFAULT_CALENDAR_COLOR: &str = "bg-blue-500";

/// Colour classes offered for new calendars, in palette order.
pub const CALENDAR_COLORS: [&str; 8] = [
    "bg-blue-500",
    "bg-green-500",
    "bg-purple-500",
    "bg-orange-500",
    "bg-red-500",
    "bg-pink-500",
    "bg-indigo-500",
    "bg-yellow-500",
];

/// People that can be assigned to tasks or added to project teams.
pub const ROSTER: [(&str, &str); 5] = [
    ("ana", "Ana García"),
    ("carlos", "Carlos López"),
    ("maria", "María Rodríguez"),
    ("elena", "Elena Ruiz"),
    ("david", "David Martín"),
];

/// Well-known project labels a task can be filed under.
pub const PROJECT_LABELS: [(&str, &str); 4] = [
    ("redesign", "Rediseño web"),
    ("api", "API v2"),
    ("marketing", "Marketing"),
    ("docs", "Documentación"),
];

const MIN_CALENDAR_NAME: usize = 2;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Accepts a palette class (`bg-green-500`) or a bare colour name (`green`).
pub fn calendar_color(input: &str) -> Option<&'static str> {
    let wanted = input.trim().to_ascii_lowercase();
    CALENDAR_COLORS.iter().copied().find(|class| {
        *class == wanted || class.trim_start_matches("bg-").trim_end_matches("-500") == wanted
    })
}

/// Roster lookup by key or by full name; anything else is unassigned.
pub fn roster_person(input: &str) -> Person {
    let wanted = input.trim();
    ROSTER
        .iter()
        .find(|(key, name)| key.eq_ignore_ascii_case(wanted) || name.eq_ignore_ascii_case(wanted))
        .map(|(_, name)| Person::named(*name))
        .unwrap_or_else(Person::unassigned)
}

fn roster_key(name: &str) -> Option<&'static str> {
    ROSTER
        .iter()
        .find(|(_, full)| *full == name)
        .map(|(key, _)| *key)
}

/// Known keys map to their label, other text is kept verbatim, blank is "General".
pub fn project_label(input: &str) -> String {
    let wanted = input.trim();
    if wanted.is_empty() {
        return DEFAULT_PROJECT_LABEL.to_string();
    }
    PROJECT_LABELS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| wanted.to_string())
}

fn project_key(label: &str) -> Option<String> {
    if label == DEFAULT_PROJECT_LABEL {
        return None;
    }
    let key = PROJECT_LABELS
        .iter()
        .find(|(_, known)| *known == label)
        .map(|(key, _)| (*key).to_string())
        .unwrap_or_else(|| label.to_string());
    Some(key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Title,
    Priority,
    Emails,
    Role,
    Access,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Title => "title",
            Field::Priority => "priority",
            Field::Emails => "emails",
            Field::Role => "role",
            Field::Access => "access",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub key: Key,
    pub message: String,
}

/// Per-field messages from a failed validation, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    fn push(&mut self, i18n: &I18n, field: Field, key: Key) {
        self.push_message(field, key, i18n.t(key).to_string());
    }

    fn push_message(&mut self, field: Field, key: Key, message: String) {
        self.errors.push(FieldError {
            field,
            key,
            message,
        });
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field.as_str(), e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

// ---- calendar ----

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarDraft {
    pub name: String,
    pub description: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInput {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

impl CalendarDraft {
    pub fn validate(&self, i18n: &I18n) -> Result<CalendarInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = self.name.trim();
        if name.is_empty() {
            errors.push(i18n, Field::Name, Key::CalendarNameRequired);
        } else if name.chars().count() < MIN_CALENDAR_NAME {
            errors.push(i18n, Field::Name, Key::NameMinLength);
        }

        errors.into_result(|| CalendarInput {
            name: name.to_string(),
            description: Some(self.description.trim().to_string()).filter(|d| !d.is_empty()),
            color: self
                .color
                .as_deref()
                .and_then(calendar_color)
                .unwrap_or(DEFAULT_CALENDAR_COLOR)
                .to_string(),
        })
    }
}

// ---- task ----

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    /// Roster key or free-text label.
    pub project: String,
    /// Roster key or full name.
    pub assignee: String,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
}

impl TaskDraft {
    /// Prefills the form from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: Some(task.priority),
            project: project_key(&task.project).unwrap_or_default(),
            assignee: roster_key(&task.assignee.name)
                .map(str::to_string)
                .unwrap_or_default(),
            due_date: Some(task.due_date),
            completed: task.completed,
        }
    }

    pub fn validate(&self, i18n: &I18n, today: NaiveDate) -> Result<TaskFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.title.trim().is_empty() {
            errors.push(i18n, Field::Title, Key::TitleRequired);
        }
        let Some(priority) = self.priority else {
            errors.push(i18n, Field::Priority, Key::PriorityRequired);
            return Err(errors);
        };

        errors.into_result(|| {
            let assignee = roster_person(&self.assignee);
            let project_key = self.project.trim();
            let tags = [priority.as_str(), project_key]
                .into_iter()
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();

            TaskFields {
                title: self.title.trim().to_string(),
                description: Some(self.description.trim().to_string()),
                completed: self.completed,
                priority,
                due_date: Some(self.due_date.unwrap_or(today)),
                assignee_name: Some(assignee.name),
                assignee_avatar: Some(PLACEHOLDER_AVATAR.to_string()),
                project_name: Some(project_label(project_key)),
                tags,
            }
        })
    }
}

// ---- project ----

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneDraft {
    pub name: String,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    /// Roster keys or full names.
    pub team: Vec<String>,
    pub milestones: Vec<MilestoneDraft>,
}

impl ProjectDraft {
    pub fn from_project(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            priority: Some(project.priority),
            due_date: Some(project.due_date),
            team: project.team.iter().map(|p| p.name.clone()).collect(),
            milestones: project
                .milestones
                .iter()
                .map(|m| MilestoneDraft {
                    name: m.name.clone(),
                    due_date: m.due_date,
                })
                .collect(),
        }
    }

    /// `editing` carries the project being edited; milestone completion is
    /// kept by position among the non-blank milestones.
    pub fn validate(
        &self,
        i18n: &I18n,
        today: NaiveDate,
        editing: Option<&Project>,
    ) -> Result<ProjectFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.title.trim().is_empty() {
            errors.push(i18n, Field::Title, Key::TitleRequired);
        }
        let Some(priority) = self.priority else {
            errors.push(i18n, Field::Priority, Key::PriorityRequired);
            return Err(errors);
        };

        errors.into_result(|| {
            let milestones = self
                .milestones
                .iter()
                .filter(|m| !m.name.trim().is_empty())
                .enumerate()
                .map(|(index, draft)| Milestone {
                    name: draft.name.trim().to_string(),
                    completed: editing
                        .and_then(|project| project.milestones.get(index))
                        .is_some_and(|m| m.completed),
                    due_date: draft.due_date,
                })
                .collect();

            let team = self
                .team
                .iter()
                .filter(|member| !member.trim().is_empty())
                .map(|member| roster_person(member))
                .collect();

            ProjectFields {
                title: self.title.trim().to_string(),
                description: Some(self.description.trim().to_string()),
                progress: 0,
                due_date: Some(self.due_date.unwrap_or(today)),
                priority,
                status: ProjectStatus::InProgress,
                team_members: team,
                milestones,
            }
            .normalized()
        })
    }
}

// ---- invitation ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }

    pub fn label_key(self) -> Key {
        match self {
            Role::Viewer => Key::RoleViewer,
            Role::Editor => Key::RoleEditor,
            Role::Admin => Key::RoleAdmin,
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            other => Err(anyhow!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InviteDraft {
    pub emails: Vec<String>,
    pub role: Option<String>,
    pub calendars: Vec<CalendarId>,
    pub projects: Vec<ProjectId>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub emails: Vec<String>,
    pub role: Role,
    pub calendars: Vec<CalendarId>,
    pub projects: Vec<ProjectId>,
    pub message: Option<String>,
}

impl InviteDraft {
    pub fn validate(&self, i18n: &I18n) -> Result<Invitation, FieldErrors> {
        let mut errors = FieldErrors::default();

        let emails: Vec<String> = self
            .emails
            .iter()
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .collect();
        if emails.is_empty() {
            errors.push(i18n, Field::Emails, Key::EmailRequired);
        } else {
            let invalid: Vec<&str> = emails
                .iter()
                .map(String::as_str)
                .filter(|email| !is_valid_email(email))
                .collect();
            if !invalid.is_empty() {
                errors.push_message(
                    Field::Emails,
                    Key::InvalidEmails,
                    i18n.tf(Key::InvalidEmails, &[("emails", &invalid.join(", "))]),
                );
            }
        }

        let role = self.role.as_deref().and_then(|r| r.parse::<Role>().ok());
        if role.is_none() {
            errors.push(i18n, Field::Role, Key::RoleRequired);
        }

        if self.calendars.is_empty() && self.projects.is_empty() {
            errors.push(i18n, Field::Access, Key::AccessRequired);
        }

        match role {
            Some(role) if errors.is_empty() => Ok(Invitation {
                emails,
                role,
                calendars: self.calendars.clone(),
                projects: self.projects.clone(),
                message: Some(self.message.trim().to_string()).filter(|m| !m.is_empty()),
            }),
            _ => Err(errors),
        }
    }
}
