//! Flattening of tasks, projects and milestones into dated calendar events,
//! plus the per-day layouts the calendar grids draw.

use chrono::NaiveDate;

use crate::model::{Priority, Project, Task};

/// Events drawn as chips in a month cell.
pub const MONTH_CHIPS: usize = 2;
/// Events drawn at all in a month cell (chips plus dots).
pub const MONTH_VISIBLE: usize = 7;
pub const WEEK_CHIPS: usize = 2;
pub const DEFAULT_UPCOMING_LIMIT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Task,
    Project,
    Milestone,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Task => "task",
            EventKind::Project => "project",
            EventKind::Milestone => "milestone",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            EventKind::Task => "✓",
            EventKind::Project => "📋",
            EventKind::Milestone => "📍",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub kind: EventKind,
    pub priority: Option<Priority>,
    pub completed: bool,
    pub project_title: Option<String>,
}

impl CalendarEvent {
    /// Hover-style label: milestones are prefixed with their project.
    pub fn label(&self) -> String {
        match (&self.kind, &self.project_title) {
            (EventKind::Milestone, Some(project)) => format!("{project}: {}", self.title),
            _ => self.title.clone(),
        }
    }
}

/// Tasks first, in input order; then each project followed by its dated milestones.
pub fn build_events(tasks: &[Task], projects: &[Project]) -> Vec<CalendarEvent> {
    let mut events = Vec::with_capacity(tasks.len() + projects.len());

    for task in tasks {
        events.push(CalendarEvent {
            id: format!("task-{}", task.id),
            title: task.title.clone(),
            date: task.due_date,
            kind: EventKind::Task,
            priority: Some(task.priority),
            completed: task.completed,
            project_title: Some(task.project.clone()),
        });
    }

    for project in projects {
        events.push(CalendarEvent {
            id: format!("project-{}", project.id),
            title: project.title.clone(),
            date: project.due_date,
            kind: EventKind::Project,
            priority: Some(project.priority),
            completed: project.is_completed(),
            project_title: None,
        });

        for (index, milestone) in project.milestones.iter().enumerate() {
            let Some(date) = milestone.due_date else {
                continue;
            };
            events.push(CalendarEvent {
                id: format!("milestone-{}-{index}", project.id),
                title: milestone.name.clone(),
                date,
                kind: EventKind::Milestone,
                priority: None,
                completed: milestone.completed,
                project_title: Some(project.title.clone()),
            });
        }
    }

    events
}

pub fn events_on(events: &[CalendarEvent], date: NaiveDate) -> Vec<&CalendarEvent> {
    events.iter().filter(|event| event.date == date).collect()
}

/// Events on or after `today`, earliest first, ties kept in input order.
pub fn upcoming(events: &[CalendarEvent], today: NaiveDate, limit: usize) -> Vec<&CalendarEvent> {
    let mut future: Vec<&CalendarEvent> = events.iter().filter(|e| e.date >= today).collect();
    future.sort_by_key(|event| event.date);
    future.truncate(limit);
    future
}

/// How one day's events are laid out in a grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLayout<'a> {
    pub chips: Vec<&'a CalendarEvent>,
    pub dots: Vec<&'a CalendarEvent>,
    /// The `+N` counter; zero when nothing is hidden.
    pub overflow: usize,
}

/// Two chips, then up to five dots, then `+N` for the rest.
pub fn month_cell<'a>(day_events: &[&'a CalendarEvent]) -> CellLayout<'a> {
    let chips = day_events.iter().take(MONTH_CHIPS).copied().collect();
    let dots = day_events
        .iter()
        .skip(MONTH_CHIPS)
        .take(MONTH_VISIBLE - MONTH_CHIPS)
        .copied()
        .collect();
    CellLayout {
        chips,
        dots,
        overflow: day_events.len().saturating_sub(MONTH_VISIBLE),
    }
}

/// Two chips, then `+N` for the rest.
pub fn week_column<'a>(day_events: &[&'a CalendarEvent]) -> CellLayout<'a> {
    CellLayout {
        chips: day_events.iter().take(WEEK_CHIPS).copied().collect(),
        dots: Vec::new(),
        overflow: day_events.len().saturating_sub(WEEK_CHIPS),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToneName {
    Green,
    Red,
    Orange,
    Yellow,
    Blue,
    Purple,
    Gray,
}

/// Chip and dot colours for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub name: ToneName,
    pub background: &'static str,
    pub border: &'static str,
    pub text: &'static str,
    pub dot: &'static str,
}

const COMPLETED: Tone = Tone {
    name: ToneName::Green,
    background: "#dcfce7",
    border: "#bbf7d0",
    text: "#166534",
    dot: "bg-green-500",
};
const MILESTONE: Tone = Tone {
    name: ToneName::Purple,
    background: "#faf5ff",
    border: "#e9d5ff",
    text: "#7c3aed",
    dot: "bg-purple-500",
};
const UNPRIORITIZED: Tone = Tone {
    name: ToneName::Gray,
    background: "#f9fafb",
    border: "#e5e7eb",
    text: "#4b5563",
    dot: "bg-gray-500",
};

pub fn tone(event: &CalendarEvent) -> Tone {
    if event.completed {
        return COMPLETED;
    }
    match (event.kind, event.priority) {
        (EventKind::Milestone, _) => MILESTONE,
        (_, None) => UNPRIORITIZED,
        (EventKind::Task, Some(Priority::High)) => Tone {
            name: ToneName::Red,
            background: "#fef2f2",
            border: "#fecaca",
            text: "#dc2626",
            dot: "bg-red-600",
        },
        (EventKind::Task, Some(Priority::Medium)) => Tone {
            name: ToneName::Orange,
            background: "#fff7ed",
            border: "#fed7aa",
            text: "#ea580c",
            dot: "bg-orange-500",
        },
        (EventKind::Task, Some(Priority::Low)) => Tone {
            name: ToneName::Blue,
            background: "#eff6ff",
            border: "#bfdbfe",
            text: "#2563eb",
            dot: "bg-blue-600",
        },
        (EventKind::Project, Some(Priority::High)) => Tone {
            name: ToneName::Red,
            background: "#fef2f2",
            border: "#fecaca",
            text: "#dc2626",
            dot: "bg-red-500",
        },
        (EventKind::Project, Some(Priority::Medium)) => Tone {
            name: ToneName::Yellow,
            background: "#fefce8",
            border: "#fef08a",
            text: "#d97706",
            dot: "bg-yellow-500",
        },
        (EventKind::Project, Some(Priority::Low)) => Tone {
            name: ToneName::Blue,
            background: "#eff6ff",
            border: "#bfdbfe",
            text: "#2563eb",
            dot: "bg-blue-500",
        },
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::model::{Milestone, Person, ProjectStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn task(title: &str, due: NaiveDate, priority: Priority) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            completed: false,
            priority,
            due_date: due,
            assignee: Person::unassigned(),
            project: "General".to_string(),
            tags: vec![],
            calendar: Uuid::nil(),
        }
    }

    fn project(title: &str, due: NaiveDate, milestones: Vec<Milestone>) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            progress: 0,
            due_date: due,
            priority: Priority::Medium,
            status: ProjectStatus::InProgress,
            team: vec![],
            milestones,
            calendar: None,
        }
    }

    #[test]
    fn tasks_come_first_then_projects_with_milestones() {
        let t = task("Write", date(2024, 5, 3), Priority::High);
        let p = project(
            "Launch",
            date(2024, 6, 1),
            vec![
                Milestone::new("Design", Some(date(2024, 5, 1))),
                Milestone::new("Undated", None),
                Milestone::new("Build", Some(date(2024, 5, 15))),
            ],
        );

        let events = build_events(std::slice::from_ref(&t), std::slice::from_ref(&p));
        let ids: Vec<_> = events.iter().map(|e| e.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                format!("task-{}", t.id),
                format!("project-{}", p.id),
                format!("milestone-{}-0", p.id),
                format!("milestone-{}-2", p.id),
            ]
        );
        assert_eq!(events[2].project_title.as_deref(), Some("Launch"));
        assert_eq!(events[2].priority, None);
        assert_eq!(events[2].label(), "Launch: Design");
    }

    #[test]
    fn month_cell_shows_two_chips_five_dots_and_overflow() {
        let day = date(2024, 5, 10);
        let tasks: Vec<_> = (0..10)
            .map(|i| task(&format!("t{i}"), day, Priority::Low))
            .collect();
        let events = build_events(&tasks, &[]);
        let on_day = events_on(&events, day);

        let cell = month_cell(&on_day);
        assert_eq!(cell.chips.len(), 2);
        assert_eq!(cell.dots.len(), 5);
        assert_eq!(cell.overflow, 3);

        let column = week_column(&on_day);
        assert_eq!(column.chips.len(), 2);
        assert_eq!(column.overflow, 8);

        let few = month_cell(&on_day[..3]);
        assert_eq!(few.dots.len(), 1);
        assert_eq!(few.overflow, 0);
    }

    #[test]
    fn upcoming_is_sorted_limited_and_skips_past() {
        let today = date(2024, 5, 10);
        let tasks = vec![
            task("past", date(2024, 5, 9), Priority::Low),
            task("later", date(2024, 5, 20), Priority::Low),
            task("today", today, Priority::Low),
            task("soon", date(2024, 5, 11), Priority::Low),
        ];
        let events = build_events(&tasks, &[]);
        let titles: Vec<_> = upcoming(&events, today, 2)
            .into_iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["today", "soon"]);
    }

    #[test]
    fn tones_follow_kind_priority_and_completion() {
        let day = date(2024, 5, 10);
        let mut done = task("done", day, Priority::High);
        done.completed = true;
        let events = build_events(
            &[done, task("medium", day, Priority::Medium)],
            &[project("p", day, vec![Milestone::new("m", Some(day))])],
        );

        assert_eq!(tone(&events[0]).name, ToneName::Green);
        assert_eq!(tone(&events[1]).name, ToneName::Orange);
        assert_eq!(tone(&events[2]).name, ToneName::Yellow);
        assert_eq!(tone(&events[3]).name, ToneName::Purple);

        let mut bare = events[1].clone();
        bare.priority = None;
        assert_eq!(tone(&bare).dot, "bg-gray-500");
    }
}
