//! Free-text search over tasks, projects and milestones.

use chrono::NaiveDate;

use crate::model::{Person, Priority, Project, Task};

/// Terms longer than this trigger a search on every keystroke.
pub const DEFAULT_LIVE_MIN_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Task,
    Project,
    Milestone,
}

impl ResultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Task => "task",
            ResultKind::Project => "project",
            ResultKind::Milestone => "milestone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub kind: ResultKind,
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub project_title: Option<String>,
    pub assignee: Option<Person>,
    pub team: Vec<Person>,
    pub progress: Option<u8>,
}

/// Case-insensitive substring search. Exact title matches come first; the
/// rest keep the order tasks, then each project followed by its milestones.
pub fn search(term: &str, tasks: &[Task], projects: &[Project]) -> Vec<SearchResult> {
    if term.trim().is_empty() {
        return Vec::new();
    }
    let needle = term.to_lowercase();
    let hit = |haystack: &str| haystack.to_lowercase().contains(&needle);

    let mut results = Vec::new();

    for task in tasks {
        let matches = hit(&task.title)
            || hit(&task.description)
            || hit(&task.project)
            || task.tags.iter().any(|tag| hit(tag));
        if matches {
            results.push(SearchResult {
                kind: ResultKind::Task,
                id: format!("task-{}", task.id),
                title: task.title.clone(),
                description: Some(task.description.clone()),
                priority: Some(task.priority),
                due_date: Some(task.due_date),
                completed: task.completed,
                project_title: Some(task.project.clone()),
                assignee: Some(task.assignee.clone()),
                team: Vec::new(),
                progress: None,
            });
        }
    }

    for project in projects {
        if hit(&project.title) || hit(&project.description) {
            results.push(SearchResult {
                kind: ResultKind::Project,
                id: format!("project-{}", project.id),
                title: project.title.clone(),
                description: Some(project.description.clone()),
                priority: Some(project.priority),
                due_date: Some(project.due_date),
                completed: project.is_completed(),
                project_title: None,
                assignee: None,
                team: project.team.clone(),
                progress: Some(project.progress),
            });
        }

        for (index, milestone) in project.milestones.iter().enumerate() {
            if hit(&milestone.name) {
                results.push(SearchResult {
                    kind: ResultKind::Milestone,
                    id: format!("milestone-{}-{index}", project.id),
                    title: milestone.name.clone(),
                    description: None,
                    priority: None,
                    due_date: milestone.due_date,
                    completed: milestone.completed,
                    project_title: Some(project.title.clone()),
                    assignee: None,
                    team: Vec::new(),
                    progress: None,
                });
            }
        }
    }

    // stable: ties keep insertion order
    results.sort_by_key(|result| result.title.to_lowercase() != needle);
    results
}

/// State of the header search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBox {
    pub term: String,
    pub results: Vec<SearchResult>,
    pub open: bool,
    live_min_chars: usize,
}

impl Default for SearchBox {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_MIN_CHARS)
    }
}

impl SearchBox {
    pub fn new(live_min_chars: usize) -> Self {
        Self {
            term: String::new(),
            results: Vec::new(),
            open: false,
            live_min_chars,
        }
    }

    /// Typing: live search past the threshold, clear when emptied.
    pub fn set_term(&mut self, term: &str, tasks: &[Task], projects: &[Project]) {
        self.term = term.to_string();
        if self.term.chars().count() > self.live_min_chars {
            self.run(tasks, projects);
        } else if self.term.is_empty() {
            self.clear();
        }
    }

    /// Enter or the explicit search button.
    pub fn submit(&mut self, tasks: &[Task], projects: &[Project]) {
        self.run(tasks, projects);
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    fn clear(&mut self) {
        self.results.clear();
        self.open = false;
    }

    fn run(&mut self, tasks: &[Task], projects: &[Project]) {
        if self.term.trim().is_empty() {
            self.clear();
            return;
        }
        self.results = search(&self.term, tasks, projects);
        self.open = true;
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::model::{Milestone, ProjectStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn task(title: &str, description: &str, tags: &[&str]) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            priority: Priority::Medium,
            due_date: date(2024, 5, 1),
            assignee: Person::unassigned(),
            project: "General".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            calendar: Uuid::nil(),
        }
    }

    fn project(title: &str, milestones: &[&str]) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            progress: 0,
            due_date: date(2024, 6, 1),
            priority: Priority::High,
            status: ProjectStatus::InProgress,
            team: vec![Person::named("Ana García")],
            milestones: milestones.iter().map(|m| Milestone::new(*m, None)).collect(),
            calendar: None,
        }
    }

    #[test]
    fn exact_title_match_comes_first() {
        let tasks = vec![task("Write report", "", &[]), task("Report", "", &[])];
        let results = search("report", &tasks, &[]);
        let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Report", "Write report"]);
    }

    #[test]
    fn project_and_its_milestone_both_match() {
        let projects = vec![project("Design system", &["Design review", "Ship"])];
        let results = search("DESIGN", &[], &projects);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].kind, ResultKind::Project);
        assert_eq!(results[0].progress, Some(0));
        assert_eq!(results[1].kind, ResultKind::Milestone);
        assert_eq!(results[1].project_title.as_deref(), Some("Design system"));
        assert!(results[1].id.ends_with("-0"));
    }

    #[test]
    fn tags_and_descriptions_are_searched() {
        let tasks = vec![
            task("a", "call the bank", &[]),
            task("b", "", &["urgent"]),
            task("c", "", &[]),
        ];
        assert_eq!(search("bank", &tasks, &[]).len(), 1);
        assert_eq!(search("URG", &tasks, &[])[0].title, "b");
        assert!(search("   ", &tasks, &[]).is_empty());
    }

    #[test]
    fn partial_word_hits_tags_and_descriptions() {
        let tasks = vec![
            task("Quarterly numbers", "", &["analysis"]),
            task("Fruit run", "buy a banana", &[]),
            task("Ana", "", &[]),
            task("Gym", "leg day", &["health"]),
        ];
        let results = search("ana", &tasks, &[]);
        let mut titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles.remove(0), "Ana");
        titles.sort_unstable();
        assert_eq!(titles, vec!["Fruit run", "Quarterly numbers"]);
    }

    #[test]
    fn search_box_goes_live_past_threshold() {
        let tasks = vec![task("Report", "", &[])];
        let mut search_box = SearchBox::default();

        search_box.set_term("re", &tasks, &[]);
        assert!(!search_box.open);
        assert!(search_box.results.is_empty());

        search_box.set_term("rep", &tasks, &[]);
        assert!(search_box.open);
        assert_eq!(search_box.results.len(), 1);

        search_box.set_term("", &tasks, &[]);
        assert!(!search_box.open);
        assert!(search_box.results.is_empty());

        search_box.set_term("r", &tasks, &[]);
        search_box.submit(&tasks, &[]);
        assert!(search_box.open);
        assert_eq!(search_box.results.len(), 1);
    }
}
