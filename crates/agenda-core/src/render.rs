use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::AgendaApp;
use crate::config::Config;
use crate::events::{self, CalendarEvent, EventKind, ToneName};
use crate::forms::FieldErrors;
use crate::grid::{self, CalendarMode};
use crate::i18n::{I18n, Key};
use crate::model::{Person, Project};
use crate::search::{ResultKind, SearchBox};
use crate::toast::{Toast, ToastKind};
use crate::tutorial::Tutorial;
use crate::views::TaskFilter;

const CELL: usize = 14;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.color && io::stdout().is_terminal(),
        }
    }

    /// No escape codes regardless of the terminal.
    pub fn plain() -> Self {
        Self { color: false }
    }

    // ---- calendar ----

    #[tracing::instrument(skip_all)]
    pub fn calendar<W: Write>(&self, out: &mut W, app: &AgendaApp) -> anyhow::Result<()> {
        let view = app.calendar_view();
        let i18n = app.i18n();
        writeln!(
            out,
            "{}  [{}]",
            self.paint(&view.title(i18n), "1"),
            view.mode_label(i18n)
        )?;

        let events = app.events();
        match view.mode {
            CalendarMode::Month => {
                self.month(out, i18n, view.focus, app.today(), &events)?;
                writeln!(out)?;
                self.upcoming(out, i18n, &events, &app.upcoming())?;
            }
            CalendarMode::Week => self.week(out, i18n, view.focus, app.today(), &events)?,
            CalendarMode::Day => self.day(out, view.focus, &events)?,
        }

        if let Some(selected) = view.selected_event.as_deref()
            && let Some(event) = events.iter().find(|e| e.id == selected)
        {
            writeln!(out)?;
            self.event_details(out, i18n, event)?;
        }
        Ok(())
    }

    fn month<W: Write>(
        &self,
        out: &mut W,
        i18n: &I18n,
        focus: NaiveDate,
        today: NaiveDate,
        events: &[CalendarEvent],
    ) -> anyhow::Result<()> {
        let header: Vec<String> = i18n
            .weekday_short()
            .iter()
            .map(|day| fit(day, CELL))
            .collect();
        writeln!(out, "{}", header.join(" "))?;

        let cells = grid::month_grid(focus, today);
        for week in cells.chunks(7) {
            let layouts: Vec<_> = week
                .iter()
                .map(|cell| events::month_cell(&events::events_on(events, cell.date)))
                .collect();

            let numbers: Vec<String> = week
                .iter()
                .map(|cell| {
                    let text = if cell.is_today {
                        format!("[{}]", cell.date.day())
                    } else {
                        format!(" {}", cell.date.day())
                    };
                    let fitted = fit(&text, CELL);
                    if cell.is_today {
                        self.paint(&fitted, "1")
                    } else if !cell.in_month {
                        self.paint(&fitted, "2")
                    } else {
                        fitted
                    }
                })
                .collect();
            writeln!(out, "{}", numbers.join(" "))?;

            for chip in 0..events::MONTH_CHIPS {
                let line: Vec<String> = layouts
                    .iter()
                    .map(|layout| match layout.chips.get(chip) {
                        Some(event) => self.chip(event, CELL),
                        None => " ".repeat(CELL),
                    })
                    .collect();
                if layouts.iter().any(|layout| layout.chips.len() > chip) {
                    writeln!(out, "{}", line.join(" "))?;
                }
            }

            if layouts.iter().any(|l| !l.dots.is_empty() || l.overflow > 0) {
                let line: Vec<String> = layouts
                    .iter()
                    .map(|layout| {
                        let mut painted = String::new();
                        let mut visible = 0;
                        for event in &layout.dots {
                            painted.push_str(&self.tone_paint("•", events::tone(event).name));
                            visible += 1;
                        }
                        if layout.overflow > 0 {
                            let more = format!(" +{}", layout.overflow);
                            visible += more.width();
                            painted.push_str(&more);
                        }
                        format!("{painted}{}", " ".repeat(CELL.saturating_sub(visible)))
                    })
                    .collect();
                writeln!(out, "{}", line.join(" "))?;
            }
        }
        Ok(())
    }

    fn week<W: Write>(
        &self,
        out: &mut W,
        i18n: &I18n,
        focus: NaiveDate,
        today: NaiveDate,
        events: &[CalendarEvent],
    ) -> anyhow::Result<()> {
        let short = i18n.weekday_short();
        for date in grid::week_dates(focus) {
            let day_events = events::events_on(events, date);
            let layout = events::week_column(&day_events);
            let label = format!(
                "{} {:>2}",
                short[date.weekday().num_days_from_sunday() as usize],
                date.day()
            );
            let label = if date == today {
                self.paint(&fit(&label, 8), "1")
            } else {
                fit(&label, 8)
            };

            let mut line = label;
            for event in &layout.chips {
                line.push_str("  ");
                line.push_str(&self.chip(event, 24));
            }
            if layout.overflow > 0 {
                line.push_str(&format!("  +{}", layout.overflow));
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }

    fn day<W: Write>(&self, out: &mut W, focus: NaiveDate, events: &[CalendarEvent]) -> anyhow::Result<()> {
        for event in events::events_on(events, focus) {
            let mut text = format!("{} {}", event.kind.icon(), event.title);
            if event.kind == EventKind::Milestone
                && let Some(project) = &event.project_title
            {
                text.push_str(&format!(" ({project})"));
            }
            writeln!(out, "  {}", self.tone_paint(&text, events::tone(event).name))?;
        }
        for hour in grid::hour_labels() {
            writeln!(out, "{} │", self.paint(&hour, "2"))?;
        }
        Ok(())
    }

    /// Upcoming panel; the empty state depends on whether the calendar has
    /// any events at all.
    pub fn upcoming<W: Write>(
        &self,
        out: &mut W,
        i18n: &I18n,
        all: &[CalendarEvent],
        upcoming: &[CalendarEvent],
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(i18n.t(Key::UpcomingEvents), "1"))?;
        if all.is_empty() {
            writeln!(out, "  {}", i18n.t(Key::NoEventsScheduled))?;
            writeln!(out, "  {}", self.paint(i18n.t(Key::EventsWillAppear), "2"))?;
            return Ok(());
        }
        for event in upcoming {
            let date = format!(
                "{} {}",
                event.date.day(),
                short_month(i18n, event.date)
            );
            writeln!(
                out,
                "  {}  {}",
                fit(&date, 7),
                self.tone_paint(&event_text(event), events::tone(event).name)
            )?;
        }
        Ok(())
    }

    pub fn event_details<W: Write>(
        &self,
        out: &mut W,
        i18n: &I18n,
        event: &CalendarEvent,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(&event.label(), "1"))?;
        writeln!(out, "  id        {}", event.id)?;
        writeln!(out, "  {:<9} {}", "type", event.kind.as_str())?;
        writeln!(out, "  {:<9} {}", i18n.t(Key::DueDate), event.date)?;
        if let Some(priority) = event.priority {
            writeln!(out, "  {:<9} {}", i18n.t(Key::Priority), i18n.priority(priority))?;
        }
        if event.completed {
            writeln!(out, "  {:<9} {}", i18n.t(Key::Status), i18n.t(Key::StatusCompleted))?;
        }
        if let Some(project) = &event.project_title {
            writeln!(out, "  {:<9} {}", i18n.t(Key::Project), project)?;
        }
        Ok(())
    }

    // ---- lists ----

    #[tracing::instrument(skip_all)]
    pub fn calendars<W: Write>(&self, out: &mut W, app: &AgendaApp) -> anyhow::Result<()> {
        let i18n = app.i18n();
        if app.calendars().is_empty() {
            writeln!(out, "{}", i18n.t(Key::NoCalendars))?;
            return Ok(());
        }

        let headers = vec![
            "".to_string(),
            "ID".to_string(),
            i18n.t(Key::Calendars).to_string(),
            i18n.t(Key::Tasks).to_string(),
            "".to_string(),
        ];
        let rows = app
            .calendars()
            .iter()
            .map(|calendar| {
                let marker = if app.selected_calendar() == Some(calendar.id) {
                    "*"
                } else {
                    ""
                };
                let default = if calendar.is_default {
                    i18n.t(Key::DefaultCalendar)
                } else {
                    ""
                };
                vec![
                    marker.to_string(),
                    self.paint(&short_id(&calendar.id), "33"),
                    self.paint(&calendar.name, color_code(&calendar.color)),
                    calendar.tasks.to_string(),
                    default.to_string(),
                ]
            })
            .collect();
        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip_all)]
    pub fn tasks<W: Write>(&self, out: &mut W, app: &AgendaApp) -> anyhow::Result<()> {
        let i18n = app.i18n();
        let list = app.task_list();
        writeln!(
            out,
            "{}: {} {}",
            i18n.t(list.filter.label_key()),
            list.total,
            i18n.tf(Key::TasksShown, &[("shown", &list.shown.len().to_string())])
        )?;

        if list.shown.is_empty() {
            writeln!(out, "{}", i18n.t(Key::NoTasks))?;
            if list.filter == TaskFilter::All {
                writeln!(out, "{}", self.paint(i18n.t(Key::StartCreatingTasks), "2"))?;
            }
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "".to_string(),
            i18n.t(Key::DueDate).to_string(),
            i18n.t(Key::Priority).to_string(),
            i18n.t(Key::Project).to_string(),
            i18n.t(Key::AssignedTo).to_string(),
            "Title".to_string(),
        ];
        let today = app.today();
        let rows = list
            .shown
            .iter()
            .map(|task| {
                let due = task.due_date.to_string();
                let due = if !task.completed && task.due_date < today {
                    self.paint(&due, "31")
                } else {
                    due
                };
                vec![
                    self.paint(&short_id(&task.id), "33"),
                    if task.completed { "[x]" } else { "[ ]" }.to_string(),
                    due,
                    i18n.priority(task.priority).to_string(),
                    task.project.clone(),
                    initials(&task.assignee),
                    task.title.clone(),
                ]
            })
            .collect();
        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip_all)]
    pub fn projects<W: Write>(&self, out: &mut W, app: &AgendaApp) -> anyhow::Result<()> {
        let i18n = app.i18n();
        let projects = app.visible_projects();
        if projects.is_empty() {
            writeln!(out, "{}", i18n.t(Key::NoProjects))?;
            writeln!(out, "{}", self.paint(i18n.t(Key::StartCreatingProjects), "2"))?;
            return Ok(());
        }

        for project in &projects {
            self.project(out, i18n, project)?;
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn project<W: Write>(&self, out: &mut W, i18n: &I18n, project: &Project) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} {}  {}",
            self.paint(&short_id(&project.id), "33"),
            self.paint(&project.title, "1"),
            self.paint(i18n.status(project.status), status_code(project))
        )?;
        if !project.description.is_empty() {
            writeln!(out, "  {}", project.description)?;
        }
        writeln!(
            out,
            "  {}: {} {}%   {}: {}   {}: {}",
            i18n.t(Key::Progress),
            progress_bar(project.progress, 10),
            project.progress,
            i18n.t(Key::Priority),
            i18n.priority(project.priority),
            i18n.t(Key::DueDate),
            project.due_date
        )?;
        if !project.team.is_empty() {
            let team: Vec<String> = project.team.iter().map(initials).collect();
            writeln!(out, "  {}: {}", i18n.t(Key::Team), team.join(" "))?;
        }
        if !project.milestones.is_empty() {
            writeln!(
                out,
                "  {} ({}/{})",
                i18n.t(Key::Milestones),
                project.completed_milestones(),
                project.milestones.len()
            )?;
            for (index, milestone) in project.milestones.iter().enumerate() {
                let mark = if milestone.completed { "[x]" } else { "[ ]" };
                let due = milestone
                    .due_date
                    .map(|d| format!("  {d}"))
                    .unwrap_or_default();
                writeln!(out, "    {index}. {mark} {}{due}", milestone.name)?;
            }
        }
        Ok(())
    }

    // ---- search ----

    #[tracing::instrument(skip_all)]
    pub fn search<W: Write>(&self, out: &mut W, i18n: &I18n, search: &SearchBox) -> anyhow::Result<()> {
        if search.term.trim().is_empty() {
            writeln!(out, "{}", i18n.t(Key::EnterSearchTerm))?;
            return Ok(());
        }
        writeln!(out, "{}", self.paint(i18n.t(Key::SearchResults), "1"))?;
        if search.results.is_empty() {
            writeln!(out, "{}", i18n.t(Key::NoResultsFound))?;
            writeln!(
                out,
                "{}",
                i18n.tf(Key::NoMatchingElements, &[("term", &search.term)])
            )?;
            return Ok(());
        }

        let count = search.results.len();
        let plural = if count == 1 { "" } else { "s" };
        writeln!(
            out,
            "{}",
            i18n.tf(
                Key::ResultsFound,
                &[("count", &count.to_string()), ("plural", plural)]
            )
        )?;

        for result in &search.results {
            let icon = match result.kind {
                ResultKind::Task => EventKind::Task.icon(),
                ResultKind::Project => EventKind::Project.icon(),
                ResultKind::Milestone => EventKind::Milestone.icon(),
            };
            let mut line = format!("  {icon} {}", result.title);
            if let Some(project) = &result.project_title {
                line.push_str(&format!("  · {project}"));
            }
            if let Some(priority) = result.priority {
                line.push_str(&format!("  · {}", i18n.priority(priority)));
            }
            if let Some(due) = result.due_date {
                line.push_str(&format!("  · {due}"));
            }
            if let Some(progress) = result.progress {
                line.push_str(&format!("  · {progress}%"));
            }
            if result.completed {
                line = self.paint(&line, "32");
            }
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    // ---- notices ----

    pub fn toasts<W: Write>(&self, out: &mut W, toasts: &[Toast]) -> anyhow::Result<()> {
        for toast in toasts {
            let (mark, code) = match toast.kind {
                ToastKind::Success => ("✓", "32"),
                ToastKind::Error => ("✗", "31"),
                ToastKind::Info => ("i", "34"),
            };
            writeln!(out, "{}", self.paint(&format!("{mark} {}", toast.message), code))?;
        }
        Ok(())
    }

    pub fn tutorial<W: Write>(&self, out: &mut W, i18n: &I18n, tutorial: &Tutorial) -> anyhow::Result<()> {
        let (title, description, step) = tutorial.describe(i18n);
        writeln!(out, "{}  {}", self.paint(&title, "1"), self.paint(&step, "2"))?;
        writeln!(out, "  {description}")?;
        let next = if tutorial.is_last() {
            i18n.t(Key::TutorialFinish)
        } else {
            i18n.t(Key::TutorialNext)
        };
        writeln!(
            out,
            "  [{}] [{}] [{}]",
            i18n.t(Key::TutorialPrevious),
            next,
            i18n.t(Key::TutorialSkip)
        )?;
        Ok(())
    }

    pub fn field_errors<W: Write>(&self, out: &mut W, errors: &FieldErrors) -> anyhow::Result<()> {
        for error in errors.iter() {
            writeln!(out, "{}", self.paint(&format!("{}: {}", error.field.as_str(), error.message), "31"))?;
        }
        Ok(())
    }

    fn chip(&self, event: &CalendarEvent, width: usize) -> String {
        let text = fit(&event_text(event), width);
        self.tone_paint(&text, events::tone(event).name)
    }

    fn tone_paint(&self, text: &str, tone: ToneName) -> String {
        let code = match tone {
            ToneName::Green => "32",
            ToneName::Red => "31",
            ToneName::Orange => "38;5;208",
            ToneName::Yellow => "33",
            ToneName::Blue => "34",
            ToneName::Purple => "35",
            ToneName::Gray => "90",
        };
        self.paint(text, code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn event_text(event: &CalendarEvent) -> String {
    format!("{} {}", event.kind.icon(), event.title)
}

fn short_month(i18n: &I18n, date: NaiveDate) -> String {
    i18n.month_name(date.month0()).chars().take(3).collect()
}

/// First eight characters of a UUID; commands accept any unique prefix.
pub fn short_id(id: &uuid::Uuid) -> String {
    id.simple().to_string().chars().take(8).collect()
}

fn initials(person: &Person) -> String {
    person.initials()
}

fn progress_bar(progress: u8, width: usize) -> String {
    let filled = (usize::from(progress.min(100)) * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn status_code(project: &Project) -> &'static str {
    match project.status {
        crate::model::ProjectStatus::Completed => "32",
        crate::model::ProjectStatus::NearCompletion => "33",
        crate::model::ProjectStatus::InProgress => "34",
    }
}

/// ANSI colour for a palette class such as `bg-green-500`.
fn color_code(class: &str) -> &'static str {
    let name = class.trim_start_matches("bg-").split('-').next().unwrap_or_default();
    match name {
        "green" => "32",
        "red" => "31",
        "yellow" | "orange" => "33",
        "blue" | "indigo" => "34",
        "purple" | "pink" => "35",
        _ => "39",
    }
}

/// Truncates to `width` display columns (with an ellipsis) and pads the rest.
fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    if text.width() <= width {
        out.push_str(text);
        used = text.width();
    } else {
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(ch);
            used += w;
        }
        out.push('…');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toast::ToastQueue;
    use crate::tutorial::Tutorial;

    fn rendered(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).expect("render");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn fit_truncates_by_display_width() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdefgh", 5), "abcd…");
        assert_eq!(fit("📋 Launch", 6).width(), 6);
    }

    #[test]
    fn table_aligns_ignoring_escape_codes() {
        let text = rendered(|out| {
            write_table(
                out,
                vec!["A".to_string(), "B".to_string()],
                vec![vec!["\x1b[33mxx\x1b[0m".to_string(), "y".to_string()]],
            )
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A  B ");
        assert_eq!(strip_ansi(lines[2]), "xx y ");
    }

    #[test]
    fn plain_toasts_and_tutorial() {
        let renderer = Renderer::plain();
        let mut queue = ToastQueue::default();
        queue.success("saved");
        queue.error("failed");
        let text = rendered(|out| renderer.toasts(out, queue.active()));
        assert_eq!(text, "✓ saved\n✗ failed\n");

        let i18n = I18n::new(crate::i18n::Language::En);
        let text = rendered(|out| renderer.tutorial(out, &i18n, &Tutorial::new()));
        assert!(text.starts_with("Welcome to your Agenda!  Step 1 of 7"));
        assert!(text.contains("[Next]"));
    }

    #[test]
    fn progress_bar_rounds() {
        assert_eq!(progress_bar(0, 10), "░░░░░░░░░░");
        assert_eq!(progress_bar(67, 10), "███████░░░");
        assert_eq!(progress_bar(100, 4), "████");
    }
}
