use std::io::Write;

use anyhow::{anyhow, bail};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::app::AgendaApp;
use crate::cli::{
    CalArgs, CalendarCommand, Command, InviteArgs, NewItemArgs, ProjectArgs, ProjectCommand, TaskArgs,
    TaskCommand, TutorialAction,
};
use crate::error::BackendError;
use crate::forms::{CalendarDraft, FieldErrors, InviteDraft, MilestoneDraft, ProjectDraft, TaskDraft};
use crate::grid::Direction;
use crate::i18n::{Key, Language};
use crate::model::{CalendarId, ProjectId, TaskId};
use crate::render::Renderer;
use crate::views::{AppView, NewIntent, TaskFilter};

/// Runs one command against a started app. Toasts raised along the way are
/// printed afterwards, followed by the walkthrough while it is pending.
#[instrument(skip_all, fields(command = command.as_ref().map_or("calendar", command_name)))]
pub async fn dispatch<W: Write>(
    app: &mut AgendaApp,
    renderer: &Renderer,
    out: &mut W,
    command: Option<Command>,
) -> anyhow::Result<()> {
    let tutorial_pending = !matches!(command, Some(Command::Tutorial { .. }));
    if let Some(command) = &command
        && needs_session(command)
        && app.user_id().is_none()
    {
        bail!("{}", app.i18n().t(Key::NotSignedIn));
    }

    let result = match command {
        None => cmd_cal(app, renderer, out, CalArgs::default()),
        Some(Command::Signup { email, password, name }) => cmd_signup(app, out, &email, &password, &name).await,
        Some(Command::Signin { email, password }) => cmd_signin(app, out, &email, &password).await,
        Some(Command::Signout) => cmd_signout(app).await,
        Some(Command::Whoami) => cmd_whoami(app, out),
        Some(Command::Lang { language }) => cmd_lang(app, out, language),
        Some(Command::Calendars) => renderer.calendars(out, app),
        Some(Command::Calendar(sub)) => cmd_calendar(app, renderer, out, sub).await,
        Some(Command::Tasks { filter }) => cmd_tasks(app, renderer, out, filter),
        Some(Command::Task(sub)) => cmd_task(app, renderer, out, sub).await,
        Some(Command::Projects) => {
            app.set_view(AppView::Projects);
            renderer.projects(out, app)
        }
        Some(Command::Project(sub)) => cmd_project(app, renderer, out, sub).await,
        Some(Command::New { view, item }) => cmd_new(app, renderer, out, view, item).await,
        Some(Command::Cal(args)) => cmd_cal(app, renderer, out, args),
        Some(Command::Upcoming) => {
            let all = app.events();
            renderer.upcoming(out, app.i18n(), &all, &app.upcoming())
        }
        Some(Command::Search { term }) => cmd_search(app, renderer, out, &term.join(" ")),
        Some(Command::Tutorial { action }) => cmd_tutorial(app, renderer, out, action).await,
        Some(Command::Invite(args)) => cmd_invite(app, renderer, out, args),
    };

    let toasts = app.toasts_mut();
    toasts.expire(Utc::now());
    renderer.toasts(out, &toasts.drain())?;
    if result.is_ok() && tutorial_pending && app.show_tutorial() {
        writeln!(out)?;
        renderer.tutorial(out, app.i18n(), app.tutorial())?;
    }
    result
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Signup { .. } => "signup",
        Command::Signin { .. } => "signin",
        Command::Signout => "signout",
        Command::Whoami => "whoami",
        Command::Lang { .. } => "lang",
        Command::Calendars => "calendars",
        Command::Calendar(_) => "calendar",
        Command::Tasks { .. } => "tasks",
        Command::Task(_) => "task",
        Command::Projects => "projects",
        Command::Project(_) => "project",
        Command::New { .. } => "new",
        Command::Cal(_) => "cal",
        Command::Upcoming => "upcoming",
        Command::Search { .. } => "search",
        Command::Tutorial { .. } => "tutorial",
        Command::Invite(_) => "invite",
    }
}

fn needs_session(command: &Command) -> bool {
    !matches!(
        command,
        Command::Signup { .. } | Command::Signin { .. } | Command::Whoami | Command::Lang { .. }
    )
}

// ---- account ----

async fn cmd_signup<W: Write>(
    app: &mut AgendaApp,
    out: &mut W,
    email: &str,
    password: &str,
    name: &str,
) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        bail!("{}", app.i18n().t(Key::FullNameRequired));
    }
    let outcome = app.sign_up(email, password, name).await;
    auth_outcome(app, outcome)?;
    cmd_whoami(app, out)
}

async fn cmd_signin<W: Write>(app: &mut AgendaApp, out: &mut W, email: &str, password: &str) -> anyhow::Result<()> {
    let outcome = app.sign_in(email, password).await;
    auth_outcome(app, outcome)?;
    cmd_whoami(app, out)
}

async fn cmd_signout(app: &mut AgendaApp) -> anyhow::Result<()> {
    let outcome = app.sign_out().await;
    auth_outcome(app, outcome)?;
    info!("signed out");
    Ok(())
}

fn auth_outcome(app: &AgendaApp, outcome: Result<(), BackendError>) -> anyhow::Result<()> {
    outcome.map_err(|err| anyhow!("{} ({err})", app.i18n().t(Key::GenericError)))
}

fn cmd_whoami<W: Write>(app: &AgendaApp, out: &mut W) -> anyhow::Result<()> {
    let i18n = app.i18n();
    match app.ctx().auth.user() {
        Some(user) => writeln!(
            out,
            "{}",
            i18n.tf(Key::SignedInAs, &[("name", &user.full_name), ("email", &user.email)])
        )?,
        None => writeln!(out, "{}", i18n.t(Key::NotSignedIn))?,
    }
    Ok(())
}

fn cmd_lang<W: Write>(app: &mut AgendaApp, out: &mut W, language: Option<Language>) -> anyhow::Result<()> {
    let Some(language) = language else {
        let i18n = app.i18n();
        writeln!(
            out,
            "{}: {}",
            i18n.t(Key::Language),
            i18n.language_name(app.ctx().language())
        )?;
        return Ok(());
    };
    completed(app.set_language(language))
}

// ---- calendars ----

async fn cmd_calendar<W: Write>(
    app: &mut AgendaApp,
    renderer: &Renderer,
    out: &mut W,
    sub: CalendarCommand,
) -> anyhow::Result<()> {
    match sub {
        CalendarCommand::Add { name, description, color } => {
            let draft = CalendarDraft {
                name,
                description,
                color: color.or_else(|| Some(app.next_calendar_color().to_string())),
            };
            let input = validated(renderer, out, draft.validate(app.i18n()))?;
            completed(app.create_calendar(&input).await.is_some())
        }
        CalendarCommand::Edit { id, name, description, color } => {
            let id = resolve_calendar(app, &id)?;
            let Some(existing) = app.calendar(id) else {
                bail!("unknown calendar {id}");
            };
            let draft = CalendarDraft {
                name: name.unwrap_or_else(|| existing.name.clone()),
                description: description.unwrap_or_else(|| existing.description.clone()),
                color: color.or_else(|| Some(existing.color.clone())),
            };
            let input = validated(renderer, out, draft.validate(app.i18n()))?;
            completed(app.update_calendar(id, &input).await)
        }
        CalendarCommand::Use { id } => {
            let id = resolve_calendar(app, &id)?;
            app.select_calendar(id);
            renderer.calendars(out, app)
        }
        CalendarCommand::Default { id } => {
            let id = resolve_calendar(app, &id)?;
            completed(app.set_default_calendar(id).await)
        }
        CalendarCommand::Rm { id } => {
            let id = resolve_calendar(app, &id)?;
            completed(app.delete_calendar(id).await)
        }
    }
}

// ---- tasks ----

fn cmd_tasks<W: Write>(
    app: &mut AgendaApp,
    renderer: &Renderer,
    out: &mut W,
    filter: TaskFilter,
) -> anyhow::Result<()> {
    app.set_view(AppView::Tasks);
    app.set_task_filter(filter);
    renderer.tasks(out, app)
}

async fn cmd_task<W: Write>(
    app: &mut AgendaApp,
    renderer: &Renderer,
    out: &mut W,
    sub: TaskCommand,
) -> anyhow::Result<()> {
    match sub {
        TaskCommand::Add { title, fields } => {
            let mut draft = TaskDraft {
                title,
                ..TaskDraft::default()
            };
            apply_task_args(&mut draft, fields);
            let fields = validated(renderer, out, draft.validate(app.i18n(), app.today()))?;
            completed(app.create_task(&fields).await.is_some())
        }
        TaskCommand::Edit { id, title, fields } => {
            let id = resolve_task(app, &id)?;
            let Some(task) = app.task(id) else {
                bail!("unknown task {id}");
            };
            let mut draft = TaskDraft::from_task(task);
            if let Some(title) = title {
                draft.title = title;
            }
            apply_task_args(&mut draft, fields);
            let fields = validated(renderer, out, draft.validate(app.i18n(), app.today()))?;
            completed(app.update_task(id, &fields).await)
        }
        TaskCommand::Done { id } => {
            let id = resolve_task(app, &id)?;
            completed(app.toggle_task(id).await)
        }
        TaskCommand::Rm { id } => {
            let id = resolve_task(app, &id)?;
            completed(app.delete_task(id).await)
        }
    }
}

fn apply_task_args(draft: &mut TaskDraft, args: TaskArgs) {
    if args.priority.is_some() {
        draft.priority = args.priority;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if let Some(project) = args.project {
        draft.project = project;
    }
    if let Some(assignee) = args.assignee {
        draft.assignee = assignee;
    }
    if args.due.is_some() {
        draft.due_date = args.due;
    }
}

// ---- projects ----

async fn cmd_project<W: Write>(
    app: &mut AgendaApp,
    renderer: &Renderer,
    out: &mut W,
    sub: ProjectCommand,
) -> anyhow::Result<()> {
    match sub {
        ProjectCommand::Add { title, fields } => {
            let mut draft = ProjectDraft {
                title,
                ..ProjectDraft::default()
            };
            apply_project_args(&mut draft, fields)?;
            let fields = validated(renderer, out, draft.validate(app.i18n(), app.today(), None))?;
            completed(app.create_project(&fields).await.is_some())
        }
        ProjectCommand::Edit { id, title, fields } => {
            let id = resolve_project(app, &id)?;
            let Some(mut draft) = app.edit_project(id) else {
                bail!("unknown project {id}");
            };
            if let Some(title) = title {
                draft.title = title;
            }
            apply_project_args(&mut draft, fields)?;
            let checked = draft.validate(app.i18n(), app.today(), app.editing_project());
            let fields = match checked {
                Ok(fields) => fields,
                Err(errors) => {
                    app.cancel_edit();
                    return validated(renderer, out, Err(errors));
                }
            };
            completed(app.update_project(id, &fields).await)
        }
        ProjectCommand::Show { id } => {
            let id = resolve_project(app, &id)?;
            let Some(project) = app.project(id) else {
                bail!("unknown project {id}");
            };
            renderer.project(out, app.i18n(), project)
        }
        ProjectCommand::Dup { id } => {
            let id = resolve_project(app, &id)?;
            completed(app.duplicate_project(id).await.is_some())
        }
        ProjectCommand::Rm { id } => {
            let id = resolve_project(app, &id)?;
            completed(app.delete_project(id).await)
        }
        ProjectCommand::Toggle { id, index } => {
            let id = resolve_project(app, &id)?;
            let Some(milestones) = app.project(id).map(|p| p.milestones.len()) else {
                bail!("unknown project {id}");
            };
            if index == 0 || index > milestones {
                bail!("milestone {index} out of range (1..={milestones})");
            }
            completed(app.toggle_milestone(id, index - 1).await)?;
            match app.project(id) {
                Some(project) => renderer.project(out, app.i18n(), project),
                None => Ok(()),
            }
        }
    }
}

fn apply_project_args(draft: &mut ProjectDraft, args: ProjectArgs) -> anyhow::Result<()> {
    if args.priority.is_some() {
        draft.priority = args.priority;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if args.due.is_some() {
        draft.due_date = args.due;
    }
    if let Some(team) = args.team {
        draft.team = team;
    }
    if !args.milestones.is_empty() {
        draft.milestones = args
            .milestones
            .iter()
            .map(|raw| parse_milestone(raw))
            .collect::<anyhow::Result<_>>()?;
    }
    Ok(())
}

/// `name` or `name@YYYY-MM-DD`. An `@` not followed by a date stays in the name.
fn parse_milestone(raw: &str) -> anyhow::Result<MilestoneDraft> {
    if let Some((name, date)) = raw.rsplit_once('@')
        && let Ok(due) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
    {
        if name.trim().is_empty() {
            bail!("milestone {raw:?} has no name");
        }
        return Ok(MilestoneDraft {
            name: name.trim().to_string(),
            due_date: Some(due),
        });
    }
    Ok(MilestoneDraft {
        name: raw.trim().to_string(),
        due_date: None,
    })
}

// ---- new ----

async fn cmd_new<W: Write>(
    app: &mut AgendaApp,
    renderer: &Renderer,
    out: &mut W,
    view: AppView,
    item: NewItemArgs,
) -> anyhow::Result<()> {
    app.set_view(view);
    match app.new_intent() {
        NewIntent::Task => {
            let draft = TaskDraft {
                title: item.title,
                description: item.description.unwrap_or_default(),
                priority: item.priority,
                due_date: item.due,
                ..TaskDraft::default()
            };
            let fields = validated(renderer, out, draft.validate(app.i18n(), app.today()))?;
            completed(app.create_task(&fields).await.is_some())
        }
        NewIntent::Project => {
            let draft = ProjectDraft {
                title: item.title,
                description: item.description.unwrap_or_default(),
                priority: item.priority,
                due_date: item.due,
                ..ProjectDraft::default()
            };
            let fields = validated(renderer, out, draft.validate(app.i18n(), app.today(), None))?;
            completed(app.create_project(&fields).await.is_some())
        }
    }
}

// ---- calendar grid ----

fn cmd_cal<W: Write>(app: &mut AgendaApp, renderer: &Renderer, out: &mut W, args: CalArgs) -> anyhow::Result<()> {
    app.set_view(AppView::Calendar);
    let event = args.event.as_deref().map(|raw| resolve_event(app, raw)).transpose()?;

    let today = app.today();
    let view = app.calendar_view_mut();
    if let Some(mode) = args.mode {
        view.set_mode(mode);
    }
    view.go_today(args.date.unwrap_or(today));
    for _ in 0..args.prev {
        view.navigate(Direction::Prev);
    }
    for _ in 0..args.next {
        view.navigate(Direction::Next);
    }
    match event {
        Some(event) => view.select_event(event),
        None => view.clear_selection(),
    }
    debug!(focus = %view.focus, mode = %view.mode, "calendar view");

    renderer.calendar(out, app)
}

// ---- search ----

fn cmd_search<W: Write>(app: &mut AgendaApp, renderer: &Renderer, out: &mut W, term: &str) -> anyhow::Result<()> {
    app.set_search_term(term);
    app.submit_search();
    renderer.search(out, app.i18n(), app.search_box())?;
    app.close_search();
    Ok(())
}

// ---- tutorial ----

async fn cmd_tutorial<W: Write>(
    app: &mut AgendaApp,
    renderer: &Renderer,
    out: &mut W,
    action: TutorialAction,
) -> anyhow::Result<()> {
    match action {
        TutorialAction::Show => {}
        TutorialAction::Next => {
            app.tutorial_next().await;
        }
        TutorialAction::Prev => {
            app.tutorial_previous();
        }
        TutorialAction::Skip => {
            app.skip_tutorial().await;
        }
    }

    if app.show_tutorial() {
        renderer.tutorial(out, app.i18n(), app.tutorial())
    } else {
        writeln!(out, "{}", app.i18n().t(Key::TutorialCompleteTitle))?;
        Ok(())
    }
}

// ---- collaborators ----

fn cmd_invite<W: Write>(app: &mut AgendaApp, renderer: &Renderer, out: &mut W, args: InviteArgs) -> anyhow::Result<()> {
    let calendars = args
        .calendars
        .iter()
        .map(|raw| resolve_calendar(app, raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let projects = args
        .projects
        .iter()
        .map(|raw| resolve_project(app, raw))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let draft = InviteDraft {
        emails: args.emails,
        role: args.role,
        calendars,
        projects,
        message: args.message,
    };
    let invitation = validated(renderer, out, draft.validate(app.i18n()))?;
    completed(app.invite(&invitation))
}

// ---- helpers ----

/// Prints field errors and stops the command when a form does not validate.
fn validated<T, W: Write>(renderer: &Renderer, out: &mut W, checked: Result<T, FieldErrors>) -> anyhow::Result<T> {
    match checked {
        Ok(value) => Ok(value),
        Err(errors) => {
            renderer.field_errors(out, &errors)?;
            Err(anyhow!("{} invalid field(s)", errors.len()))
        }
    }
}

/// Handlers report failure through an error toast; this turns it into a
/// failing exit status.
fn completed(ok: bool) -> anyhow::Result<()> {
    if ok { Ok(()) } else { Err(anyhow!("command did not complete")) }
}

fn resolve_calendar(app: &AgendaApp, raw: &str) -> anyhow::Result<CalendarId> {
    resolve_id("calendar", raw, app.calendars().iter().map(|c| c.id))
}

fn resolve_task(app: &AgendaApp, raw: &str) -> anyhow::Result<TaskId> {
    resolve_id("task", raw, app.tasks().iter().map(|t| t.id))
}

fn resolve_project(app: &AgendaApp, raw: &str) -> anyhow::Result<ProjectId> {
    resolve_id("project", raw, app.projects().iter().map(|p| p.id))
}

/// Ids may be abbreviated to any unique prefix, with or without hyphens.
fn resolve_id(kind: &str, raw: &str, ids: impl Iterator<Item = Uuid>) -> anyhow::Result<Uuid> {
    let needle: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if needle.is_empty() {
        bail!("empty {kind} id");
    }
    unique_prefix(kind, raw, &needle, ids.map(|id| (id.simple().to_string(), id)))
}

fn resolve_event(app: &AgendaApp, raw: &str) -> anyhow::Result<String> {
    let events = app.events();
    if let Some(exact) = events.iter().find(|event| event.id == raw) {
        return Ok(exact.id.clone());
    }
    unique_prefix(
        "event",
        raw,
        raw.trim(),
        events.into_iter().map(|event| (event.id.clone(), event.id)),
    )
}

fn unique_prefix<T>(
    kind: &str,
    raw: &str,
    needle: &str,
    candidates: impl Iterator<Item = (String, T)>,
) -> anyhow::Result<T> {
    let mut matches = candidates.filter(|(key, _)| key.starts_with(needle));
    let Some((_, first)) = matches.next() else {
        bail!("no {kind} matches {raw:?}");
    };
    if matches.next().is_some() {
        bail!("{kind} id {raw:?} is ambiguous");
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestone_with_and_without_date() {
        let dated = parse_milestone("Design@2024-05-01").expect("dated");
        assert_eq!(dated.name, "Design");
        assert_eq!(dated.due_date, NaiveDate::from_ymd_opt(2024, 5, 1));

        let plain = parse_milestone("Ship").expect("plain");
        assert_eq!(plain.due_date, None);

        let email = parse_milestone("Ping ana@example.com").expect("not a date");
        assert_eq!(email.name, "Ping ana@example.com");
        assert!(parse_milestone("@2024-05-01").is_err());
    }

    #[test]
    fn id_prefix_must_be_unique() {
        let a = Uuid::parse_str("aaaa1111-0000-4000-8000-000000000000").expect("uuid");
        let b = Uuid::parse_str("aaaa2222-0000-4000-8000-000000000000").expect("uuid");

        assert_eq!(resolve_id("task", "AAAA1", [a, b].into_iter()).expect("unique"), a);
        assert_eq!(
            resolve_id("task", &b.to_string(), [a, b].into_iter()).expect("full id"),
            b
        );
        assert!(resolve_id("task", "aaaa", [a, b].into_iter()).is_err());
        assert!(resolve_id("task", "ffff", [a, b].into_iter()).is_err());
        assert!(resolve_id("task", " - ", [a, b].into_iter()).is_err());
    }

    #[test]
    fn sign_in_commands_skip_the_session_check() {
        assert!(!needs_session(&Command::Whoami));
        assert!(!needs_session(&Command::Lang { language: None }));
        assert!(needs_session(&Command::Calendars));
        assert!(needs_session(&Command::Upcoming));
    }
}
