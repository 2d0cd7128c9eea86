use std::path::Path;
use std::sync::Arc;

use agenda_core::app::AgendaApp;
use agenda_core::backend::LocalBackend;
use agenda_core::backend::mock_behaviour::MockBehaviour;
use agenda_core::cli::GlobalCli;
use agenda_core::commands;
use agenda_core::config::Config;
use agenda_core::context::AppContext;
use agenda_core::forms::{CalendarDraft, MilestoneDraft, ProjectDraft, TaskDraft};
use agenda_core::i18n::Language;
use agenda_core::model::{CalendarId, Priority, ProjectId};
use agenda_core::render::Renderer;
use agenda_core::toast::ToastKind;
use chrono::NaiveDate;
use clap::Parser;
use tempfile::tempdir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 15).expect("valid date")
}

fn spanish() -> Config {
    Config {
        language: Some(Language::Es),
        ..Config::default()
    }
}

fn app_on(dir: &Path, backend: Arc<LocalBackend>) -> AgendaApp {
    let ctx = AppContext::new(spanish(), dir, backend)
        .expect("context")
        .with_today(today());
    AgendaApp::new(ctx)
}

async fn signed_in(dir: &Path) -> (AgendaApp, Arc<LocalBackend>) {
    let backend = Arc::new(LocalBackend::in_memory());
    let mut app = app_on(dir, backend.clone());
    app.start().await.expect("start");
    app.sign_up("ana@example.com", "secret123", "Ana García")
        .await
        .expect("sign up");
    (app, backend)
}

async fn calendar(app: &mut AgendaApp, name: &str) -> CalendarId {
    let input = CalendarDraft {
        name: name.to_string(),
        ..CalendarDraft::default()
    }
    .validate(app.i18n())
    .expect("valid calendar");
    app.create_calendar(&input).await.expect("calendar created")
}

async fn task(app: &mut AgendaApp, title: &str) {
    let fields = TaskDraft {
        title: title.to_string(),
        priority: Some(Priority::Medium),
        ..TaskDraft::default()
    }
    .validate(app.i18n(), app.today())
    .expect("valid task");
    app.create_task(&fields).await.expect("task created");
}

async fn project(app: &mut AgendaApp, title: &str, milestones: &[&str]) -> ProjectId {
    let fields = ProjectDraft {
        title: title.to_string(),
        priority: Some(Priority::High),
        milestones: milestones
            .iter()
            .map(|name| MilestoneDraft {
                name: name.to_string(),
                due_date: NaiveDate::from_ymd_opt(2024, 5, 20),
            })
            .collect(),
        ..ProjectDraft::default()
    }
    .validate(app.i18n(), app.today(), None)
    .expect("valid project");
    app.create_project(&fields).await.expect("project created")
}

#[tokio::test]
async fn first_calendar_becomes_default_and_new_ones_are_selected() {
    let dir = tempdir().expect("tempdir");
    let (mut app, _) = signed_in(dir.path()).await;
    assert!(app.show_tutorial());

    let work = calendar(&mut app, "Trabajo").await;
    let home = calendar(&mut app, "Casa").await;

    assert!(app.calendar(work).expect("work").is_default);
    assert!(!app.calendar(home).expect("home").is_default);
    assert_eq!(app.selected_calendar(), Some(home));

    assert!(app.set_default_calendar(home).await);
    assert!(!app.calendar(work).expect("work").is_default);
    assert!(app.calendar(home).expect("home").is_default);
}

#[tokio::test]
async fn failed_write_leaves_state_alone_and_raises_error_toast() {
    let dir = tempdir().expect("tempdir");
    let (mut app, backend) = signed_in(dir.path()).await;
    calendar(&mut app, "Trabajo").await;
    app.toasts_mut().drain();

    backend.set_behaviour(MockBehaviour::fail_writes(1));
    let fields = TaskDraft {
        title: "Informe".to_string(),
        priority: Some(Priority::Low),
        ..TaskDraft::default()
    }
    .validate(app.i18n(), app.today())
    .expect("valid task");

    assert!(app.create_task(&fields).await.is_none());
    assert!(app.tasks().is_empty());
    let toast = app.toasts().last().expect("error toast");
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, "Error al crear la tarea");

    assert!(app.create_task(&fields).await.is_some());
    assert_eq!(app.tasks().len(), 1);
}

#[tokio::test]
async fn deleting_a_calendar_drops_its_tasks_and_projects() {
    let dir = tempdir().expect("tempdir");
    let (mut app, _) = signed_in(dir.path()).await;

    let work = calendar(&mut app, "Trabajo").await;
    task(&mut app, "Informe").await;
    project(&mut app, "Lanzamiento", &["Diseño"]).await;
    let home = calendar(&mut app, "Casa").await;
    task(&mut app, "Compras").await;

    assert!(app.delete_calendar(work).await);
    assert_eq!(app.calendars().len(), 1);
    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.tasks()[0].title, "Compras");
    assert!(app.projects().is_empty());
    assert_eq!(app.selected_calendar(), Some(home));
}

#[tokio::test]
async fn duplicate_resets_progress_and_keeps_calendar() {
    let dir = tempdir().expect("tempdir");
    let (mut app, _) = signed_in(dir.path()).await;
    let work = calendar(&mut app, "Trabajo").await;
    let source = project(&mut app, "Lanzamiento", &["Diseño", "Entrega"]).await;
    assert!(app.toggle_milestone(source, 0).await);

    calendar(&mut app, "Casa").await;
    let copy = app.duplicate_project(source).await.expect("duplicated");
    let copy = app.project(copy).expect("copy loaded");

    assert_eq!(copy.title, "Lanzamiento (Copia)");
    assert_eq!(copy.progress, 0);
    assert!(copy.milestones.iter().all(|m| !m.completed));
    assert_eq!(copy.calendar, Some(work));
    assert_eq!(
        app.toasts().last().expect("toast").message,
        "Proyecto \"Lanzamiento (Copia)\" duplicado exitosamente"
    );
}

#[tokio::test]
async fn milestone_progress_survives_a_reload() {
    let dir = tempdir().expect("tempdir");
    let (mut app, _) = signed_in(dir.path()).await;
    calendar(&mut app, "Trabajo").await;
    let id = project(&mut app, "Lanzamiento", &["Diseño", "Entrega"]).await;

    assert!(app.toggle_milestone(id, 1).await);
    assert!(!app.toggle_milestone(id, 7).await);
    assert_eq!(app.project(id).expect("project").progress, 50);

    app.sign_out().await.expect("sign out");
    assert!(app.projects().is_empty());
    app.sign_in("ana@example.com", "secret123").await.expect("sign in");

    let reloaded = app.project(id).expect("reloaded");
    assert_eq!(reloaded.progress, 50);
    assert!(reloaded.milestones[1].completed);
}

#[tokio::test]
async fn calendar_counters_follow_task_changes() {
    let dir = tempdir().expect("tempdir");
    let (mut app, _) = signed_in(dir.path()).await;
    let work = calendar(&mut app, "Trabajo").await;
    task(&mut app, "Informe").await;
    task(&mut app, "Revisión").await;
    assert_eq!(app.calendar(work).expect("work").tasks, 2);

    let first = app.tasks()[0].id;
    assert!(app.delete_task(first).await);
    assert_eq!(app.calendar(work).expect("work").tasks, 1);
}

#[tokio::test]
async fn finishing_the_tutorial_updates_the_profile() {
    let dir = tempdir().expect("tempdir");
    let (mut app, _) = signed_in(dir.path()).await;
    assert!(app.show_tutorial());

    app.tutorial_next().await;
    app.skip_tutorial().await;
    assert!(!app.show_tutorial());
    assert!(app.ctx().auth.user().expect("user").tutorial_completed);

    app.sign_out().await.expect("sign out");
    app.sign_in("ana@example.com", "secret123").await.expect("sign in");
    assert!(!app.show_tutorial());
}

#[tokio::test]
async fn language_choice_is_stored_for_next_start() {
    let dir = tempdir().expect("tempdir");
    let (mut app, backend) = signed_in(dir.path()).await;
    assert!(app.set_language(Language::En));
    assert_eq!(
        app.toasts().last().expect("toast").message,
        "Language changed to English"
    );

    let restarted = app_on(dir.path(), backend);
    assert_eq!(restarted.ctx().language(), Language::En);
}

#[tokio::test]
async fn mutations_are_ignored_when_signed_out() {
    let dir = tempdir().expect("tempdir");
    let mut app = app_on(dir.path(), Arc::new(LocalBackend::in_memory()));
    app.start().await.expect("start");

    let input = CalendarDraft {
        name: "Trabajo".to_string(),
        ..CalendarDraft::default()
    }
    .validate(app.i18n())
    .expect("valid calendar");
    assert!(app.create_calendar(&input).await.is_none());
    assert!(app.calendars().is_empty());
    assert!(app.toasts().is_empty());
}

#[tokio::test]
async fn search_spans_every_calendar() {
    let dir = tempdir().expect("tempdir");
    let (mut app, _) = signed_in(dir.path()).await;
    calendar(&mut app, "Trabajo").await;
    task(&mut app, "Informe mensual").await;
    calendar(&mut app, "Casa").await;
    task(&mut app, "Informe del banco").await;

    assert_eq!(app.visible_tasks().len(), 1);
    app.set_search_term("informe");
    assert_eq!(app.search_box().results.len(), 2);
}

async fn run(app: &mut AgendaApp, args: &[&str]) -> anyhow::Result<String> {
    let cli = GlobalCli::try_parse_from(std::iter::once("agenda").chain(args.iter().copied()))?;
    let mut out = Vec::new();
    commands::dispatch(app, &Renderer::plain(), &mut out, cli.command).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn commands_drive_the_app_end_to_end() {
    let dir = tempdir().expect("tempdir");
    let mut app = app_on(dir.path(), Arc::new(LocalBackend::in_memory()));
    app.start().await.expect("start");

    assert!(run(&mut app, &["calendars"]).await.is_err());
    assert!(
        run(&mut app, &["signup", "ana@example.com", "secret123", "--name", " "])
            .await
            .is_err()
    );

    let signed = run(&mut app, &["signup", "ana@example.com", "secret123", "--name", "Ana"])
        .await
        .expect("signup");
    assert!(signed.contains("Ana (ana@example.com)"));
    assert!(signed.contains("Paso 1 de 7"));

    run(&mut app, &["tutorial", "skip"]).await.expect("skip tutorial");
    let created = run(&mut app, &["calendar", "add", "Trabajo"]).await.expect("calendar add");
    assert!(created.contains("Calendario \"Trabajo\" creado exitosamente"));

    run(&mut app, &["task", "add", "Informe", "-p", "h"])
        .await
        .expect("task add");
    let listed = run(&mut app, &["tasks"]).await.expect("tasks");
    assert!(listed.contains("Informe"));

    let task_id = app.tasks()[0].id.simple().to_string();
    let done = run(&mut app, &["task", "done", &task_id[..6]]).await.expect("done");
    assert!(done.contains("completada"));

    let invalid = run(&mut app, &["task", "add", "Sin prioridad"]).await;
    assert!(invalid.is_err());
    assert_eq!(app.tasks().len(), 1);
}

#[tokio::test]
async fn failed_calendar_delete_keeps_everything() {
    let dir = tempdir().expect("tempdir");
    let (mut app, backend) = signed_in(dir.path()).await;
    let work = calendar(&mut app, "Trabajo").await;
    task(&mut app, "Informe").await;
    project(&mut app, "Lanzamiento", &["Diseño"]).await;

    backend.set_behaviour(MockBehaviour {
        delete_behaviour: (0, 1),
        ..MockBehaviour::default()
    });
    assert!(!app.delete_calendar(work).await);
    assert_eq!(app.toasts().last().expect("toast").kind, ToastKind::Error);
    assert_eq!(app.tasks().len(), 1);

    app.sign_out().await.expect("sign out");
    app.sign_in("ana@example.com", "secret123").await.expect("sign in");
    assert_eq!(app.calendars().len(), 1);
    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.projects().len(), 1);
}

#[tokio::test]
async fn calendar_delete_holds_when_the_cascade_breaks() {
    let dir = tempdir().expect("tempdir");
    let (mut app, backend) = signed_in(dir.path()).await;
    let work = calendar(&mut app, "Trabajo").await;
    task(&mut app, "Informe").await;
    project(&mut app, "Lanzamiento", &["Diseño"]).await;
    calendar(&mut app, "Casa").await;
    task(&mut app, "Compras").await;

    // the calendar row and its tasks go, the project delete fails
    backend.set_behaviour(MockBehaviour {
        delete_behaviour: (2, 1),
        ..MockBehaviour::default()
    });
    assert!(app.delete_calendar(work).await);
    assert_eq!(app.tasks().len(), 1);
    assert!(app.projects().is_empty());

    app.sign_out().await.expect("sign out");
    app.sign_in("ana@example.com", "secret123").await.expect("sign in");
    assert_eq!(app.calendars().len(), 1);
    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.tasks()[0].title, "Compras");
    assert!(app.projects().is_empty());
}

#[tokio::test]
async fn deleting_a_project_leaves_tasks_alone() {
    let dir = tempdir().expect("tempdir");
    let (mut app, _) = signed_in(dir.path()).await;
    calendar(&mut app, "Trabajo").await;
    task(&mut app, "Informe").await;
    let launch = project(&mut app, "Lanzamiento", &["Diseño"]).await;
    project(&mut app, "Migración", &[]).await;
    let tasks_before = app.tasks().to_vec();
    let projects_before = app.projects().len();

    assert!(app.delete_project(launch).await);
    assert_eq!(app.projects().len(), projects_before - 1);
    assert!(app.project(launch).is_none());
    assert_eq!(app.tasks(), tasks_before.as_slice());
}

/// One CLI process: a fresh backend and app over the same data directory.
async fn invocation(dir: &Path, args: &[&str]) -> AgendaApp {
    let backend = LocalBackend::open(&dir.join("backend")).expect("open backend");
    let mut app = app_on(dir, Arc::new(backend));
    app.start().await.expect("start");
    run(&mut app, args).await.expect("command");
    app.shutdown();
    app
}

#[tokio::test]
async fn selected_calendar_carries_over_between_invocations() {
    let dir = tempdir().expect("tempdir");
    invocation(dir.path(), &["signup", "ana@example.com", "secret123", "--name", "Ana"]).await;
    invocation(dir.path(), &["calendar", "add", "Trabajo"]).await;
    let app = invocation(dir.path(), &["calendar", "add", "Casa"]).await;
    let home = app
        .calendars()
        .iter()
        .find(|c| c.name == "Casa")
        .map(|c| c.id)
        .expect("home calendar");

    let app = invocation(dir.path(), &["task", "add", "Compras", "-p", "l"]).await;
    assert_eq!(app.selected_calendar(), Some(home));
    assert_eq!(app.tasks()[0].calendar, home);

    let work = app
        .calendars()
        .iter()
        .find(|c| c.is_default)
        .map(|c| c.id)
        .expect("default calendar");
    invocation(dir.path(), &["calendar", "use", &work.simple().to_string()]).await;
    let app = invocation(dir.path(), &["tasks"]).await;
    assert_eq!(app.selected_calendar(), Some(work));
    assert!(app.visible_tasks().is_empty());
}
