//! The top-level controller: owns the loaded rows and turns user intents into
//! backend calls.
//!
//! Every mutating handler follows the same shape. It does nothing without a
//! signed-in user, calls the backend, and only on success merges the result
//! into local state and raises a success toast. A failed call is logged and
//! raises an error toast; local state is left as it was.

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::backend::rows::{CalendarPatch, NewCalendar, ProjectFields, TaskFields, TaskPatch, UserPatch};
use crate::context::AppContext;
use crate::error::BackendError;
use crate::events::{self, CalendarEvent};
use crate::forms::{CALENDAR_COLORS, CalendarInput, Invitation, ProjectDraft};
use crate::grid::CalendarView;
use crate::i18n::{I18n, Key, Language};
use crate::model::{CalendarId, CalendarItem, Project, ProjectId, Task, TaskId, UserId};
use crate::progress;
use crate::search::SearchBox;
use crate::toast::ToastQueue;
use crate::tutorial::{Tutorial, TutorialMove};
use crate::views::{self, AppView, NewIntent, TaskFilter, TaskList};

#[derive(Debug)]
pub struct AgendaApp {
    ctx: AppContext,
    view: AppView,
    selected_calendar: Option<CalendarId>,
    calendars: Vec<CalendarItem>,
    tasks: Vec<Task>,
    projects: Vec<Project>,
    editing_project: Option<ProjectId>,
    toasts: ToastQueue,
    show_tutorial: bool,
    tutorial: Tutorial,
    loaded_for: Option<UserId>,
    calendar_view: CalendarView,
    search: SearchBox,
    task_filter: TaskFilter,
}

impl AgendaApp {
    pub fn new(ctx: AppContext) -> Self {
        let toasts = ToastQueue::new(ctx.config.toast.duration_ms);
        let calendar_view = CalendarView::new(ctx.today(), ctx.config.calendar.default_view);
        let search = SearchBox::new(ctx.config.search.live_min_chars);
        let selected_calendar = ctx.prefs.selected_calendar();
        let tutorial = Tutorial::at(ctx.prefs.tutorial_step());

        Self {
            ctx,
            view: AppView::default(),
            selected_calendar,
            calendars: Vec::new(),
            tasks: Vec::new(),
            projects: Vec::new(),
            editing_project: None,
            toasts,
            show_tutorial: false,
            tutorial,
            loaded_for: None,
            calendar_view,
            search,
            task_filter: TaskFilter::default(),
        }
    }

    /// Restores the session and loads the signed-in user's data.
    #[tracing::instrument(skip(self))]
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.ctx.init().await?;
        self.sync_user().await;
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.ctx.teardown();
    }

    // ---- accessors ----

    pub fn ctx(&self) -> &AppContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    pub fn i18n(&self) -> &I18n {
        &self.ctx.i18n
    }

    pub fn today(&self) -> NaiveDate {
        self.ctx.today()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.ctx.auth.user_id()
    }

    pub fn view(&self) -> AppView {
        self.view
    }

    pub fn selected_calendar(&self) -> Option<CalendarId> {
        self.selected_calendar
    }

    pub fn calendars(&self) -> &[CalendarItem] {
        &self.calendars
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn editing_project(&self) -> Option<&Project> {
        let id = self.editing_project?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn show_tutorial(&self) -> bool {
        self.show_tutorial
    }

    pub fn tutorial(&self) -> &Tutorial {
        &self.tutorial
    }

    pub fn calendar_view(&self) -> &CalendarView {
        &self.calendar_view
    }

    pub fn calendar_view_mut(&mut self) -> &mut CalendarView {
        &mut self.calendar_view
    }

    pub fn search_box(&self) -> &SearchBox {
        &self.search
    }

    pub fn task_filter(&self) -> TaskFilter {
        self.task_filter
    }

    pub fn calendar(&self, id: CalendarId) -> Option<&CalendarItem> {
        self.calendars.iter().find(|c| c.id == id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    // ---- derived state ----

    pub fn visible_tasks(&self) -> Vec<Task> {
        views::tasks_in(&self.tasks, self.selected_calendar)
    }

    pub fn visible_projects(&self) -> Vec<Project> {
        views::projects_in(&self.projects, self.selected_calendar)
    }

    pub fn task_list(&self) -> TaskList {
        views::task_list(&self.tasks, self.selected_calendar, self.task_filter)
    }

    /// Events of the selected calendar.
    pub fn events(&self) -> Vec<CalendarEvent> {
        events::build_events(&self.visible_tasks(), &self.visible_projects())
    }

    pub fn upcoming(&self) -> Vec<CalendarEvent> {
        let all = self.events();
        events::upcoming(&all, self.today(), self.ctx.config.calendar.upcoming_limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Palette colour for the next calendar, rotating by how many exist.
    pub fn next_calendar_color(&self) -> &'static str {
        CALENDAR_COLORS[self.calendars.len() % CALENDAR_COLORS.len()]
    }

    // ---- session ----

    /// Applies pending auth events; loads data once per newly seen user.
    #[tracing::instrument(skip(self))]
    pub async fn sync_user(&mut self) {
        let client = self.ctx.client.clone();
        self.ctx.auth.pump(&client).await;

        let Some(user) = self.ctx.auth.user().cloned() else {
            if self.loaded_for.take().is_some() {
                debug!("user signed out, clearing state");
            }
            self.clear();
            return;
        };

        self.show_tutorial = !user.tutorial_completed;
        if self.loaded_for == Some(user.id) {
            return;
        }
        if self.load(user.id).await {
            self.loaded_for = Some(user.id);
        }
    }

    pub async fn sign_up(&mut self, email: &str, password: &str, full_name: &str) -> Result<(), BackendError> {
        let client = self.ctx.client.clone();
        self.ctx.auth.sign_up(&client, email, password, full_name).await?;
        self.sync_user().await;
        Ok(())
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), BackendError> {
        let client = self.ctx.client.clone();
        self.ctx.auth.sign_in(&client, email, password).await?;
        self.sync_user().await;
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<(), BackendError> {
        let client = self.ctx.client.clone();
        self.ctx.auth.sign_out(&client).await?;
        self.sync_user().await;
        Ok(())
    }

    fn clear(&mut self) {
        self.calendars.clear();
        self.tasks.clear();
        self.projects.clear();
        self.editing_project = None;
        self.show_tutorial = false;
        self.tutorial = Tutorial::at(self.ctx.prefs.tutorial_step());
        self.search = SearchBox::new(self.ctx.config.search.live_min_chars);
    }

    #[tracing::instrument(skip(self))]
    async fn load(&mut self, user: UserId) -> bool {
        let client = self.ctx.client.clone();
        let today = self.today();

        let loaded = async {
            let calendars = client.list_calendars(user).await?;
            let tasks = client.list_tasks(user).await?;
            let projects = client.list_projects(user).await?;
            Ok::<_, BackendError>((calendars, tasks, projects))
        }
        .await;

        let (calendars, tasks, projects) = match loaded {
            Ok(rows) => rows,
            Err(err) => {
                self.fail(Key::LoadFailed, "load user data", &err);
                return false;
            }
        };

        self.calendars = calendars.into_iter().map(CalendarItem::from).collect();
        self.tasks = tasks.into_iter().map(|row| Task::from_row(row, today)).collect();
        self.projects = projects
            .into_iter()
            .map(|row| Project::from_row(row, today))
            .collect();
        self.drop_orphans();

        let default = self.calendars.iter().find(|c| c.is_default).map(|c| c.id);
        let kept = self
            .selected_calendar
            .filter(|id| self.calendars.iter().any(|c| c.id == *id));
        let first = self.calendars.first().map(|c| c.id);
        self.selected_calendar = kept.or(default).or(first);
        self.remember_selection();
        self.recount();

        info!(
            calendars = self.calendars.len(),
            tasks = self.tasks.len(),
            projects = self.projects.len(),
            "loaded user data"
        );
        true
    }

    // ---- calendars ----

    /// The first calendar a user creates becomes the default one. The new
    /// calendar is selected.
    #[tracing::instrument(skip(self))]
    pub async fn create_calendar(&mut self, input: &CalendarInput) -> Option<CalendarId> {
        let user = self.require_user()?;
        let client = self.ctx.client.clone();
        let payload = NewCalendar {
            name: input.name.clone(),
            description: input.description.clone(),
            color: input.color.clone(),
            is_default: self.calendars.is_empty(),
        };

        match client.insert_calendar(user, &payload).await {
            Ok(row) => {
                let item = CalendarItem::from(row);
                let id = item.id;
                self.calendars.push(item);
                self.selected_calendar = Some(id);
                self.remember_selection();
                self.recount();
                self.succeed(Key::CalendarCreated, &input.name);
                Some(id)
            }
            Err(err) => {
                self.fail(Key::CreateCalendarFailed, "create calendar", &err);
                None
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_calendar(&mut self, id: CalendarId, input: &CalendarInput) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        let client = self.ctx.client.clone();
        let patch = CalendarPatch {
            name: Some(input.name.clone()),
            description: Some(input.description.clone().unwrap_or_default()),
            color: Some(input.color.clone()),
            is_default: None,
        };

        match client.update_calendar(id, &patch).await {
            Ok(row) => {
                let tasks = self.calendar(id).map(|c| c.tasks).unwrap_or_default();
                if let Some(slot) = self.calendars.iter_mut().find(|c| c.id == id) {
                    *slot = CalendarItem { tasks, ..CalendarItem::from(row) };
                }
                self.succeed(Key::CalendarUpdated, &input.name);
                true
            }
            Err(err) => {
                self.fail(Key::UpdateCalendarFailed, "update calendar", &err);
                false
            }
        }
    }

    /// Removes the calendar along with its tasks and projects.
    #[tracing::instrument(skip(self))]
    pub async fn delete_calendar(&mut self, id: CalendarId) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        let Some(name) = self.calendar(id).map(|c| c.name.clone()) else {
            warn!(calendar = %id, "delete requested for unknown calendar");
            return false;
        };
        let client = self.ctx.client.clone();

        match client.delete_calendar(id).await {
            Ok(()) => {
                self.calendars.retain(|c| c.id != id);
                self.tasks.retain(|t| t.calendar != id);
                self.projects.retain(|p| p.calendar != Some(id));
                if self.selected_calendar == Some(id) {
                    self.selected_calendar = self
                        .calendars
                        .iter()
                        .find(|c| c.is_default)
                        .or_else(|| self.calendars.first())
                        .map(|c| c.id);
                    self.remember_selection();
                }
                self.recount();
                self.succeed(Key::CalendarDeleted, &name);
                true
            }
            Err(err) => {
                self.fail(Key::DeleteCalendarFailed, "delete calendar", &err);
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_default_calendar(&mut self, id: CalendarId) -> bool {
        let Some(user) = self.require_user() else {
            return false;
        };
        let client = self.ctx.client.clone();

        match client.set_default_calendar(user, id).await {
            Ok(rows) => {
                for calendar in &mut self.calendars {
                    calendar.is_default = rows.iter().any(|row| row.id == calendar.id && row.is_default);
                }
                let name = self.calendar(id).map(|c| c.name.clone()).unwrap_or_default();
                self.succeed(Key::DefaultCalendarSet, &name);
                true
            }
            Err(err) => {
                self.fail(Key::UpdateCalendarFailed, "set default calendar", &err);
                false
            }
        }
    }

    pub fn select_calendar(&mut self, id: CalendarId) -> bool {
        if self.calendar(id).is_none() {
            return false;
        }
        self.selected_calendar = Some(id);
        self.remember_selection();
        true
    }

    // ---- tasks ----

    /// Files the task under the selected calendar.
    #[tracing::instrument(skip(self, fields), fields(title = %fields.title))]
    pub async fn create_task(&mut self, fields: &TaskFields) -> Option<TaskId> {
        let user = self.require_user()?;
        let Some(calendar) = self.selected_calendar else {
            warn!("no calendar selected for new task");
            self.toasts.error(self.ctx.i18n.t(Key::CreateTaskFailed));
            return None;
        };
        let client = self.ctx.client.clone();

        match client.insert_task(user, calendar, fields).await {
            Ok(row) => {
                let task = Task::from_row(row, self.today());
                let id = task.id;
                self.tasks.insert(0, task);
                self.recount();
                self.succeed(Key::TaskCreated, &fields.title);
                Some(id)
            }
            Err(err) => {
                self.fail(Key::CreateTaskFailed, "create task", &err);
                None
            }
        }
    }

    #[tracing::instrument(skip(self, fields), fields(title = %fields.title))]
    pub async fn update_task(&mut self, id: TaskId, fields: &TaskFields) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        let client = self.ctx.client.clone();

        match client.update_task(id, &TaskPatch::from(fields.clone())).await {
            Ok(row) => {
                self.replace_task(Task::from_row(row, self.today()));
                self.succeed(Key::TaskUpdated, &fields.title);
                true
            }
            Err(err) => {
                self.fail(Key::UpdateTaskFailed, "update task", &err);
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn toggle_task(&mut self, id: TaskId) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        let Some(task) = self.task(id).cloned() else {
            return false;
        };
        let client = self.ctx.client.clone();
        let patch = TaskPatch {
            completed: Some(!task.completed),
            ..TaskPatch::default()
        };

        match client.update_task(id, &patch).await {
            Ok(row) => {
                let updated = Task::from_row(row, self.today());
                let key = if updated.completed {
                    Key::TaskCompleted
                } else {
                    Key::TaskReopened
                };
                self.replace_task(updated);
                self.succeed(key, &task.title);
                true
            }
            Err(err) => {
                self.fail(Key::UpdateTaskFailed, "toggle task", &err);
                false
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&mut self, id: TaskId) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        let Some(title) = self.task(id).map(|t| t.title.clone()) else {
            return false;
        };
        let client = self.ctx.client.clone();

        match client.delete_task(id).await {
            Ok(()) => {
                self.tasks.retain(|t| t.id != id);
                self.recount();
                self.succeed(Key::TaskDeleted, &title);
                true
            }
            Err(err) => {
                self.fail(Key::DeleteTaskFailed, "delete task", &err);
                false
            }
        }
    }

    pub fn set_task_filter(&mut self, filter: TaskFilter) {
        self.task_filter = filter;
    }

    fn replace_task(&mut self, task: Task) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
        self.recount();
    }

    // ---- projects ----

    /// Files the project under the selected calendar.
    #[tracing::instrument(skip(self, fields), fields(title = %fields.title))]
    pub async fn create_project(&mut self, fields: &ProjectFields) -> Option<ProjectId> {
        let calendar = self.selected_calendar;
        self.insert_project(fields.clone(), calendar, Key::ProjectCreated).await
    }

    /// Opens the edit form for `id`, prefilled.
    pub fn edit_project(&mut self, id: ProjectId) -> Option<ProjectDraft> {
        let draft = ProjectDraft::from_project(self.project(id)?);
        self.editing_project = Some(id);
        Some(draft)
    }

    pub fn cancel_edit(&mut self) {
        self.editing_project = None;
    }

    #[tracing::instrument(skip(self, fields), fields(title = %fields.title))]
    pub async fn update_project(&mut self, id: ProjectId, fields: &ProjectFields) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        let fields = fields.clone().normalized();
        let client = self.ctx.client.clone();

        match client.update_project(id, &fields).await {
            Ok(row) => {
                self.replace_project(Project::from_row(row, self.today()));
                if self.editing_project == Some(id) {
                    self.editing_project = None;
                }
                self.succeed(Key::ProjectUpdated, &fields.title);
                true
            }
            Err(err) => {
                self.fail(Key::UpdateProjectFailed, "update project", &err);
                false
            }
        }
    }

    /// Creates `"<title> <copy suffix>"` in the same calendar, progress
    /// reset and every milestone reopened.
    #[tracing::instrument(skip(self))]
    pub async fn duplicate_project(&mut self, id: ProjectId) -> Option<ProjectId> {
        let source = self.project(id)?;
        let copy = progress::duplicate_of(source, self.ctx.i18n.t(Key::CopySuffix));
        let calendar = source.calendar.or(self.selected_calendar);
        self.insert_project(ProjectFields::from(&copy), calendar, Key::ProjectDuplicated)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_project(&mut self, id: ProjectId) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        let Some(title) = self.project(id).map(|p| p.title.clone()) else {
            return false;
        };
        let client = self.ctx.client.clone();

        match client.delete_project(id).await {
            Ok(()) => {
                self.projects.retain(|p| p.id != id);
                if self.editing_project == Some(id) {
                    self.editing_project = None;
                }
                self.succeed(Key::ProjectDeleted, &title);
                true
            }
            Err(err) => {
                self.fail(Key::DeleteProjectFailed, "delete project", &err);
                false
            }
        }
    }

    /// Flips milestone `index` and stores the recomputed progress. An
    /// out-of-range index changes nothing.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_milestone(&mut self, id: ProjectId, index: usize) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        let Some(updated) = self
            .project(id)
            .and_then(|project| progress::toggle_milestone(project, index))
        else {
            debug!(project = %id, index, "milestone toggle ignored");
            return false;
        };
        let client = self.ctx.client.clone();

        match client.update_project(id, &ProjectFields::from(&updated)).await {
            Ok(row) => {
                self.replace_project(Project::from_row(row, self.today()));
                true
            }
            Err(err) => {
                self.fail(Key::UpdateProjectFailed, "toggle milestone", &err);
                false
            }
        }
    }

    async fn insert_project(
        &mut self,
        fields: ProjectFields,
        calendar: Option<CalendarId>,
        success: Key,
    ) -> Option<ProjectId> {
        let user = self.require_user()?;
        let Some(calendar) = calendar else {
            warn!("no calendar selected for new project");
            self.toasts.error(self.ctx.i18n.t(Key::CreateProjectFailed));
            return None;
        };
        let fields = fields.normalized();
        let client = self.ctx.client.clone();

        match client.insert_project(user, calendar, &fields).await {
            Ok(row) => {
                let project = Project::from_row(row, self.today());
                let id = project.id;
                self.projects.insert(0, project);
                self.succeed(success, &fields.title);
                Some(id)
            }
            Err(err) => {
                self.fail(Key::CreateProjectFailed, "create project", &err);
                None
            }
        }
    }

    fn replace_project(&mut self, project: Project) {
        if let Some(slot) = self.projects.iter_mut().find(|p| p.id == project.id) {
            *slot = project;
        }
    }

    // ---- navigation ----

    pub fn set_view(&mut self, view: AppView) {
        self.view = view;
    }

    /// What "new" creates from the current view. Clears any project being edited.
    pub fn new_intent(&mut self) -> NewIntent {
        let intent = NewIntent::for_view(self.view);
        if intent == NewIntent::Project {
            self.editing_project = None;
        }
        intent
    }

    // ---- search ----

    /// Searches every calendar, not only the selected one.
    pub fn set_search_term(&mut self, term: &str) {
        self.search.set_term(term, &self.tasks, &self.projects);
    }

    pub fn submit_search(&mut self) {
        self.search.submit(&self.tasks, &self.projects);
    }

    pub fn close_search(&mut self) {
        self.search.close();
    }

    // ---- collaborators ----

    /// There is no invitations table; the invitation is logged and acknowledged.
    #[tracing::instrument(skip(self, invitation))]
    pub fn invite(&mut self, invitation: &Invitation) -> bool {
        if self.require_user().is_none() {
            return false;
        }
        info!(
            emails = ?invitation.emails,
            role = invitation.role.as_str(),
            calendars = invitation.calendars.len(),
            projects = invitation.projects.len(),
            "sending invitations"
        );
        let message = self.ctx.i18n.tf(
            Key::InvitationsSent,
            &[("count", &invitation.emails.len().to_string())],
        );
        self.toasts.info(message);
        true
    }

    // ---- language ----

    pub fn set_language(&mut self, language: Language) -> bool {
        match self.ctx.set_language(language) {
            Ok(()) => {
                let name = self.ctx.i18n.language_name(language);
                let message = self.ctx.i18n.tf(Key::LanguageChanged, &[("language", name)]);
                self.toasts.success(message);
                true
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "failed to store language");
                self.toasts.error(self.ctx.i18n.t(Key::GenericError));
                false
            }
        }
    }

    // ---- tutorial ----

    pub async fn tutorial_next(&mut self) -> TutorialMove {
        if !self.show_tutorial {
            return TutorialMove::Stayed;
        }
        let step = self.tutorial.next();
        match step {
            TutorialMove::Finished => self.complete_tutorial().await,
            TutorialMove::Moved(_) => self.remember_tutorial(self.tutorial.index()),
            TutorialMove::Stayed => {}
        }
        step
    }

    pub fn tutorial_previous(&mut self) -> TutorialMove {
        if !self.show_tutorial {
            return TutorialMove::Stayed;
        }
        let step = self.tutorial.previous();
        if let TutorialMove::Moved(_) = step {
            self.remember_tutorial(self.tutorial.index());
        }
        step
    }

    pub async fn skip_tutorial(&mut self) -> TutorialMove {
        if !self.show_tutorial {
            return TutorialMove::Stayed;
        }
        let step = self.tutorial.skip();
        self.complete_tutorial().await;
        step
    }

    /// Hides the tutorial and marks it completed on the profile.
    #[tracing::instrument(skip(self))]
    async fn complete_tutorial(&mut self) {
        self.show_tutorial = false;
        self.remember_tutorial(0);
        let client = self.ctx.client.clone();
        let patch = UserPatch {
            tutorial_completed: Some(true),
            ..UserPatch::default()
        };
        if let Err(err) = self.ctx.auth.update_profile(&client, &patch).await {
            self.fail(Key::ProfileUpdateFailed, "complete tutorial", &err);
        }
    }

    // ---- helpers ----

    fn require_user(&self) -> Option<UserId> {
        let user = self.ctx.auth.user_id();
        if user.is_none() {
            debug!("ignored: not signed in");
        }
        user
    }

    fn recount(&mut self) {
        views::recount(&mut self.calendars, &self.tasks);
    }

    /// Rows whose calendar no longer exists stay hidden.
    fn drop_orphans(&mut self) {
        let known: Vec<CalendarId> = self.calendars.iter().map(|c| c.id).collect();
        let (tasks, projects) = (self.tasks.len(), self.projects.len());
        self.tasks.retain(|t| known.contains(&t.calendar));
        self.projects
            .retain(|p| p.calendar.is_none_or(|id| known.contains(&id)));
        let dropped = tasks - self.tasks.len() + projects - self.projects.len();
        if dropped > 0 {
            warn!(dropped, "skipped rows from deleted calendars");
        }
    }

    fn remember_selection(&self) {
        if let Err(err) = self.ctx.prefs.set_selected_calendar(self.selected_calendar) {
            warn!(error = %format!("{err:#}"), "failed to store calendar selection");
        }
    }

    fn remember_tutorial(&self, index: usize) {
        if let Err(err) = self.ctx.prefs.set_tutorial_step(index) {
            warn!(error = %format!("{err:#}"), "failed to store tutorial step");
        }
    }

    fn succeed(&mut self, key: Key, name: &str) {
        let message = self.ctx.i18n.tf(key, &[("name", name)]);
        self.toasts.success(message);
    }

    fn fail(&mut self, key: Key, operation: &'static str, err: &BackendError) {
        error!(operation, error = %err, "backend call failed");
        self.toasts.error(self.ctx.i18n.t(key));
    }
}
