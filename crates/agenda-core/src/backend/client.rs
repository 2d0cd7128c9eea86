use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::rows::{
    CalendarPatch, CalendarRow, NewCalendar, NewUser, ProjectFields, ProjectRow, TaskFields,
    TaskPatch, TaskRow, UserPatch, UserRow,
};
use super::{AuthSubscription, AuthUser, Backend, Query, Session, Table};
use crate::error::{BackendError, BackendResult};
use crate::model::{CalendarId, ProjectId, TaskId, UserId};

/// Typed access to the four tables and the auth service.
#[derive(Clone)]
pub struct BackendClient {
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient").finish_non_exhaustive()
    }
}

impl BackendClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    // ---- auth ----

    pub async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthUser> {
        self.backend.sign_up(email, password).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.backend.sign_in_with_password(email, password).await
    }

    pub async fn sign_out(&self) -> BackendResult<()> {
        self.backend.sign_out().await
    }

    pub async fn session(&self) -> BackendResult<Option<Session>> {
        self.backend.get_session().await
    }

    pub fn subscribe(&self) -> AuthSubscription {
        self.backend.on_auth_state_change()
    }

    // ---- users ----

    pub async fn fetch_user(&self, id: UserId) -> BackendResult<UserRow> {
        let query = by_id(id);
        let rows = self.backend.select(Table::Users, &query).await?;
        single(Table::Users, &query, rows)
    }

    pub async fn insert_user(&self, user: &NewUser) -> BackendResult<UserRow> {
        let row = self.backend.insert(Table::Users, to_row(user)?).await?;
        decode(Table::Users, row)
    }

    pub async fn update_user(&self, id: UserId, patch: &UserPatch) -> BackendResult<UserRow> {
        let query = by_id(id);
        let rows = self.backend.update(Table::Users, &query, to_row(patch)?).await?;
        single(Table::Users, &query, rows)
    }

    // ---- calendars ----

    /// Oldest first.
    pub async fn list_calendars(&self, user: UserId) -> BackendResult<Vec<CalendarRow>> {
        let query = owned_by(user).order("created_at", true);
        let rows = self.backend.select(Table::Calendars, &query).await?;
        decode_all(Table::Calendars, rows)
    }

    pub async fn insert_calendar(
        &self,
        user: UserId,
        calendar: &NewCalendar,
    ) -> BackendResult<CalendarRow> {
        let row = with_owner(to_row(calendar)?, user, None);
        let row = self.backend.insert(Table::Calendars, row).await?;
        decode(Table::Calendars, row)
    }

    pub async fn update_calendar(
        &self,
        id: CalendarId,
        patch: &CalendarPatch,
    ) -> BackendResult<CalendarRow> {
        let query = by_id(id);
        let rows = self
            .backend
            .update(Table::Calendars, &query, to_row(patch)?)
            .await?;
        single(Table::Calendars, &query, rows)
    }

    /// Flags `id` as the default calendar and clears the flag on the others.
    pub async fn set_default_calendar(
        &self,
        user: UserId,
        id: CalendarId,
    ) -> BackendResult<Vec<CalendarRow>> {
        let mine = self.list_calendars(user).await?;
        if !mine.iter().any(|c| c.id == id) {
            return Err(BackendError::NotFound {
                table: Table::Calendars,
                filter: by_id(id).describe(),
            });
        }

        for other in mine.iter().filter(|c| c.is_default && c.id != id) {
            self.backend
                .update(Table::Calendars, &by_id(other.id), json!({"is_default": false}))
                .await?;
        }
        self.backend
            .update(Table::Calendars, &by_id(id), json!({"is_default": true}))
            .await?;
        self.list_calendars(user).await
    }

    /// Removes the calendar, then its tasks and projects.
    ///
    /// Once the calendar row is gone the call succeeds. Rows the cascade
    /// could not remove are orphans and are skipped when user data loads.
    pub async fn delete_calendar(&self, id: CalendarId) -> BackendResult<()> {
        let removed = self.backend.delete(Table::Calendars, &by_id(id)).await?;
        if removed == 0 {
            return Err(BackendError::NotFound {
                table: Table::Calendars,
                filter: by_id(id).describe(),
            });
        }

        let in_calendar = Query::new().eq("calendar_id", id.to_string());
        for table in [Table::Tasks, Table::Projects] {
            match self.backend.delete(table, &in_calendar).await {
                Ok(count) => debug!(calendar = %id, ?table, count, "cascaded calendar delete"),
                Err(err) => {
                    warn!(calendar = %id, ?table, error = %err, "calendar cascade left orphaned rows")
                }
            }
        }
        debug!(calendar = %id, "deleted calendar");
        Ok(())
    }

    // ---- tasks ----

    /// Newest first.
    pub async fn list_tasks(&self, user: UserId) -> BackendResult<Vec<TaskRow>> {
        let query = owned_by(user).order("created_at", false);
        let rows = self.backend.select(Table::Tasks, &query).await?;
        decode_all(Table::Tasks, rows)
    }

    pub async fn insert_task(
        &self,
        user: UserId,
        calendar: CalendarId,
        task: &TaskFields,
    ) -> BackendResult<TaskRow> {
        let row = with_owner(to_row(task)?, user, Some(calendar));
        let row = self.backend.insert(Table::Tasks, row).await?;
        decode(Table::Tasks, row)
    }

    pub async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> BackendResult<TaskRow> {
        let query = by_id(id);
        let rows = self.backend.update(Table::Tasks, &query, to_row(patch)?).await?;
        single(Table::Tasks, &query, rows)
    }

    pub async fn delete_task(&self, id: TaskId) -> BackendResult<()> {
        self.delete_one(Table::Tasks, id).await
    }

    // ---- projects ----

    /// Newest first.
    pub async fn list_projects(&self, user: UserId) -> BackendResult<Vec<ProjectRow>> {
        let query = owned_by(user).order("created_at", false);
        let rows = self.backend.select(Table::Projects, &query).await?;
        decode_all(Table::Projects, rows)
    }

    pub async fn insert_project(
        &self,
        user: UserId,
        calendar: CalendarId,
        project: &ProjectFields,
    ) -> BackendResult<ProjectRow> {
        let row = with_owner(to_row(project)?, user, Some(calendar));
        let row = self.backend.insert(Table::Projects, row).await?;
        decode(Table::Projects, row)
    }

    pub async fn update_project(
        &self,
        id: ProjectId,
        project: &ProjectFields,
    ) -> BackendResult<ProjectRow> {
        let query = by_id(id);
        let rows = self
            .backend
            .update(Table::Projects, &query, to_row(project)?)
            .await?;
        single(Table::Projects, &query, rows)
    }

    pub async fn delete_project(&self, id: ProjectId) -> BackendResult<()> {
        self.delete_one(Table::Projects, id).await
    }

    async fn delete_one(&self, table: Table, id: uuid::Uuid) -> BackendResult<()> {
        let query = by_id(id);
        match self.backend.delete(table, &query).await? {
            0 => Err(BackendError::NotFound {
                table,
                filter: query.describe(),
            }),
            _ => Ok(()),
        }
    }
}

fn by_id(id: uuid::Uuid) -> Query {
    Query::new().eq("id", id.to_string())
}

fn owned_by(user: UserId) -> Query {
    Query::new().eq("user_id", user.to_string())
}

fn with_owner(mut row: Value, user: UserId, calendar: Option<CalendarId>) -> Value {
    if let Value::Object(object) = &mut row {
        object.insert("user_id".to_string(), Value::String(user.to_string()));
        if let Some(calendar) = calendar {
            object.insert("calendar_id".to_string(), Value::String(calendar.to_string()));
        }
    }
    row
}

fn to_row<T: Serialize>(value: &T) -> BackendResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn decode<T: DeserializeOwned>(table: Table, row: Value) -> BackendResult<T> {
    serde_json::from_value(row).map_err(|err| BackendError::InvalidRow {
        table,
        reason: err.to_string(),
    })
}

fn decode_all<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> BackendResult<Vec<T>> {
    rows.into_iter().map(|row| decode(table, row)).collect()
}

fn single<T: DeserializeOwned>(table: Table, query: &Query, rows: Vec<Value>) -> BackendResult<T> {
    let row = rows.into_iter().next().ok_or_else(|| BackendError::NotFound {
        table,
        filter: query.describe(),
    })?;
    decode(table, row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use crate::model::Priority;

    async fn signed_in() -> (BackendClient, UserId) {
        let client = BackendClient::new(Arc::new(LocalBackend::in_memory()));
        let user = client
            .sign_up("ana@example.com", "secret")
            .await
            .expect("sign up");
        (client, user.id)
    }

    fn calendar(name: &str) -> NewCalendar {
        NewCalendar {
            name: name.to_string(),
            description: None,
            color: "bg-blue-500".to_string(),
            is_default: false,
        }
    }

    fn task(title: &str) -> TaskFields {
        TaskFields {
            title: title.to_string(),
            description: None,
            completed: false,
            priority: Priority::Medium,
            due_date: None,
            assignee_name: None,
            assignee_avatar: None,
            project_name: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn calendars_listed_oldest_first_and_tasks_newest_first() {
        let (client, user) = signed_in().await;
        let work = client.insert_calendar(user, &calendar("Work")).await.expect("insert");
        client.insert_calendar(user, &calendar("Home")).await.expect("insert");

        let names: Vec<_> = client
            .list_calendars(user)
            .await
            .expect("list")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Work", "Home"]);

        client.insert_task(user, work.id, &task("first")).await.expect("insert");
        client.insert_task(user, work.id, &task("second")).await.expect("insert");
        let titles: Vec<_> = client
            .list_tasks(user)
            .await
            .expect("list")
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn set_default_clears_other_flags() {
        let (client, user) = signed_in().await;
        let mut first = calendar("Work");
        first.is_default = true;
        let work = client.insert_calendar(user, &first).await.expect("insert");
        let home = client.insert_calendar(user, &calendar("Home")).await.expect("insert");

        let rows = client.set_default_calendar(user, home.id).await.expect("set default");
        let defaults: Vec<_> = rows.iter().filter(|c| c.is_default).map(|c| c.id).collect();
        assert_eq!(defaults, vec![home.id]);
        assert!(rows.iter().any(|c| c.id == work.id && !c.is_default));
    }

    #[tokio::test]
    async fn deleting_calendar_cascades() {
        let (client, user) = signed_in().await;
        let work = client.insert_calendar(user, &calendar("Work")).await.expect("insert");
        let home = client.insert_calendar(user, &calendar("Home")).await.expect("insert");
        client.insert_task(user, work.id, &task("a")).await.expect("insert");
        client.insert_task(user, home.id, &task("b")).await.expect("insert");

        client.delete_calendar(work.id).await.expect("delete");

        let tasks = client.list_tasks(user).await.expect("list");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].calendar_id, home.id);
        assert!(client.delete_calendar(work.id).await.is_err());
    }
}
