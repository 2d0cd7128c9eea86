use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    AuthChange, AuthEvent, AuthSubscription, AuthUser, Backend, MockBehaviour, Query, Session,
    Table,
};
use crate::error::{BackendError, BackendResult};

const ACCOUNTS_FILE: &str = "accounts.data";
const SESSION_FILE: &str = "session.json";
const AUTH_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    user: AuthUser,
    salt: String,
    password_hash: String,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<Table, Vec<Value>>,
    accounts: Vec<Account>,
    session: Option<Session>,
    last_stamp: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing timestamps so creation order survives sorting.
    fn next_stamp(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp
            && now <= last
        {
            now = last + Duration::microseconds(1);
        }
        self.last_stamp = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Value> {
        self.tables.entry(table).or_default()
    }

    fn require_session(&self) -> BackendResult<()> {
        if self.session.is_some() {
            Ok(())
        } else {
            Err(BackendError::NotAuthenticated)
        }
    }
}

/// An in-process stand-in for the hosted backend.
///
/// Tables live in memory; when opened on a directory every write is mirrored
/// to `<table>.data` JSON-lines files (plus the account list and the current
/// session) so separate invocations share state.
#[derive(Debug)]
pub struct LocalBackend {
    dir: Option<PathBuf>,
    state: Mutex<State>,
    behaviour: Mutex<MockBehaviour>,
    auth_tx: broadcast::Sender<AuthEvent>,
}

impl LocalBackend {
    pub fn in_memory() -> Self {
        Self::with_state(None, State::default())
    }

    #[tracing::instrument(skip(dir))]
    pub fn open(dir: &Path) -> BackendResult<Self> {
        fs::create_dir_all(dir)?;

        let mut state = State::default();
        for table in Table::ALL {
            let rows = load_jsonl::<Value>(&table_path(dir, table))?;
            state.tables.insert(table, rows);
        }
        state.accounts = load_jsonl(&dir.join(ACCOUNTS_FILE))?;

        let session_path = dir.join(SESSION_FILE);
        if session_path.exists() {
            let raw = fs::read_to_string(&session_path)?;
            if !raw.trim().is_empty() {
                state.session = Some(serde_json::from_str(&raw)?);
            }
        }

        info!(
            data_dir = %dir.display(),
            accounts = state.accounts.len(),
            signed_in = state.session.is_some(),
            "opened local backend"
        );
        Ok(Self::with_state(Some(dir.to_path_buf()), state))
    }

    fn with_state(dir: Option<PathBuf>, state: State) -> Self {
        let (auth_tx, _) = broadcast::channel(AUTH_CHANNEL_CAPACITY);
        Self {
            dir,
            state: Mutex::new(state),
            behaviour: Mutex::new(MockBehaviour::default()),
            auth_tx,
        }
    }

    pub fn with_behaviour(self, behaviour: MockBehaviour) -> Self {
        *self.behaviour.lock() = behaviour;
        self
    }

    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        *self.behaviour.lock() = behaviour;
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn persist_table(&self, table: Table, rows: &[Value]) -> BackendResult<()> {
        match &self.dir {
            Some(dir) => save_jsonl_atomic(&table_path(dir, table), rows),
            None => Ok(()),
        }
    }

    fn persist_accounts(&self, accounts: &[Account]) -> BackendResult<()> {
        match &self.dir {
            Some(dir) => save_jsonl_atomic(&dir.join(ACCOUNTS_FILE), accounts),
            None => Ok(()),
        }
    }

    fn persist_session(&self, session: Option<&Session>) -> BackendResult<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let path = dir.join(SESSION_FILE);
        match session {
            Some(session) => {
                let mut temp = NamedTempFile::new_in(dir)?;
                serde_json::to_writer(&mut temp, session)?;
                temp.flush()?;
                temp.persist(&path).map_err(|err| err.error)?;
            }
            None => {
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            }
        }
        Ok(())
    }

    fn notify(&self, change: AuthChange, session: Option<Session>) {
        // no subscribers is not an error
        let _ = self.auth_tx.send(AuthEvent { change, session });
    }

    fn start_session(&self, state: &mut State, user: AuthUser) -> BackendResult<Session> {
        let session = Session {
            access_token: Uuid::new_v4().simple().to_string(),
            user,
            created_at: Utc::now(),
        };
        self.persist_session(Some(&session))?;
        state.session = Some(session.clone());
        Ok(session)
    }
}

#[async_trait]
impl Backend for LocalBackend {
    #[tracing::instrument(skip(self, query), fields(filter = %query.describe()))]
    async fn select(&self, table: Table, query: &Query) -> BackendResult<Vec<Value>> {
        self.behaviour.lock().can_select()?;
        let mut state = self.state.lock();
        state.require_session()?;

        let mut rows: Vec<Value> = state
            .rows_mut(table)
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        query.sort(&mut rows);
        debug!(count = rows.len(), "selected rows");
        Ok(rows)
    }

    #[tracing::instrument(skip(self, row))]
    async fn insert(&self, table: Table, row: Value) -> BackendResult<Value> {
        self.behaviour.lock().can_insert()?;
        let mut state = self.state.lock();
        state.require_session()?;

        let Value::Object(mut object) = row else {
            return Err(BackendError::InvalidRow {
                table,
                reason: "expected a JSON object".to_string(),
            });
        };

        let id = match object.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => Uuid::new_v4().to_string(),
        };
        if state
            .rows_mut(table)
            .iter()
            .any(|existing| existing.get("id").and_then(Value::as_str) == Some(id.as_str()))
        {
            return Err(BackendError::InvalidRow {
                table,
                reason: format!("duplicate id {id}"),
            });
        }

        let stamp = state.next_stamp();
        object.insert("id".to_string(), Value::String(id.clone()));
        object.insert("created_at".to_string(), Value::String(stamp.clone()));
        object.insert("updated_at".to_string(), Value::String(stamp));

        let stored = Value::Object(object);
        let mut next = state.rows_mut(table).clone();
        next.push(stored.clone());
        self.persist_table(table, &next)?;
        *state.rows_mut(table) = next;

        debug!(%id, "inserted row");
        Ok(stored)
    }

    #[tracing::instrument(skip(self, query, patch), fields(filter = %query.describe()))]
    async fn update(&self, table: Table, query: &Query, patch: Value) -> BackendResult<Vec<Value>> {
        self.behaviour.lock().can_update()?;
        let mut state = self.state.lock();
        state.require_session()?;

        let Value::Object(patch) = patch else {
            return Err(BackendError::InvalidRow {
                table,
                reason: "patch must be a JSON object".to_string(),
            });
        };

        let stamp = state.next_stamp();
        let mut next = state.rows_mut(table).clone();
        let mut updated = Vec::new();
        for row in next.iter_mut().filter(|row| query.matches(row)) {
            if let Value::Object(object) = row {
                merge_patch(object, &patch);
                object.insert("updated_at".to_string(), Value::String(stamp.clone()));
                updated.push(Value::Object(object.clone()));
            }
        }

        if updated.is_empty() {
            return Err(BackendError::NotFound {
                table,
                filter: query.describe(),
            });
        }

        self.persist_table(table, &next)?;
        *state.rows_mut(table) = next;
        debug!(count = updated.len(), "updated rows");
        Ok(updated)
    }

    #[tracing::instrument(skip(self, query), fields(filter = %query.describe()))]
    async fn delete(&self, table: Table, query: &Query) -> BackendResult<usize> {
        self.behaviour.lock().can_delete()?;
        let mut state = self.state.lock();
        state.require_session()?;

        let mut next = state.rows_mut(table).clone();
        let before = next.len();
        next.retain(|row| !query.matches(row));
        let removed = before - next.len();

        if removed > 0 {
            self.persist_table(table, &next)?;
            *state.rows_mut(table) = next;
        }
        debug!(removed, "deleted rows");
        Ok(removed)
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthUser> {
        self.behaviour.lock().can_authenticate()?;
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(BackendError::InvalidCredentials);
        }

        let session = {
            let mut state = self.state.lock();
            if state.accounts.iter().any(|a| a.user.email == email) {
                return Err(BackendError::UserExists(email));
            }

            let salt = Uuid::new_v4().simple().to_string();
            let account = Account {
                user: AuthUser {
                    id: Uuid::new_v4(),
                    email: email.clone(),
                },
                password_hash: hash_password(&salt, password),
                salt,
            };
            state.accounts.push(account.clone());
            let accounts = state.accounts.clone();
            self.persist_accounts(&accounts)?;

            // new accounts are confirmed and signed in right away
            self.start_session(&mut state, account.user)?
        };

        info!(user = %session.user.id, "account created");
        let user = session.user.clone();
        self.notify(AuthChange::SignedIn, Some(session));
        Ok(user)
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.behaviour.lock().can_authenticate()?;
        let email = normalize_email(email);

        let session = {
            let mut state = self.state.lock();
            let account = state
                .accounts
                .iter()
                .find(|a| a.user.email == email)
                .cloned()
                .ok_or(BackendError::InvalidCredentials)?;
            if hash_password(&account.salt, password) != account.password_hash {
                warn!("password mismatch");
                return Err(BackendError::InvalidCredentials);
            }
            self.start_session(&mut state, account.user)?
        };

        info!(user = %session.user.id, "signed in");
        self.notify(AuthChange::SignedIn, Some(session.clone()));
        Ok(session)
    }

    #[tracing::instrument(skip(self))]
    async fn sign_out(&self) -> BackendResult<()> {
        let previous = {
            let mut state = self.state.lock();
            self.persist_session(None)?;
            state.session.take()
        };
        if let Some(previous) = previous {
            info!(user = %previous.user.id, "signed out");
            self.notify(AuthChange::SignedOut, None);
        }
        Ok(())
    }

    async fn get_session(&self) -> BackendResult<Option<Session>> {
        Ok(self.state.lock().session.clone())
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.auth_tx.subscribe()
    }
}

fn merge_patch(object: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if matches!(key.as_str(), "id" | "created_at" | "updated_at") {
            continue;
        }
        object.insert(key.clone(), value.clone());
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn table_path(dir: &Path, table: Table) -> PathBuf {
    dir.join(format!("{table}.data"))
}

#[tracing::instrument(skip(path))]
fn load_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> BackendResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    debug!(file = %path.display(), "loading jsonl");
    let reader = BufReader::new(fs::File::open(path)?);

    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.push(serde_json::from_str(trimmed)?);
    }
    debug!(count = out.len(), "loaded jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, items))]
fn save_jsonl_atomic<T: Serialize>(path: &Path, items: &[T]) -> BackendResult<()> {
    debug!(file = %path.display(), count = items.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for item in items {
        let serialized = serde_json::to_string(item)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
            .block_on(fut)
    }

    #[test]
    fn table_writes_require_a_session() {
        let backend = LocalBackend::in_memory();
        let err = block_on(backend.insert(Table::Tasks, json!({"title": "x"})))
            .expect_err("no session yet");
        assert!(matches!(err, BackendError::NotAuthenticated));
    }

    #[test]
    fn insert_stamps_id_and_timestamps() {
        let backend = LocalBackend::in_memory();
        block_on(async {
            backend.sign_up("ana@example.com", "secret").await.expect("sign up");
            let first = backend
                .insert(Table::Calendars, json!({"name": "Work"}))
                .await
                .expect("insert");
            let second = backend
                .insert(Table::Calendars, json!({"name": "Home"}))
                .await
                .expect("insert");

            assert!(first["id"].as_str().is_some());
            assert_eq!(first["created_at"], first["updated_at"]);
            assert!(second["created_at"].as_str() > first["created_at"].as_str());
        });
    }

    #[test]
    fn update_ignores_identity_columns() {
        let backend = LocalBackend::in_memory();
        block_on(async {
            backend.sign_up("ana@example.com", "secret").await.expect("sign up");
            let row = backend
                .insert(Table::Tasks, json!({"title": "Draft"}))
                .await
                .expect("insert");
            let id = row["id"].clone();

            let updated = backend
                .update(
                    Table::Tasks,
                    &Query::new().eq("id", id.clone()),
                    json!({"id": "other", "completed": true}),
                )
                .await
                .expect("update");
            assert_eq!(updated.len(), 1);
            assert_eq!(updated[0]["id"], id);
            assert_eq!(updated[0]["completed"], true);

            let missing = backend
                .update(Table::Tasks, &Query::new().eq("id", "nope"), json!({}))
                .await
                .expect_err("nothing to update");
            assert!(matches!(missing, BackendError::NotFound { .. }));
        });
    }

    #[test]
    fn wrong_password_is_rejected() {
        let backend = LocalBackend::in_memory();
        block_on(async {
            backend.sign_up("Ana@Example.com ", "secret").await.expect("sign up");
            backend.sign_out().await.expect("sign out");

            let err = backend
                .sign_in_with_password("ana@example.com", "nope")
                .await
                .expect_err("bad password");
            assert!(matches!(err, BackendError::InvalidCredentials));

            let session = backend
                .sign_in_with_password("ana@example.com", "secret")
                .await
                .expect("good password");
            assert_eq!(session.user.email, "ana@example.com");

            let dup = backend
                .sign_up("ana@example.com", "again")
                .await
                .expect_err("duplicate account");
            assert!(matches!(dup, BackendError::UserExists(_)));
        });
    }

    #[test]
    fn auth_changes_are_broadcast() {
        let backend = LocalBackend::in_memory();
        let mut rx = backend.on_auth_state_change();
        block_on(async {
            backend.sign_up("ana@example.com", "secret").await.expect("sign up");
            backend.sign_out().await.expect("sign out");
        });

        let signed_in = rx.try_recv().expect("sign-in event");
        assert_eq!(signed_in.change, AuthChange::SignedIn);
        assert!(signed_in.session.is_some());
        let signed_out = rx.try_recv().expect("sign-out event");
        assert_eq!(signed_out.change, AuthChange::SignedOut);
        assert!(signed_out.session.is_none());
    }

    #[test]
    fn reopening_a_directory_restores_rows_and_session() {
        let temp = tempfile::tempdir().expect("tempdir");
        block_on(async {
            let backend = LocalBackend::open(temp.path()).expect("open");
            backend.sign_up("ana@example.com", "secret").await.expect("sign up");
            backend
                .insert(Table::Projects, json!({"title": "Launch"}))
                .await
                .expect("insert");
        });

        let reopened = LocalBackend::open(temp.path()).expect("reopen");
        block_on(async {
            let session = reopened.get_session().await.expect("session");
            assert_eq!(
                session.map(|s| s.user.email),
                Some("ana@example.com".to_string())
            );
            let rows = reopened
                .select(Table::Projects, &Query::new())
                .await
                .expect("select");
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["title"], "Launch");
        });
        assert!(temp.path().join("projects.data").exists());
    }

    #[test]
    fn failed_disk_write_leaves_rows_untouched() {
        let temp = tempfile::tempdir().expect("tempdir");
        let backend = LocalBackend::open(temp.path()).expect("open");
        block_on(async {
            backend.sign_up("ana@example.com", "secret").await.expect("sign up");
            let kept = backend
                .insert(Table::Tasks, json!({"title": "Draft"}))
                .await
                .expect("insert");

            // a directory in place of the table file makes the rename fail
            let path = table_path(temp.path(), Table::Tasks);
            fs::remove_file(&path).expect("remove table file");
            fs::create_dir(&path).expect("block table file");
            fs::write(path.join("lock"), b"").expect("fill directory");

            backend
                .insert(Table::Tasks, json!({"title": "Lost"}))
                .await
                .expect_err("insert cannot persist");
            backend
                .update(
                    Table::Tasks,
                    &Query::new().eq("id", kept["id"].clone()),
                    json!({"completed": true}),
                )
                .await
                .expect_err("update cannot persist");
            backend
                .delete(Table::Tasks, &Query::new())
                .await
                .expect_err("delete cannot persist");

            let rows = backend
                .select(Table::Tasks, &Query::new())
                .await
                .expect("select");
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["title"], "Draft");
            assert_eq!(rows[0]["completed"], kept["completed"]);
        });
    }
}
