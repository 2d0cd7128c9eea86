//! The hosted auth + database collaborator, seen as a remote object store.
//!
//! [`Backend`] is the raw, table-style surface: rows travel as JSON objects and
//! queries are equality filters with an optional ordering column. The typed
//! [`client::BackendClient`] sits on top of it and owns the row shapes in
//! [`rows`]. [`local::LocalBackend`] implements the trait against in-memory
//! tables that can be mirrored to a data directory.

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::BackendResult;

pub mod client;
pub mod local;
pub mod mock_behaviour;
pub mod rows;

pub use client::BackendClient;
pub use local::LocalBackend;
pub use mock_behaviour::MockBehaviour;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Users,
    Calendars,
    Tasks,
    Projects,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Users, Table::Calendars, Table::Tasks, Table::Projects];

    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Calendars => "calendars",
            Table::Tasks => "tasks",
            Table::Projects => "projects",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Equality filters plus an optional ordering column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }

    /// Stable sort of `rows` by the ordering column, if any.
    pub fn sort(&self, rows: &mut [Value]) {
        let Some(order) = &self.order else {
            return;
        };
        rows.sort_by(|a, b| {
            let ord = compare_values(a.get(&order.column), b.get(&order.column));
            if order.ascending { ord } else { ord.reverse() }
        });
    }

    pub fn describe(&self) -> String {
        if self.filters.is_empty() {
            return "*".to_string();
        }
        self.filters
            .iter()
            .map(|(column, value)| format!("{column}={value}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// The identity the auth service knows about; profile data lives in `users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn,
    SignedOut,
    UserUpdated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub change: AuthChange,
    pub session: Option<Session>,
}

pub type AuthSubscription = broadcast::Receiver<AuthEvent>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows of `table` matching `query`, ordered as requested
    async fn select(&self, table: Table, query: &Query) -> BackendResult<Vec<Value>>;
    /// Stores `row` and returns it as persisted, with `id`, `created_at` and `updated_at` filled in
    async fn insert(&self, table: Table, row: Value) -> BackendResult<Value>;
    /// Merges `patch` into every matching row and returns the updated rows
    async fn update(&self, table: Table, query: &Query, patch: Value) -> BackendResult<Vec<Value>>;
    /// Removes every matching row and returns how many were removed
    async fn delete(&self, table: Table, query: &Query) -> BackendResult<usize>;

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthUser>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BackendResult<Session>;
    async fn sign_out(&self) -> BackendResult<()>;
    async fn get_session(&self) -> BackendResult<Option<Session>>;

    /// Subscribe to sign-in/sign-out notifications. Dropping the receiver unsubscribes.
    fn on_auth_state_change(&self) -> AuthSubscription;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_matches_all_filters() {
        let query = Query::new().eq("user_id", "u1").eq("completed", false);
        assert!(query.matches(&json!({"user_id": "u1", "completed": false, "title": "x"})));
        assert!(!query.matches(&json!({"user_id": "u1", "completed": true})));
        assert!(!query.matches(&json!({"completed": false})));
    }

    #[test]
    fn descending_sort_is_stable_for_ties() {
        let mut rows = vec![
            json!({"n": "a", "created_at": "2024-01-01"}),
            json!({"n": "b", "created_at": "2024-03-01"}),
            json!({"n": "c", "created_at": "2024-01-01"}),
        ];
        Query::new().order("created_at", false).sort(&mut rows);
        let names: Vec<_> = rows.iter().map(|r| r["n"].as_str().unwrap_or_default()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
