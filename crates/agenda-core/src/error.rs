//! Errors surfaced by backend operations.

use thiserror::Error;

use crate::backend::Table;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("a user with email {0} is already registered")]
    UserExists(String),

    #[error("no {table} row matches {filter}")]
    NotFound { table: Table, filter: String },

    #[error("invalid row for {table}: {reason}")]
    InvalidRow { table: Table, reason: String },

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;
