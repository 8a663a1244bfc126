use murmur_db::DbError;
use thiserror::Error;

/// Failures returned to callers. `Display` is the user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Username or email already exists")]
    AccountExists,

    /// Unknown username and wrong password are deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Not logged in")]
    Unauthenticated,

    /// Raw reason from the store.
    #[error("{0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Store(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {}", err))
    }
}
