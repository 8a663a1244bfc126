use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE constraint rejected the write. Holds the raw SQLite message.
    #[error("{0}")]
    UniqueViolation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Migration v{version} failed: {source}")]
    Migration {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if is_unique_violation(&err) {
            DbError::UniqueViolation(err.to_string())
        } else {
            DbError::Sqlite(err)
        }
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}
