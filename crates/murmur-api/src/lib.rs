pub mod account;
pub mod auth;
pub mod error;
pub mod messages;
pub mod reactions;
pub mod users;
pub mod validation;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{error, warn};

use murmur_db::Database;

/// Run a blocking store call off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::from(e)
        })?
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS[.SSS]" without timezone.
/// Parse as naive UTC; corrupt values fall back to the epoch.
pub(crate) fn parse_db_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|ndt| ndt.and_utc())
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, owner, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_both_timestamp_shapes() {
        let precise = parse_db_timestamp("2024-05-01 10:20:30.125", "test");
        assert_eq!(precise.nanosecond(), 125_000_000);

        let legacy = parse_db_timestamp("2024-05-01 10:20:30", "test");
        assert_eq!(legacy.second(), 30);

        assert_eq!(parse_db_timestamp("garbage", "test"), DateTime::<Utc>::default());
    }
}
