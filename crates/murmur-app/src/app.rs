use anyhow::{Context, Result};
use tracing::info;

use murmur_api::{AppState, AppStateInner};
use murmur_db::Database;

use crate::config::AppConfig;
use crate::session::Session;
use crate::telemetry;

/// Owns the store for the lifetime of the application.
pub struct App {
    state: AppState,
    config: AppConfig,
}

impl App {
    /// Open (creating and migrating if needed) the database. Failure here is fatal.
    pub fn start(config: AppConfig) -> Result<Self> {
        let db = Database::open(&config.db_path).with_context(|| {
            format!("failed to open database at {}", config.db_path.display())
        })?;

        info!(
            "Murmur started (db: {}, poll interval: {:?})",
            config.db_path.display(),
            config.poll_interval
        );
        Ok(Self {
            state: AppStateInner::new(db),
            config,
        })
    }

    /// Logging, `.env`, config and store in one call.
    pub fn from_env() -> Result<Self> {
        telemetry::init_tracing();
        let config = AppConfig::from_env()?;
        Self::start(config)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// A fresh, logged-out session.
    pub fn session(&self) -> Session {
        Session::new(self.state.clone(), self.config.poll_interval)
    }

    /// The connection closes once the last session or poller holding the
    /// state is gone.
    pub fn shutdown(self) {
        info!(
            "Murmur shutting down ({} outstanding handles)",
            std::sync::Arc::strong_count(&self.state) - 1
        );
    }
}
