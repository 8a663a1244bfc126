use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use murmur_db::DEFAULT_DB_NAME;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// How often an open chat refetches its conversation.
    pub poll_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_NAME),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl AppConfig {
    /// Load .env if present, then read `MURMUR_*` variables.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("MURMUR_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let poll_interval = match lookup("MURMUR_POLL_INTERVAL_MS") {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("MURMUR_POLL_INTERVAL_MS is not a number: {raw:?}"))?;
                if ms == 0 {
                    bail!("MURMUR_POLL_INTERVAL_MS must be greater than zero");
                }
                Duration::from_millis(ms)
            }
            None => defaults.poll_interval,
        };

        Ok(Self {
            db_path,
            poll_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("auth.db"));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("MURMUR_DB_PATH", "/tmp/chat.db"),
            ("MURMUR_POLL_INTERVAL_MS", "500"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/chat.db"));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn rejects_bad_interval() {
        assert!(load(&[("MURMUR_POLL_INTERVAL_MS", "soon")]).is_err());
        assert!(load(&[("MURMUR_POLL_INTERVAL_MS", "0")]).is_err());
    }
}
