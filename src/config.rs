use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::{AggregationMode, UnknownMode};

/// Settings read from the environment (and an optional `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_level: String,
    pub catalog_path: Option<PathBuf>,
    pub mode: Option<AggregationMode>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SURVEY_MODE is invalid")]
    InvalidMode(#[source] UnknownMode),
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = env::var("SURVEY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let catalog_path = env::var("SURVEY_CATALOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let mode: Option<AggregationMode> = match env::var("SURVEY_MODE") {
            Ok(value) if !value.trim().is_empty() => {
                Some(value.parse().map_err(ConfigError::InvalidMode)?)
            }
            _ => None,
        };

        Ok(Self {
            log_level,
            catalog_path,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("SURVEY_LOG_LEVEL");
        env::remove_var("SURVEY_CATALOG");
        env::remove_var("SURVEY_MODE");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.mode, None);
    }

    #[test]
    fn reads_overrides_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SURVEY_CATALOG", "catalogs/work-drivers.json");
        env::set_var("SURVEY_MODE", "Sum");
        env::set_var("SURVEY_LOG_LEVEL", "debug");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("catalogs/work-drivers.json"))
        );
        assert_eq!(config.mode, Some(AggregationMode::Sum));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn rejects_unknown_mode() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SURVEY_MODE", "median");
        let result = AppConfig::load();
        reset_env();
        assert!(matches!(result, Err(ConfigError::InvalidMode(_))));
    }
}
