//! Configuration service.
//!
//! Loads `AppConfig` from config.toml (defaults when absent) and layers the
//! `KAMBO_*` environment overrides on top.

use crate::storage::{ConfigStorage, ConfigStorageError};
use kambo_core::config::AppConfig;
use kambo_core::error::{KamboError, Result};
use std::path::PathBuf;

pub const ENV_MODEL: &str = "KAMBO_MODEL";
pub const ENV_MAX_INPUT_LENGTH: &str = "KAMBO_MAX_INPUT_LENGTH";
pub const ENV_TIMEOUT_SECS: &str = "KAMBO_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "KAMBO_DATA_DIR";

impl From<ConfigStorageError> for KamboError {
    fn from(err: ConfigStorageError) -> Self {
        match err {
            ConfigStorageError::IoError(e) => e.into(),
            ConfigStorageError::TomlParseError(e) => e.into(),
            ConfigStorageError::TomlSerError(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigService {
    storage: ConfigStorage,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            storage: ConfigStorage::new(path),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.storage.path().to_path_buf()
    }

    /// Loads the effective configuration using the process environment.
    pub fn load(&self) -> Result<AppConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Loads the configuration, reading overrides through `lookup`.
    pub fn load_with_env<F>(&self, lookup: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match self.storage.load()? {
            Some(config) => {
                tracing::debug!(path = %self.storage.path().display(), "[ConfigService] Loaded config file");
                config
            }
            None => {
                tracing::debug!(path = %self.storage.path().display(), "[ConfigService] No config file, using defaults");
                AppConfig::default()
            }
        };

        apply_env_overrides(config, lookup)
    }

    /// Writes the default configuration unless a file already exists.
    ///
    /// Returns `true` when a file was created.
    pub fn init_default(&self) -> Result<bool> {
        if self.storage.path().exists() {
            return Ok(false);
        }
        self.storage.save(&AppConfig::default())?;
        tracing::info!(path = %self.storage.path().display(), "[ConfigService] Wrote default config");
        Ok(true)
    }
}

/// Applies `KAMBO_*` overrides. Unparseable numbers are a config error.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
        config.generation.model = Some(model.trim().to_string());
    }

    if let Some(raw) = lookup(ENV_MAX_INPUT_LENGTH) {
        config.guard.max_input_length = raw.trim().parse().map_err(|_| {
            KamboError::config(format!("{ENV_MAX_INPUT_LENGTH} must be a positive integer, got '{raw}'"))
        })?;
    }

    if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
        config.generation.timeout_secs = raw.trim().parse().map_err(|_| {
            KamboError::config(format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got '{raw}'"))
        })?;
    }

    if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
        config.storage.data_dir = Some(dir);
    }

    Ok(config)
}
