//! Runtime configuration loaded from TOML.
//!
//! # Responsibility
//! - Describe storage, logging and pagination settings with defaults.
//! - Apply environment overrides on top of the file.
//!
//! # Invariants
//! - A loaded config has already passed `validate`.
//! - Every section and field may be omitted from the file.

use crate::logging::default_log_level;
use crate::model::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides `database.path`.
pub const DB_PATH_ENV_VAR: &str = "SAMPLE_DB_PATH";
/// Overrides `logging.level`.
pub const LOG_LEVEL_ENV_VAR: &str = "SAMPLE_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub pagination: PaginationConfig,
}

impl AppConfig {
    /// Reads `path`, applies environment overrides and validates.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read, parsed or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML text without consulting the environment.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides found through `lookup`; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| lookup(key).filter(|value: &String| !value.trim().is_empty());
        if let Some(path) = read(DB_PATH_ENV_VAR) {
            self.database.path = Some(PathBuf::from(path.trim()));
        }
        if let Some(level) = read(LOG_LEVEL_ENV_VAR) {
            self.logging.level = level.trim().to_string();
        }
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.pool_max_size == 0 {
            return Err(ConfigError::Invalid(
                "database.pool_max_size must be at least 1".to_string(),
            ));
        }
        if self.pagination.default_size < 1 || self.pagination.max_size < 1 {
            return Err(ConfigError::Invalid(
                "pagination sizes must be at least 1".to_string(),
            ));
        }
        if self.pagination.default_size > self.pagination.max_size {
            return Err(ConfigError::Invalid(format!(
                "pagination.default_size {} exceeds pagination.max_size {}",
                self.pagination.default_size, self.pagination.max_size
            )));
        }
        if self
            .logging
            .dir
            .as_deref()
            .is_some_and(|dir| !Path::new(dir.trim()).is_absolute())
        {
            return Err(ConfigError::Invalid(
                "logging.dir must be an absolute path".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file; absent selects an in-memory database.
    pub path: Option<PathBuf>,
    pub pool_max_size: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_max_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute log directory; absent leaves file logging off.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    pub default_size: i64,
    pub max_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}
