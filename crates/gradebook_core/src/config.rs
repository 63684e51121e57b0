//! Runtime configuration for core callers.
//!
//! # Responsibility
//! - Collect database and logging settings from the process environment.
//! - Validate values once, before any storage or logger is touched.
//!
//! # Invariants
//! - `log_dir`, when present, is absolute.
//! - Unset variables fall back to build-mode defaults.

use crate::logging::{default_log_level, normalize_log_dir, LogLevel, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "GRADEBOOK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "GRADEBOOK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "GRADEBOOK_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "gradebook.sqlite3";

/// Validated core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    /// Variable is set but blank.
    Empty(&'static str),
    /// Variable is set but does not parse.
    Invalid {
        key: &'static str,
        source: LoggingError,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(key) => write!(f, "`{key}` is set but empty"),
            Self::Invalid { key, source } => write!(f, "invalid `{key}`: {source}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty(_) => None,
            Self::Invalid { source, .. } => Some(source),
        }
    }
}

impl CoreConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an injected variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(non_empty(ENV_DB_PATH, &value)?);
        }

        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            config.log_level = non_empty(ENV_LOG_LEVEL, &value)?
                .parse()
                .map_err(|source| ConfigError::Invalid {
                    key: ENV_LOG_LEVEL,
                    source,
                })?;
        }

        if let Some(value) = lookup(ENV_LOG_DIR) {
            let dir = non_empty(ENV_LOG_DIR, &value)?;
            config.log_dir = Some(normalize_log_dir(Path::new(dir)).map_err(|source| {
                ConfigError::Invalid {
                    key: ENV_LOG_DIR,
                    source,
                }
            })?);
        }

        Ok(config)
    }
}

fn non_empty<'a>(key: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(key));
    }
    Ok(trimmed)
}
