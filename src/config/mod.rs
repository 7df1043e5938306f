//! Configuration management for the moodlog application.
//!
//! This module loads and validates configuration settings from environment
//! variables, with sensible defaults. It covers the backend endpoints and keys,
//! the journal retry count, the local preference file, and log output.
//!
//! # Environment Variables
//!
//! - `MOODLOG_API_KEY`: Backend web API key (required for live commands)
//! - `MOODLOG_PROJECT_ID`: Backend project id (required for live commands)
//! - `MOODLOG_AUTH_URL`: Identity endpoint base (defaults to the public Identity Toolkit)
//! - `MOODLOG_FIRESTORE_URL`: Document store base (defaults to the public Firestore)
//! - `MOODLOG_MAX_RETRIES`: Extra attempts for failed journal calls (defaults to 2)
//! - `MOODLOG_PREFS_PATH`: Local preference file (defaults to ~/.config/moodlog/preferences.json)
//! - `MOODLOG_LOG_FORMAT`: `text` or `json` (defaults to text)
//! - `MOODLOG_LOG_LEVEL`: Default log level when `RUST_LOG` is unset (defaults to info)

use crate::constants::{
    DEFAULT_AUTH_URL, DEFAULT_FIRESTORE_URL, DEFAULT_LOG_LEVEL, DEFAULT_MAX_RETRIES,
    DEFAULT_PREFS_PATH, ENV_VAR_API_KEY, ENV_VAR_AUTH_URL, ENV_VAR_FIRESTORE_URL,
    ENV_VAR_LOG_FORMAT, ENV_VAR_LOG_LEVEL, ENV_VAR_MAX_RETRIES, ENV_VAR_PREFS_PATH,
    ENV_VAR_PROJECT_ID, LOG_FORMAT_JSON, LOG_FORMAT_TEXT, REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use crate::retry::RetryPolicy;
use crate::services::FirebaseSettings;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            LOG_FORMAT_TEXT => Ok(LogFormat::Text),
            LOG_FORMAT_JSON => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Unknown log format '{}'. Expected '{}' or '{}'",
                other, LOG_FORMAT_TEXT, LOG_FORMAT_JSON
            ))),
        }
    }
}

/// Configuration for the moodlog application.
///
/// # Examples
///
/// Creating a configuration manually:
/// ```
/// use moodlog::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     api_key: Some("web-key".to_string()),
///     project_id: Some("my-project".to_string()),
///     preferences_path: PathBuf::from("/tmp/moodlog/preferences.json"),
///     ..Config::default()
/// };
/// assert!(config.validate().is_ok());
/// assert!(config.require_backend().is_ok());
/// ```
///
/// Loading configuration from environment variables:
/// ```no_run
/// use moodlog::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
/// println!("Retrying journal calls {} times", config.max_retries);
/// ```
#[derive(Clone)]
pub struct Config {
    /// Backend web API key. Never logged.
    pub api_key: Option<String>,

    /// Backend project id.
    pub project_id: Option<String>,

    /// Base URL of the identity REST API.
    pub auth_url: String,

    /// Base URL of the document store REST API.
    pub firestore_url: String,

    /// Extra attempts for a journal call that failed transiently.
    pub max_retries: u32,

    /// File holding device-local preferences.
    pub preferences_path: PathBuf,

    pub log_format: LogFormat,

    /// Default log level when `RUST_LOG` is not set.
    pub log_level: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED_PLACEHOLDER))
            .field("project_id", &self.project_id)
            .field("auth_url", &self.auth_url)
            .field("firestore_url", &self.firestore_url)
            .field("max_retries", &self.max_retries)
            .field("preferences_path", &self.preferences_path)
            .field("log_format", &self.log_format)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            project_id: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            preferences_path: PathBuf::from(""),
            log_format: LogFormat::Text,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Reads a variable, treating an empty value as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn expand_path(raw: &str) -> AppResult<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

fn check_url(name: &str, url: &str) -> AppResult<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            name, url
        )))
    }
}

impl Config {
    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// The preference path is expanded with `shellexpand`, so `~` and
    /// `$VARS` work.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if:
    /// - `MOODLOG_MAX_RETRIES` is not a non-negative integer
    /// - `MOODLOG_LOG_FORMAT` is neither `text` nor `json`
    /// - The preference path cannot be expanded
    /// - The result fails [`Config::validate`]
    pub fn load() -> AppResult<Self> {
        let max_retries = match non_empty_var(ENV_VAR_MAX_RETRIES) {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                AppError::Config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    ENV_VAR_MAX_RETRIES, raw
                ))
            })?,
            None => DEFAULT_MAX_RETRIES,
        };

        let log_format = match non_empty_var(ENV_VAR_LOG_FORMAT) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        let prefs_raw =
            non_empty_var(ENV_VAR_PREFS_PATH).unwrap_or_else(|| DEFAULT_PREFS_PATH.to_string());

        let config = Config {
            api_key: non_empty_var(ENV_VAR_API_KEY),
            project_id: non_empty_var(ENV_VAR_PROJECT_ID),
            auth_url: non_empty_var(ENV_VAR_AUTH_URL)
                .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            firestore_url: non_empty_var(ENV_VAR_FIRESTORE_URL)
                .unwrap_or_else(|| DEFAULT_FIRESTORE_URL.to_string()),
            max_retries,
            preferences_path: expand_path(&prefs_raw)?,
            log_format,
            log_level: non_empty_var(ENV_VAR_LOG_LEVEL)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when either base URL is not http(s) or the
    /// preference path is empty.
    pub fn validate(&self) -> AppResult<()> {
        check_url(ENV_VAR_AUTH_URL, &self.auth_url)?;
        check_url(ENV_VAR_FIRESTORE_URL, &self.firestore_url)?;

        if self.preferences_path.as_os_str().is_empty() {
            return Err(AppError::Config(
                "Preference file path is empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Backend settings for live commands.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the missing variable when the API key
    /// or project id is not set.
    pub fn require_backend(&self) -> AppResult<FirebaseSettings> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            AppError::Config(format!("{} is not set", ENV_VAR_API_KEY))
        })?;
        let project_id = self.project_id.clone().ok_or_else(|| {
            AppError::Config(format!("{} is not set", ENV_VAR_PROJECT_ID))
        })?;

        Ok(FirebaseSettings {
            api_key,
            project_id,
            auth_url: self.auth_url.clone(),
            firestore_url: self.firestore_url.clone(),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }
}
