//! Constants used throughout the application.
//!
//! This module contains all constants used in the moodlog crate, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "moodlog";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "Mood-tagged journaling with streaks and a calendar view";

// Logging
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Configuration Keys & Environment Variables
/// Environment variable holding the backend web API key.
pub const ENV_VAR_API_KEY: &str = "MOODLOG_API_KEY";
/// Environment variable holding the backend project id.
pub const ENV_VAR_PROJECT_ID: &str = "MOODLOG_PROJECT_ID";
/// Environment variable overriding the identity endpoint base URL.
pub const ENV_VAR_AUTH_URL: &str = "MOODLOG_AUTH_URL";
/// Environment variable overriding the document store base URL.
pub const ENV_VAR_FIRESTORE_URL: &str = "MOODLOG_FIRESTORE_URL";
/// Environment variable overriding the journal retry count.
pub const ENV_VAR_MAX_RETRIES: &str = "MOODLOG_MAX_RETRIES";
/// Environment variable overriding the local preference file.
pub const ENV_VAR_PREFS_PATH: &str = "MOODLOG_PREFS_PATH";
/// Environment variable selecting the log format.
pub const ENV_VAR_LOG_FORMAT: &str = "MOODLOG_LOG_FORMAT";
/// Environment variable selecting the default log level.
pub const ENV_VAR_LOG_LEVEL: &str = "MOODLOG_LOG_LEVEL";
/// Environment variable supplying the account password non-interactively.
pub const ENV_VAR_PASSWORD: &str = "MOODLOG_PASSWORD";

// Backend Defaults
/// Default base URL of the identity REST API.
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";
/// Default base URL of the document store REST API.
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
/// Default preference file location (expanded with shellexpand).
pub const DEFAULT_PREFS_PATH: &str = "~/.config/moodlog/preferences.json";
/// Collection holding journal entry documents.
pub const ENTRIES_COLLECTION: &str = "journalEntries";
/// Collection holding user profile documents.
pub const USERS_COLLECTION: &str = "users";

// Journal Service
/// Number of immediate re-issues of a failed journal call.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

// Accounts
/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Hour of the default daily reminder.
pub const DEFAULT_REMINDER_HOUR: u32 = 20;
/// Minute of the default daily reminder.
pub const DEFAULT_REMINDER_MINUTE: u32 = 0;

// Date/Time Logic
/// Date format string for ISO date format (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Date format string for compact date format (YYYYMMDD).
pub const DATE_FORMAT_COMPACT: &str = "%Y%m%d";

/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";
