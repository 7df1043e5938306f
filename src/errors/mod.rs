//! Error handling utilities for the moodlog crate.
//!
//! Two closed taxonomies describe what can go wrong when talking to the
//! backend: [`AuthError`] for identity operations and [`JournalError`] for
//! entry storage. Their `Display` output is the fixed, user-facing message
//! shown in the UI. [`AppError`] is the umbrella type used by the binary and
//! by local concerns such as configuration and the preference file.
//! [`UnknownMood`] and [`DecodeError`] are parse failures that the backend
//! layer folds into [`JournalError::DecodingError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by authentication operations.
///
/// # Examples
///
/// ```
/// use moodlog::errors::AuthError;
///
/// let error = AuthError::InvalidCredentials;
/// assert_eq!(error.to_string(), "Invalid email or password.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The email/password pair was rejected, or was empty.
    #[error("Invalid email or password.")]
    InvalidCredentials,

    /// The identity service could not be reached.
    #[error("Network error. Please check your connection and try again.")]
    NetworkError,

    /// Signup with an email that already has an account.
    #[error("An account with this email already exists.")]
    UserAlreadyExists,

    /// Signup password does not meet the backend's policy.
    #[error("Password is too weak. Please use at least 6 characters.")]
    WeakPassword,

    /// Anything the taxonomy does not name.
    #[error("An unknown error occurred. Please try again.")]
    Unknown,
}

/// Errors surfaced by journal entry operations.
///
/// Only [`JournalError::DatabaseError`] and [`JournalError::InvalidData`] carry
/// a detail string; it is meant for diagnostic display.
///
/// # Examples
///
/// ```
/// use moodlog::errors::JournalError;
///
/// let error = JournalError::InvalidData("Entry content cannot be empty".to_string());
/// assert!(error.to_string().contains("Entry content cannot be empty"));
/// assert!(!error.is_transient());
/// assert!(JournalError::NetworkError.is_transient());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    /// No signed-in user, or the backend rejected the session.
    #[error("You must be logged in to access journal entries.")]
    Unauthorized,

    /// The document store could not be reached.
    #[error("Network error. Please check your connection and try again.")]
    NetworkError,

    /// The entry id does not resolve to a stored entry.
    #[error("The requested journal entry could not be found.")]
    NotFound,

    /// A stored document could not be decoded into an entry.
    #[error("Failed to read journal data.")]
    DecodingError,

    /// The document store reported a failure it may recover from, such as
    /// throttling or a server error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The store refused the request as sent, e.g. a malformed body or a
    /// failed write precondition.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Anything the taxonomy does not name.
    #[error("An unknown error occurred.")]
    Unknown,
}

impl JournalError {
    /// Whether re-issuing the same call could plausibly succeed.
    ///
    /// Only [`JournalError::NetworkError`] and [`JournalError::DatabaseError`]
    /// qualify; the live backend reserves the latter for HTTP 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        matches!(self, JournalError::NetworkError | JournalError::DatabaseError(_))
    }
}

/// Returned when a string is not one of the six raw mood values.
///
/// # Examples
///
/// ```
/// use moodlog::errors::UnknownMood;
/// use moodlog::models::Mood;
///
/// let err = "ecstatic".parse::<Mood>().unwrap_err();
/// assert_eq!(err, UnknownMood("ecstatic".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood '{0}'")]
pub struct UnknownMood(pub String);

/// Why a stored document could not be turned into a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl From<UnknownMood> for DecodeError {
    fn from(err: UnknownMood) -> Self {
        DecodeError(err.to_string())
    }
}

/// Errors from the local preference file.
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// Reading or writing the preference file failed.
    #[error("Failed to access preferences at {path}: {source}")]
    Io {
        /// The preference file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The preference file exists but is not valid JSON.
    #[error("Preferences file is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another process holds the preference file lock.
    #[error("Failed to lock preferences at {path}: {source}. Is another moodlog process running?")]
    Lock {
        /// The preference file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Represents all possible errors that can occur in the moodlog application.
///
/// Note: This type does not implement `Clone` to avoid losing error context when
/// cloning `std::io::Error` values.
///
/// # Examples
///
/// ```
/// use moodlog::errors::{AppError, AuthError};
///
/// let error = AppError::Config("Missing API key".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing API key");
///
/// let error: AppError = AuthError::WeakPassword.into();
/// assert!(format!("{}", error).starts_with("Authentication error:"));
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the identity backend.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Errors from the journal backend.
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    /// Errors from the local preference store.
    #[error("Preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    /// Invalid command-line input (dates, export files).
    #[error("Invalid input: {0}")]
    Cli(String),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_auth_error_messages_are_fixed() {
        assert_eq!(
            AuthError::UserAlreadyExists.to_string(),
            "An account with this email already exists."
        );
        assert!(AuthError::NetworkError.to_string().contains("connection"));
        assert!(AuthError::WeakPassword.to_string().contains("6 characters"));
        assert!(AuthError::Unknown.to_string().contains("unknown"));
    }

    #[test]
    fn test_journal_error_detail_variants() {
        let error = JournalError::DatabaseError("quota exceeded".to_string());
        assert_eq!(error.to_string(), "Database error: quota exceeded");

        let error = JournalError::InvalidData("missing id".to_string());
        assert_eq!(error.to_string(), "Invalid data: missing id");
    }

    #[test]
    fn test_journal_error_transience() {
        assert!(JournalError::NetworkError.is_transient());
        assert!(JournalError::DatabaseError("unavailable".to_string()).is_transient());
        assert!(!JournalError::Unauthorized.is_transient());
        assert!(!JournalError::NotFound.is_transient());
        assert!(!JournalError::DecodingError.is_transient());
        assert!(!JournalError::Unknown.is_transient());
        assert!(!JournalError::InvalidData("HTTP 409: exists".to_string()).is_transient());
    }

    #[test]
    fn test_parse_errors_are_std_errors() {
        let mood_error: Box<dyn std::error::Error> = Box::new(UnknownMood("elated".to_string()));
        assert_eq!(mood_error.to_string(), "unknown mood 'elated'");

        let decode_error: DecodeError = UnknownMood("elated".to_string()).into();
        assert_eq!(decode_error.to_string(), "unknown mood 'elated'");
        assert!(decode_error.source().is_none());
    }

    #[test]
    fn test_app_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_error: AppError = io_error.into();

        match app_error {
            AppError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            _ => panic!("Expected AppError::Io variant"),
        }
    }

    #[test]
    fn test_app_error_wraps_taxonomies() {
        let app_error: AppError = JournalError::NotFound.into();
        assert_eq!(
            app_error.to_string(),
            "Journal error: The requested journal entry could not be found."
        );

        let app_error: AppError = AuthError::InvalidCredentials.into();
        match app_error {
            AppError::Auth(AuthError::InvalidCredentials) => {}
            other => panic!("Expected AppError::Auth, got {:?}", other),
        }
    }

    #[test]
    fn test_preferences_error_source_chaining() {
        let error = PreferencesError::Io {
            path: PathBuf::from("/tmp/prefs.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(error.to_string().contains("/tmp/prefs.json"));

        let source = error.source().expect("Io variant should have a source");
        let io_error = source
            .downcast_ref::<io::Error>()
            .expect("Source should be an io::Error");
        assert_eq!(io_error.kind(), io::ErrorKind::PermissionDenied);

        let app_error: AppError = error.into();
        assert!(app_error.source().is_some());
    }
}
