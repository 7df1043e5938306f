//! Device-local preferences.
//!
//! Two values live outside the backend: whether onboarding has been completed
//! on this device, and an optional language override. They are read once at
//! startup and written whenever they change.

use crate::errors::PreferencesError;
use crate::services::lock;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// The persisted preference record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPreferences {
    #[serde(default)]
    pub has_completed_onboarding: bool,
    #[serde(default)]
    pub language_override: Option<String>,
}

/// Key-value storage for [`LocalPreferences`].
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<LocalPreferences, PreferencesError>;

    fn save(&self, preferences: &LocalPreferences) -> Result<(), PreferencesError>;
}

/// Preferences kept in a JSON file.
///
/// A missing file reads as defaults. Writes hold an exclusive lock on the
/// file for their duration.
///
/// # Examples
///
/// ```
/// use moodlog::preferences::{FilePreferenceStore, LocalPreferences, PreferenceStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = FilePreferenceStore::new(dir.path().join("prefs.json"));
/// assert_eq!(store.load().unwrap(), LocalPreferences::default());
///
/// let prefs = LocalPreferences { has_completed_onboarding: true, language_override: None };
/// store.save(&prefs).unwrap();
/// assert!(store.load().unwrap().has_completed_onboarding);
/// ```
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PreferencesError {
        PreferencesError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<LocalPreferences, PreferencesError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(LocalPreferences::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No preference file at {:?}, using defaults", self.path);
                Ok(LocalPreferences::default())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, preferences: &LocalPreferences) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(false);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;

        FileExt::try_lock_exclusive(&file).map_err(|source| PreferencesError::Lock {
            path: self.path.clone(),
            source,
        })?;

        let body = serde_json::to_vec_pretty(preferences)?;
        file.set_len(0).map_err(|e| self.io_error(e))?;
        file.write_all(&body).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        // The lock is released when `file` is closed.
        debug!("Saved preferences to {:?}", self.path);
        Ok(())
    }
}

/// Preferences held in memory.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    preferences: Mutex<LocalPreferences>,
}

impl MemoryPreferenceStore {
    pub fn new(preferences: LocalPreferences) -> Self {
        Self {
            preferences: Mutex::new(preferences),
        }
    }

    /// Current stored value.
    pub fn snapshot(&self) -> LocalPreferences {
        lock(&self.preferences).clone()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<LocalPreferences, PreferencesError> {
        Ok(self.snapshot())
    }

    fn save(&self, preferences: &LocalPreferences) -> Result<(), PreferencesError> {
        *lock(&self.preferences) = preferences.clone();
        Ok(())
    }
}
