//! Backend capabilities the state container depends on.
//!
//! [`AuthService`] and [`JournalService`] are the only way the rest of the
//! crate reaches the backend. Two implementations satisfy them:
//!
//! - `memory`: deterministic in-process fakes with call counters
//! - `firebase`: the live REST backend, with bounded retry on journal calls

use crate::errors::{AuthError, JournalError};
use crate::models::{JournalEntry, User};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

pub mod firebase;
pub mod memory;

pub use firebase::{FirebaseAuthService, FirebaseSession, FirebaseSettings, FirestoreJournalService};
pub use memory::{MemoryAuthService, MemoryJournalService};

/// Capacity of auth-state broadcast channels.
pub(crate) const AUTH_EVENT_CAPACITY: usize = 16;

/// A session transition reported by the identity backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateChange {
    /// A session became active. Carries the identity-only user record.
    SignedIn(User),
    /// The session ended (sign-out, expiry, revocation).
    SignedOut,
}

/// Identity operations plus the user profile document.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Signs in and returns the identity-only user record.
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Creates an account and its default profile.
    async fn signup(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError>;

    async fn reset_password(&self, email: &str) -> Result<(), AuthError>;

    async fn logout(&self) -> Result<(), AuthError>;

    /// The identity of the active session, if any.
    async fn current_user(&self) -> Option<User>;

    /// Loads the stored profile document for `user_id`.
    async fn fetch_profile(&self, user_id: &str) -> Result<User, AuthError>;

    /// Writes the profile document.
    async fn save_profile(&self, user: &User) -> Result<(), AuthError>;

    /// Subscribes to session transitions.
    fn auth_state_changes(&self) -> broadcast::Receiver<AuthStateChange>;
}

/// Entry storage keyed by user id and entry id.
#[async_trait]
pub trait JournalService: Send + Sync {
    /// All entries owned by `user_id`, newest first.
    async fn fetch_entries(&self, user_id: &str) -> Result<Vec<JournalEntry>, JournalError>;

    /// Persists a new entry and returns it with its id assigned.
    async fn create_entry(&self, entry: JournalEntry) -> Result<JournalEntry, JournalError>;

    /// Replaces a stored entry. The entry must carry an id.
    async fn update_entry(&self, entry: JournalEntry) -> Result<JournalEntry, JournalError>;

    /// Removes an entry owned by `user_id`. An entry owned by anyone else is
    /// left alone and reported as [`JournalError::Unauthorized`].
    async fn delete_entry(&self, user_id: &str, entry_id: &str) -> Result<(), JournalError>;
}

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
