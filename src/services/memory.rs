//! In-memory service fakes.
//!
//! Both fakes are deterministic, count every call that reaches them, and can
//! be told to fail, so the state container can be exercised without a backend.

use super::{lock, AuthService, AuthStateChange, JournalService, AUTH_EVENT_CAPACITY};
use crate::constants::MIN_PASSWORD_LENGTH;
use crate::errors::{AuthError, JournalError};
use crate::models::{JournalEntry, User};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user_id: String,
}

/// Identity and profile storage held in process memory.
///
/// # Examples
///
/// ```
/// use moodlog::services::{AuthService, MemoryAuthService};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let auth = MemoryAuthService::new();
/// auth.add_account("ada@example.com", "secret-pass", "Ada");
///
/// let user = auth.login("ada@example.com", "secret-pass").await.unwrap();
/// assert_eq!(user.email, "ada@example.com");
/// assert_eq!(auth.call_count(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct MemoryAuthService {
    accounts: Mutex<HashMap<String, Account>>,
    profiles: Mutex<HashMap<String, User>>,
    current: Mutex<Option<User>>,
    failures: Mutex<VecDeque<AuthError>>,
    profile_save_failures: Mutex<VecDeque<AuthError>>,
    calls: AtomicUsize,
    events: broadcast::Sender<AuthStateChange>,
}

impl Default for MemoryAuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            accounts: Mutex::new(HashMap::new()),
            profiles: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            failures: Mutex::new(VecDeque::new()),
            profile_save_failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            events,
        }
    }

    /// Registers an account with a default profile and returns its user id.
    pub fn add_account(&self, email: &str, password: &str, name: &str) -> String {
        let user_id = Uuid::new_v4().to_string();
        lock(&self.accounts).insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user_id: user_id.clone(),
            },
        );
        lock(&self.profiles).insert(user_id.clone(), User::new(&user_id, email, name));
        user_id
    }

    /// Stored profile for `user_id`.
    pub fn profile(&self, user_id: &str) -> Option<User> {
        lock(&self.profiles).get(user_id).cloned()
    }

    /// Makes the next backend call fail with `error`.
    pub fn fail_next(&self, error: AuthError) {
        lock(&self.failures).push_back(error);
    }

    /// Makes the next `save_profile` call fail with `error`.
    pub fn fail_next_profile_save(&self, error: AuthError) {
        lock(&self.profile_save_failures).push_back(error);
    }

    /// Number of calls that reached this service (subscriptions excluded).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Simulates a session started elsewhere (another device, token refresh).
    pub fn simulate_external_sign_in(&self, user_id: &str) -> Option<User> {
        let profile = self.profile(user_id)?;
        let identity = User::new(&profile.id, &profile.email, "");
        *lock(&self.current) = Some(identity.clone());
        let _ = self.events.send(AuthStateChange::SignedIn(identity.clone()));
        Some(identity)
    }

    /// Simulates the backend ending the session (expiry, revocation).
    pub fn simulate_sign_out(&self) {
        *lock(&self.current) = None;
        let _ = self.events.send(AuthStateChange::SignedOut);
    }

    fn record_call(&self, operation: &str) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!("memory auth: {}", operation);
        match lock(&self.failures).pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn start_session(&self, user: &User) -> User {
        let identity = User::new(&user.id, &user.email, "");
        *lock(&self.current) = Some(identity.clone());
        let _ = self.events.send(AuthStateChange::SignedIn(identity.clone()));
        identity
    }
}

#[async_trait]
impl AuthService for MemoryAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.record_call("login")?;

        let account = lock(&self.accounts)
            .get(&email.to_lowercase())
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;
        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }

        let profile = self.profile(&account.user_id).ok_or(AuthError::Unknown)?;
        Ok(self.start_session(&profile))
    }

    async fn signup(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        self.record_call("signup")?;

        if lock(&self.accounts).contains_key(&email.to_lowercase()) {
            return Err(AuthError::UserAlreadyExists);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        let user_id = self.add_account(email, password, name);
        let profile = self.profile(&user_id).ok_or(AuthError::Unknown)?;
        self.start_session(&profile);
        Ok(profile)
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.record_call("reset_password")?;
        if lock(&self.accounts).contains_key(&email.to_lowercase()) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.record_call("logout")?;
        let was_signed_in = lock(&self.current).take().is_some();
        if was_signed_in {
            let _ = self.events.send(AuthStateChange::SignedOut);
        }
        Ok(())
    }

    async fn current_user(&self) -> Option<User> {
        lock(&self.current).clone()
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<User, AuthError> {
        self.record_call("fetch_profile")?;
        self.profile(user_id).ok_or(AuthError::Unknown)
    }

    async fn save_profile(&self, user: &User) -> Result<(), AuthError> {
        self.record_call("save_profile")?;
        if let Some(error) = lock(&self.profile_save_failures).pop_front() {
            return Err(error);
        }
        lock(&self.profiles).insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn auth_state_changes(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}

/// Entry storage held in process memory.
#[derive(Debug, Default)]
pub struct MemoryJournalService {
    entries: Mutex<Vec<JournalEntry>>,
    failures: Mutex<VecDeque<JournalError>>,
    calls: AtomicUsize,
}

impl MemoryJournalService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds stored entries, assigning ids where missing.
    pub fn with_entries(entries: Vec<JournalEntry>) -> Self {
        let service = Self::new();
        {
            let mut stored = lock(&service.entries);
            for mut entry in entries {
                entry.id.get_or_insert_with(|| Uuid::new_v4().to_string());
                stored.push(entry);
            }
        }
        service
    }

    /// Makes the next call fail with `error`.
    pub fn fail_next(&self, error: JournalError) {
        lock(&self.failures).push_back(error);
    }

    /// Number of calls that reached this service.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every stored entry regardless of owner.
    pub fn stored_entries(&self) -> Vec<JournalEntry> {
        lock(&self.entries).clone()
    }

    fn record_call(&self, operation: &str) -> Result<(), JournalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!("memory journal: {}", operation);
        match lock(&self.failures).pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JournalService for MemoryJournalService {
    async fn fetch_entries(&self, user_id: &str) -> Result<Vec<JournalEntry>, JournalError> {
        self.record_call("fetch_entries")?;
        let mut entries: Vec<JournalEntry> = lock(&self.entries)
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn create_entry(&self, mut entry: JournalEntry) -> Result<JournalEntry, JournalError> {
        self.record_call("create_entry")?;
        let mut stored = lock(&self.entries);
        let id = entry
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        if stored.iter().any(|e| e.id.as_deref() == Some(id.as_str())) {
            return Err(JournalError::InvalidData(format!(
                "Entry {} already exists",
                id
            )));
        }
        stored.push(entry.clone());
        Ok(entry)
    }

    async fn update_entry(&self, entry: JournalEntry) -> Result<JournalEntry, JournalError> {
        self.record_call("update_entry")?;
        let id = entry
            .id
            .clone()
            .ok_or_else(|| JournalError::InvalidData("Entry has no id".to_string()))?;
        let mut stored = lock(&self.entries);
        let slot = stored
            .iter_mut()
            .find(|e| e.id.as_deref() == Some(id.as_str()))
            .ok_or(JournalError::NotFound)?;
        *slot = entry.clone();
        Ok(entry)
    }

    async fn delete_entry(&self, user_id: &str, entry_id: &str) -> Result<(), JournalError> {
        self.record_call("delete_entry")?;
        let mut stored = lock(&self.entries);
        let position = stored
            .iter()
            .position(|e| e.id.as_deref() == Some(entry_id))
            .ok_or(JournalError::NotFound)?;
        if stored[position].user_id != user_id {
            return Err(JournalError::Unauthorized);
        }
        stored.remove(position);
        Ok(())
    }
}
