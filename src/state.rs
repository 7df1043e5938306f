//! The application state container.
//!
//! [`AppState`] is the single source of truth for who is signed in and which
//! entries are visible. It composes the auth and journal services, publishes
//! every change as an [`AppSnapshot`] through a `tokio::sync::watch` channel,
//! and mirrors backend session transitions once [`AppState::start`] has been
//! called.
//!
//! All mutations go through the watch sender, so subscribers observe a total
//! order of snapshots.

use crate::calendar::CalendarIndex;
use crate::clock::Clock;
use crate::constants::MIN_PASSWORD_LENGTH;
use crate::errors::{AuthError, JournalError, PreferencesError};
use crate::models::{EntryDraft, JournalEntry, User};
use crate::notifications::{apply_reminder_preferences, NotificationScheduler};
use crate::preferences::PreferenceStore;
use crate::services::{lock, AuthService, AuthStateChange, JournalService};
use crate::stats::JournalStats;
use chrono::NaiveTime;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

/// Authentication progress of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    SignedOut,
    /// Identity known, profile document not loaded yet.
    SignedInBasic,
    /// Profile document merged over the identity.
    SignedInComplete,
}

/// Everything the UI renders from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppSnapshot {
    pub session: SessionState,
    pub current_user: Option<User>,
    pub is_onboarding: bool,
    /// Entries of `current_user`, newest first.
    pub entries: Vec<JournalEntry>,
    /// Profile changes applied locally whose backend write failed.
    pub unsynced_profile_writes: u32,
}

impl AppSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    fn is_current(&self, user_id: &str) -> bool {
        self.current_user
            .as_ref()
            .map(|u| u.id == user_id)
            .unwrap_or(false)
    }

    fn clear_session(&mut self) {
        self.session = SessionState::SignedOut;
        self.current_user = None;
        self.entries.clear();
    }
}

/// Collaborators injected into [`AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<dyn AuthService>,
    pub journal: Arc<dyn JournalService>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub notifications: Arc<dyn NotificationScheduler>,
    pub clock: Arc<dyn Clock>,
}

struct Inner {
    services: AppServices,
    state: watch::Sender<AppSnapshot>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }
}

/// Shared handle to the application state. Clones share one state.
///
/// # Examples
///
/// ```
/// use moodlog::clock::SystemClock;
/// use moodlog::models::{EntryDraft, Mood};
/// use moodlog::notifications::RecordingScheduler;
/// use moodlog::preferences::MemoryPreferenceStore;
/// use moodlog::services::{MemoryAuthService, MemoryJournalService};
/// use moodlog::state::{AppServices, AppState};
/// use std::sync::Arc;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let auth = Arc::new(MemoryAuthService::new());
/// auth.add_account("ada@example.com", "secret-pass", "Ada");
///
/// let state = AppState::new(AppServices {
///     auth,
///     journal: Arc::new(MemoryJournalService::new()),
///     preferences: Arc::new(MemoryPreferenceStore::default()),
///     notifications: Arc::new(RecordingScheduler::new()),
///     clock: Arc::new(SystemClock),
/// });
///
/// state.login("ada@example.com", "secret-pass").await.unwrap();
/// state.create_entry(EntryDraft::new("First entry", Mood::Happy)).await.unwrap();
/// assert_eq!(state.snapshot().entries.len(), 1);
/// assert_eq!(state.stats().day_streak, 1);
/// # });
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    /// Builds the container. The onboarding flag starts from the stored
    /// preferences; an unreadable store counts as never onboarded.
    pub fn new(services: AppServices) -> Self {
        let preferences = services.preferences.load().unwrap_or_else(|e| {
            warn!("Could not read local preferences: {}", e);
            Default::default()
        });
        let (state, _) = watch::channel(AppSnapshot {
            is_onboarding: !preferences.has_completed_onboarding,
            ..AppSnapshot::default()
        });

        Self {
            inner: Arc::new(Inner {
                services,
                state,
                listener: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppSnapshot> {
        self.inner.state.subscribe()
    }

    /// Stream of snapshots, starting with the current one.
    pub fn snapshots(&self) -> WatchStream<AppSnapshot> {
        WatchStream::new(self.subscribe())
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().current_user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.services.clock.as_ref()
    }

    // ---- session lifecycle -------------------------------------------------

    /// Adopts a session the auth backend already holds, e.g. at startup.
    pub async fn restore_session(&self) -> Option<User> {
        let identity = self.inner.services.auth.current_user().await?;
        info!("Restoring session for user {}", identity.id);
        self.apply_sign_in(&identity);
        Some(self.load_profile(&identity.id).await.unwrap_or(identity))
    }

    /// Starts mirroring auth-state changes into the snapshot.
    ///
    /// Must be called from within a Tokio runtime. Calling it twice is a no-op.
    pub fn start(&self) {
        let mut listener = lock(&self.inner.listener);
        if listener.is_some() {
            return;
        }

        let events = self.inner.services.auth.auth_state_changes();
        let weak = Arc::downgrade(&self.inner);
        *listener = Some(tokio::spawn(listen(weak, events)));
        debug!("Auth state listener started");
    }

    /// Stops mirroring auth-state changes.
    pub fn stop(&self) {
        if let Some(handle) = lock(&self.inner.listener).take() {
            handle.abort();
            debug!("Auth state listener stopped");
        }
    }

    async fn handle_auth_change(&self, change: AuthStateChange) {
        match change {
            AuthStateChange::SignedIn(identity) => {
                if self.apply_sign_in(&identity) {
                    self.load_profile(&identity.id).await;
                }
            }
            AuthStateChange::SignedOut => {
                info!("Session ended by the backend");
                self.inner.state.send_modify(AppSnapshot::clear_session);
            }
        }
    }

    /// Re-reads the session after missed auth events.
    async fn resync(&self) {
        match self.inner.services.auth.current_user().await {
            Some(identity) => {
                if self.apply_sign_in(&identity) {
                    self.load_profile(&identity.id).await;
                }
            }
            None => self.inner.state.send_modify(AppSnapshot::clear_session),
        }
    }

    /// Records `identity` as the signed-in user.
    ///
    /// Returns `false` when that user was already signed in, leaving the
    /// snapshot untouched.
    fn apply_sign_in(&self, identity: &User) -> bool {
        self.inner.state.send_if_modified(|s| {
            if s.is_current(&identity.id) {
                return false;
            }
            info!("Signed in as {}", identity.id);
            s.session = SessionState::SignedInBasic;
            s.current_user = Some(identity.clone());
            s.entries.clear();
            true
        })
    }

    /// Fetches the profile and merges it, unless another user has signed in
    /// since the fetch began.
    async fn load_profile(&self, user_id: &str) -> Option<User> {
        let profile = match self.inner.services.auth.fetch_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Profile for {} could not be loaded: {}", user_id, e);
                return None;
            }
        };

        let mut merged = None;
        self.inner.state.send_if_modified(|s| {
            let Some(current) = s.current_user.as_mut().filter(|u| u.id == user_id) else {
                debug!("Discarding profile for {}: session changed", user_id);
                return false;
            };
            *current = current.merge_profile(&profile);
            s.session = SessionState::SignedInComplete;
            merged = Some(current.clone());
            true
        });
        merged
    }

    // ---- authentication ----------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = self.inner.services.auth.login(email, password).await?;
        self.apply_sign_in(&identity);
        Ok(self.load_profile(&identity.id).await.unwrap_or(identity))
    }

    /// Creates an account, signs it in and forces onboarding.
    ///
    /// The session skips `SignedInBasic` and goes straight to
    /// `SignedInComplete`: the backend returns the freshly written profile,
    /// so there is nothing left to load.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        let user = self.inner.services.auth.signup(email, password, name).await?;
        info!("Account created for {}", user.id);
        self.inner.state.send_modify(|s| {
            s.session = SessionState::SignedInComplete;
            s.current_user = Some(user.clone());
            s.entries.clear();
            s.is_onboarding = true;
        });
        if let Err(e) = self.store_onboarding_completed(false) {
            warn!("Could not persist onboarding state: {}", e);
        }
        Ok(user)
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        self.inner.services.auth.reset_password(email).await
    }

    /// Signs out. Local state is cleared even when the backend call fails.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.services.auth.logout().await {
            warn!("Backend sign-out failed, clearing local session anyway: {}", e);
        }
        self.inner.state.send_modify(AppSnapshot::clear_session);
    }

    // ---- onboarding and local preferences ----------------------------------

    /// Marks onboarding as done on this device.
    pub fn complete_onboarding(&self) -> Result<(), PreferencesError> {
        self.inner.state.send_if_modified(|s| {
            let changed = s.is_onboarding;
            s.is_onboarding = false;
            changed
        });
        self.store_onboarding_completed(true)
    }

    fn store_onboarding_completed(&self, completed: bool) -> Result<(), PreferencesError> {
        let store = &self.inner.services.preferences;
        let mut preferences = store.load()?;
        preferences.has_completed_onboarding = completed;
        store.save(&preferences)
    }

    pub fn language_override(&self) -> Option<String> {
        match self.inner.services.preferences.load() {
            Ok(preferences) => preferences.language_override,
            Err(e) => {
                warn!("Could not read local preferences: {}", e);
                None
            }
        }
    }

    /// Stores a language code, or clears the override with `None`.
    pub fn set_language_override(&self, code: Option<&str>) -> Result<(), PreferencesError> {
        let store = &self.inner.services.preferences;
        let mut preferences = store.load()?;
        preferences.language_override = code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        store.save(&preferences)
    }

    // ---- journal -----------------------------------------------------------

    fn require_user(&self) -> Result<User, JournalError> {
        self.current_user().ok_or(JournalError::Unauthorized)
    }

    /// Applies `change` to the entry list if `user_id` is still signed in.
    fn modify_entries<F>(&self, user_id: &str, change: F)
    where
        F: FnOnce(&mut Vec<JournalEntry>),
    {
        self.inner.state.send_if_modified(|s| {
            if !s.is_current(user_id) {
                return false;
            }
            change(&mut s.entries);
            sort_newest_first(&mut s.entries);
            true
        });
    }

    /// Loads the signed-in user's entries, newest first.
    pub async fn fetch_entries(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let user = self.require_user()?;
        let mut entries = self.inner.services.journal.fetch_entries(&user.id).await?;
        sort_newest_first(&mut entries);
        debug!("Fetched {} entries for {}", entries.len(), user.id);

        let visible = entries.clone();
        self.modify_entries(&user.id, move |current| *current = visible);
        Ok(entries)
    }

    pub async fn create_entry(&self, draft: EntryDraft) -> Result<JournalEntry, JournalError> {
        let user = self.require_user()?;
        if draft.is_blank() {
            return Err(JournalError::InvalidData(
                "Entry content cannot be empty".to_string(),
            ));
        }

        let entry = draft.into_entry(&user.id, self.clock().now());
        let saved = self.inner.services.journal.create_entry(entry).await?;
        info!("Created entry {:?}", saved.id);

        let visible = saved.clone();
        self.modify_entries(&user.id, move |entries| entries.push(visible));
        Ok(saved)
    }

    /// Saves changes to a persisted entry and stamps `updated_at`.
    pub async fn update_entry(
        &self,
        mut entry: JournalEntry,
    ) -> Result<JournalEntry, JournalError> {
        let user = self.require_user()?;
        if entry.id.is_none() {
            return Err(JournalError::InvalidData(
                "Entry has not been saved yet".to_string(),
            ));
        }
        if entry.user_id != user.id {
            return Err(JournalError::Unauthorized);
        }

        entry.touch(self.clock().now());
        let saved = self.inner.services.journal.update_entry(entry).await?;
        debug!("Updated entry {:?}", saved.id);

        let visible = saved.clone();
        self.modify_entries(&user.id, move |entries| {
            match entries.iter().position(|e| e.id == visible.id) {
                Some(index) => entries[index] = visible,
                None => entries.push(visible),
            }
        });
        Ok(saved)
    }

    /// Deletes one of the signed-in user's entries. Someone else's entry is
    /// refused with [`JournalError::Unauthorized`] and stays in place.
    pub async fn delete_entry(&self, entry_id: &str) -> Result<(), JournalError> {
        let user = self.require_user()?;
        self.inner
            .services
            .journal
            .delete_entry(&user.id, entry_id)
            .await?;
        info!("Deleted entry {}", entry_id);

        self.modify_entries(&user.id, |entries| {
            entries.retain(|e| e.id.as_deref() != Some(entry_id))
        });
        Ok(())
    }

    pub async fn toggle_favorite(
        &self,
        entry: &JournalEntry,
    ) -> Result<JournalEntry, JournalError> {
        let mut entry = entry.clone();
        entry.toggle_favorite();
        self.update_entry(entry).await
    }

    pub fn stats(&self) -> JournalStats {
        JournalStats::compute(&self.inner.state.borrow().entries, self.clock())
    }

    pub fn calendar(&self) -> CalendarIndex {
        CalendarIndex::new(&self.inner.state.borrow().entries, self.clock())
    }

    // ---- profile and settings ----------------------------------------------

    /// Applies `change` to the local profile at once, then writes it to the
    /// backend. A failed write is logged and counted; the local copy stays.
    ///
    /// Returns the updated profile, or `None` when nobody is signed in.
    async fn update_profile<F>(&self, change: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut updated = None;
        self.inner.state.send_if_modified(|s| match s.current_user.as_mut() {
            Some(user) => {
                change(user);
                updated = Some(user.clone());
                true
            }
            None => false,
        });
        let user = updated?;

        if let Err(e) = self.inner.services.auth.save_profile(&user).await {
            warn!("Profile change for {} kept locally but not saved: {}", user.id, e);
            self.inner.state.send_modify(|s| s.unsynced_profile_writes += 1);
        }
        Some(user)
    }

    pub async fn update_user_profile(&self, name: &str, goals: &str) -> Option<User> {
        self.update_profile(|user| {
            user.name = name.to_string();
            user.journaling_goals = goals.to_string();
        })
        .await
    }

    /// Updates the reminder settings and reschedules the daily reminder.
    pub async fn update_notification_preferences(
        &self,
        enabled: bool,
        time: NaiveTime,
    ) -> Option<User> {
        let user = self
            .update_profile(|user| {
                user.notifications_enabled = enabled;
                user.reminder_time = time;
            })
            .await?;
        apply_reminder_preferences(
            self.inner.services.notifications.as_ref(),
            user.notifications_enabled,
            user.reminder_time,
        );
        Some(user)
    }

    pub async fn update_theme_preference(&self, dark_mode: bool) -> Option<User> {
        self.update_profile(|user| user.prefers_dark_mode = dark_mode).await
    }

    pub async fn update_biometric_auth_preference(&self, enabled: bool) -> Option<User> {
        self.update_profile(|user| user.use_biometric_auth = enabled).await
    }
}

async fn listen(
    state: Weak<Inner>,
    mut events: tokio::sync::broadcast::Receiver<AuthStateChange>,
) {
    loop {
        let event = events.recv().await;
        let Some(inner) = state.upgrade() else {
            break;
        };
        let app = AppState { inner };
        match event {
            Ok(change) => app.handle_auth_change(change).await,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Missed {} auth events, re-reading session", skipped);
                app.resync().await;
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("Auth state listener finished");
}

fn sort_newest_first(entries: &mut [JournalEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
