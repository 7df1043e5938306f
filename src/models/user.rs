//! User profile and preferences.

use crate::constants::{DEFAULT_REMINDER_HOUR, DEFAULT_REMINDER_MINUTE};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A user's profile as stored in the `users` collection.
///
/// The backend copy is authoritative; the state container holds a possibly
/// briefly stale mirror of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub journaling_goals: String,
    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,
    /// Only hour and minute are significant.
    #[serde(default = "default_reminder_time")]
    pub reminder_time: NaiveTime,
    #[serde(default)]
    pub use_biometric_auth: bool,
    #[serde(default)]
    pub prefers_dark_mode: bool,
}

fn default_notifications_enabled() -> bool {
    true
}

/// The 20:00 daily reminder given to new accounts.
pub fn default_reminder_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_REMINDER_HOUR, DEFAULT_REMINDER_MINUTE, 0)
        .unwrap_or(NaiveTime::MIN)
}

impl User {
    /// Creates a user with signup defaults.
    ///
    /// ```
    /// use moodlog::models::User;
    /// use chrono::NaiveTime;
    ///
    /// let user = User::new("uid", "a@b.c", "Ada");
    /// assert!(user.notifications_enabled);
    /// assert_eq!(user.reminder_time, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
    /// assert!(!user.prefers_dark_mode);
    /// ```
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            journaling_goals: String::new(),
            notifications_enabled: default_notifications_enabled(),
            reminder_time: default_reminder_time(),
            use_biometric_auth: false,
            prefers_dark_mode: false,
        }
    }

    /// Overlays a stored profile onto an identity-only record.
    ///
    /// The identity's `id` always wins; an empty profile email falls back to
    /// the identity's.
    pub fn merge_profile(&self, profile: &User) -> User {
        let email = if profile.email.is_empty() {
            self.email.clone()
        } else {
            profile.email.clone()
        };
        User {
            id: self.id.clone(),
            email,
            ..profile.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_profile_keeps_identity_id() {
        let identity = User::new("uid-1", "ada@example.com", "");
        let mut profile = User::new("stale-id", "", "Ada");
        profile.journaling_goals = "write daily".to_string();
        profile.prefers_dark_mode = true;

        let merged = identity.merge_profile(&profile);
        assert_eq!(merged.id, "uid-1");
        assert_eq!(merged.email, "ada@example.com");
        assert_eq!(merged.name, "Ada");
        assert_eq!(merged.journaling_goals, "write daily");
        assert!(merged.prefers_dark_mode);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let user: User =
            serde_json::from_str(r#"{"id":"u","email":"e@x.io","name":"N"}"#).unwrap();
        assert!(user.notifications_enabled);
        assert_eq!(user.reminder_time, default_reminder_time());
        assert!(user.journaling_goals.is_empty());
    }
}
