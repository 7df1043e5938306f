//! Journal entries.

use super::Mood;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single mood-tagged journal record.
///
/// `id` is `None` until the entry has been persisted; the journal service
/// assigns it. `created_at` never changes after construction and `updated_at`
/// never falls behind it.
///
/// # Examples
///
/// ```
/// use moodlog::models::{JournalEntry, Mood};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let tags = ["Outside", "walk", "outside"];
/// let entry = JournalEntry::new("user-1", "Long walk today", Mood::Content, tags, now);
/// assert!(!entry.is_persisted());
/// assert_eq!(entry.created_at, entry.updated_at);
/// assert_eq!(entry.tags, vec!["outside".to_string(), "walk".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub mood: Mood,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl JournalEntry {
    /// Builds a not-yet-persisted entry stamped with `now`.
    pub fn new<I, S>(
        user_id: impl Into<String>,
        content: impl Into<String>,
        mood: Mood,
        tags: I,
        now: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            id: None,
            user_id: user_id.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            mood,
            tags: normalize_tags(tags),
            is_favorite: false,
        }
    }

    /// Whether the backend has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Marks the entry as modified at `now`, clamped so `updated_at >= created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// Re-establishes the model invariants on an entry read from outside,
    /// such as a stored document or an export file.
    ///
    /// Tags are normalised and `updated_at` is clamped to `created_at`.
    pub fn normalized(mut self) -> Self {
        self.tags = normalize_tags(&self.tags);
        self.updated_at = self.updated_at.max(self.created_at);
        self
    }

    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
    }

    /// Adds a tag if its normalised form is not already present.
    ///
    /// Returns `true` when the tag was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }
}

/// What the user typed for a new entry, before ownership and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub content: String,
    pub mood: Mood,
    pub tags: Vec<String>,
}

impl EntryDraft {
    pub fn new(content: impl Into<String>, mood: Mood) -> Self {
        Self {
            content: content.into(),
            mood,
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    /// Whether the content is empty once whitespace is ignored.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Stamps the draft as a new entry owned by `user_id`.
    pub fn into_entry(self, user_id: impl Into<String>, now: DateTime<Utc>) -> JournalEntry {
        JournalEntry::new(user_id, self.content, self.mood, self.tags, now)
    }
}

/// Lowercases and trims tags, dropping empties and later duplicates.
///
/// ```
/// use moodlog::models::normalize_tags;
///
/// let tags = normalize_tags(["Work", " work ", "", "Family"]);
/// assert_eq!(tags, vec!["work", "family"]);
/// ```
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_new_entry_is_pending() {
        let entry = JournalEntry::new("u1", "text", Mood::Happy, Vec::<String>::new(), at(9));
        assert_eq!(entry.id, None);
        assert!(!entry.is_persisted());
        assert!(!entry.is_favorite);
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn test_persisted_entry_has_id() {
        let mut entry = JournalEntry::new("u1", "text", Mood::Happy, ["a"], at(9));
        entry.id = Some("doc-1".to_string());
        assert!(entry.is_persisted());
    }

    #[test]
    fn test_touch_moves_updated_at_forward() {
        let mut entry = JournalEntry::new("u1", "text", Mood::Sad, ["a"], at(9));
        entry.touch(at(11));
        assert_eq!(entry.updated_at, at(11));
        assert_eq!(entry.created_at, at(9));
    }

    #[test]
    fn test_touch_never_precedes_creation() {
        let mut entry = JournalEntry::new("u1", "text", Mood::Sad, ["a"], at(9));
        entry.touch(at(9) - Duration::minutes(5));
        assert_eq!(entry.updated_at, entry.created_at);
    }

    #[test]
    fn test_normalized_repairs_external_entry() {
        let mut entry = JournalEntry::new("u1", "text", Mood::Content, ["a"], at(9));
        entry.tags = [" Work ", "work", "", "Gym"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        entry.updated_at = at(7);

        let entry = entry.normalized();
        assert_eq!(entry.tags, vec!["work", "gym"]);
        assert_eq!(entry.updated_at, at(9));
        assert_eq!(entry.created_at, at(9));
    }

    #[test]
    fn test_normalized_keeps_valid_entry() {
        let mut entry = JournalEntry::new("u1", "text", Mood::Content, ["a", "b"], at(9));
        entry.touch(at(12));
        assert_eq!(entry.clone().normalized(), entry);
    }

    #[test]
    fn test_add_tag_dedupes() {
        let mut entry = JournalEntry::new("u1", "text", Mood::Neutral, ["work"], at(9));
        assert!(!entry.add_tag("WORK"));
        assert!(!entry.add_tag("   "));
        assert!(entry.add_tag("Gym"));
        assert_eq!(entry.tags, vec!["work", "gym"]);
    }

    #[test]
    fn test_serde_camel_case_and_optional_id() {
        let entry = JournalEntry::new("u1", "text", Mood::Angry, ["x"], at(9));
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["isFavorite"], false);
        assert_eq!(json["mood"], "angry");

        let parsed: JournalEntry = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_draft_into_entry() {
        let draft = EntryDraft::new("  ", Mood::Neutral);
        assert!(draft.is_blank());

        let entry = EntryDraft::new("Rainy", Mood::Sad)
            .with_tags(["Weather", "weather"])
            .into_entry("u7", at(18));
        assert_eq!(entry.user_id, "u7");
        assert_eq!(entry.tags, vec!["weather".to_string()]);
        assert_eq!(entry.created_at, at(18));
        assert!(!entry.is_persisted());
    }
}
