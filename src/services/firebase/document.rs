//! Conversion between models and Firestore documents.
//!
//! Firestore's REST API wraps every field in a typed value object, e.g.
//! `{"stringValue": "..."}` or `{"timestampValue": "2024-01-01T00:00:00Z"}`.
//! `reminderTime` is stored as a timestamp on the Unix epoch day; only its
//! UTC time of day is meaningful.

use crate::errors::DecodeError;
use crate::models::{JournalEntry, Mood, User};
use crate::models::user::default_reminder_time;
use chrono::{DateTime, NaiveTime, SecondsFormat, Timelike, Utc};
use serde_json::{json, Map, Value};

fn string(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn boolean(value: bool) -> Value {
    json!({ "booleanValue": value })
}

fn timestamp(value: DateTime<Utc>) -> Value {
    json!({ "timestampValue": value.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

fn string_array(values: &[String]) -> Value {
    let values: Vec<Value> = values.iter().map(|v| string(v)).collect();
    json!({ "arrayValue": { "values": values } })
}

/// Encodes a time of day as a timestamp on 1970-01-01 UTC.
fn time_of_day(value: NaiveTime) -> Value {
    let seconds = i64::from(value.hour() * 3600 + value.minute() * 60);
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(timestamp)
        .unwrap_or(Value::Null)
}

fn fields(document: &Value) -> Result<&Map<String, Value>, DecodeError> {
    document
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| DecodeError("document has no fields".to_string()))
}

fn get_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)?
        .get("stringValue")?
        .as_str()
        .map(str::to_string)
}

fn require_string(fields: &Map<String, Value>, key: &str) -> Result<String, DecodeError> {
    get_string(fields, key).ok_or_else(|| DecodeError(format!("missing string field '{}'", key)))
}

fn get_bool(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    fields.get(key)?.get("booleanValue")?.as_bool()
}

fn get_timestamp(fields: &Map<String, Value>, key: &str) -> Result<DateTime<Utc>, DecodeError> {
    let raw = fields
        .get(key)
        .and_then(|v| v.get("timestampValue"))
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError(format!("missing timestamp field '{}'", key)))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DecodeError(format!("invalid timestamp '{}': {}", key, e)))
}

fn get_string_array(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(|v| v.get("arrayValue"))
        .and_then(|v| v.get("values"))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.get("stringValue").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Last path segment of a document `name`.
pub fn document_id(document: &Value) -> Option<String> {
    document
        .get("name")?
        .as_str()?
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Firestore `fields` object for an entry. The id lives in the document name.
pub fn entry_fields(entry: &JournalEntry) -> Value {
    json!({
        "userId": string(&entry.user_id),
        "content": string(&entry.content),
        "createdAt": timestamp(entry.created_at),
        "updatedAt": timestamp(entry.updated_at),
        "mood": string(entry.mood.as_str()),
        "tags": string_array(&entry.tags),
        "isFavorite": boolean(entry.is_favorite),
    })
}

/// Decodes a `journalEntries` document and normalises it with
/// [`JournalEntry::normalized`].
pub fn entry_from_document(document: &Value) -> Result<JournalEntry, DecodeError> {
    let fields = fields(document)?;
    let mood_raw = require_string(fields, "mood")?;
    let mood: Mood = mood_raw.parse()?;

    Ok(JournalEntry {
        id: document_id(document),
        user_id: require_string(fields, "userId")?,
        content: get_string(fields, "content").unwrap_or_default(),
        created_at: get_timestamp(fields, "createdAt")?,
        updated_at: get_timestamp(fields, "updatedAt")?,
        mood,
        tags: get_string_array(fields, "tags"),
        is_favorite: get_bool(fields, "isFavorite").unwrap_or(false),
    }
    .normalized())
}

/// Firestore `fields` object for a profile.
pub fn user_fields(user: &User) -> Value {
    json!({
        "email": string(&user.email),
        "name": string(&user.name),
        "journalingGoals": string(&user.journaling_goals),
        "notificationsEnabled": boolean(user.notifications_enabled),
        "reminderTime": time_of_day(user.reminder_time),
        "useBiometricAuth": boolean(user.use_biometric_auth),
        "prefersDarkMode": boolean(user.prefers_dark_mode),
    })
}

/// Decodes a `users` document; absent fields take signup defaults.
pub fn user_from_document(document: &Value) -> Result<User, DecodeError> {
    let fields = fields(document)?;
    let id = document_id(document).ok_or_else(|| DecodeError("document has no name".to_string()))?;
    let defaults = User::new(&id, "", "");

    let reminder_time = get_timestamp(fields, "reminderTime")
        .map(|t| {
            NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or_else(default_reminder_time)
        })
        .unwrap_or(defaults.reminder_time);

    Ok(User {
        id,
        email: get_string(fields, "email").unwrap_or_default(),
        name: get_string(fields, "name").unwrap_or_default(),
        journaling_goals: get_string(fields, "journalingGoals").unwrap_or_default(),
        notifications_enabled: get_bool(fields, "notificationsEnabled")
            .unwrap_or(defaults.notifications_enabled),
        reminder_time,
        use_biometric_auth: get_bool(fields, "useBiometricAuth").unwrap_or(false),
        prefers_dark_mode: get_bool(fields, "prefersDarkMode").unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored_entry() -> JournalEntry {
        let created = Utc.with_ymd_and_hms(2024, 2, 29, 8, 15, 0).unwrap();
        let mut entry =
            JournalEntry::new("uid-9", "Leap day", Mood::Content, ["rare", "calm"], created);
        entry.id = Some("doc-42".to_string());
        entry.is_favorite = true;
        entry
    }

    #[test]
    fn test_entry_fields_use_typed_values() {
        let fields = entry_fields(&stored_entry());
        assert_eq!(fields["userId"]["stringValue"], "uid-9");
        assert_eq!(fields["mood"]["stringValue"], "content");
        assert_eq!(fields["isFavorite"]["booleanValue"], true);
        assert_eq!(
            fields["createdAt"]["timestampValue"],
            "2024-02-29T08:15:00.000000Z"
        );
        assert_eq!(fields["tags"]["arrayValue"]["values"][1]["stringValue"], "calm");
        assert!(fields.get("id").is_none());
    }

    #[test]
    fn test_entry_from_document() {
        let entry = stored_entry();
        let document = json!({
            "name": "projects/p/databases/(default)/documents/journalEntries/doc-42",
            "fields": entry_fields(&entry),
        });
        assert_eq!(entry_from_document(&document).unwrap(), entry);
    }

    #[test]
    fn test_entry_with_unknown_mood_fails() {
        let mut fields = entry_fields(&stored_entry());
        fields["mood"] = json!({ "stringValue": "elated" });
        let document = json!({ "name": "x/journalEntries/d", "fields": fields });
        let err = entry_from_document(&document).unwrap_err();
        assert!(err.0.contains("elated"));
    }

    #[test]
    fn test_entry_from_document_normalizes_stored_values() {
        let entry = stored_entry();
        let mut fields = entry_fields(&entry);
        fields["tags"] = string_array(&["Calm ".to_string(), "calm".to_string(), " ".to_string()]);
        fields["updatedAt"] = json!({ "timestampValue": "2024-02-28T23:00:00Z" });
        let document = json!({ "name": "x/journalEntries/doc-42", "fields": fields });

        let decoded = entry_from_document(&document).unwrap();
        assert_eq!(decoded.tags, vec!["calm"]);
        assert_eq!(decoded.updated_at, entry.created_at);
    }

    #[test]
    fn test_entry_missing_user_fails() {
        let document = json!({
            "name": "x/journalEntries/d",
            "fields": { "mood": { "stringValue": "sad" } },
        });
        assert!(entry_from_document(&document).is_err());
    }

    #[test]
    fn test_empty_tag_array_decodes() {
        let mut fields = entry_fields(&stored_entry());
        fields["tags"] = json!({ "arrayValue": {} });
        let document = json!({ "name": "x/journalEntries/d", "fields": fields });
        assert!(entry_from_document(&document).unwrap().tags.is_empty());
    }

    #[test]
    fn test_reminder_time_round_trips_through_epoch_timestamp() {
        let mut user = User::new("uid-1", "a@b.io", "Ada");
        user.reminder_time = NaiveTime::from_hms_opt(7, 45, 0).unwrap();
        user.prefers_dark_mode = true;

        let fields = user_fields(&user);
        assert_eq!(
            fields["reminderTime"]["timestampValue"],
            "1970-01-01T07:45:00.000000Z"
        );

        let document = json!({ "name": "p/users/uid-1", "fields": fields });
        assert_eq!(user_from_document(&document).unwrap(), user);
    }

    #[test]
    fn test_sparse_profile_takes_defaults() {
        let document = json!({
            "name": "p/users/uid-2",
            "fields": { "name": { "stringValue": "Bo" } },
        });
        let user = user_from_document(&document).unwrap();
        assert_eq!(user.name, "Bo");
        assert!(user.notifications_enabled);
        assert_eq!(user.reminder_time, default_reminder_time());
    }
}
