
use chrono::{Duration, TimeZone, Utc};
use moodlog::models::{JournalEntry, Mood};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};
use test_helpers::base_moodlog_command;

/// Writes an export with entries on 2024-03-13..=15 plus one on 2024-03-01.
fn write_export() -> (TempDir, PathBuf) {
    let noon = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    let mut favorite = JournalEntry::new("u1", "Sunny walk", Mood::Happy, ["outside"], noon);
    favorite.id = Some("e1".to_string());
    favorite.is_favorite = true;

    let entries = vec![
        favorite,
        JournalEntry::new("u1", "Long day", Mood::Sad, ["work"], noon - Duration::days(1)),
        JournalEntry::new("u1", "Good lunch", Mood::Happy, ["food"], noon - Duration::days(2)),
        JournalEntry::new(
            "u1",
            "Way back",
            Mood::Neutral,
            Vec::<String>::new(),
            noon - Duration::days(14),
        ),
    ];

    let dir = tempdir().unwrap();
    let path = dir.path().join("entries.json");
    fs::write(&path, serde_json::to_string_pretty(&entries).unwrap()).unwrap();
    (dir, path)
}

#[test]
fn test_cli_no_args_shows_usage() {
    base_moodlog_command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_stats_from_export() {
    let (_dir, path) = write_export();

    base_moodlog_command()
        .args(["stats", "--today", "2024-03-15", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries:        4"))
        .stdout(predicate::str::contains("Day streak:     3"))
        .stdout(predicate::str::contains("Favorites:      1"))
        .stdout(predicate::str::contains("Happy"));
}

#[test]
fn test_cli_stats_streak_broken_after_two_days() {
    let (_dir, path) = write_export();

    base_moodlog_command()
        .args(["stats", "--today", "20240317", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Day streak:     0"))
        .stdout(predicate::str::contains("Longest streak: 3"));
}

#[test]
fn test_cli_day_lists_entries() {
    let (_dir, path) = write_export();

    base_moodlog_command()
        .args(["day", "--date", "2024-03-14", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Thursday, March 14, 2024"))
        .stdout(predicate::str::contains("Long day"))
        .stdout(predicate::str::contains("#work"))
        .stdout(predicate::str::contains("Sunny walk").not());
}

#[test]
fn test_cli_day_without_entries() {
    let (_dir, path) = write_export();

    base_moodlog_command()
        .args(["day", "--date", "2024-02-29", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries."));
}

#[test]
fn test_cli_invalid_date() {
    let (_dir, path) = write_export();

    base_moodlog_command()
        .args(["day", "--date", "not-a-date", "--input"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_cli_normalizes_hand_edited_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("edited.json");
    fs::write(
        &path,
        r#"[{
            "id": "e9",
            "userId": "u1",
            "content": "Edited by hand",
            "createdAt": "2024-03-14T12:00:00Z",
            "updatedAt": "2024-03-10T12:00:00Z",
            "mood": "content",
            "tags": [" Work ", "work", "", "Garden"]
        }]"#,
    )
    .unwrap();

    base_moodlog_command()
        .args(["day", "--date", "2024-03-14", "--input"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Edited by hand"))
        .stdout(predicate::str::contains("#work #garden"))
        .stdout(predicate::str::contains("Work").not());
}

#[test]
fn test_cli_rejects_malformed_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"[{"content": "no owner"}]"#).unwrap();

    base_moodlog_command()
        .args(["stats", "--input"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid entry export"));
}

#[test]
fn test_cli_live_source_requires_backend_settings() {
    base_moodlog_command()
        .args(["stats", "--email", "ada@example.com"])
        .env("MOODLOG_PASSWORD", "irrelevant")
        .assert()
        .failure()
        .stderr(predicate::str::contains("MOODLOG_API_KEY"));
}

#[test]
fn test_cli_rejects_unknown_log_format() {
    let (_dir, path) = write_export();

    base_moodlog_command()
        .args(["stats", "--input"])
        .arg(&path)
        .env("MOODLOG_LOG_FORMAT", "xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown log format"));
}
