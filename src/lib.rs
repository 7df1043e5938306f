/*!
# moodlog

The client-side core of a mood-tagged journaling app: entries and profiles,
the statistics and calendar views derived from them, and the state container
that composes authentication and entry storage behind swappable services.

## Core Features

- Day streak, longest streak and most common mood over a user's entries
- Calendar-day grouping for "what did I write on date X"
- An observable state container with session tracking and optimistic profile updates
- Auth and journal service traits with in-memory fakes and a live REST backend
- Bounded immediate retry on transient journal failures

## Architecture

- `models`: entries, moods, drafts and user profiles
- `clock`: injectable "now" and time zone for day bucketing
- `stats` / `calendar`: pure derived views
- `services`: backend capability traits and their implementations
- `state`: the application state container
- `preferences` / `notifications`: device-local storage and reminder scheduling
- `config` / `logging` / `cli`: the binary's ambient plumbing

## Usage Example

```rust
use moodlog::clock::FixedClock;
use moodlog::models::{JournalEntry, Mood};
use moodlog::stats::JournalStats;
use chrono::{Duration, TimeZone, Utc};

let now = Utc.with_ymd_and_hms(2024, 6, 3, 18, 0, 0).unwrap();
let clock = FixedClock::utc(now);
let entries = vec![
    JournalEntry::new("u", "today", Mood::Happy, ["walk"], now),
    JournalEntry::new("u", "yesterday", Mood::Happy, ["work"], now - Duration::days(1)),
    JournalEntry::new("u", "before", Mood::Sad, ["work"], now - Duration::days(2)),
];

let stats = JournalStats::compute(&entries, &clock);
assert_eq!(stats.day_streak, 3);
assert_eq!(stats.common_mood, Some(Mood::Happy));
```
*/

/// Calendar-day grouping of entries
pub mod calendar;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Injectable clock and time zone
pub mod clock;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// Error types and utilities for error handling
pub mod errors;
/// Tracing subscriber setup
pub mod logging;
/// Journal data types
pub mod models;
/// Daily reminder scheduling
pub mod notifications;
/// Device-local preferences
pub mod preferences;
/// Bounded retry for journal calls
pub mod retry;
/// Backend service contracts and implementations
pub mod services;
/// The application state container
pub mod state;
/// Derived statistics
pub mod stats;

// Re-export important types for convenience
pub use config::Config;
pub use errors::{AppError, AppResult, AuthError, JournalError};
pub use state::{AppServices, AppSnapshot, AppState, SessionState};
