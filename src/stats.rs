//! Derived statistics over a user's entries.
//!
//! Everything here is computed from the in-memory entry list without a
//! backend round-trip. Calendar days are taken in the clock's local time zone.

use crate::clock::Clock;
use crate::models::{JournalEntry, Mood};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Summary values shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalStats {
    pub total_entries: usize,
    pub day_streak: u32,
    pub longest_streak: u32,
    /// `None` when there are no entries.
    pub common_mood: Option<Mood>,
    pub favorite_count: usize,
    /// Occurrences per mood, in [`Mood::ALL`] order.
    pub mood_counts: Vec<(Mood, usize)>,
}

impl JournalStats {
    pub fn compute(entries: &[JournalEntry], clock: &dyn Clock) -> Self {
        let mood_counts = Mood::ALL
            .iter()
            .map(|mood| (*mood, entries.iter().filter(|e| e.mood == *mood).count()))
            .collect();

        Self {
            total_entries: entries.len(),
            day_streak: day_streak(entries, clock),
            longest_streak: longest_streak(entries, clock),
            common_mood: common_mood(entries),
            favorite_count: entries.iter().filter(|e| e.is_favorite).count(),
            mood_counts,
        }
    }
}

fn entry_days(entries: &[JournalEntry], clock: &dyn Clock) -> BTreeSet<NaiveDate> {
    entries.iter().map(|e| clock.day_of(e.created_at)).collect()
}

/// Consecutive days with at least one entry, ending at the most recent such day.
///
/// The streak is broken (zero) unless the most recent entry day is today or
/// yesterday. Several entries on one day count once.
///
/// # Examples
///
/// ```
/// use moodlog::clock::FixedClock;
/// use moodlog::models::{JournalEntry, Mood};
/// use moodlog::stats::day_streak;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
/// let clock = FixedClock::utc(now);
/// let entries: Vec<JournalEntry> = (0..3)
///     .map(|d| JournalEntry::new("u", "x", Mood::Happy, ["t"], now - Duration::days(d)))
///     .collect();
///
/// assert_eq!(day_streak(&entries, &clock), 3);
/// assert_eq!(day_streak(&[], &clock), 0);
/// ```
pub fn day_streak(entries: &[JournalEntry], clock: &dyn Clock) -> u32 {
    let days = entry_days(entries, clock);
    let Some(&most_recent) = days.iter().next_back() else {
        return 0;
    };

    let today = clock.today();
    if most_recent != today && Some(most_recent) != today.pred_opt() {
        return 0;
    }

    let mut streak = 0;
    let mut day = Some(most_recent);
    while let Some(current) = day.filter(|d| days.contains(d)) {
        streak += 1;
        day = current.pred_opt();
    }
    streak
}

/// Longest run of consecutive entry days anywhere in the history.
pub fn longest_streak(entries: &[JournalEntry], clock: &dyn Clock) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in entry_days(entries, clock) {
        current = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }
    longest
}

/// The mood with the highest occurrence count.
///
/// Ties go to the mood encountered first in `entries`. Entries are normally
/// newest-first, so the most recently used of the tied moods wins.
///
/// ```
/// use moodlog::models::{JournalEntry, Mood};
/// use moodlog::stats::common_mood;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let entries: Vec<JournalEntry> = [Mood::Happy, Mood::Happy, Mood::Sad]
///     .into_iter()
///     .map(|m| JournalEntry::new("u", "x", m, ["t"], now))
///     .collect();
/// assert_eq!(common_mood(&entries), Some(Mood::Happy));
/// assert_eq!(common_mood(&[]), None);
/// ```
pub fn common_mood(entries: &[JournalEntry]) -> Option<Mood> {
    // (mood, count) in first-seen order
    let mut tally: Vec<(Mood, usize)> = Vec::with_capacity(Mood::ALL.len());
    for entry in entries {
        match tally.iter_mut().find(|(mood, _)| *mood == entry.mood) {
            Some((_, count)) => *count += 1,
            None => tally.push((entry.mood, 1)),
        }
    }

    tally
        .into_iter()
        .fold(None, |best: Option<(Mood, usize)>, (mood, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((mood, count)),
        })
        .map(|(mood, _)| mood)
}
