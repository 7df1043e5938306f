//! Calendar-day grouping of entries.
//!
//! The calendar view answers "what did I write on date X" from the already
//! fetched entry list instead of issuing a per-date query.

use crate::clock::Clock;
use crate::models::JournalEntry;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Buckets entries by local calendar day of `created_at`.
///
/// Within a day, entries keep their input order.
///
/// ```
/// use moodlog::calendar::group_by_date;
/// use moodlog::clock::FixedClock;
/// use moodlog::models::{JournalEntry, Mood};
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
/// let clock = FixedClock::utc(now);
/// let entries = vec![
///     JournalEntry::new("u", "morning", Mood::Happy, ["t"], now),
///     JournalEntry::new("u", "evening", Mood::Sad, ["t"], now),
/// ];
///
/// let groups = group_by_date(&entries, &clock);
/// let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
/// assert_eq!(groups[&day].len(), 2);
/// assert_eq!(groups[&day][0].content, "morning");
/// ```
pub fn group_by_date(
    entries: &[JournalEntry],
    clock: &dyn Clock,
) -> BTreeMap<NaiveDate, Vec<JournalEntry>> {
    let mut groups: BTreeMap<NaiveDate, Vec<JournalEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry(clock.day_of(entry.created_at))
            .or_default()
            .push(entry.clone());
    }
    groups
}

/// Date-indexed view over a set of entries.
#[derive(Debug, Clone, Default)]
pub struct CalendarIndex {
    days: BTreeMap<NaiveDate, Vec<JournalEntry>>,
}

impl CalendarIndex {
    pub fn new(entries: &[JournalEntry], clock: &dyn Clock) -> Self {
        Self {
            days: group_by_date(entries, clock),
        }
    }

    /// Entries written on `date`; empty when there are none.
    pub fn entries_on(&self, date: NaiveDate) -> &[JournalEntry] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_entries(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Days of the given month that have at least one entry.
    pub fn days_in_month(&self, year: i32, month: u32) -> BTreeSet<NaiveDate> {
        self.days
            .keys()
            .filter(|day| day.year() == year && day.month() == month)
            .copied()
            .collect()
    }

    /// Number of distinct days with entries.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::Mood;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn entry(content: &str, at: DateTime<Utc>, mood: Mood) -> JournalEntry {
        let mut entry = JournalEntry::new("u1", content, mood, ["t"], at);
        entry.id = Some(content.to_string());
        entry
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_every_entry_lands_in_its_day_once() {
        let clock = FixedClock::utc(now());
        let entries: Vec<JournalEntry> = (0..10)
            .map(|i| entry(&format!("e{}", i), now() - Duration::hours(i * 7), Mood::Neutral))
            .collect();

        let groups = group_by_date(&entries, &clock);
        for e in &entries {
            let bucket = &groups[&clock.day_of(e.created_at)];
            assert_eq!(bucket.iter().filter(|x| x.id == e.id).count(), 1);
        }
        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, entries.len());
    }

    #[test]
    fn test_order_within_day_is_stable() {
        let clock = FixedClock::utc(now());
        let entries = vec![
            entry("late", now() + Duration::hours(3), Mood::Happy),
            entry("early", now() - Duration::hours(3), Mood::Sad),
            entry("noon", now(), Mood::Content),
        ];

        let groups = group_by_date(&entries, &clock);
        let ids: Vec<_> = groups[&date(2024, 6, 15)]
            .iter()
            .map(|e| e.content.as_str())
            .collect();
        assert_eq!(ids, vec!["late", "early", "noon"]);
    }

    #[test]
    fn test_same_day_two_moods() {
        let clock = FixedClock::utc(now());
        let entries = vec![
            entry("a", now(), Mood::Happy),
            entry("b", now() - Duration::hours(1), Mood::Sad),
        ];
        let index = CalendarIndex::new(&entries, &clock);
        assert_eq!(index.entries_on(date(2024, 6, 15)).len(), 2);
        assert_eq!(crate::stats::common_mood(&entries), Some(Mood::Happy));
    }

    #[test]
    fn test_missing_day_is_empty_not_error() {
        let clock = FixedClock::utc(now());
        let index = CalendarIndex::new(&[entry("a", now(), Mood::Happy)], &clock);
        assert!(index.entries_on(date(2020, 1, 1)).is_empty());
        assert!(!index.has_entries(date(2020, 1, 1)));
        assert!(index.has_entries(date(2024, 6, 15)));
    }

    #[test]
    fn test_day_key_follows_time_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 30, 23, 0, 0).unwrap();
        let entries = vec![entry("a", instant, Mood::Happy)];
        let clock = FixedClock::new(now(), FixedOffset::east_opt(3600 * 5).unwrap());

        let index = CalendarIndex::new(&entries, &clock);
        assert!(index.has_entries(date(2024, 7, 1)));
        assert!(!index.has_entries(date(2024, 6, 30)));
    }

    #[test]
    fn test_days_in_month() {
        let clock = FixedClock::utc(now());
        let entries = vec![
            entry("a", now(), Mood::Happy),
            entry("b", now() - Duration::days(3), Mood::Happy),
            entry("c", now() - Duration::days(3), Mood::Sad),
            entry("d", now() - Duration::days(20), Mood::Sad),
        ];
        let index = CalendarIndex::new(&entries, &clock);

        let june = index.days_in_month(2024, 6);
        assert_eq!(
            june.into_iter().collect::<Vec<_>>(),
            vec![date(2024, 6, 12), date(2024, 6, 15)]
        );
        assert_eq!(index.days_in_month(2024, 5).len(), 1);
        assert_eq!(index.day_count(), 3);
    }
}
