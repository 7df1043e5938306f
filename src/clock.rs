//! Injectable wall clock and time zone.
//!
//! Day bucketing (streaks, the calendar) depends on "now" and on the device's
//! time zone. Both come from a [`Clock`] so tests can pin them.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};
use std::sync::Mutex;

/// Source of the current instant and of calendar-day projection.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Local wall-clock date and time of `instant`.
    fn local_datetime(&self, instant: DateTime<Utc>) -> NaiveDateTime;

    /// Calendar day of `instant` in the clock's time zone, time of day discarded.
    fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local_datetime(instant).date()
    }

    /// Today's calendar day.
    fn today(&self) -> NaiveDate {
        self.day_of(self.now())
    }
}

/// The device clock in the device's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_datetime(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&Local).naive_local()
    }
}

/// A settable clock in a fixed UTC offset.
///
/// # Examples
///
/// ```
/// use moodlog::clock::{Clock, FixedClock};
/// use chrono::{Duration, NaiveDate, TimeZone, Utc};
///
/// let clock = FixedClock::utc(Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap());
/// assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
///
/// clock.advance(Duration::hours(1));
/// assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Mutex::new(now),
            offset,
        }
    }

    /// A fixed clock whose local time zone is UTC.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Utc.fix())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = *guard + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn local_datetime(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }
}
