//! Daily reminder scheduling.
//!
//! The delivery mechanism is platform specific and lives behind
//! [`NotificationScheduler`]. At most one repeating reminder is pending at any
//! time: every change cancels everything first.

use crate::services::lock;
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use std::sync::Mutex;
use tracing::{debug, info};

/// A repeating reminder that fires every day at `time` (local).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReminder {
    pub time: NaiveTime,
}

/// Platform notification scheduling.
pub trait NotificationScheduler: Send + Sync {
    fn schedule_daily(&self, reminder: DailyReminder);

    fn cancel_all(&self);
}

/// Brings the pending reminders in line with the user's settings.
///
/// Cancels all pending reminders, then schedules exactly one when `enabled`.
/// Seconds in `time` are ignored.
pub fn apply_reminder_preferences(
    scheduler: &dyn NotificationScheduler,
    enabled: bool,
    time: NaiveTime,
) {
    scheduler.cancel_all();
    if !enabled {
        info!("Daily reminder disabled");
        return;
    }

    let time = truncate_to_minute(time);
    info!("Daily reminder set for {}", time.format("%H:%M"));
    scheduler.schedule_daily(DailyReminder { time });
}

/// Next local instant strictly after `now_local` at `time` of day.
///
/// ```
/// use moodlog::notifications::next_fire_time;
/// use chrono::{NaiveDate, NaiveTime};
///
/// let now = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(20, 0, 0).unwrap();
/// let at_eight = NaiveTime::from_hms_opt(20, 0, 0).unwrap();
/// assert_eq!(next_fire_time(now, at_eight).date(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
/// ```
pub fn next_fire_time(now_local: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let today = now_local.date().and_time(truncate_to_minute(time));
    if today > now_local {
        today
    } else {
        today + Duration::days(1)
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// A scheduler that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    pending: Mutex<Vec<DailyReminder>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reminders currently scheduled.
    pub fn pending(&self) -> Vec<DailyReminder> {
        lock(&self.pending).clone()
    }
}

impl NotificationScheduler for RecordingScheduler {
    fn schedule_daily(&self, reminder: DailyReminder) {
        debug!("Scheduling daily reminder at {}", reminder.time);
        lock(&self.pending).push(reminder);
    }

    fn cancel_all(&self) {
        lock(&self.pending).clear();
    }
}
