//! Command-line interface for the moodlog binary.
//!
//! The binary reads a user's entries either from an exported JSON file or
//! from the live backend, then prints derived statistics or one calendar day.

use crate::clock::Clock;
use crate::constants::{APP_DESCRIPTION, APP_NAME, DATE_FORMAT_COMPACT, DATE_FORMAT_ISO};
use crate::errors::{AppError, AppResult};
use crate::models::JournalEntry;
use crate::stats::JournalStats;
use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::fmt::Write;
use std::path::PathBuf;

/// Mood-tagged journaling with streaks and a calendar view
#[derive(Parser, Debug)]
#[clap(name = APP_NAME, about = APP_DESCRIPTION)]
#[clap(author, version, long_about = None)]
pub struct CliArgs {
    /// Print debug output
    #[clap(short = 'v', long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prints the day streak, the most common mood and entry counts
    Stats {
        #[clap(flatten)]
        source: EntrySource,

        /// Computes streaks as if today were this date (YYYY-MM-DD or YYYYMMDD)
        #[clap(long)]
        today: Option<String>,
    },

    /// Lists the entries written on one calendar day
    Day {
        /// The day to show (YYYY-MM-DD or YYYYMMDD)
        #[clap(short = 'd', long)]
        date: String,

        #[clap(flatten)]
        source: EntrySource,
    },
}

/// Where entries come from. Exactly one must be given.
#[derive(Args, Debug)]
#[clap(group(ArgGroup::new("source").required(true).args(&["input", "email"])))]
pub struct EntrySource {
    /// JSON file holding an array of entries
    #[clap(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Account email; entries are fetched from the backend
    #[clap(short = 'e', long)]
    pub email: Option<String>,
}

/// Parses a date in YYYY-MM-DD or YYYYMMDD format.
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT_ISO)
        .or_else(|_| NaiveDate::parse_from_str(raw, DATE_FORMAT_COMPACT))
        .map_err(|e| AppError::Cli(format!("Invalid date '{}': {}", raw, e)))
}

/// Human-readable summary of [`JournalStats`].
pub fn render_stats(stats: &JournalStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Entries:        {}", stats.total_entries);
    let _ = writeln!(out, "Day streak:     {}", stats.day_streak);
    let _ = writeln!(out, "Longest streak: {}", stats.longest_streak);
    let _ = writeln!(out, "Favorites:      {}", stats.favorite_count);
    match stats.common_mood {
        Some(mood) => {
            let _ = writeln!(out, "Common mood:    {}", mood);
        }
        None => {
            let _ = writeln!(out, "Common mood:    -");
        }
    }
    for (mood, count) in stats.mood_counts.iter().filter(|(_, count)| *count > 0) {
        let _ = writeln!(out, "  {:<12} {}", mood.to_string(), count);
    }
    out
}

/// Lists `entries` written on `date`, in the given order.
pub fn render_day(date: NaiveDate, entries: &[JournalEntry], clock: &dyn Clock) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", date.format("%A, %B %-d, %Y"));
    if entries.is_empty() {
        let _ = writeln!(out, "No entries.");
        return out;
    }

    for entry in entries {
        let time = clock.local_datetime(entry.created_at).format("%H:%M");
        let star = if entry.is_favorite { " ★" } else { "" };
        let _ = writeln!(out, "\n{} {}{}", time, entry.mood, star);
        let _ = writeln!(out, "{}", entry.content);
        if !entry.tags.is_empty() {
            let _ = writeln!(out, "#{}", entry.tags.join(" #"));
        }
    }
    out
}
