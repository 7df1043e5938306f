/*!
# moodlog

Command-line companion for a mood-tagged journal. It reads a user's entries
from an exported JSON file or from the live backend and prints the derived
statistics the app shows on its home screen, or the entries of one calendar
day.

## Usage

```text
moodlog stats (--input FILE | --email EMAIL) [--today DATE]
moodlog day --date DATE (--input FILE | --email EMAIL)

Options:
  -v, --verbose     Print debug output
  -h, --help        Print help information
  -V, --version     Print version information
```

## Configuration

See [`moodlog::config`] for the environment variables. Live commands need
`MOODLOG_API_KEY` and `MOODLOG_PROJECT_ID`; the password is read from
`MOODLOG_PASSWORD` or prompted for.
*/

use chrono::{Local, NaiveTime, Offset, TimeZone, Utc};
use clap::Parser;
use moodlog::calendar::CalendarIndex;
use moodlog::cli::{self, CliArgs, Command, EntrySource};
use moodlog::clock::{Clock, FixedClock, SystemClock};
use moodlog::constants::ENV_VAR_PASSWORD;
use moodlog::errors::{AppError, AppResult};
use moodlog::models::JournalEntry;
use moodlog::notifications::RecordingScheduler;
use moodlog::preferences::FilePreferenceStore;
use moodlog::services::{FirebaseAuthService, FirebaseSession, FirestoreJournalService};
use moodlog::state::{AppServices, AppState};
use moodlog::stats::JournalStats;
use moodlog::{logging, Config};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();

    let config = Config::load()?;
    logging::init(config.log_format, &config.log_level, args.verbose);
    info!("Starting moodlog");
    debug!("Configuration: {:?}", config);

    match args.command {
        Command::Stats { source, today } => {
            let clock: Arc<dyn Clock> = match today {
                Some(raw) => Arc::new(clock_at_noon(cli::parse_date(&raw)?)?),
                None => Arc::new(SystemClock),
            };
            let entries = load_entries(&source, &config, clock.clone()).await?;
            let stats = JournalStats::compute(&entries, clock.as_ref());
            print!("{}", cli::render_stats(&stats));
        }
        Command::Day { date, source } => {
            let date = cli::parse_date(&date)?;
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let entries = load_entries(&source, &config, clock.clone()).await?;
            let calendar = CalendarIndex::new(&entries, clock.as_ref());
            print!("{}", cli::render_day(date, calendar.entries_on(date), clock.as_ref()));
        }
    }

    info!("Done");
    Ok(())
}

/// A clock frozen at local noon on `date`, in the device's current offset.
fn clock_at_noon(date: chrono::NaiveDate) -> AppResult<FixedClock> {
    let offset = Local::now().offset().fix();
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
    let now = offset
        .from_local_datetime(&noon)
        .single()
        .ok_or_else(|| AppError::Cli(format!("Cannot place {} in the local time zone", date)))?
        .with_timezone(&Utc);
    Ok(FixedClock::new(now, offset))
}

async fn load_entries(
    source: &EntrySource,
    config: &Config,
    clock: Arc<dyn Clock>,
) -> AppResult<Vec<JournalEntry>> {
    match (&source.input, &source.email) {
        (Some(path), _) => read_entries_file(path),
        (None, Some(email)) => fetch_entries(config, email, clock).await,
        (None, None) => Err(AppError::Cli(
            "Either --input or --email is required".to_string(),
        )),
    }
}

fn read_entries_file(path: &Path) -> AppResult<Vec<JournalEntry>> {
    debug!("Reading entries from {:?}", path);
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<JournalEntry> = serde_json::from_str(&raw).map_err(|e| {
        AppError::Cli(format!(
            "{} is not a valid entry export: {}",
            path.display(),
            e
        ))
    })?;
    let mut entries: Vec<JournalEntry> =
        entries.into_iter().map(JournalEntry::normalized).collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    info!("Loaded {} entries from file", entries.len());
    Ok(entries)
}

async fn fetch_entries(
    config: &Config,
    email: &str,
    clock: Arc<dyn Clock>,
) -> AppResult<Vec<JournalEntry>> {
    let settings = config.require_backend()?;
    let session = Arc::new(FirebaseSession::new());

    let state = AppState::new(AppServices {
        auth: Arc::new(FirebaseAuthService::new(&settings, session.clone())),
        journal: Arc::new(FirestoreJournalService::new(
            &settings,
            session,
            config.retry_policy(),
        )),
        preferences: Arc::new(FilePreferenceStore::new(&config.preferences_path)),
        notifications: Arc::new(RecordingScheduler::new()),
        clock,
    });

    let password = read_password()?;
    state.login(email, &password).await?;
    let entries = state.fetch_entries().await;
    state.logout().await;
    Ok(entries?)
}

fn read_password() -> AppResult<Zeroizing<String>> {
    if let Ok(password) = env::var(ENV_VAR_PASSWORD) {
        return Ok(Zeroizing::new(password));
    }
    let password = rpassword::prompt_password("Password: ")?;
    Ok(Zeroizing::new(password))
}
