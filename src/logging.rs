//! Tracing subscriber setup for the binary.

use crate::config::LogFormat;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset: `level` for this crate, warn elsewhere.
pub fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("warn,moodlog={}", level))
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `level`. `verbose` forces debug output for this
/// crate. Calling this more than once keeps the first subscriber.
pub fn init(format: LogFormat, level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(e) = result {
        tracing::debug!("Subscriber already installed: {}", e);
    }
}
