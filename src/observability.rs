//! Logging setup and per-engine counters

use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Cannot open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Logging already initialized: {0}")]
    Init(String),
}

/// Log level as given on the command line.
///
/// Accepts `DEBUG`, `INFO`, `WARNING`/`WARN`, `ERROR` and `CRITICAL` in any
/// case. `CRITICAL` has no tracing equivalent and maps to error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub LevelFilter);

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let filter = match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => LevelFilter::TRACE,
            "DEBUG" => LevelFilter::DEBUG,
            "INFO" => LevelFilter::INFO,
            "WARNING" | "WARN" => LevelFilter::WARN,
            "ERROR" | "CRITICAL" => LevelFilter::ERROR,
            "OFF" => LevelFilter::OFF,
            _ => return Err(LoggingError::InvalidLevel(s.to_string())),
        };
        Ok(LogLevel(filter))
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` directives, when set, refine the given level. With a log file
/// the output is appended there without ANSI colors; otherwise it goes to
/// stdout.
pub fn init_logging(level: LogLevel, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.0.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::LogFile {
                    path: path.display().to_string(),
                    source,
                })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.try_init(),
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))?;

    match log_file {
        Some(path) => tracing::debug!(level = %level.0, logfile = %path.display(), "Logging configured"),
        None => tracing::debug!(level = %level.0, "Logging configured, display output"),
    }
    Ok(())
}

/// Counters for one stream engine
#[derive(Debug, Default)]
pub struct Metrics {
    items_seen: AtomicU64,
    items_skipped: AtomicU64,
    items_processed: AtomicU64,
    replies_sent: AtomicU64,
    captures_succeeded: AtomicU64,
    captures_failed: AtomicU64,
    stream_faults: AtomicU64,
    fault_sleeps: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_seen(&self) {
        self.items_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn item_skipped(&self) {
        self.items_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "items_skipped", "Metric incremented");
    }

    pub fn item_processed(&self) {
        self.items_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reply_sent(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn capture(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.captures_succeeded
        } else {
            &self.captures_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stream_fault(&self) {
        self.stream_faults.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "stream_faults", "Metric incremented");
    }

    pub fn fault_sleep(&self) {
        self.fault_sleeps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_seen: self.items_seen.load(Ordering::Relaxed),
            items_skipped: self.items_skipped.load(Ordering::Relaxed),
            items_processed: self.items_processed.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            captures_succeeded: self.captures_succeeded.load(Ordering::Relaxed),
            captures_failed: self.captures_failed.load(Ordering::Relaxed),
            stream_faults: self.stream_faults.load(Ordering::Relaxed),
            fault_sleeps: self.fault_sleeps.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub items_seen: u64,
    pub items_skipped: u64,
    pub items_processed: u64,
    pub replies_sent: u64,
    pub captures_succeeded: u64,
    pub captures_failed: u64,
    pub stream_faults: u64,
    pub fault_sleeps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap().0, LevelFilter::WARN);
        assert_eq!("debug".parse::<LogLevel>().unwrap().0, LevelFilter::DEBUG);
        assert_eq!("Critical".parse::<LogLevel>().unwrap().0, LevelFilter::ERROR);
        assert!(matches!("LOUD".parse::<LogLevel>(), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.item_seen();
        metrics.item_seen();
        metrics.item_skipped();
        metrics.capture(true);
        metrics.capture(false);
        metrics.capture(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.items_seen, 2);
        assert_eq!(snapshot.items_skipped, 1);
        assert_eq!(snapshot.captures_succeeded, 1);
        assert_eq!(snapshot.captures_failed, 2);
        assert_eq!(snapshot.replies_sent, 0);
    }
}
