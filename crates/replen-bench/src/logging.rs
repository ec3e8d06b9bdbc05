//! Subscriber setup driven by `REPLEN_TRACE`, `REPLEN_LOG_FORMAT` and `REPLEN_LOG_FILE`.

use std::env;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
pub enum LoggingError {
    InvalidFilter(String),
    InvalidFormat(String),
    LogFile(io::Error),
    Init(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::InvalidFilter(err) => write!(f, "Invalid log filter: {err}"),
            LoggingError::InvalidFormat(format) => write!(
                f,
                "Invalid REPLEN_LOG_FORMAT '{format}' (expected 'json' or 'pretty')"
            ),
            LoggingError::LogFile(err) => write!(f, "Failed to open log file: {err}"),
            LoggingError::Init(err) => write!(f, "Failed to initialize logging: {err}"),
        }
    }
}

impl std::error::Error for LoggingError {}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(LoggingError::LogFile)
}

fn map_init_err<E: fmt::Display>(err: E) -> LoggingError {
    LoggingError::Init(err.to_string())
}

/// Parse a filter directive; `off` disables all events.
pub fn parse_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if level.eq_ignore_ascii_case("off") {
        Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()))
    } else {
        EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter(err.to_string()))
    }
}

/// Install the global subscriber.
///
/// `level` wins over `REPLEN_TRACE`; with neither set logging stays off.
/// Returns `false` when a subscriber was already installed.
pub fn enable_logging(level: Option<String>) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level_value = level
        .or_else(|| env::var("REPLEN_TRACE").ok())
        .unwrap_or_else(|| "off".to_string());
    let filter = parse_filter(&level_value)?;

    let format = env::var("REPLEN_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let log_file = env::var("REPLEN_LOG_FILE").ok();
    let use_json = format.eq_ignore_ascii_case("json");
    if !use_json && !format.eq_ignore_ascii_case("pretty") {
        return Err(LoggingError::InvalidFormat(format));
    }

    if use_json {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .json();
        let base = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer);
        if let Some(path) = log_file {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(open_log_file(&path)?)
                .with_ansi(false)
                .json();
            base.with(file_layer).try_init().map_err(map_init_err)?;
        } else {
            base.try_init().map_err(map_init_err)?;
        }
    } else {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .pretty();
        let base = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer);
        if let Some(path) = log_file {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(open_log_file(&path)?)
                .with_ansi(false)
                .pretty();
            base.with(file_layer).try_init().map_err(map_init_err)?;
        } else {
            base.try_init().map_err(map_init_err)?;
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_and_directives_parse() {
        assert!(parse_filter("off").is_ok());
        assert!(parse_filter("replen_policy=debug,info").is_ok());
    }

    #[test]
    fn malformed_directive_is_rejected() {
        let err = parse_filter("replen_policy=loud").unwrap_err();
        assert!(err.to_string().starts_with("Invalid log filter"));
    }
}
