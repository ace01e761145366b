//! Minimal stderr logger.
//!
//! Prints `[elapsed LEVEL target] message`. Install once at startup with
//! [`init_with_level`], or [`init_from_env`] to read the level from
//! `SUDOKU_SCANNER_LOG` (`off`, `error`, `warn`, `info`, `debug`, `trace`).

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable read by [`init_from_env`].
pub const LOG_ENV_VAR: &str = "SUDOKU_SCANNER_LOG";

struct StderrLogger {
    level: LevelFilter,
    started: OnceLock<Instant>,
}

/// Errors from installing the stderr logger.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    #[error("another logger was installed before the stderr logger")]
    ForeignLogger,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.get_or_init(Instant::now).elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger {
    level: LevelFilter::Trace,
    started: OnceLock::new(),
};

/// Outcome of the one `log::set_logger` attempt made by this process.
static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Install the stderr logger with the provided level filter.
///
/// Only the first call attempts the installation; later calls report the
/// same outcome and, if it succeeded, adjust the global max level.
pub fn init_with_level(level: LevelFilter) -> Result<(), InitError> {
    let installed = *INSTALLED.get_or_init(|| {
        LOGGER.started.get_or_init(Instant::now);
        log::set_logger(&LOGGER).is_ok()
    });
    if !installed {
        return Err(InitError::ForeignLogger);
    }
    log::set_max_level(level);
    Ok(())
}

/// Install the stderr logger at the level named by `SUDOKU_SCANNER_LOG`,
/// defaulting to `warn` when unset or unparsable.
pub fn init_from_env() -> Result<(), InitError> {
    init_with_level(level_from_env())
}

fn level_from_env() -> LevelFilter {
    std::env::var(LOG_ENV_VAR)
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(LevelFilter::Warn)
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(value.trim()).ok()
}

/// Map a numeric verbosity (0 = off .. 5 = trace) to a level filter.
///
/// Values above 5 saturate to `Trace`. Used by bindings that cannot pass
/// strings conveniently.
pub fn level_from_verbosity(verbosity: u32) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
