//! Tracing setup shared by the enose binaries.
//!
//! Each launch gets its own `enose_<timestamp>.log` under `.enose/logs`; only the newest
//! [`MAX_LOG_FILES`] launches are kept.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use time::format_description::{BorrowedFormatItem, FormatItem};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Launch logs retained in the log directory.
pub const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "enose_";
const FILE_STAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const LINE_STAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Reasons logging could not be set up. Binaries report these and carry on without logs.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Log directory unavailable: {0}")]
    Directory(#[from] AppDirError),
    #[error("Failed to create log file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to prune old logs in {path}: {source}")]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log file name: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("A global tracing subscriber is already installed: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Where log lines go besides the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutput {
    /// Mirror log lines to stdout.
    Stdout,
    /// Only the log file. Used while the terminal is in raw mode.
    FileOnly,
}

/// Log to stdout and this launch's file. Later calls are no-ops.
pub fn init() -> Result<(), LoggingError> {
    init_with(ConsoleOutput::Stdout)
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_with(console: ConsoleOutput) -> Result<(), LoggingError> {
    if FILE_GUARD.get().is_some() {
        return Ok(());
    }

    let dir = app_dirs::logs_dir()?;
    let file_name = log_file_name(now_local_or_utc())?;
    let path = dir.join(&file_name);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::CreateFile {
            path: path.clone(),
            source,
        })?;
    let removed = prune_logs(&dir, MAX_LOG_FILES)?;

    let (file_writer, guard) = tracing_appender::non_blocking(file);
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = fmt::time::OffsetTime::new(offset, BorrowedFormatItem::from(LINE_STAMP));
    let console_layer = (console == ConsoleOutput::Stdout).then(|| {
        fmt::layer()
            .with_timer(timer.clone())
            .with_writer(std::io::stdout)
    });
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing::subscriber::set_global_default(
        Registry::default()
            .with(filter)
            .with(console_layer)
            .with(file_layer),
    )?;
    let _ = FILE_GUARD.set(guard);

    tracing::info!("Logging to {} ({removed} old logs pruned)", path.display());
    Ok(())
}

/// Current local time, falling back to UTC when the offset is unavailable.
pub fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn log_file_name(at: OffsetDateTime) -> Result<String, LoggingError> {
    Ok(format!("{LOG_FILE_PREFIX}{}.log", at.format(FILE_STAMP)?))
}

/// Delete the oldest `enose_*.log` files beyond `keep`, returning how many went.
///
/// Names embed a zero-padded timestamp, so name order is launch order.
fn prune_logs(dir: &Path, keep: usize) -> Result<usize, LoggingError> {
    let prune_err = |source| LoggingError::Prune {
        path: dir.to_path_buf(),
        source,
    };
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(prune_err)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_launch_log(path))
        .collect();
    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    for path in &logs[..excess] {
        fs::remove_file(path).map_err(prune_err)?;
    }
    Ok(excess)
}

fn is_launch_log(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|ext| ext == "log")
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
}
