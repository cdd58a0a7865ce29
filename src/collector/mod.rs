//! Serial-to-CSV collection sessions.

pub mod csv_log;
pub mod files;
pub mod keys;
pub mod session;

use std::path::PathBuf;

use thiserror::Error;

use crate::sensor::SerialError;

pub use csv_log::{CSV_HEADER, CsvLog, LogMode, SampleRow, format_session_id, format_timestamp};
pub use files::{DataFileInfo, FileIdentity, list_data_files, read_identity};
pub use keys::{KeyListener, stop_on_interrupt};
pub use session::{
    Collector, RowProgress, SessionControls, SessionInfo, SessionSummary, open_session,
};

/// Errors raised while collecting samples.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read or write CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    /// Refused to clobber an existing log.
    #[error("{path} already exists; pass --overwrite to replace it")]
    Exists { path: PathBuf },
    /// `continue` on a file without rows needs class and sample from the caller.
    #[error("{path} has no samples; provide --class and --sample")]
    MissingIdentity { path: PathBuf },
    #[error("Failed to format timestamp: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error(transparent)]
    Serial(#[from] SerialError),
    #[error("Failed to install Ctrl+C handler: {0}")]
    Interrupt(#[from] ctrlc::Error),
}
