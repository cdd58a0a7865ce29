//! The collection loop: serial lines in, CSV rows out.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::CollectError;
use super::csv_log::{CsvLog, LogMode, SampleRow, format_timestamp};
use crate::logging::now_local_or_utc;
use crate::sensor::{LineEvent, LineLayout, LineReader, Reading, SerialError, parse_line};

const PAUSE_POLL: Duration = Duration::from_millis(100);

/// Cross-thread pause and stop signals for a running session.
#[derive(Debug, Clone)]
pub struct SessionControls {
    paused: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl Default for SessionControls {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionControls {
    pub fn new() -> Self {
        Self {
            paused: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flip the pause flag, returning whether the session is now paused.
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Labels stamped on every row of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub class: String,
    pub sample_id: String,
    pub note: String,
    pub session_id: String,
}

/// Passed to the progress callback after each written row.
#[derive(Debug, Clone)]
pub struct RowProgress {
    pub counter: usize,
    pub timestamp: String,
    pub reading: Reading,
}

/// What happened during one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub path: PathBuf,
    /// Rows written by this session.
    pub written: usize,
    /// Rows in the file afterwards.
    pub total: usize,
    /// Lines dropped as short or non-numeric.
    pub rejected: usize,
    /// Lines dropped as invalid UTF-8.
    pub undecodable: usize,
}

/// Open the device, then the log. The log is left untouched when the device fails to open.
pub fn open_session<D, F>(
    path: &Path,
    mode: LogMode,
    open_device: F,
) -> Result<(D, CsvLog), CollectError>
where
    F: FnOnce() -> Result<D, SerialError>,
{
    let device = open_device()?;
    let log = CsvLog::open(path, mode)?;
    Ok((device, log))
}

/// Drives one session until stopped or the device stream closes.
pub struct Collector<R> {
    reader: LineReader<R>,
    log: CsvLog,
    info: SessionInfo,
    controls: SessionControls,
    pause_poll: Duration,
}

impl<R: Read> Collector<R> {
    pub fn new(reader: R, log: CsvLog, info: SessionInfo, controls: SessionControls) -> Self {
        Self {
            reader: LineReader::new(reader),
            log,
            info,
            controls,
            pause_poll: PAUSE_POLL,
        }
    }

    pub fn controls(&self) -> &SessionControls {
        &self.controls
    }

    /// Run the loop. `on_row` sees every written row; serial read failures end the session.
    pub fn run(
        &mut self,
        mut on_row: impl FnMut(&RowProgress),
    ) -> Result<SessionSummary, CollectError> {
        let start_rows = self.log.rows();
        let mut rejected = 0usize;
        let mut undecodable = 0usize;
        tracing::info!(
            "Session {} started: class={}, sample={}, file={}",
            self.info.session_id,
            self.info.class,
            self.info.sample_id,
            self.log.path().display()
        );

        while self.controls.is_running() {
            if self.controls.is_paused() {
                std::thread::sleep(self.pause_poll);
                continue;
            }
            let line = match self.reader.next_event()? {
                LineEvent::Line(line) => line,
                LineEvent::Idle => continue,
                LineEvent::Undecodable => {
                    undecodable += 1;
                    tracing::trace!("Skipping non-UTF-8 line");
                    continue;
                }
                LineEvent::Closed => {
                    tracing::info!("Serial stream closed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let Some(reading) = parse_line(&line, LineLayout::Plain) else {
                rejected += 1;
                tracing::debug!("Rejected line: {line}");
                continue;
            };
            let timestamp = format_timestamp(now_local_or_utc())?;
            let counter = self.log.append(&SampleRow {
                timestamp: timestamp.clone(),
                session_id: &self.info.session_id,
                sample_id: &self.info.sample_id,
                class: &self.info.class,
                reading,
                note: &self.info.note,
            })?;
            on_row(&RowProgress {
                counter,
                timestamp,
                reading,
            });
        }

        let summary = SessionSummary {
            path: self.log.path().to_path_buf(),
            written: self.log.rows() - start_rows,
            total: self.log.rows(),
            rejected,
            undecodable,
        };
        tracing::info!(
            "Session {} finished: {} rows written, {} rejected",
            self.info.session_id,
            summary.written,
            summary.rejected
        );
        Ok(summary)
    }
}
