//! Append-only CSV sample log.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use super::CollectError;
use crate::sensor::{GAS_CHANNELS, Reading};

/// Column names, written once at the top of every log.
pub const CSV_HEADER: [&str; 17] = [
    "timestamp",
    "sessao_id",
    "amostra_id",
    "classe",
    "temp",
    "umid",
    GAS_CHANNELS[0],
    GAS_CHANNELS[1],
    GAS_CHANNELS[2],
    GAS_CHANNELS[3],
    GAS_CHANNELS[4],
    GAS_CHANNELS[5],
    GAS_CHANNELS[6],
    GAS_CHANNELS[7],
    GAS_CHANNELS[8],
    GAS_CHANNELS[9],
    "notas",
];

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const SESSION_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String, CollectError> {
    Ok(at.format(TIMESTAMP_FORMAT)?)
}

/// `YYYYMMDD_HHMMSS`.
pub fn format_session_id(at: OffsetDateTime) -> Result<String, CollectError> {
    Ok(at.format(SESSION_FORMAT)?)
}

/// One row ready to be appended.
#[derive(Debug, Clone)]
pub struct SampleRow<'a> {
    pub timestamp: String,
    pub session_id: &'a str,
    pub sample_id: &'a str,
    pub class: &'a str,
    pub reading: Reading,
    pub note: &'a str,
}

impl SampleRow<'_> {
    fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(CSV_HEADER.len());
        fields.push(self.timestamp.clone());
        fields.push(self.session_id.to_string());
        fields.push(self.sample_id.to_string());
        fields.push(self.class.to_string());
        fields.push(format!("{:.1}", self.reading.temperature));
        fields.push(format!("{:.1}", self.reading.humidity));
        fields.extend(self.reading.gases.iter().map(|gas| format!("{gas:.0}")));
        fields.push(self.note.to_string());
        fields
    }
}

/// How an existing log is treated when a session opens it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Keep existing rows and continue the counter.
    Append,
    /// Truncate the file and start over with a fresh header.
    Replace,
}

/// Open log file plus the running sample counter.
pub struct CsvLog {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvLog {
    pub fn open(path: &Path, mode: LogMode) -> Result<Self, CollectError> {
        if mode == LogMode::Replace && path.is_file() {
            File::create(path).map_err(|source| CollectError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!("Replacing {}", path.display());
        }
        Self::open_append(path)
    }

    /// Open `path` for appending, writing the header only when the file is new or empty.
    ///
    /// Existing bytes are never rewritten. A missing final newline is added before the first
    /// new row, and the counter starts at the number of data rows already present.
    pub fn open_append(path: &Path) -> Result<Self, CollectError> {
        let io_err = |source| CollectError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let existing_len = std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
        let rows = if existing_len > 0 {
            count_rows(path)?
        } else {
            0
        };
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        if existing_len > 0 && !ends_with_newline(&mut file).map_err(io_err)? {
            file.write_all(b"\n").map_err(io_err)?;
        }
        let mut log = Self {
            path: path.to_path_buf(),
            writer: csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(file),
            rows,
        };
        if existing_len == 0 {
            log.write_fields(CSV_HEADER.iter().copied())?;
        } else {
            tracing::info!(
                "Continuing {} ({} existing rows)",
                path.display(),
                rows
            );
        }
        Ok(log)
    }

    /// Append and flush one row, returning the updated counter.
    pub fn append(&mut self, row: &SampleRow<'_>) -> Result<usize, CollectError> {
        self.write_fields(row.fields())?;
        self.rows += 1;
        Ok(self.rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_fields<I, T>(&mut self, fields: I) -> Result<(), CollectError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(fields)
            .map_err(|source| CollectError::Csv {
                path: self.path.clone(),
                source,
            })?;
        self.writer.flush().map_err(|source| CollectError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Data rows in an existing log, not counting the header.
pub(crate) fn count_rows(path: &Path) -> Result<usize, CollectError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| CollectError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let mut rows = 0usize;
    let mut record = csv::ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => rows += 1,
            Ok(false) => break,
            Err(source) => {
                return Err(CollectError::Csv {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
    Ok(rows)
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
