//! Listing and inspecting existing logs in the data directory.

use std::path::{Path, PathBuf};

use super::CollectError;
use super::csv_log::count_rows;

/// One CSV log in the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileInfo {
    pub path: PathBuf,
    pub rows: usize,
    pub size_bytes: u64,
}

impl DataFileInfo {
    pub fn size_kib(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Class and sample id recorded in a log's first data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub class: String,
    pub sample_id: String,
}

/// `*.csv` files directly inside `dir`, sorted by name. A missing directory lists nothing.
pub fn list_data_files(dir: &Path) -> Result<Vec<DataFileInfo>, CollectError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(CollectError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    };
    let mut files = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !is_csv || !meta.is_file() {
            continue;
        }
        let rows = if meta.len() == 0 {
            0
        } else {
            match count_rows(&path) {
                Ok(rows) => rows,
                Err(err) => {
                    tracing::warn!("Skipping unreadable log {}: {err}", path.display());
                    continue;
                }
            }
        };
        files.push(DataFileInfo {
            path,
            rows,
            size_bytes: meta.len(),
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Read `classe` and `amostra_id` from the first data row, if there is one.
pub fn read_identity(path: &Path) -> Result<Option<FileIdentity>, CollectError> {
    let csv_err = |source| CollectError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (Some(class_col), Some(sample_col)) = (column("classe"), column("amostra_id")) else {
        return Ok(None);
    };
    let Some(record) = reader.records().next().transpose().map_err(csv_err)? else {
        return Ok(None);
    };
    match (record.get(class_col), record.get(sample_col)) {
        (Some(class), Some(sample)) if !class.is_empty() && !sample.is_empty() => {
            Ok(Some(FileIdentity {
                class: class.to_string(),
                sample_id: sample.to_string(),
            }))
        }
        _ => Ok(None),
    }
}
