//! Reading gas columns out of collector CSVs.

use std::path::Path;

use csv::StringRecord;

use super::DatasetError;
use crate::sensor::{GAS_CHANNEL_COUNT, GAS_CHANNELS, RATIO_FEATURE_COUNT, gas_ratios};

/// Label column used by single-file datasets.
pub const CLASS_COLUMN: &str = "classe";

/// Rows kept from one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRows {
    pub ratios: Vec<[f32; RATIO_FEATURE_COUNT]>,
    /// Label text per row; filled only when a label column was requested.
    pub labels: Vec<String>,
    /// Rows dropped for bad or non-positive gas values.
    pub dropped: usize,
}

/// How reading one file went.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Loaded(FileRows),
    Missing,
    MissingColumns(Vec<String>),
    /// The file could not be opened or its header could not be read.
    Unreadable(String),
}

/// Read one CSV, keeping the ratio features of every usable row.
///
/// A missing, unreadable or column-less file is reported in the outcome rather than as an error.
pub fn read_file(path: &Path, label_column: Option<&str>) -> Result<FileOutcome, DatasetError> {
    if !path.is_file() {
        return Ok(FileOutcome::Missing);
    }
    let mut reader = match csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
    {
        Ok(reader) => reader,
        Err(err) => return Ok(FileOutcome::Unreadable(err.to_string())),
    };
    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(err) => return Ok(FileOutcome::Unreadable(err.to_string())),
    };
    let position = |name: &str| headers.iter().position(|h| h == name);

    let mut gas_columns = [0usize; GAS_CHANNEL_COUNT];
    let mut missing = Vec::new();
    for (slot, name) in gas_columns.iter_mut().zip(GAS_CHANNELS) {
        match position(name) {
            Some(idx) => *slot = idx,
            None => missing.push(name.to_string()),
        }
    }
    if !missing.is_empty() {
        return Ok(FileOutcome::MissingColumns(missing));
    }
    let label_idx = match label_column {
        Some(name) => match position(name) {
            Some(idx) => Some(idx),
            None => return Err(DatasetError::MissingClassColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            }),
        },
        None => None,
    };

    let mut rows = FileRows::default();
    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                tracing::debug!("Dropping malformed record in {}: {err}", path.display());
                rows.dropped += 1;
                continue;
            }
        }
        let label = match label_idx {
            Some(idx) => match record.get(idx).filter(|label| !label.is_empty()) {
                Some(label) => Some(label.to_string()),
                None => {
                    rows.dropped += 1;
                    continue;
                }
            },
            None => None,
        };
        let Some(ratios) = row_ratios(&record, &gas_columns) else {
            rows.dropped += 1;
            continue;
        };
        rows.ratios.push(ratios);
        if let Some(label) = label {
            rows.labels.push(label);
        }
    }
    Ok(FileOutcome::Loaded(rows))
}

fn row_ratios(
    record: &StringRecord,
    columns: &[usize; GAS_CHANNEL_COUNT],
) -> Option<[f32; RATIO_FEATURE_COUNT]> {
    let mut gases = [0f32; GAS_CHANNEL_COUNT];
    for (gas, &col) in gases.iter_mut().zip(columns.iter()) {
        let value: f32 = record.get(col)?.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *gas = value;
    }
    let ratios = gas_ratios(&gases)?;
    ratios.iter().all(|r| r.is_finite()).then_some(ratios)
}
