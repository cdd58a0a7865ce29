//! Training data assembled from collector CSVs.

pub mod classes;
pub mod reader;
pub mod sources;
pub mod summary;

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

pub use classes::ClassRegistry;
pub use reader::{CLASS_COLUMN, FileOutcome, FileRows, read_file};
pub use sources::{DataSource, expand_pattern};
pub use summary::{ClassCount, DatasetSummary, IMBALANCE_RATIO_LIMIT};

use crate::config::ClassSource;
use crate::ml::TrainDataset;
use crate::sensor::RATIO_FEATURE_COUNT;

/// Errors that abort dataset loading.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid file pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("{path} has no `{column}` column")]
    MissingClassColumn { path: PathBuf, column: String },
    /// Nothing usable survived loading.
    #[error("No valid data found; check the configured files and their G320..G100 columns")]
    NoData,
}

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    /// Label the file was loaded under; `None` for single-file datasets.
    pub class: Option<usize>,
    pub outcome: FileOutcome,
}

/// Ratio features and labels ready for training.
#[derive(Debug, Clone)]
pub struct GasDataset {
    pub features: Vec<[f32; RATIO_FEATURE_COUNT]>,
    pub labels: Vec<usize>,
    pub classes: ClassRegistry,
    pub files: Vec<FileReport>,
}

impl GasDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label space covering both the registry and every observed label.
    pub fn n_classes(&self) -> usize {
        let observed = self.labels.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        observed.max(self.classes.label_space())
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::from_labels(&self.labels, &self.classes)
    }

    pub fn to_train_dataset(&self) -> TrainDataset {
        TrainDataset {
            n_classes: self.n_classes(),
            x: self.features.iter().map(|row| row.to_vec()).collect(),
            y: self.labels.clone(),
        }
    }
}

/// Load every configured file. Missing files and files without gas columns are skipped
/// with a warning; an empty result is an error.
pub fn load(source: &DataSource) -> Result<GasDataset, DatasetError> {
    let dataset = match source {
        DataSource::PerClass(classes) => load_per_class(classes)?,
        DataSource::SingleFile(path) => load_single_file(path)?,
    };
    if dataset.is_empty() {
        return Err(DatasetError::NoData);
    }
    if let Some(ratio) = dataset.summary().imbalance_advisory() {
        tracing::warn!(
            "Classes are imbalanced ({ratio:.1}:1); consider collecting more minority samples"
        );
    }
    Ok(dataset)
}

fn load_per_class(classes: &[ClassSource]) -> Result<GasDataset, DatasetError> {
    let mut dataset = GasDataset {
        features: Vec::new(),
        labels: Vec::new(),
        classes: classes.iter().map(|c| (c.id, c.name.clone())).collect(),
        files: Vec::new(),
    };
    for class in classes {
        let mut paths = class.files.clone();
        for pattern in &class.patterns {
            let matched = expand_pattern(pattern)?;
            if matched.is_empty() {
                tracing::warn!("Pattern {pattern} matched no files for {}", class.name);
            }
            paths.extend(matched);
        }
        let mut class_total = 0usize;
        for path in paths {
            let outcome = read_file(&path, None)?;
            match &outcome {
                FileOutcome::Loaded(rows) => {
                    class_total += rows.ratios.len();
                    dataset.features.extend_from_slice(&rows.ratios);
                    dataset
                        .labels
                        .extend(std::iter::repeat_n(class.id, rows.ratios.len()));
                    tracing::info!(
                        "{}: {} samples ({} dropped) from {}",
                        class.name,
                        rows.ratios.len(),
                        rows.dropped,
                        path.display()
                    );
                }
                FileOutcome::Missing => {
                    tracing::warn!("{}: file not found: {}", class.name, path.display());
                }
                FileOutcome::MissingColumns(missing) => {
                    tracing::warn!(
                        "{}: skipping {} (missing columns {:?})",
                        class.name,
                        path.display(),
                        missing
                    );
                }
                FileOutcome::Unreadable(reason) => {
                    tracing::warn!(
                        "{}: skipping unreadable {}: {reason}",
                        class.name,
                        path.display()
                    );
                }
            }
            dataset.files.push(FileReport {
                path,
                class: Some(class.id),
                outcome,
            });
        }
        tracing::info!("{}: {} samples total", class.name, class_total);
    }
    Ok(dataset)
}

/// Labels are encoded by sorted unique value; names are the upper-cased label text.
fn load_single_file(path: &std::path::Path) -> Result<GasDataset, DatasetError> {
    let outcome = read_file(path, Some(CLASS_COLUMN))?;
    let mut dataset = GasDataset {
        features: Vec::new(),
        labels: Vec::new(),
        classes: ClassRegistry::new(),
        files: Vec::new(),
    };
    match &outcome {
        FileOutcome::Loaded(rows) => {
            let unique: Vec<&str> = rows
                .labels
                .iter()
                .map(String::as_str)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            for (id, label) in unique.iter().enumerate() {
                dataset.classes.insert(id, label.to_uppercase());
            }
            dataset.features = rows.ratios.clone();
            dataset.labels = rows
                .labels
                .iter()
                .filter_map(|label| unique.binary_search(&label.as_str()).ok())
                .collect();
            tracing::info!(
                "Loaded {} samples with classes {:?} from {}",
                rows.ratios.len(),
                unique,
                path.display()
            );
        }
        FileOutcome::Missing => tracing::warn!("File not found: {}", path.display()),
        FileOutcome::MissingColumns(missing) => tracing::warn!(
            "Skipping {} (missing columns {:?})",
            path.display(),
            missing
        ),
        FileOutcome::Unreadable(reason) => {
            tracing::warn!("Skipping unreadable {}: {reason}", path.display())
        }
    }
    dataset.files.push(FileReport {
        path: path.to_path_buf(),
        class: None,
        outcome,
    });
    Ok(dataset)
}
