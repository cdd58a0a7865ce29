use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::defaults::{
    clamp_test_fraction, clamp_window, default_classes, default_cv_folds, default_data_dir,
    default_output_dir, default_poll_interval_ms, default_read_timeout_ms, default_split_seed,
    default_table_rows, default_test_fraction, default_window,
};
use crate::ml::{ForestOptions, ModelOptions, SvmOptions, TreeOptions};
use crate::sensor::{LineLayout, SerialSettings};

/// Errors that may occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// Two `[[trainer.classes]]` entries share an id.
    #[error("Class id {id} is defined more than once in {path}")]
    DuplicateClass { path: PathBuf, id: usize },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnoseConfig {
    #[serde(default)]
    pub serial: SerialSettings,
    #[serde(default)]
    pub collector: CollectorSettings,
    #[serde(default)]
    pub trainer: TrainerSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

impl EnoseConfig {
    pub(super) fn normalized(mut self) -> Self {
        self.trainer.test_fraction = clamp_test_fraction(self.trainer.test_fraction);
        self.dashboard.window = clamp_window(self.dashboard.window);
        self.trainer.classes.sort_by_key(|class| class.id);
        self
    }

    /// Resolve relative data paths against `base`, usually the config file's directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.collector.data_dir);
        resolve(&mut self.trainer.output_dir);
        if let Some(single) = self.trainer.single_file.as_mut() {
            resolve(single);
        }
        for class in &mut self.trainer.classes {
            for file in &mut class.files {
                resolve(file);
            }
            for pattern in &mut class.patterns {
                if Path::new(pattern.as_str()).is_relative() {
                    *pattern = base.join(pattern.as_str()).to_string_lossy().into_owned();
                }
            }
        }
    }
}

/// Config keys: `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorSettings {
    /// Where new CSV logs are created and listed from.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// One class label and where its CSV files live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSource {
    pub id: usize,
    pub name: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// File-name wildcards (`*`, `?`) such as `data/plant_*.csv`.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Trainer inputs, validation settings and per-model hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// One CSV with a `classe` column; overrides `classes` when set.
    #[serde(default)]
    pub single_file: Option<PathBuf>,
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f32,
    #[serde(default = "default_split_seed")]
    pub split_seed: u64,
    #[serde(default = "default_classes")]
    pub classes: Vec<ClassSource>,
    #[serde(default)]
    pub decision_tree: TreeOptions,
    #[serde(default)]
    pub random_forest: ForestOptions,
    #[serde(default)]
    pub svm: SvmOptions,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            single_file: None,
            cv_folds: default_cv_folds(),
            test_fraction: default_test_fraction(),
            split_seed: default_split_seed(),
            classes: default_classes(),
            decision_tree: TreeOptions::default(),
            random_forest: ForestOptions::default(),
            svm: SvmOptions::default(),
        }
    }
}

impl TrainerSettings {
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            decision_tree: self.decision_tree.clone(),
            random_forest: self.random_forest.clone(),
            svm: self.svm.clone(),
        }
    }
}

/// Live plot settings.
///
/// Config keys: `line_layout`, `window`, `poll_interval_ms`, `read_timeout_ms`, `table_rows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default = "indexed_layout")]
    pub line_layout: LineLayout,
    /// Readings kept in the rolling window.
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,
}

fn indexed_layout() -> LineLayout {
    LineLayout::Indexed
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            line_layout: indexed_layout(),
            window: default_window(),
            poll_interval_ms: default_poll_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            table_rows: default_table_rows(),
        }
    }
}
