//! Classifiers trained on gas-ratio features.
//!
//! Every learner here is deterministic for a given seed and keeps its parameters in plain
//! arrays so the code generator can walk them directly.

pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod svm;
pub mod tree;
pub mod validation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use forest::{ForestOptions, RandomForest, train_random_forest};
pub use metrics::{ConfusionMatrix, PerClassStats, accuracy, precision_recall_by_class};
pub use scaler::StandardScaler;
pub use svm::{LinearSvm, SvmOptions, train_linear_svm};
pub use tree::{DecisionTree, Node, Split, TreeOptions, train_decision_tree};
pub use validation::{CvScore, cross_validate, evaluate, stratified_folds, stratified_split};

/// Errors raised while fitting or validating a model.
#[derive(Debug, Error, PartialEq)]
pub enum TrainError {
    #[error("Empty training set")]
    EmptyDataset,
    #[error("Mismatched X/Y lengths ({x} rows, {y} labels)")]
    LengthMismatch { x: usize, y: usize },
    #[error("Row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Row {row} has a non-finite value in column {column}")]
    NonFiniteFeature { row: usize, column: usize },
    #[error("Label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },
    #[error("Linear SVM needs exactly two classes, found {found:?}")]
    NeedTwoClasses { found: Vec<usize> },
    #[error("Cannot split {samples} samples into {folds} folds")]
    TooFewSamples { samples: usize, folds: usize },
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

/// In-memory dataset: row-major features plus class labels.
#[derive(Debug, Clone, Default)]
pub struct TrainDataset {
    /// Size of the label space; labels are `0..n_classes`.
    pub n_classes: usize,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Class indices aligned with `x`.
    pub y: Vec<usize>,
}

impl TrainDataset {
    /// Check shape and label invariants, returning the feature count.
    pub fn validate(&self) -> Result<usize, TrainError> {
        if self.x.len() != self.y.len() {
            return Err(TrainError::LengthMismatch {
                x: self.x.len(),
                y: self.y.len(),
            });
        }
        let Some(first) = self.x.first() else {
            return Err(TrainError::EmptyDataset);
        };
        let n_features = first.len();
        for (row_idx, row) in self.x.iter().enumerate() {
            if row.len() != n_features {
                return Err(TrainError::RaggedRow {
                    row: row_idx,
                    expected: n_features,
                    found: row.len(),
                });
            }
            if let Some(column) = row.iter().position(|v| !v.is_finite()) {
                return Err(TrainError::NonFiniteFeature {
                    row: row_idx,
                    column,
                });
            }
        }
        if let Some(&label) = self.y.iter().find(|&&label| label >= self.n_classes) {
            return Err(TrainError::LabelOutOfRange {
                label,
                n_classes: self.n_classes,
            });
        }
        Ok(n_features)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of samples per class, indexed by label.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &label in &self.y {
            if label < self.n_classes {
                counts[label] += 1;
            }
        }
        counts
    }

    /// Labels that occur at least once, ascending.
    pub fn present_classes(&self) -> Vec<usize> {
        self.class_counts()
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(label, _)| label)
            .collect()
    }

    /// Copy of the rows at `indices`, keeping the label space.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            n_classes: self.n_classes,
            x: indices.iter().map(|&i| self.x[i].clone()).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

/// Anything that maps a feature vector to a class label.
pub trait Classifier {
    fn predict(&self, features: &[f32]) -> usize;
}

/// Model families supported by the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    DecisionTree,
    RandomForest,
    LinearSvm,
}

impl ModelKind {
    /// Evaluation order; earlier kinds win ties.
    pub const ALL: [ModelKind; 3] = [
        ModelKind::DecisionTree,
        ModelKind::RandomForest,
        ModelKind::LinearSvm,
    ];

    /// Short code used on the command line and in file names.
    pub fn code(self) -> &'static str {
        match self {
            ModelKind::DecisionTree => "dt",
            ModelKind::RandomForest => "rf",
            ModelKind::LinearSvm => "svm",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::LinearSvm => "SVM Linear",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Whether this family can be trained on `n_present` distinct classes.
    pub fn supports_classes(self, n_present: usize) -> bool {
        match self {
            ModelKind::LinearSvm => n_present == 2,
            _ => n_present >= 1,
        }
    }
}

/// Hyperparameters for every model family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub decision_tree: TreeOptions,
    pub random_forest: ForestOptions,
    pub svm: SvmOptions,
}

/// A fitted model of any supported family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    LinearSvm(LinearSvm),
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::DecisionTree(_) => ModelKind::DecisionTree,
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
            TrainedModel::LinearSvm(_) => ModelKind::LinearSvm,
        }
    }
}

impl Classifier for TrainedModel {
    fn predict(&self, features: &[f32]) -> usize {
        match self {
            TrainedModel::DecisionTree(model) => model.predict(features),
            TrainedModel::RandomForest(model) => model.predict(features),
            TrainedModel::LinearSvm(model) => model.predict(features),
        }
    }
}

/// Fit one model family with the given options.
pub fn fit(
    kind: ModelKind,
    dataset: &TrainDataset,
    options: &ModelOptions,
) -> Result<TrainedModel, TrainError> {
    Ok(match kind {
        ModelKind::DecisionTree => {
            TrainedModel::DecisionTree(train_decision_tree(dataset, &options.decision_tree)?)
        }
        ModelKind::RandomForest => {
            TrainedModel::RandomForest(train_random_forest(dataset, &options.random_forest)?)
        }
        ModelKind::LinearSvm => TrainedModel::LinearSvm(train_linear_svm(dataset, &options.svm)?),
    })
}

/// Index of the largest value; the lowest index wins ties.
pub fn argmax<T: PartialOrd + Copy>(values: &[T]) -> usize {
    let mut best_idx = 0usize;
    for (idx, &v) in values.iter().enumerate().skip(1) {
        if v > values[best_idx] {
            best_idx = idx;
        }
    }
    best_idx
}
