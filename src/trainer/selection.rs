//! Cross-validating every applicable model and picking the one to export.

use std::fmt;
use std::str::FromStr;

use super::TrainerError;
use crate::ml::{CvScore, ModelKind, ModelOptions, TrainDataset, cross_validate, fit};

/// `--model` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelChoice {
    /// Best mean CV accuracy; earlier kinds win ties.
    #[default]
    Auto,
    Fixed(ModelKind),
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ModelChoice::Auto);
        }
        ModelKind::from_code(&s.to_ascii_lowercase())
            .map(ModelChoice::Fixed)
            .ok_or_else(|| format!("unknown model '{s}', expected dt, rf, svm or auto"))
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelChoice::Auto => f.write_str("auto"),
            ModelChoice::Fixed(kind) => f.write_str(kind.code()),
        }
    }
}

/// Cross-validation outcome for one model family.
#[derive(Debug, Clone, PartialEq)]
pub struct CvResult {
    pub kind: ModelKind,
    pub score: CvScore,
}

/// Model families that can be trained on `dataset`, in evaluation order.
pub fn applicable_models(dataset: &TrainDataset) -> Vec<ModelKind> {
    let n_present = dataset.present_classes().len();
    ModelKind::ALL
        .into_iter()
        .filter(|kind| kind.supports_classes(n_present))
        .collect()
}

/// k-fold accuracy for each applicable model.
pub fn evaluate_models(
    dataset: &TrainDataset,
    folds: usize,
    options: &ModelOptions,
) -> Result<Vec<CvResult>, TrainerError> {
    let mut results = Vec::new();
    for kind in applicable_models(dataset) {
        let score = cross_validate(dataset, folds, |train| fit(kind, train, options))?;
        tracing::info!(
            "{}: {:.2}% ± {:.2}%",
            kind.display_name(),
            score.mean() * 100.0,
            score.std() * 100.0
        );
        results.push(CvResult { kind, score });
    }
    Ok(results)
}

/// Resolve `--model` against the evaluated families.
pub fn select_model(choice: ModelChoice, results: &[CvResult]) -> Result<ModelKind, TrainerError> {
    match choice {
        ModelChoice::Fixed(kind) => {
            if results.iter().any(|result| result.kind == kind) {
                Ok(kind)
            } else {
                Err(TrainerError::ModelUnavailable {
                    kind,
                    reason: "it does not support the number of classes in the dataset".to_string(),
                })
            }
        }
        ModelChoice::Auto => {
            let mut best: Option<&CvResult> = None;
            for result in results {
                if best.is_none_or(|current| result.score.mean() > current.score.mean()) {
                    best = Some(result);
                }
            }
            best.map(|result| result.kind).ok_or(TrainerError::NoModels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(kind: ModelKind, accuracies: &[f32]) -> CvResult {
        CvResult {
            kind,
            score: CvScore {
                fold_accuracies: accuracies.to_vec(),
            },
        }
    }

    #[test]
    fn auto_prefers_earlier_kind_on_ties() {
        let results = vec![
            result(ModelKind::DecisionTree, &[0.9, 0.8]),
            result(ModelKind::RandomForest, &[0.8, 0.9]),
            result(ModelKind::LinearSvm, &[0.7, 0.7]),
        ];
        assert_eq!(
            select_model(ModelChoice::Auto, &results).unwrap(),
            ModelKind::DecisionTree
        );
        let better_forest = vec![
            result(ModelKind::DecisionTree, &[0.8]),
            result(ModelKind::RandomForest, &[0.9]),
        ];
        assert_eq!(
            select_model(ModelChoice::Auto, &better_forest).unwrap(),
            ModelKind::RandomForest
        );
    }

    #[test]
    fn fixed_choice_must_have_been_evaluated() {
        let results = vec![result(ModelKind::DecisionTree, &[1.0])];
        assert!(matches!(
            select_model(ModelChoice::Fixed(ModelKind::LinearSvm), &results),
            Err(TrainerError::ModelUnavailable {
                kind: ModelKind::LinearSvm,
                ..
            })
        ));
        assert!(matches!(
            select_model(ModelChoice::Auto, &[]),
            Err(TrainerError::NoModels)
        ));
    }

    #[test]
    fn svm_is_only_applicable_to_two_classes() {
        let mut dataset = TrainDataset {
            n_classes: 3,
            x: vec![vec![0.0], vec![1.0], vec![2.0]],
            y: vec![0, 1, 2],
        };
        assert_eq!(
            applicable_models(&dataset),
            vec![ModelKind::DecisionTree, ModelKind::RandomForest]
        );
        dataset.y[2] = 1;
        assert_eq!(applicable_models(&dataset), ModelKind::ALL.to_vec());
    }

    #[test]
    fn parses_model_choice() {
        assert_eq!("auto".parse::<ModelChoice>().unwrap(), ModelChoice::Auto);
        assert_eq!(
            "RF".parse::<ModelChoice>().unwrap(),
            ModelChoice::Fixed(ModelKind::RandomForest)
        );
        assert!("knn".parse::<ModelChoice>().is_err());
        assert_eq!(ModelChoice::Fixed(ModelKind::LinearSvm).to_string(), "svm");
    }
}
