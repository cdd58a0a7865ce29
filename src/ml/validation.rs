//! Stratified cross-validation and hold-out splits.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::metrics::{ConfusionMatrix, accuracy};
use super::{Classifier, TrainDataset, TrainError};

/// Per-fold accuracies from one cross-validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CvScore {
    pub fold_accuracies: Vec<f32>,
}

impl CvScore {
    pub fn mean(&self) -> f32 {
        if self.fold_accuracies.is_empty() {
            return 0.0;
        }
        self.fold_accuracies.iter().sum::<f32>() / self.fold_accuracies.len() as f32
    }

    /// Population standard deviation across folds.
    pub fn std(&self) -> f32 {
        if self.fold_accuracies.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .fold_accuracies
            .iter()
            .map(|a| (a - mean) * (a - mean))
            .sum::<f32>()
            / self.fold_accuracies.len() as f32;
        var.sqrt()
    }
}

/// Assign samples to `k` folds, walking each class in order and dealing round-robin so
/// every fold receives a near-equal share of every class. Returns held-out indices per fold.
pub fn stratified_folds(y: &[usize], k: usize) -> Result<Vec<Vec<usize>>, TrainError> {
    if k < 2 || y.len() < k {
        return Err(TrainError::TooFewSamples {
            samples: y.len(),
            folds: k,
        });
    }
    let mut by_class: Vec<(usize, usize)> = y.iter().copied().enumerate().map(|(i, c)| (c, i)).collect();
    by_class.sort();
    let mut folds = vec![Vec::new(); k];
    for (position, (_, sample)) in by_class.into_iter().enumerate() {
        folds[position % k].push(sample);
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

/// Fit on `k-1` folds and score accuracy on the held-out fold, for every fold.
pub fn cross_validate<M, F>(
    dataset: &TrainDataset,
    k: usize,
    mut fit: F,
) -> Result<CvScore, TrainError>
where
    M: Classifier,
    F: FnMut(&TrainDataset) -> Result<M, TrainError>,
{
    dataset.validate()?;
    let folds = stratified_folds(&dataset.y, k)?;
    let mut fold_accuracies = Vec::with_capacity(k);
    for (fold_idx, held_out) in folds.iter().enumerate() {
        let train_idx: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != fold_idx)
            .flat_map(|(_, fold)| fold.iter().copied())
            .collect();
        let model = fit(&dataset.subset(&train_idx))?;
        let test = dataset.subset(held_out);
        fold_accuracies.push(accuracy(&evaluate(&model, &test)));
    }
    Ok(CvScore { fold_accuracies })
}

/// Confusion matrix of `model` over `dataset`.
pub fn evaluate<M: Classifier>(model: &M, dataset: &TrainDataset) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix::new(dataset.n_classes);
    for (row, &truth) in dataset.x.iter().zip(dataset.y.iter()) {
        cm.add(truth, model.predict(row));
    }
    cm
}

/// Seeded per-class shuffle split. Classes with one sample stay in the training side.
pub fn stratified_split(y: &[usize], test_fraction: f32, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_classes = y.iter().copied().max().map(|m| m + 1).unwrap_or(0);
    let mut per_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in y.iter().enumerate() {
        per_class[label].push(i);
    }
    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut members in per_class {
        if members.is_empty() {
            continue;
        }
        members.shuffle(&mut rng);
        let n_test = ((members.len() as f32 * fraction).round() as usize)
            .min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
