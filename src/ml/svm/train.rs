use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::LinearSvm;
use crate::ml::{StandardScaler, TrainDataset, TrainError};

/// Linear SVM hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmOptions {
    /// Hinge-loss penalty.
    pub c: f64,
    /// Passes over the data before giving up on convergence.
    pub max_iter: usize,
    /// Stop once the projected-gradient spread falls below this.
    pub tolerance: f64,
    /// Seed for the coordinate visiting order.
    pub seed: u64,
}

impl Default for SvmOptions {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1_000,
            tolerance: 0.1,
            seed: 42,
        }
    }
}

/// Train a binary hinge-loss SVM by dual coordinate descent on standardized features.
///
/// The bias is learned as the weight of an extra constant feature. The lower label present
/// becomes the negative class.
pub fn train_linear_svm(
    dataset: &TrainDataset,
    options: &SvmOptions,
) -> Result<LinearSvm, TrainError> {
    let n_features = dataset.validate()?;
    let present = dataset.present_classes();
    let &[negative_class, positive_class] = present.as_slice() else {
        return Err(TrainError::NeedTwoClasses {
            found: present.clone(),
        });
    };
    if !(options.c > 0.0) {
        return Err(TrainError::InvalidOption(format!(
            "C must be positive, got {}",
            options.c
        )));
    }

    let scaler = StandardScaler::fit(&dataset.x);
    let rows: Vec<Vec<f64>> = dataset
        .x
        .iter()
        .map(|row| {
            let mut scaled: Vec<f64> = scaler.transform(row).into_iter().map(f64::from).collect();
            scaled.push(1.0);
            scaled
        })
        .collect();
    let signs: Vec<f64> = dataset
        .y
        .iter()
        .map(|&label| if label == positive_class { 1.0 } else { -1.0 })
        .collect();
    let diag: Vec<f64> = rows.iter().map(|row| dot(row, row)).collect();

    let upper = options.c;
    let mut alpha = vec![0f64; rows.len()];
    let mut w = vec![0f64; n_features + 1];
    let mut order: Vec<usize> = (0..rows.len()).collect();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut converged = false;

    for _ in 0..options.max_iter {
        order.shuffle(&mut rng);
        let mut pg_max = f64::NEG_INFINITY;
        let mut pg_min = f64::INFINITY;
        for &i in &order {
            let gradient = signs[i] * dot(&w, &rows[i]) - 1.0;
            let projected = if alpha[i] <= 0.0 {
                gradient.min(0.0)
            } else if alpha[i] >= upper {
                gradient.max(0.0)
            } else {
                gradient
            };
            pg_max = pg_max.max(projected);
            pg_min = pg_min.min(projected);
            if projected.abs() <= 1e-12 || diag[i] <= 0.0 {
                continue;
            }
            let previous = alpha[i];
            alpha[i] = (previous - gradient / diag[i]).clamp(0.0, upper);
            let delta = (alpha[i] - previous) * signs[i];
            for (wj, &xj) in w.iter_mut().zip(rows[i].iter()) {
                *wj += delta * xj;
            }
        }
        if pg_max - pg_min <= options.tolerance {
            converged = true;
            break;
        }
    }
    if !converged {
        tracing::warn!(
            "Linear SVM did not converge within {} iterations",
            options.max_iter
        );
    }

    let bias = w.pop().unwrap_or(0.0) as f32;
    Ok(LinearSvm {
        scaler,
        weights: w.into_iter().map(|v| v as f32).collect(),
        bias,
        negative_class,
        positive_class,
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
