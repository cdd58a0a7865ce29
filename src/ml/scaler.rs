//! Per-feature standardization.

use serde::{Deserialize, Serialize};

/// Removes the mean and divides by the population standard deviation of each feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    /// Standard deviation per feature; constant features use 1.0.
    pub scale: Vec<f32>,
}

impl StandardScaler {
    /// Fit on row-major data. Rows are assumed to share a length.
    pub fn fit(x: &[Vec<f32>]) -> Self {
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let n = x.len().max(1) as f64;
        let mut mean = vec![0f64; n_features];
        for row in x {
            for (acc, &v) in mean.iter_mut().zip(row.iter()) {
                *acc += v as f64;
            }
        }
        for acc in &mut mean {
            *acc /= n;
        }
        let mut var = vec![0f64; n_features];
        for row in x {
            for ((acc, &v), &m) in var.iter_mut().zip(row.iter()).zip(mean.iter()) {
                let d = v as f64 - m;
                *acc += d * d;
            }
        }
        let scale = var
            .iter()
            .map(|&v| {
                let std = (v / n).sqrt() as f32;
                if std < 10.0 * f32::EPSILON || !std.is_finite() {
                    1.0
                } else {
                    std
                }
            })
            .collect();
        Self {
            mean: mean.into_iter().map(|m| m as f32).collect(),
            scale,
        }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one feature value, in the same `f32` order the firmware uses.
    pub fn transform_value(&self, feature: usize, value: f32) -> f32 {
        (value - self.mean[feature]) / self.scale[feature]
    }

    pub fn transform(&self, row: &[f32]) -> Vec<f32> {
        row.iter()
            .take(self.n_features())
            .enumerate()
            .map(|(i, &v)| self.transform_value(i, v))
            .collect()
    }
}
