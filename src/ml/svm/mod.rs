//! Binary linear SVM over standardized features.

mod train;

pub use train::{SvmOptions, train_linear_svm};

use serde::{Deserialize, Serialize};

use super::{Classifier, StandardScaler};

/// Fitted linear SVM: `bias + Σ w[i]·(x[i]-mean[i])/scale[i]`, positive class above zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvm {
    pub scaler: StandardScaler,
    pub weights: Vec<f32>,
    pub bias: f32,
    pub negative_class: usize,
    pub positive_class: usize,
}

impl LinearSvm {
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Signed distance proxy, accumulated in `f32` starting from the bias.
    pub fn decision_function(&self, features: &[f32]) -> f32 {
        let mut sum = self.bias;
        for (i, &w) in self.weights.iter().enumerate() {
            let value = features.get(i).copied().unwrap_or(0.0);
            sum += w * self.scaler.transform_value(i, value);
        }
        sum
    }

    pub fn predict(&self, features: &[f32]) -> usize {
        if self.decision_function(features) > 0.0 {
            self.positive_class
        } else {
            self.negative_class
        }
    }

    /// Validate that weights and scaler agree in length.
    pub fn validate(&self) -> Result<(), String> {
        if self.weights.len() != self.scaler.mean.len()
            || self.weights.len() != self.scaler.scale.len()
        {
            return Err(format!(
                "weights ({}) and scaler ({}/{}) length mismatch",
                self.weights.len(),
                self.scaler.mean.len(),
                self.scaler.scale.len()
            ));
        }
        Ok(())
    }
}

impl Classifier for LinearSvm {
    fn predict(&self, features: &[f32]) -> usize {
        LinearSvm::predict(self, features)
    }
}
